//! Identifier registry for one scenario run.
//!
//! [`ScenarioState`] assigns stable placeholders to volatile identifiers the
//! first time they are seen, and returns the same placeholder on every later
//! occurrence within the run. A fresh state is created for every fixture set
//! and threaded by `&mut` through each normalizer; it is never shared between
//! scenarios.
//!
//! # Invariants
//!
//! - The same original commit SHA always maps to the same placeholder, and
//!   distinct originals map to distinct placeholders.
//! - Numeric ids are scoped by [`IdKind`]. Each kind has its own counter and
//!   a disjoint output range, so equal originals of different kinds never
//!   alias and never shift each other's numbering.
//! - Placeholders get no special treatment on input: a real id or SHA that
//!   happens to equal an issued placeholder is a new original and gets its
//!   own placeholder. Normalization stays idempotent because the mapping is
//!   injective and normalized input is walked in the same order, so the
//!   n-th distinct placeholder is met where the n-th original was.

use std::collections::HashMap;
use std::fmt;

/// Length of a commit SHA in hex characters.
pub const COMMIT_SHA_LEN: usize = 40;

/// First normalized id of the first [`IdKind`].
pub const ID_BASE: u64 = 1000;

/// Size of the output range reserved for each [`IdKind`].
pub const IDS_PER_KIND: u64 = 100_000;

/// Class of entity a numeric id identifies.
///
/// The declaration order fixes each kind's output range; append new kinds at
/// the end so existing fixtures keep their values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdKind {
    /// Users, organizations and bots. GitHub allocates all of them from one
    /// account id space.
    Account,
    /// Repositories.
    Repository,
    /// Issues.
    Issue,
    /// Pull requests.
    PullRequest,
    /// Issue, commit and review comments.
    Comment,
    /// Pull request reviews.
    Review,
    /// Labels.
    Label,
    /// Milestones.
    Milestone,
    /// Teams.
    Team,
    /// Repository and organization invitations.
    Invitation,
    /// Webhooks.
    Hook,
    /// Commit statuses.
    Status,
    /// Releases.
    Release,
    /// Release assets.
    ReleaseAsset,
    /// Reactions.
    Reaction,
    /// Projects.
    Project,
    /// Project columns.
    ProjectColumn,
    /// Project cards.
    ProjectCard,
    /// App installations.
    Installation,
    /// GitHub Apps.
    App,
    /// Check runs.
    CheckRun,
    /// Check suites.
    CheckSuite,
}

impl IdKind {
    /// All kinds in declaration order.
    pub const ALL: [Self; 22] = [
        Self::Account,
        Self::Repository,
        Self::Issue,
        Self::PullRequest,
        Self::Comment,
        Self::Review,
        Self::Label,
        Self::Milestone,
        Self::Team,
        Self::Invitation,
        Self::Hook,
        Self::Status,
        Self::Release,
        Self::ReleaseAsset,
        Self::Reaction,
        Self::Project,
        Self::ProjectColumn,
        Self::ProjectCard,
        Self::Installation,
        Self::App,
        Self::CheckRun,
        Self::CheckSuite,
    ];

    /// First normalized value issued for this kind.
    #[must_use]
    pub const fn base(self) -> u64 {
        ID_BASE + (self as u64) * IDS_PER_KIND
    }

    /// GraphQL type name used in legacy `node_id` values.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Account => "User",
            Self::Repository => "Repository",
            Self::Issue => "Issue",
            Self::PullRequest => "PullRequest",
            Self::Comment => "IssueComment",
            Self::Review => "PullRequestReview",
            Self::Label => "Label",
            Self::Milestone => "Milestone",
            Self::Team => "Team",
            Self::Invitation => "RepositoryInvitation",
            Self::Hook => "Hook",
            Self::Status => "StatusContext",
            Self::Release => "Release",
            Self::ReleaseAsset => "ReleaseAsset",
            Self::Reaction => "Reaction",
            Self::Project => "Project",
            Self::ProjectColumn => "ProjectColumn",
            Self::ProjectCard => "ProjectCard",
            Self::Installation => "Installation",
            Self::App => "Integration",
            Self::CheckRun => "CheckRun",
            Self::CheckSuite => "CheckSuite",
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Commit SHA placeholders issued during one run.
#[derive(Debug, Default, Clone)]
struct CommitShaTable {
    by_original: HashMap<String, String>,
}

impl CommitShaTable {
    fn assign(&mut self, original: &str) -> String {
        let next = self.by_original.len() + 1;
        self.by_original
            .entry(original.to_string())
            .or_insert_with(|| format!("{next:0>width$}", width = COMMIT_SHA_LEN))
            .clone()
    }

    fn get(&self, original: &str) -> Option<&str> {
        self.by_original.get(original).map(String::as_str)
    }
}

/// Id placeholders issued for one [`IdKind`].
#[derive(Debug, Default, Clone)]
struct IdTable {
    by_original: HashMap<u64, u64>,
}

impl IdTable {
    fn assign(&mut self, kind: IdKind, original: u64) -> u64 {
        let next = kind.base() + self.by_original.len() as u64;
        let normalized = *self.by_original.entry(original).or_insert(next);
        debug_assert!(
            normalized < kind.base() + IDS_PER_KIND,
            "{kind} id range exhausted"
        );
        normalized
    }
}

/// Per-run identifier registry.
#[derive(Debug, Default, Clone)]
pub struct ScenarioState {
    commit_shas: CommitShaTable,
    ids: HashMap<IdKind, IdTable>,
}

impl ScenarioState {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the placeholder for a commit SHA, issuing one on first sight.
    ///
    /// Placeholders are the 1-based insertion count left-padded with `0` to
    /// 40 characters. The caller must pass a 40-character lowercase hex
    /// string; see [`is_commit_sha`].
    pub fn assign_commit_sha(&mut self, original: &str) -> String {
        debug_assert!(is_commit_sha(original), "not a commit sha: {original}");
        self.commit_shas.assign(original)
    }

    /// Looks up the placeholder of a known commit SHA without issuing one.
    #[must_use]
    pub fn commit_sha(&self, original: &str) -> Option<&str> {
        self.commit_shas.get(original)
    }

    /// Returns the normalized id for `original` within `kind`, issuing the
    /// next value of that kind's range on first sight.
    pub fn assign_id(&mut self, kind: IdKind, original: u64) -> u64 {
        self.ids.entry(kind).or_default().assign(kind, original)
    }

    /// Number of distinct commit SHAs seen so far.
    #[must_use]
    pub fn commit_sha_count(&self) -> usize {
        self.commit_shas.by_original.len()
    }

    /// Number of distinct ids of `kind` seen so far.
    #[must_use]
    pub fn id_count(&self, kind: IdKind) -> usize {
        self.ids.get(&kind).map_or(0, |table| table.by_original.len())
    }
}

/// Returns `true` if `value` has the shape of a commit SHA: exactly 40
/// lowercase hex characters.
#[must_use]
pub fn is_commit_sha(value: &str) -> bool {
    value.len() == COMMIT_SHA_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
