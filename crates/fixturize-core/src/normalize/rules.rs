//! Declarative rule tables.
//!
//! Every decision about which field a normalizer touches is made from the
//! tables in this module, so the rule set can be read and tested without
//! running the pipeline.

use crate::registry::IdKind;

/// Fixed value for normalized RFC 3339 timestamps.
pub const FIXTURE_TIMESTAMP: &str = "2017-10-10T16:00:00Z";

/// Fixed value for normalized HTTP dates.
pub const FIXTURE_HTTP_DATE: &str = "Tue, 10 Oct 2017 16:00:00 GMT";

/// Placeholder authorization header value.
pub const FIXTURE_AUTHORIZATION: &str = "token 0000000000000000000000000000000000000000";

/// Response headers zeroed to a fixed value when present.
pub const ZEROED_HEADERS: &[(&str, &str)] = &[
    ("date", FIXTURE_HTTP_DATE),
    ("last-modified", FIXTURE_HTTP_DATE),
    ("x-github-request-id", "0000:00000:0000000:0000000:00000000"),
    ("x-ratelimit-remaining", "4999"),
    ("x-ratelimit-reset", "1507651200"),
    ("x-ratelimit-used", "1"),
    ("x-runtime-rack", "0.000000"),
    (
        "github-authentication-token-expiration",
        "2017-10-10 16:00:00 UTC",
    ),
];

/// Placeholder entity tag. A weak validator keeps its `W/` prefix.
pub const FIXTURE_ETAG: &str = "\"00000000000000000000000000000000\"";

/// Response headers dropped entirely.
pub const REMOVED_HEADERS: &[&str] = &[
    "age",
    "server-timing",
    "x-cache",
    "x-cache-hits",
    "x-fastly-request-id",
    "x-served-by",
    "x-timer",
];

/// Keys whose string values are timestamps.
pub const TIMESTAMP_KEYS: &[&str] = &[
    "closed_at",
    "completed_at",
    "created_at",
    "expires_at",
    "merged_at",
    "published_at",
    "pushed_at",
    "started_at",
    "submitted_at",
    "updated_at",
];

/// Parent keys under which a `date` field is a timestamp (git signatures).
pub const SIGNATURE_KEYS: &[&str] = &["author", "committer", "tagger"];

/// Keys whose values are commit SHAs.
pub const COMMIT_SHA_KEYS: &[&str] = &[
    "after",
    "before",
    "commit_id",
    "head_sha",
    "merge_commit_sha",
    "original_commit_id",
    "sha",
];

/// Object `type` values whose `sha` is a content hash, not a commit.
pub const NON_COMMIT_TYPES: &[&str] = &["blob", "dir", "file", "submodule", "symlink", "tree"];

/// Parent keys whose object `sha` is a content hash, not a commit.
pub const NON_COMMIT_PARENTS: &[&str] = &["tree"];

/// URL path segments followed by a commit SHA.
pub const COMMIT_SHA_SEGMENTS: &[&str] = &["commits", "statuses"];

/// Fields holding the id of another entity.
pub const FOREIGN_KEYS: &[(&str, IdKind)] = &[
    ("in_reply_to_id", IdKind::Comment),
    ("pull_request_review_id", IdKind::Review),
    ("repository_id", IdKind::Repository),
];

/// Parent key of a nested object (or of an array of objects) to the kind of
/// entity it holds.
pub const PARENT_KINDS: &[(&str, IdKind)] = &[
    ("actor", IdKind::Account),
    ("app", IdKind::App),
    ("assets", IdKind::ReleaseAsset),
    ("assignee", IdKind::Account),
    ("assignees", IdKind::Account),
    ("author", IdKind::Account),
    ("base_repo", IdKind::Repository),
    ("check_runs", IdKind::CheckRun),
    ("check_suite", IdKind::CheckSuite),
    ("check_suites", IdKind::CheckSuite),
    ("closed_by", IdKind::Account),
    ("comment", IdKind::Comment),
    ("committer", IdKind::Account),
    ("creator", IdKind::Account),
    ("forkee", IdKind::Repository),
    ("head_repo", IdKind::Repository),
    ("installation", IdKind::Installation),
    ("installations", IdKind::Installation),
    ("invitee", IdKind::Account),
    ("inviter", IdKind::Account),
    ("issue", IdKind::Issue),
    ("label", IdKind::Label),
    ("labels", IdKind::Label),
    ("merged_by", IdKind::Account),
    ("milestone", IdKind::Milestone),
    ("org", IdKind::Account),
    ("organization", IdKind::Account),
    ("owner", IdKind::Account),
    ("performed_via_github_app", IdKind::App),
    ("project", IdKind::Project),
    ("pull_request", IdKind::PullRequest),
    ("release", IdKind::Release),
    ("repo", IdKind::Repository),
    ("repositories", IdKind::Repository),
    ("repository", IdKind::Repository),
    ("requested_reviewers", IdKind::Account),
    ("requested_teams", IdKind::Team),
    ("review", IdKind::Review),
    ("sender", IdKind::Account),
    ("source", IdKind::Repository),
    ("statuses", IdKind::Status),
    ("team", IdKind::Team),
    ("teams", IdKind::Team),
    ("template_repository", IdKind::Repository),
    ("uploader", IdKind::Account),
    ("user", IdKind::Account),
];

/// Array keys whose elements take the kind of the request route (search
/// results, installation repository lists).
pub const ROUTE_ITEM_KEYS: &[&str] = &["items"];

/// How a route segment affects the kind of the top-level response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRule {
    /// Path segment.
    pub segment: &'static str,
    /// Kind of the entities below this segment, `None` if they carry no
    /// normalizable id.
    pub kind: Option<IdKind>,
    /// Number of following segments that are names, not collections
    /// (`/repos/{owner}/{repo}`).
    pub skip: usize,
    /// Stop scanning after this segment; the rest of the path is free-form
    /// (file paths, git refs).
    pub terminal: bool,
}

const fn rule(segment: &'static str, kind: Option<IdKind>, skip: usize) -> RouteRule {
    RouteRule {
        segment,
        kind,
        skip,
        terminal: false,
    }
}

const fn terminal(segment: &'static str) -> RouteRule {
    RouteRule {
        segment,
        kind: None,
        skip: 0,
        terminal: true,
    }
}

/// Route segments, scanned left to right. The last matching rule decides
/// the kind of the response body.
pub const ROUTE_RULES: &[RouteRule] = &[
    rule("assets", Some(IdKind::ReleaseAsset), 0),
    rule("assignees", Some(IdKind::Account), 0),
    rule("branches", None, 0),
    rule("cards", Some(IdKind::ProjectCard), 0),
    rule("check-runs", Some(IdKind::CheckRun), 0),
    rule("check-suites", Some(IdKind::CheckSuite), 0),
    rule("collaborators", Some(IdKind::Account), 0),
    rule("columns", Some(IdKind::ProjectColumn), 0),
    rule("comments", Some(IdKind::Comment), 0),
    rule("commits", None, 0),
    rule("forks", Some(IdKind::Repository), 0),
    rule("hooks", Some(IdKind::Hook), 0),
    rule("installations", Some(IdKind::Installation), 0),
    rule("invitations", Some(IdKind::Invitation), 0),
    rule("issues", Some(IdKind::Issue), 0),
    rule("labels", Some(IdKind::Label), 0),
    rule("members", Some(IdKind::Account), 0),
    rule("milestones", Some(IdKind::Milestone), 0),
    rule("orgs", Some(IdKind::Account), 1),
    rule("projects", Some(IdKind::Project), 0),
    rule("pulls", Some(IdKind::PullRequest), 0),
    rule("reactions", Some(IdKind::Reaction), 0),
    rule("releases", Some(IdKind::Release), 0),
    rule("repos", Some(IdKind::Repository), 2),
    rule("repositories", Some(IdKind::Repository), 0),
    rule("reviews", Some(IdKind::Review), 0),
    rule("search", None, 0),
    rule("stargazers", Some(IdKind::Account), 0),
    rule("status", None, 0),
    rule("statuses", Some(IdKind::Status), 0),
    rule("subscribers", Some(IdKind::Account), 0),
    rule("teams", Some(IdKind::Team), 0),
    rule("user", Some(IdKind::Account), 0),
    rule("users", Some(IdKind::Account), 1),
    terminal("archive"),
    terminal("contents"),
    terminal("git"),
    terminal("readme"),
    terminal("tarball"),
    terminal("zipball"),
];

/// URL path segments followed by a numeric id of the given kind.
pub const ID_SEGMENTS: &[(&str, IdKind)] = &[
    ("assets", IdKind::ReleaseAsset),
    ("cards", IdKind::ProjectCard),
    ("check-runs", IdKind::CheckRun),
    ("check-suites", IdKind::CheckSuite),
    ("columns", IdKind::ProjectColumn),
    ("comments", IdKind::Comment),
    ("hooks", IdKind::Hook),
    ("installations", IdKind::Installation),
    ("invitations", IdKind::Invitation),
    ("projects", IdKind::Project),
    ("reactions", IdKind::Reaction),
    ("releases", IdKind::Release),
    ("repositories", IdKind::Repository),
    ("reviews", IdKind::Review),
    ("teams", IdKind::Team),
];

/// Looks up the kind held under a parent key.
#[must_use]
pub fn parent_kind(key: &str) -> Option<IdKind> {
    lookup(PARENT_KINDS, key)
}

/// Looks up the kind of a foreign-key field.
#[must_use]
pub fn foreign_key_kind(key: &str) -> Option<IdKind> {
    lookup(FOREIGN_KEYS, key)
}

/// Looks up the kind of the numeric id following a URL segment.
#[must_use]
pub fn id_segment_kind(segment: &str) -> Option<IdKind> {
    lookup(ID_SEGMENTS, segment)
}

fn lookup(table: &[(&str, IdKind)], key: &str) -> Option<IdKind> {
    table
        .iter()
        .find_map(|&(name, kind)| (name == key).then_some(kind))
}

/// Resolves the kind of the top-level response body from a request route.
///
/// Segments are scanned left to right; the last [`RouteRule`] that matches
/// wins, name segments after `repos`, `orgs` and `users` are skipped, and a
/// terminal segment ends the scan with no kind.
#[must_use]
pub fn route_kind(route: &str) -> Option<IdKind> {
    let mut kind = None;
    let mut segments = route.split('/').filter(|s| !s.is_empty());

    while let Some(segment) = segments.next() {
        let Some(rule) = ROUTE_RULES.iter().find(|r| r.segment == segment) else {
            continue;
        };
        if rule.terminal {
            return None;
        }
        kind = rule.kind;
        for _ in 0..rule.skip {
            segments.next();
        }
    }

    kind
}
