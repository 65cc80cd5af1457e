//! Temporary repositories created by mutating scenarios.
//!
//! Scenarios that change repository state work on a throwaway repository
//! whose name embeds the scenario title and a millisecond timestamp, so two
//! recordings never collide. Normalization strips the timestamp back out,
//! and cleanup uses the same pattern to find leftovers.

use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use tracing::info;

use crate::recorder::{RecordError, RecordSession, Request};

/// Prefix of every temporary repository name.
pub const PREFIX: &str = "tmp-scenario-";

/// Matches a temporary repository name; capture group 1 is the scenario
/// title.
pub static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"tmp-scenario-([a-z0-9][a-z0-9-]*?)-\d{17}")
        .expect("invalid temporary repository pattern")
});

/// A temporary repository for one scenario recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryRepository {
    title: String,
    name: String,
}

impl TemporaryRepository {
    /// Creates the repository name for `title` at `now`.
    #[must_use]
    pub fn new(title: &str, now: DateTime<Utc>) -> Self {
        let name = format!("{PREFIX}{title}-{}", now.format("%Y%m%d%H%M%S%3f"));
        Self {
            title: title.to_string(),
            name,
        }
    }

    /// Scenario title the repository belongs to.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Full repository name, including the timestamp.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Returns `true` if `name` is a temporary repository name.
#[must_use]
pub fn is_temporary(name: &str) -> bool {
    PATTERN
        .find(name)
        .is_some_and(|m| m.start() == 0 && m.end() == name.len())
}

/// Replaces every temporary repository name in `input` with its scenario
/// title.
#[must_use]
pub fn strip_timestamps(input: &str) -> Cow<'_, str> {
    PATTERN.replace_all(input, "$1")
}

/// Page size when listing organization repositories.
const PER_PAGE: usize = 100;

/// Deletes every temporary repository left behind in the session's
/// organization and returns the deleted names.
///
/// # Errors
///
/// Returns the first failed request. Repositories deleted before the
/// failure stay deleted.
pub fn remove_temporary_repositories(
    session: &mut RecordSession<'_>,
) -> Result<Vec<String>, RecordError> {
    let org = session.organization().to_string();
    let mut leftovers = Vec::new();

    for page in 1.. {
        let path = format!("/orgs/{org}/repos?per_page={PER_PAGE}&page={page}");
        let response = session.request(Request::get(path.as_str()))?;
        let Value::Array(repositories) = response.body else {
            return Err(RecordError::UnexpectedResponse {
                path,
                reason: "expected an array of repositories".to_string(),
            });
        };

        leftovers.extend(
            repositories
                .iter()
                .filter_map(|repository| repository.get("name").and_then(Value::as_str))
                .filter(|name| is_temporary(name))
                .map(str::to_string),
        );
        if repositories.len() < PER_PAGE {
            break;
        }
    }

    for name in &leftovers {
        session.request(Request::delete(format!("/repos/{org}/{name}")))?;
        info!(repository = %name, "deleted temporary repository");
    }
    Ok(leftovers)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 14, 11).unwrap()
            + chrono::Duration::milliseconds(42)
    }

    #[test]
    fn name_embeds_title_and_millisecond_timestamp() {
        let repo = TemporaryRepository::new("create-file", now());
        assert_eq!(repo.name(), "tmp-scenario-create-file-20250602091411042");
        assert_eq!(repo.title(), "create-file");
        assert!(is_temporary(repo.name()));
    }

    #[test]
    fn strip_timestamps_restores_title() {
        let input = "https://api.github.com/repos/octokit-fixture-org/tmp-scenario-create-file-20250602091411042/contents/test.txt";
        assert_eq!(
            strip_timestamps(input),
            "https://api.github.com/repos/octokit-fixture-org/create-file/contents/test.txt"
        );
    }

    #[test]
    fn strip_timestamps_is_idempotent() {
        let once = strip_timestamps("tmp-scenario-labels-20250602091411042").into_owned();
        assert_eq!(once, "labels");
        assert_eq!(strip_timestamps(&once), "labels");
    }

    #[test]
    fn regular_names_are_not_temporary() {
        assert!(!is_temporary("hello-world"));
        assert!(!is_temporary("tmp-scenario-create-file"));
        assert!(!is_temporary("x-tmp-scenario-create-file-20250602091411042"));
    }
}
