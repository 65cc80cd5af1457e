//! Commit SHA normalizer.
//!
//! Runs in two passes over a fixture:
//!
//! 1. **Register**: commit SHAs are collected from commit-SHA keys and from
//!    URL segments after `commits`/`statuses`, and each gets a placeholder
//!    from the registry. Content hashes (`sha` of blobs, trees and files)
//!    are skipped: they only change when content changes.
//! 2. **Rewrite**: every registered SHA is replaced wherever it occurs in a
//!    string, so `sha`, `url` and `html_url` of the same commit agree.
//!
//! Registration follows a fixed order (path, request body, response,
//! `location` header) so placeholder numbering depends only on the fixture
//! contents.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use super::FieldNormalizer;
use super::rules::{COMMIT_SHA_KEYS, COMMIT_SHA_SEGMENTS, NON_COMMIT_PARENTS, NON_COMMIT_TYPES};
use super::strings::{for_each_path_segment, rewrite_strings};
use crate::fixture::Fixture;
use crate::registry::{ScenarioState, is_commit_sha};

static EMBEDDED_SHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9a-f]{40}\b").expect("invalid commit sha pattern"));

/// Rewrites commit SHAs through the scenario registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommitShas;

impl FieldNormalizer for CommitShas {
    fn name(&self) -> &'static str {
        "commit-shas"
    }

    fn apply(&self, state: &mut ScenarioState, fixture: &mut Fixture) {
        register_url(state, &fixture.path);
        if let Some(body) = fixture.body.as_ref() {
            register(state, body, None);
        }
        if fixture.has_structured_response() {
            register(state, &fixture.response, None);
        }
        if let Some(location) = fixture.headers.get("location") {
            register_url(state, location);
        }

        if state.commit_sha_count() == 0 {
            return;
        }

        let mut rewrite = |text: &str| replace_known(state, text);
        if let Some(path) = rewrite(&fixture.path) {
            fixture.path = path;
        }
        if let Some(body) = fixture.body.as_mut() {
            rewrite_strings(body, &mut rewrite);
        }
        if fixture.has_structured_response() {
            rewrite_strings(&mut fixture.response, &mut rewrite);
        }
        if let Some(location) = fixture.headers.get_mut("location") {
            if let Some(replaced) = rewrite(location.as_str()) {
                *location = replaced;
            }
        }
    }
}

fn register(state: &mut ScenarioState, value: &Value, parent: Option<&str>) {
    match value {
        Value::Object(map) => {
            let is_content = map
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| NON_COMMIT_TYPES.contains(&t))
                || parent.is_some_and(|p| NON_COMMIT_PARENTS.contains(&p));

            for (key, child) in map {
                match child {
                    Value::String(text) if COMMIT_SHA_KEYS.contains(&key.as_str()) => {
                        if is_commit_sha(text) && !(is_content && key == "sha") {
                            state.assign_commit_sha(text);
                        }
                    },
                    Value::String(text) => register_url(state, text),
                    other => register(state, other, Some(key.as_str())),
                }
            }
        },
        Value::Array(items) => {
            for item in items {
                register(state, item, parent);
            }
        },
        Value::String(text) => register_url(state, text),
        _ => {},
    }
}

fn register_url(state: &mut ScenarioState, url: &str) {
    for_each_path_segment(url, |previous, segment| {
        if COMMIT_SHA_SEGMENTS.contains(&previous) && is_commit_sha(segment) {
            state.assign_commit_sha(segment);
        }
    });
}

fn replace_known(state: &ScenarioState, text: &str) -> Option<String> {
    let mut changed = false;
    let replaced = EMBEDDED_SHA.replace_all(text, |caps: &Captures<'_>| {
        let sha = &caps[0];
        match state.commit_sha(sha) {
            Some(placeholder) if placeholder != sha => {
                changed = true;
                placeholder.to_string()
            },
            _ => sha.to_string(),
        }
    });
    changed.then(|| replaced.into_owned())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::fixture::Headers;

    const SHA_1: &str = "1111111111111111111111111111111111111111";
    const SHA_2: &str = "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3";
    const BLOB: &str = "3b18e512dba79e4c8300dd08aeb37f8e728b8dad";
    const P1: &str = "0000000000000000000000000000000000000001";
    const P2: &str = "0000000000000000000000000000000000000002";

    fn fixture(path: &str, response: Value) -> Fixture {
        Fixture {
            scope: "https://api.github.com:443".to_string(),
            method: "get".to_string(),
            path: path.to_string(),
            body: None,
            status: 200,
            response,
            reqheaders: Headers::new(),
            headers: Headers::new(),
            response_is_binary: false,
            duration_ms: None,
        }
    }

    #[test]
    fn same_sha_gets_same_placeholder_across_fixtures() {
        let mut state = ScenarioState::new();
        let mut first = fixture("/repos/o/r/commits", json!([{ "sha": SHA_1 }]));
        let mut second = fixture("/repos/o/r/branches/main", json!({ "commit": { "sha": SHA_1 } }));

        CommitShas.apply(&mut state, &mut first);
        CommitShas.apply(&mut state, &mut second);

        assert_eq!(first.response[0]["sha"], P1);
        assert_eq!(second.response["commit"]["sha"], P1);
    }

    #[test]
    fn urls_follow_registered_shas() {
        let mut state = ScenarioState::new();
        let mut f = fixture(
            &format!("/repos/o/r/commits/{SHA_2}"),
            json!({
                "sha": SHA_2,
                "html_url": format!("https://github.com/o/r/commit/{SHA_2}"),
                "parents": [{ "sha": SHA_1, "url": format!("https://api.github.com/repos/o/r/commits/{SHA_1}") }],
            }),
        );

        CommitShas.apply(&mut state, &mut f);

        assert_eq!(f.path, format!("/repos/o/r/commits/{P1}"));
        assert_eq!(f.response["sha"], P1);
        assert_eq!(f.response["html_url"], format!("https://github.com/o/r/commit/{P1}"));
        assert_eq!(f.response["parents"][0]["sha"], P2);
        assert_eq!(
            f.response["parents"][0]["url"],
            format!("https://api.github.com/repos/o/r/commits/{P2}")
        );
    }

    #[test]
    fn content_hashes_are_kept() {
        let mut state = ScenarioState::new();
        let mut f = fixture(
            "/repos/o/r/contents/test.txt",
            json!({
                "content": { "type": "file", "sha": BLOB, "git_url": format!("https://api.github.com/repos/o/r/git/blobs/{BLOB}") },
                "commit": { "sha": SHA_1, "tree": { "sha": BLOB } },
            }),
        );

        CommitShas.apply(&mut state, &mut f);

        assert_eq!(f.response["content"]["sha"], BLOB);
        assert_eq!(f.response["commit"]["tree"]["sha"], BLOB);
        assert_eq!(f.response["commit"]["sha"], P1);
        assert_eq!(state.commit_sha_count(), 1);
    }

    #[test]
    fn non_sha_values_under_sha_keys_are_kept() {
        let mut state = ScenarioState::new();
        let mut f = fixture("/", json!({ "before": "Y3Vyc29yOjE=", "sha": null }));

        CommitShas.apply(&mut state, &mut f);

        assert_eq!(f.response["before"], "Y3Vyc29yOjE=");
        assert_eq!(f.response["sha"], Value::Null);
    }

    #[test]
    fn location_header_and_request_body_are_rewritten() {
        let mut state = ScenarioState::new();
        let mut f = fixture("/repos/o/r/git/refs", json!({ "object": { "type": "commit", "sha": SHA_1 } }));
        f.body = Some(json!({ "ref": "refs/heads/test", "sha": SHA_1 }));
        f.headers.insert(
            "location".to_string(),
            format!("https://api.github.com/repos/o/r/commits/{SHA_1}"),
        );

        CommitShas.apply(&mut state, &mut f);

        assert_eq!(f.body.as_ref().unwrap()["sha"], P1);
        assert_eq!(f.response["object"]["sha"], P1);
        assert_eq!(
            f.headers["location"],
            format!("https://api.github.com/repos/o/r/commits/{P1}")
        );
    }

    #[test]
    fn longer_hex_strings_are_not_split() {
        let mut state = ScenarioState::new();
        let long = format!("{SHA_1}{}", "f".repeat(24));
        let mut f = fixture("/", json!({ "sha": SHA_1, "digest": long }));

        CommitShas.apply(&mut state, &mut f);
        assert_eq!(f.response["digest"], long);
    }

    #[test]
    fn binary_response_is_not_traversed() {
        let mut state = ScenarioState::new();
        let mut f = fixture("/repos/o/r/tarball/main", json!(SHA_1));
        f.response_is_binary = true;

        CommitShas.apply(&mut state, &mut f);
        assert_eq!(f.response, SHA_1);
        assert_eq!(state.commit_sha_count(), 0);
    }
}
