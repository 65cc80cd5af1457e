//! Property tests for normalization determinism and idempotence.

use fixturize_core::fixture::{Fixture, Headers};
use fixturize_core::normalize_fixture_set;
use proptest::prelude::*;
use serde_json::{Value, json};

/// GitHub ids, including old ones that fall inside a placeholder range.
fn entity_id() -> impl Strategy<Value = u64> {
    prop_oneof![
        1000_u64..1100,
        101_000_u64..101_100,
        10_000_000_u64..2_000_000_000,
    ]
}

fn commit_sha() -> impl Strategy<Value = String> {
    "[0-9a-f]{40}"
}

fn timestamp() -> impl Strategy<Value = String> {
    (2018_u32..2030, 1_u32..13, 1_u32..29, 0_u32..24).prop_map(|(y, mo, d, h)| {
        format!("{y:04}-{mo:02}-{d:02}T{h:02}:15:42Z")
    })
}

fn fixture(method: &str, path: String, response: Value) -> Fixture {
    let mut headers = Headers::new();
    headers.insert("content-type".to_string(), "application/json".to_string());
    headers.insert("content-length".to_string(), "0".to_string());
    Fixture {
        scope: "https://api.github.com:443".to_string(),
        method: method.to_string(),
        path,
        body: None,
        status: 200,
        response,
        reqheaders: Headers::new(),
        headers,
        response_is_binary: false,
        duration_ms: Some(87),
    }
}

prop_compose! {
    fn recording(commits: usize)(
        owner in entity_id(),
        repo in entity_id(),
        hook in entity_id(),
        shas in prop::collection::vec(commit_sha(), commits),
        created in timestamp(),
    ) -> Vec<Fixture> {
        let commits: Vec<Value> = shas
            .iter()
            .map(|sha| json!({
                "sha": sha,
                "commit": { "author": { "date": created.clone() } },
                "author": { "id": owner, "type": "User", "node_id": "MDQ6VXNlcjE=" },
            }))
            .collect();

        vec![
            fixture(
                "get",
                "/repos/octokit-fixture-org/hello-world".to_string(),
                json!({
                    "id": repo,
                    "node_id": "MDEwOlJlcG9zaXRvcnkx",
                    "owner": { "id": owner, "type": "Organization" },
                    "created_at": created.clone(),
                }),
            ),
            fixture(
                "get",
                "/repos/octokit-fixture-org/hello-world/commits".to_string(),
                Value::Array(commits),
            ),
            fixture(
                "get",
                format!("/repos/octokit-fixture-org/hello-world/commits/{}", shas[0]),
                json!({ "sha": shas[0], "parents": [] }),
            ),
            fixture(
                "get",
                format!("/repos/octokit-fixture-org/hello-world/hooks/{hook}"),
                json!({
                    "id": hook,
                    "url": format!("https://api.github.com/repos/octokit-fixture-org/hello-world/hooks/{hook}"),
                    "updated_at": created,
                }),
            ),
        ]
    }
}

fn any_recording() -> impl Strategy<Value = Vec<Fixture>> {
    (1_usize..4).prop_flat_map(recording)
}

/// Two recordings of the same scenario: same shape, different volatile
/// values.
fn recording_pair() -> impl Strategy<Value = (Vec<Fixture>, Vec<Fixture>)> {
    (1_usize..4).prop_flat_map(|commits| (recording(commits), recording(commits)))
}

proptest! {
    #[test]
    fn normalization_is_idempotent(raw in any_recording()) {
        let once = normalize_fixture_set(&raw);
        let twice = normalize_fixture_set(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalization_is_deterministic(raw in any_recording()) {
        let first = serde_json::to_string(&normalize_fixture_set(&raw)).unwrap();
        let second = serde_json::to_string(&normalize_fixture_set(&raw)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn volatile_values_do_not_reach_the_output((a, b) in recording_pair()) {
        prop_assert_eq!(normalize_fixture_set(&a), normalize_fixture_set(&b));
    }
}
