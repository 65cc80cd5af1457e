//! End-to-end recording tests against a fake API.
//!
//! Records built-in scenarios through a [`Transport`] that answers like
//! GitHub, normalizes the result, stores it, and checks drift detection.

use std::cell::RefCell;

use chrono::{DateTime, Duration, TimeZone, Utc};
use fixturize_core::fixture::Headers;
use fixturize_core::normalize::rules::FIXTURE_AUTHORIZATION;
use fixturize_core::recorder::{
    HttpRequest, HttpResponse, RecordError, RecordSession, Scenario, SessionOptions, Throttle,
    Transport, record_scenario,
};
use fixturize_core::scenarios::CreateFile;
use fixturize_core::store::RAW_FIXTURE_FILE;
use fixturize_core::temporary_repository::remove_temporary_repositories;
use fixturize_core::{FixtureDrift, FixtureStore, detect_drift, normalize_fixture_set};
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Answers `create-file` and cleanup calls. `seed` varies every value the
/// real API would generate.
struct FakeGitHub {
    seed: u64,
    repositories: Vec<String>,
    sent: RefCell<Vec<HttpRequest>>,
}

impl FakeGitHub {
    fn new(seed: u64) -> Self {
        Self {
            seed,
            repositories: Vec::new(),
            sent: RefCell::new(Vec::new()),
        }
    }

    fn with_repositories(mut self, names: &[&str]) -> Self {
        self.repositories = names.iter().map(ToString::to_string).collect();
        self
    }

    fn respond(status: u16, body: &Value, seed: u64) -> HttpResponse {
        let mut headers = Headers::new();
        headers.insert(
            "content-type".to_string(),
            "application/json; charset=utf-8".to_string(),
        );
        headers.insert(
            "date".to_string(),
            format!("Mon, 02 Jun 2025 09:14:{:02} GMT", seed % 60),
        );
        headers.insert(
            "x-github-request-id".to_string(),
            format!("C2E1:3A4F:{seed}:1C2D3E:683D6A13"),
        );
        headers.insert("x-ratelimit-remaining".to_string(), (4990 - seed).to_string());
        let body = serde_json::to_vec(body).unwrap();
        headers.insert("content-length".to_string(), body.len().to_string());
        HttpResponse {
            status,
            headers,
            body,
        }
    }
}

impl Transport for FakeGitHub {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RecordError> {
        self.sent.borrow_mut().push(request.clone());
        let seed = self.seed;
        let path = request
            .url
            .strip_prefix("https://api.github.com")
            .unwrap_or(&request.url);
        let segments: Vec<&str> = path.split('/').collect();

        let response = match (request.method.as_str(), segments.as_slice()) {
            ("POST", ["", "orgs", _, "repos"]) => {
                let name = request.body.as_ref().unwrap()["name"].clone();
                Self::respond(201, &json!({ "id": 193_112_847 + seed, "name": name }), seed)
            }
            ("PUT", ["", "repos", org, repo, "contents", file]) => {
                let sha = format!("{seed:0>40}").replace('0', "a");
                Self::respond(
                    201,
                    &json!({
                        "content": {
                            "name": file,
                            "sha": "5e1c309dae7f45e0f39b1bf3ac3cd9db12e7d689",
                            "type": "file",
                            "url": format!("https://api.github.com/repos/{org}/{repo}/contents/{file}?ref=main"),
                        },
                        "commit": {
                            "sha": sha,
                            "url": format!("https://api.github.com/repos/{org}/{repo}/git/commits/{sha}"),
                            "author": {
                                "name": "Octokit Fixture User A",
                                "date": format!("2025-06-02T09:14:{:02}Z", seed % 60),
                            },
                            "tree": { "sha": "b4ff46ebd5d9b0e4b5b5a0e2b5a5b5a5b5a5b5a5" },
                        },
                    }),
                    seed,
                )
            }
            ("DELETE", ["", "repos", _, _]) => HttpResponse {
                status: 204,
                headers: Headers::new(),
                body: Vec::new(),
            },
            ("GET", ["", "orgs", _, query]) if query.starts_with("repos?") => {
                let repositories: Vec<Value> = self
                    .repositories
                    .iter()
                    .map(|name| json!({ "name": name }))
                    .collect();
                Self::respond(200, &Value::Array(repositories), seed)
            }
            _ => Self::respond(404, &json!({ "message": "Not Found" }), seed),
        };
        Ok(response)
    }
}

fn session<'a>(transport: &'a FakeGitHub, started_at: DateTime<Utc>) -> RecordSession<'a> {
    let options = SessionOptions {
        base_url: "https://api.github.com".to_string(),
        organization: "octokit-fixture-org".to_string(),
        throttle: Throttle::disabled(),
        started_at,
    };
    let token = SecretString::from("f".repeat(40));
    RecordSession::new(transport, options)
        .unwrap()
        .with_token(&token)
}

fn started_at(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 14, 11).unwrap()
        + Duration::seconds(offset_secs)
        + Duration::milliseconds(42)
}

#[test]
fn create_file_records_setup_and_teardown_as_ignored() {
    let api = FakeGitHub::new(1);
    let raw = record_scenario(&CreateFile, session(&api, started_at(0))).unwrap();

    let methods: Vec<_> = raw.iter().map(|f| f.method.as_str()).collect();
    assert_eq!(methods, ["post", "put", "delete"]);
    assert!(raw[0].is_ignored());
    assert!(!raw[1].is_ignored());
    assert!(raw[2].is_ignored());
    assert_eq!(
        raw[1].path,
        "/repos/octokit-fixture-org/tmp-scenario-create-file-20250602091411042/contents/test.txt"
    );
    assert_eq!(
        raw[1].body,
        Some(json!({ "message": "create test.txt", "content": "SGVsbG8gV29ybGQ=" }))
    );

    let normalized = normalize_fixture_set(&raw);
    assert_eq!(normalized.len(), 1);
    assert_eq!(
        normalized[0].path,
        "/repos/octokit-fixture-org/create-file/contents/test.txt"
    );
    assert_eq!(
        normalized[0].response["commit"]["sha"],
        "0000000000000000000000000000000000000001"
    );
    assert_eq!(
        normalized[0].response["commit"]["url"],
        "https://api.github.com/repos/octokit-fixture-org/create-file/git/commits/0000000000000000000000000000000000000001"
    );
}

#[test]
fn rerecording_is_up_to_date() {
    let dir = TempDir::new().unwrap();
    let store = FixtureStore::new(dir.path());
    let id = CreateFile.id();

    let first_api = FakeGitHub::new(1);
    let raw = record_scenario(&CreateFile, session(&first_api, started_at(0))).unwrap();
    let normalized = normalize_fixture_set(&raw);
    let stored = store.read_normalized(&id).unwrap();
    assert_eq!(detect_drift(stored.as_deref(), &normalized), FixtureDrift::New);
    store.write_raw(&id, &raw).unwrap();
    store.write_normalized(&id, &normalized).unwrap();

    let second_api = FakeGitHub::new(7);
    let raw = record_scenario(&CreateFile, session(&second_api, started_at(300))).unwrap();
    let normalized = normalize_fixture_set(&raw);
    let stored = store.read_normalized(&id).unwrap();

    assert_eq!(
        detect_drift(stored.as_deref(), &normalized),
        FixtureDrift::UpToDate
    );
    assert_eq!(store.list().unwrap(), vec![id]);
}

#[test]
fn changed_api_behavior_is_reported_as_drift() {
    let dir = TempDir::new().unwrap();
    let store = FixtureStore::new(dir.path());
    let id = CreateFile.id();

    let api = FakeGitHub::new(1);
    let raw = record_scenario(&CreateFile, session(&api, started_at(0))).unwrap();
    let normalized = normalize_fixture_set(&raw);
    store.write_normalized(&id, &normalized).unwrap();

    let mut changed = normalized.clone();
    changed[0].status = 200;
    let stored = store.read_normalized(&id).unwrap();

    let drift = detect_drift(stored.as_deref(), &changed);
    let FixtureDrift::Changed { changes } = &drift else {
        panic!("expected drift, got {drift:?}");
    };
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].path, "[0].status");
}

#[test]
fn stored_raw_fixtures_renormalize_to_the_same_result() {
    let dir = TempDir::new().unwrap();
    let store = FixtureStore::new(dir.path());
    let id = CreateFile.id();

    let api = FakeGitHub::new(3);
    let raw = record_scenario(&CreateFile, session(&api, started_at(0))).unwrap();
    store.write_raw(&id, &raw).unwrap();

    let reloaded = store.read_raw(&id).unwrap().unwrap();
    assert_eq!(normalize_fixture_set(&reloaded), normalize_fixture_set(&raw));
}

#[test]
fn stored_raw_fixtures_hold_no_access_token() {
    let dir = TempDir::new().unwrap();
    let store = FixtureStore::new(dir.path());
    let id = CreateFile.id();

    let api = FakeGitHub::new(1);
    let raw = record_scenario(&CreateFile, session(&api, started_at(0))).unwrap();
    assert!(raw.iter().all(|f| f.reqheaders.contains_key("authorization")));
    store.write_raw(&id, &raw).unwrap();

    let contents =
        std::fs::read_to_string(store.scenario_dir(&id).join(RAW_FIXTURE_FILE)).unwrap();
    assert!(!contents.contains(&"f".repeat(40)));

    let reloaded = store.read_raw(&id).unwrap().unwrap();
    for fixture in &reloaded {
        assert_eq!(fixture.reqheaders["authorization"], FIXTURE_AUTHORIZATION);
    }
}

#[test]
fn cleanup_deletes_only_temporary_repositories() {
    let api = FakeGitHub::new(1).with_repositories(&[
        "hello-world",
        "tmp-scenario-create-file-20250602091411042",
        "tmp-scenario-rename-repository-20250101000000000",
        "tmp-scenario-notes",
    ]);
    let mut session = session(&api, started_at(0));

    let deleted = remove_temporary_repositories(&mut session).unwrap();

    assert_eq!(
        deleted,
        [
            "tmp-scenario-create-file-20250602091411042",
            "tmp-scenario-rename-repository-20250101000000000",
        ]
    );
    let sent = api.sent.borrow();
    let deletes: Vec<_> = sent
        .iter()
        .filter(|r| r.method == "DELETE")
        .map(|r| r.url.as_str())
        .collect();
    assert_eq!(
        deletes,
        [
            "https://api.github.com/repos/octokit-fixture-org/tmp-scenario-create-file-20250602091411042",
            "https://api.github.com/repos/octokit-fixture-org/tmp-scenario-rename-repository-20250101000000000",
        ]
    );
}

#[test]
fn failed_file_creation_still_deletes_the_repository() {
    struct FailingPut(FakeGitHub);

    impl Transport for FailingPut {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RecordError> {
            if request.method == "PUT" {
                self.0.sent.borrow_mut().push(request.clone());
                return Ok(FakeGitHub::respond(
                    422,
                    &json!({ "message": "Invalid request" }),
                    1,
                ));
            }
            self.0.send(request)
        }
    }

    let api = FailingPut(FakeGitHub::new(1));
    let options = SessionOptions {
        base_url: "https://api.github.com".to_string(),
        organization: "octokit-fixture-org".to_string(),
        throttle: Throttle::disabled(),
        started_at: started_at(0),
    };
    let session = RecordSession::new(&api, options).unwrap();

    let err = record_scenario(&CreateFile, session).unwrap_err();

    assert!(matches!(err, RecordError::Status { status: 422, .. }));
    let methods: Vec<_> = api.0.sent.borrow().iter().map(|r| r.method.clone()).collect();
    assert_eq!(methods, ["POST", "PUT", "DELETE"]);
}
