//! Scenario recording.
//!
//! A [`Scenario`] is a scripted sequence of API calls. [`record_scenario`]
//! runs one against a [`Transport`] and captures every exchange as a raw
//! [`Fixture`], in the order the calls were made.
//!
//! Recording is all or nothing: if any call fails, the scenario fails and no
//! fixtures are returned.

mod error;
mod http;
mod throttle;

use std::time::Instant;

use chrono::{DateTime, Utc};
pub use error::RecordError;
pub use http::{HttpRequest, HttpResponse, HttpTransport, Transport};
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
pub use throttle::{Throttle, is_mutating};
use tracing::{debug, info};

use crate::fixture::{Fixture, Headers, IGNORE_HEADER};
use crate::log::SecretRedactor;
use crate::store::ScenarioId;

/// Default `accept` header sent with every request.
pub const DEFAULT_ACCEPT: &str = "application/vnd.github.v3+json";

/// One API call made by a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    path: String,
    body: Option<Value>,
    headers: Headers,
}

impl Request {
    /// Creates a request for `path`, relative to the session's base URL.
    #[must_use]
    pub fn new(method: &str, path: impl Into<String>) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: path.into(),
            body: None,
            headers: Headers::new(),
        }
    }

    /// `GET path`
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// `POST path`
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// `PUT path`
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new("PUT", path)
    }

    /// `PATCH path`
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new("PATCH", path)
    }

    /// `DELETE path`
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new("DELETE", path)
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a header, overriding the session default of the same name.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Marks the call as setup or teardown, so normalization drops it.
    #[must_use]
    pub fn ignored(self) -> Self {
        self.header(IGNORE_HEADER, "true")
    }
}

/// A response as seen by a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code.
    pub status: u16,
    /// Response headers, lowercase names.
    pub headers: Headers,
    /// Parsed JSON body, the text for non-JSON bodies, or a hex string for
    /// binary bodies.
    pub body: Value,
}

/// Settings for one recording session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// REST API base URL, e.g. `https://api.github.com`.
    pub base_url: String,
    /// Organization that owns the fixture repositories.
    pub organization: String,
    /// Spacing between mutating requests.
    pub throttle: Throttle,
    /// Start of the recording, used to name temporary repositories.
    pub started_at: DateTime<Utc>,
}

/// Sends a scenario's requests and captures them as fixtures.
pub struct RecordSession<'a> {
    transport: &'a dyn Transport,
    base_url: Url,
    scope: String,
    organization: String,
    started_at: DateTime<Utc>,
    throttle: Throttle,
    default_headers: Headers,
    redactor: SecretRedactor,
    fixtures: Vec<Fixture>,
}

impl<'a> RecordSession<'a> {
    /// Creates a session.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL.
    pub fn new(transport: &'a dyn Transport, options: SessionOptions) -> Result<Self, RecordError> {
        let invalid = |reason: &str| RecordError::InvalidRequest {
            method: String::new(),
            path: options.base_url.clone(),
            reason: reason.to_string(),
        };

        let mut base_url = Url::parse(&options.base_url).map_err(|e| invalid(&e.to_string()))?;
        let host = base_url.host_str().ok_or_else(|| invalid("base URL has no host"))?;
        let port = base_url
            .port_or_known_default()
            .ok_or_else(|| invalid("base URL has no port"))?;
        let scope = format!("{}://{host}:{port}", base_url.scheme());
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut default_headers = Headers::new();
        default_headers.insert("accept".to_string(), DEFAULT_ACCEPT.to_string());

        Ok(Self {
            transport,
            base_url,
            scope,
            organization: options.organization,
            started_at: options.started_at,
            throttle: options.throttle,
            default_headers,
            redactor: SecretRedactor::new(),
            fixtures: Vec::new(),
        })
    }

    /// Authenticates every request with `token`.
    #[must_use]
    pub fn with_token(mut self, token: &SecretString) -> Self {
        self.default_headers.insert(
            "authorization".to_string(),
            format!("token {}", token.expose_secret()),
        );
        self.redactor = self.redactor.with_secret(token);
        self
    }

    /// Organization that owns the fixture repositories.
    #[must_use]
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Start of the recording.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Fixtures captured so far.
    #[must_use]
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Sends `request` and captures the exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the API answers
    /// with a status of 400 or above. Error bodies are redacted.
    pub fn request(&mut self, request: Request) -> Result<Response, RecordError> {
        let url = self.url_for(&request)?;
        let mut reqheaders = self.default_headers.clone();
        reqheaders.extend(request.headers);

        let wire = HttpRequest {
            method: request.method.clone(),
            url: url.to_string(),
            headers: reqheaders.clone(),
            body: request.body.clone(),
        };

        self.throttle.acquire(&wire.method);
        debug!(method = %wire.method, path = %request.path, "sending request");
        let started = Instant::now();
        let response = self.transport.send(&wire)?;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (body, response_is_binary) = decode_body(&response);
        let path = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };

        if response.status >= 400 {
            let text = String::from_utf8_lossy(&response.body);
            return Err(RecordError::Status {
                method: wire.method,
                path,
                status: response.status,
                body: self.redactor.redact(&text).into_owned(),
            });
        }

        self.fixtures.push(Fixture {
            scope: self.scope.clone(),
            method: wire.method.to_ascii_lowercase(),
            path,
            body: request.body,
            status: response.status,
            response: body.clone(),
            reqheaders,
            headers: response.headers.clone(),
            response_is_binary,
            duration_ms: Some(duration_ms),
        });

        Ok(Response {
            status: response.status,
            headers: response.headers,
            body,
        })
    }

    fn url_for(&self, request: &Request) -> Result<Url, RecordError> {
        // Join relative to the base path so GitHub Enterprise prefixes such
        // as `/api/v3` are kept.
        self.base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|e| RecordError::InvalidRequest {
                method: request.method.clone(),
                path: request.path.clone(),
                reason: e.to_string(),
            })
    }

    fn into_fixtures(self) -> Vec<Fixture> {
        self.fixtures
    }
}

/// Decodes a response body into its fixture representation.
fn decode_body(response: &HttpResponse) -> (Value, bool) {
    let is_json = response
        .headers
        .get("content-type")
        .is_some_and(|t| t.contains("json"));

    if is_json {
        if let Ok(value) = serde_json::from_slice(&response.body) {
            return (value, false);
        }
    }
    match std::str::from_utf8(&response.body) {
        Ok(text) => (Value::String(text.to_string()), false),
        Err(_) => (Value::String(hex::encode(&response.body)), true),
    }
}

/// A scripted sequence of API calls.
pub trait Scenario {
    /// Where the scenario's fixtures are stored.
    fn id(&self) -> ScenarioId;

    /// Makes the scenario's calls through `session`.
    ///
    /// # Errors
    ///
    /// Returns the first error; the recording is then discarded.
    fn record(&self, session: &mut RecordSession<'_>) -> Result<(), RecordError>;
}

/// Records `scenario` and returns its raw fixtures in call order.
///
/// # Errors
///
/// Returns the scenario's error. No fixtures are returned on failure.
pub fn record_scenario(
    scenario: &dyn Scenario,
    mut session: RecordSession<'_>,
) -> Result<Vec<Fixture>, RecordError> {
    let id = scenario.id();
    info!(scenario = %id, "recording scenario");
    scenario.record(&mut session)?;

    let fixtures = session.into_fixtures();
    info!(scenario = %id, fixtures = fixtures.len(), "recorded scenario");
    Ok(fixtures)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    struct ScriptedTransport {
        responses: RefCell<VecDeque<HttpResponse>>,
        sent: RefCell<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<HttpResponse>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RecordError> {
            self.sent.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| RecordError::Transport {
                    method: request.method.clone(),
                    path: request.url.clone(),
                    message: "no scripted response".to_string(),
                })
        }
    }

    fn json_response(status: u16, body: &Value) -> HttpResponse {
        let mut headers = Headers::new();
        headers.insert(
            "content-type".to_string(),
            "application/json; charset=utf-8".to_string(),
        );
        HttpResponse {
            status,
            headers,
            body: serde_json::to_vec(body).unwrap(),
        }
    }

    fn options(base_url: &str) -> SessionOptions {
        SessionOptions {
            base_url: base_url.to_string(),
            organization: "octokit-fixture-org".to_string(),
            throttle: Throttle::disabled(),
            started_at: Utc.with_ymd_and_hms(2025, 6, 2, 9, 14, 11).unwrap(),
        }
    }

    #[test]
    fn exchanges_are_captured_as_fixtures() {
        let transport = ScriptedTransport::new(vec![json_response(200, &json!({ "id": 1 }))]);
        let token = SecretString::from("a".repeat(40));
        let mut session = RecordSession::new(&transport, options("https://api.github.com"))
            .unwrap()
            .with_token(&token);

        let response = session
            .request(Request::get("/orgs/octokit-fixture-org?per_page=1"))
            .unwrap();

        assert_eq!(response.body, json!({ "id": 1 }));
        let fixture = &session.fixtures()[0];
        assert_eq!(fixture.scope, "https://api.github.com:443");
        assert_eq!(fixture.method, "get");
        assert_eq!(fixture.path, "/orgs/octokit-fixture-org?per_page=1");
        assert_eq!(fixture.reqheaders["accept"], DEFAULT_ACCEPT);
        assert_eq!(
            fixture.reqheaders["authorization"],
            format!("token {}", "a".repeat(40))
        );
        assert!(fixture.duration_ms.is_some());

        let sent = transport.sent.borrow();
        assert_eq!(sent[0].method, "GET");
        assert_eq!(
            sent[0].url,
            "https://api.github.com/orgs/octokit-fixture-org?per_page=1"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let transport = ScriptedTransport::new(vec![json_response(200, &json!({}))]);
        let mut session =
            RecordSession::new(&transport, options("https://ghe.example.com/api/v3")).unwrap();

        session.request(Request::get("/user")).unwrap();

        assert_eq!(session.fixtures()[0].scope, "https://ghe.example.com:443");
        assert_eq!(session.fixtures()[0].path, "/api/v3/user");
    }

    #[test]
    fn ignored_requests_carry_the_ignore_header() {
        let transport = ScriptedTransport::new(vec![json_response(201, &json!({}))]);
        let mut session = RecordSession::new(&transport, options("https://api.github.com")).unwrap();

        session
            .request(
                Request::post("/orgs/octokit-fixture-org/repos")
                    .json(json!({ "name": "x" }))
                    .ignored(),
            )
            .unwrap();

        let fixture = &session.fixtures()[0];
        assert!(fixture.is_ignored());
        assert_eq!(fixture.method, "post");
        assert_eq!(fixture.body, Some(json!({ "name": "x" })));
    }

    #[test]
    fn text_and_binary_bodies() {
        let text = HttpResponse {
            status: 200,
            headers: Headers::new(),
            body: b"Hello World".to_vec(),
        };
        assert_eq!(decode_body(&text), (json!("Hello World"), false));

        let binary = HttpResponse {
            status: 200,
            headers: Headers::new(),
            body: vec![0x1f, 0x8b, 0xff, 0x00],
        };
        assert_eq!(decode_body(&binary), (json!("1f8bff00"), true));
    }

    #[test]
    fn error_status_fails_with_redacted_body() {
        let token = SecretString::from("s3cr3t".to_string());
        let transport = ScriptedTransport::new(vec![json_response(
            401,
            &json!({ "message": "Bad credentials for s3cr3t" }),
        )]);
        let mut session = RecordSession::new(&transport, options("https://api.github.com"))
            .unwrap()
            .with_token(&token);

        let err = session.request(Request::get("/user")).unwrap_err();

        let RecordError::Status { status, body, .. } = &err else {
            panic!("expected status error, got {err:?}");
        };
        assert_eq!(*status, 401);
        assert!(!body.contains("s3cr3t"));
        assert!(session.fixtures().is_empty());
    }

    struct TwoCalls;

    impl Scenario for TwoCalls {
        fn id(&self) -> ScenarioId {
            ScenarioId::new("api.github.com", "two-calls")
        }

        fn record(&self, session: &mut RecordSession<'_>) -> Result<(), RecordError> {
            session.request(Request::get("/"))?;
            session.request(Request::get("/user"))?;
            Ok(())
        }
    }

    #[test]
    fn record_scenario_returns_fixtures_in_call_order() {
        let transport = ScriptedTransport::new(vec![
            json_response(200, &json!({ "n": 1 })),
            json_response(200, &json!({ "n": 2 })),
        ]);
        let session = RecordSession::new(&transport, options("https://api.github.com")).unwrap();

        let fixtures = record_scenario(&TwoCalls, session).unwrap();

        let paths: Vec<_> = fixtures.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["/", "/user"]);
    }

    #[test]
    fn failed_scenario_returns_no_fixtures() {
        let transport = ScriptedTransport::new(vec![json_response(200, &json!({}))]);
        let session = RecordSession::new(&transport, options("https://api.github.com")).unwrap();

        let result = record_scenario(&TwoCalls, session);

        assert!(matches!(result, Err(RecordError::Transport { .. })));
    }
}
