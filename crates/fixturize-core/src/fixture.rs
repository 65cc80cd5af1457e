//! Fixture records.
//!
//! A [`Fixture`] is one captured HTTP exchange. Raw and normalized fixtures
//! share the same shape; normalization only rewrites values. The serialized
//! layout follows the nock recorder format consumed by the mock server, so a
//! normalized document can be loaded directly by the test suites that replay
//! it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request header that excludes a record from the normalized set.
///
/// Matched by exact key. Scenarios set it on setup and teardown calls whose
/// only purpose is a side effect (creating or deleting a temporary
/// repository, for example).
pub const IGNORE_HEADER: &str = "x-octokit-fixture-ignore";

/// Request headers that carry credentials.
pub const CREDENTIAL_HEADERS: &[&str] = &["authorization", "proxy-authorization"];

/// Credential written in place of a removed one.
pub const ZEROED_CREDENTIAL: &str = "0000000000000000000000000000000000000000";

/// Header map keyed by lowercase header name.
///
/// A `BTreeMap` keeps serialization order stable between recordings.
pub type Headers = BTreeMap<String, String>;

/// One captured request/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// Origin the request was sent to, e.g. `https://api.github.com:443`.
    pub scope: String,

    /// Lowercase HTTP method.
    pub method: String,

    /// Request path including the query string.
    pub path: String,

    /// Request body, when one was sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Response status code.
    pub status: u16,

    /// Response body. JSON responses are stored as parsed values, text
    /// responses as strings and binary responses as a hex string.
    #[serde(default)]
    pub response: Value,

    /// Request headers.
    #[serde(default)]
    pub reqheaders: Headers,

    /// Response headers.
    #[serde(default)]
    pub headers: Headers,

    /// Whether `response` holds hex-encoded binary content.
    #[serde(default, rename = "responseIsBinary")]
    pub response_is_binary: bool,

    /// Wall-clock duration of the exchange in milliseconds.
    #[serde(
        default,
        rename = "durationMs",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_ms: Option<u64>,
}

impl Fixture {
    /// Returns `true` if the request carries [`IGNORE_HEADER`].
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.reqheaders.contains_key(IGNORE_HEADER)
    }

    /// Returns `true` if the response body is structured JSON that body
    /// normalizers may traverse.
    #[must_use]
    pub fn has_structured_response(&self) -> bool {
        !self.response_is_binary && matches!(self.response, Value::Object(_) | Value::Array(_))
    }

    /// Replaces the credential of every [`CREDENTIAL_HEADERS`] entry with
    /// [`ZEROED_CREDENTIAL`], keeping the scheme.
    ///
    /// `token <pat>` becomes `token 000...0`, `Bearer <jwt>` becomes
    /// `Bearer 000...0` and a value without a scheme is zeroed whole.
    pub fn remove_credentials(&mut self) {
        for name in CREDENTIAL_HEADERS {
            if let Some(value) = self.reqheaders.get_mut(*name) {
                *value = match value.split_once(' ') {
                    Some((scheme, _)) if !scheme.is_empty() => {
                        format!("{scheme} {ZEROED_CREDENTIAL}")
                    },
                    _ => ZEROED_CREDENTIAL.to_string(),
                };
            }
        }
    }

    /// Returns the request path without its query string.
    #[must_use]
    pub fn route(&self) -> &str {
        self.path.split_once('?').map_or(self.path.as_str(), |(route, _)| route)
    }
}

/// Ordered sequence of fixtures for one scenario, in capture order.
pub type FixtureSet = Vec<Fixture>;
