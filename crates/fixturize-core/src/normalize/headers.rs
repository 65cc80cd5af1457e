//! Header-level normalizers.
//!
//! These rules never look at response bodies (except [`ContentLength`],
//! which measures one) and never touch the identifier registry, so they run
//! first in the pipeline and apply to binary and text responses alike.

use serde_json::Value;

use super::FieldNormalizer;
use super::rules::{FIXTURE_ETAG, REMOVED_HEADERS, ZEROED_HEADERS};
use crate::fixture::Fixture;
use crate::registry::ScenarioState;

/// Clears the captured response timing.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseTiming;

impl FieldNormalizer for ResponseTiming {
    fn name(&self) -> &'static str {
        "response-timing"
    }

    fn apply(&self, _state: &mut ScenarioState, fixture: &mut Fixture) {
        fixture.duration_ms = None;
    }
}

/// Zeroes request credentials; see [`Fixture::remove_credentials`].
///
/// A personal access token sent as `token <pat>` ends up as
/// [`FIXTURE_AUTHORIZATION`](super::rules::FIXTURE_AUTHORIZATION).
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthorizationHeader;

impl FieldNormalizer for AuthorizationHeader {
    fn name(&self) -> &'static str {
        "authorization-header"
    }

    fn apply(&self, _state: &mut ScenarioState, fixture: &mut Fixture) {
        fixture.remove_credentials();
    }
}

/// Zeroes or drops response headers that change on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct VolatileHeaders;

impl FieldNormalizer for VolatileHeaders {
    fn name(&self) -> &'static str {
        "volatile-headers"
    }

    fn apply(&self, _state: &mut ScenarioState, fixture: &mut Fixture) {
        let headers = &mut fixture.headers;

        for &(name, fixed) in ZEROED_HEADERS {
            if let Some(value) = headers.get_mut(name) {
                fixed.clone_into(value);
            }
        }

        if let Some(etag) = headers.get_mut("etag") {
            *etag = if etag.starts_with("W/") {
                format!("W/{FIXTURE_ETAG}")
            } else {
                FIXTURE_ETAG.to_string()
            };
        }

        for name in REMOVED_HEADERS {
            headers.remove(*name);
        }
    }
}

/// Recomputes `content-length` from the normalized response body.
///
/// Runs last: every earlier rule may change the body length. Binary
/// responses are not rewritten, so their header is kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentLength;

impl FieldNormalizer for ContentLength {
    fn name(&self) -> &'static str {
        "content-length"
    }

    fn apply(&self, _state: &mut ScenarioState, fixture: &mut Fixture) {
        if fixture.response_is_binary {
            return;
        }
        let Some(length) = body_length(&fixture.response) else {
            return;
        };
        if let Some(value) = fixture.headers.get_mut("content-length") {
            *value = length.to_string();
        }
    }
}

/// Serialized length of a response body, as the mock server would send it.
fn body_length(response: &Value) -> Option<usize> {
    match response {
        Value::Null => Some(0),
        Value::String(text) => Some(text.len()),
        other => serde_json::to_string(other).ok().map(|s| s.len()),
    }
}
