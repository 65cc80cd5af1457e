//! Timestamp normalizer.

use chrono::DateTime;
use serde_json::Value;

use super::FieldNormalizer;
use super::rules::{FIXTURE_TIMESTAMP, SIGNATURE_KEYS, TIMESTAMP_KEYS};
use crate::fixture::Fixture;
use crate::registry::ScenarioState;

/// Replaces RFC 3339 timestamps under known keys with a fixed instant.
///
/// Only string values that actually parse are rewritten; `null` (an issue
/// that was never closed) and free-form strings are kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct Timestamps;

impl FieldNormalizer for Timestamps {
    fn name(&self) -> &'static str {
        "timestamps"
    }

    fn apply(&self, _state: &mut ScenarioState, fixture: &mut Fixture) {
        if fixture.has_structured_response() {
            visit(&mut fixture.response, None);
        }
        if let Some(body) = fixture.body.as_mut() {
            visit(body, None);
        }
    }
}

fn visit(value: &mut Value, parent: Option<&str>) {
    match value {
        Value::Object(map) => {
            let in_signature = parent.is_some_and(|p| SIGNATURE_KEYS.contains(&p));
            for (key, child) in map.iter_mut() {
                let is_timestamp_key =
                    TIMESTAMP_KEYS.contains(&key.as_str()) || (in_signature && key == "date");
                if is_timestamp_key {
                    rewrite(child);
                } else {
                    visit(child, Some(key.as_str()));
                }
            }
        },
        Value::Array(items) => {
            for item in items {
                visit(item, parent);
            }
        },
        _ => {},
    }
}

fn rewrite(value: &mut Value) {
    if let Value::String(text) = value {
        if DateTime::parse_from_rfc3339(text).is_ok() {
            FIXTURE_TIMESTAMP.clone_into(text);
        }
    }
}
