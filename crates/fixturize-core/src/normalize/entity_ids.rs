//! Numeric entity id normalizer.
//!
//! The kind of every object is resolved from where it sits: the top-level
//! body takes the kind of the request route, a nested object the kind of its
//! parent key, and array elements the kind of the array's key. Only objects
//! with a resolved kind have their `id` rewritten; an `id` of unknown kind is
//! left alone rather than guessed.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};

use super::FieldNormalizer;
use super::rules::{ROUTE_ITEM_KEYS, foreign_key_kind, id_segment_kind, parent_kind, route_kind};
use super::strings::rewrite_path_segments;
use crate::fixture::Fixture;
use crate::registry::{IdKind, ScenarioState};

/// Account `type` values that name their own GraphQL type.
const ACCOUNT_TYPES: &[&str] = &["Bot", "Organization", "User"];

/// Rewrites entity ids, `node_id`s, foreign keys and ids in URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityIds;

impl FieldNormalizer for EntityIds {
    fn name(&self) -> &'static str {
        "entity-ids"
    }

    fn apply(&self, state: &mut ScenarioState, fixture: &mut Fixture) {
        if let Some(path) = rewrite_url_ids(state, &fixture.path) {
            fixture.path = path;
        }

        if fixture.has_structured_response() {
            let kind = route_kind(fixture.route());
            visit(state, &mut fixture.response, kind, kind);
        }

        if let Some(location) = fixture.headers.get_mut("location") {
            if let Some(replaced) = rewrite_url_ids(state, location) {
                *location = replaced;
            }
        }
    }
}

/// Legacy global node id: base64 of `0<len>:<TypeName><id>`.
#[must_use]
pub fn node_id(type_name: &str, id: u64) -> String {
    STANDARD.encode(format!("0{}:{type_name}{id}", type_name.len()))
}

fn visit(state: &mut ScenarioState, value: &mut Value, kind: Option<IdKind>, route: Option<IdKind>) {
    match value {
        Value::Object(map) => visit_object(state, map, kind, route),
        Value::Array(items) => {
            for item in items {
                visit(state, item, kind, route);
            }
        },
        Value::String(text) => {
            if let Some(replaced) = rewrite_url_ids(state, text) {
                *text = replaced;
            }
        },
        _ => {},
    }
}

fn visit_object(
    state: &mut ScenarioState,
    map: &mut Map<String, Value>,
    kind: Option<IdKind>,
    route: Option<IdKind>,
) {
    if let Some(kind) = kind {
        rewrite_own_id(state, map, kind);
    }

    for (key, child) in map.iter_mut() {
        if kind.is_some() && (key == "id" || key == "node_id") {
            continue;
        }
        if let Some(foreign) = foreign_key_kind(key) {
            if let Some(original) = child.as_u64() {
                *child = Value::from(state.assign_id(foreign, original));
            }
            continue;
        }

        let child_kind = if ROUTE_ITEM_KEYS.contains(&key.as_str()) {
            route
        } else {
            parent_kind(key)
        };
        visit(state, child, child_kind, route);
    }
}

fn rewrite_own_id(state: &mut ScenarioState, map: &mut Map<String, Value>, kind: IdKind) {
    let Some(original) = map.get("id").and_then(Value::as_u64) else {
        return;
    };
    let normalized = state.assign_id(kind, original);
    map.insert("id".to_string(), Value::from(normalized));

    if map.get("node_id").is_some_and(Value::is_string) {
        let type_name = node_type_name(kind, map);
        map.insert("node_id".to_string(), Value::String(node_id(type_name, normalized)));
    }
}

/// Accounts carry their concrete type in `type`; everything else uses the
/// kind's type name.
fn node_type_name(kind: IdKind, map: &Map<String, Value>) -> &'static str {
    if kind != IdKind::Account {
        return kind.type_name();
    }
    map.get("type")
        .and_then(Value::as_str)
        .and_then(|t| ACCOUNT_TYPES.iter().copied().find(|&name| name == t))
        .unwrap_or(kind.type_name())
}

fn rewrite_url_ids(state: &mut ScenarioState, url: &str) -> Option<String> {
    rewrite_path_segments(url, |previous, segment| {
        let kind = id_segment_kind(previous)?;
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let original = segment.parse::<u64>().ok()?;
        let normalized = state.assign_id(kind, original);
        (normalized != original).then(|| normalized.to_string())
    })
}
