//! Drift detection between stored and freshly normalized fixtures.
//!
//! A fresh recording is compared against the normalized document already on
//! disk. Because normalization is deterministic, any difference is a real
//! change in the API's behavior (or in the scenario script) rather than
//! noise.
//!
//! # Example
//!
//! ```
//! use fixturize_core::drift::{FixtureDrift, detect_drift};
//!
//! assert_eq!(detect_drift(None, &[]), FixtureDrift::New);
//! assert_eq!(detect_drift(Some(&[][..]), &[]), FixtureDrift::UpToDate);
//! ```

use std::fmt;

use serde_json::Value;

use crate::fixture::Fixture;

/// How a value at one path differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Present only in the fresh fixtures.
    Added,

    /// Present only in the stored fixtures.
    Removed,

    /// Present in both with different values (or types).
    Modified,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
        })
    }
}

/// One changed value, addressed by its path in the fixture document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureChange {
    /// Path such as `[1].response.owner.id`.
    pub path: String,

    /// Kind of change.
    pub kind: ChangeKind,
}

impl fmt::Display for FixtureChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.path)
    }
}

/// Result of comparing a fresh recording with the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureDrift {
    /// The stored fixtures match.
    UpToDate,

    /// No fixtures are stored for the scenario yet.
    New,

    /// The stored fixtures differ.
    Changed {
        /// Changed paths, in document order.
        changes: Vec<FixtureChange>,
    },
}

impl FixtureDrift {
    /// Returns `true` unless the stored fixtures are up to date.
    #[must_use]
    pub const fn is_out_of_date(&self) -> bool {
        !matches!(self, Self::UpToDate)
    }
}

/// Compares stored normalized fixtures with freshly normalized ones.
#[must_use]
pub fn detect_drift(stored: Option<&[Fixture]>, fresh: &[Fixture]) -> FixtureDrift {
    let Some(stored) = stored else {
        return FixtureDrift::New;
    };

    let mut changes = Vec::new();
    compare_values(&document(stored), &document(fresh), "", &mut changes);

    if changes.is_empty() {
        FixtureDrift::UpToDate
    } else {
        FixtureDrift::Changed { changes }
    }
}

fn document(fixtures: &[Fixture]) -> Value {
    // Fixture serialization cannot fail: every map key is a string.
    Value::Array(
        fixtures
            .iter()
            .map(|f| serde_json::to_value(f).unwrap_or_default())
            .collect(),
    )
}

/// Recursively compares two JSON values and records where they differ.
fn compare_values(old: &Value, new: &Value, path: &str, changes: &mut Vec<FixtureChange>) {
    match (old, new) {
        (Value::Array(a), Value::Array(b)) => {
            for i in 0..a.len().max(b.len()) {
                let elem_path = format!("{path}[{i}]");
                match (a.get(i), b.get(i)) {
                    (Some(old_elem), Some(new_elem)) => {
                        compare_values(old_elem, new_elem, &elem_path, changes);
                    },
                    (Some(_), None) => changes.push(change(elem_path, ChangeKind::Removed)),
                    (None, Some(_)) => changes.push(change(elem_path, ChangeKind::Added)),
                    (None, None) => {},
                }
            }
        },

        (Value::Object(a), Value::Object(b)) => {
            for (key, old_value) in a {
                let key_path = join(path, key);
                match b.get(key) {
                    Some(new_value) => compare_values(old_value, new_value, &key_path, changes),
                    None => changes.push(change(key_path, ChangeKind::Removed)),
                }
            }
            for key in b.keys().filter(|k| !a.contains_key(*k)) {
                changes.push(change(join(path, key), ChangeKind::Added));
            }
        },

        (a, b) if a == b => {},

        _ => changes.push(change(path.to_string(), ChangeKind::Modified)),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

const fn change(path: String, kind: ChangeKind) -> FixtureChange {
    FixtureChange { path, kind }
}
