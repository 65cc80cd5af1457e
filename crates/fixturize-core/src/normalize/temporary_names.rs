//! Temporary repository name normalizer.

use std::borrow::Cow;

use super::FieldNormalizer;
use super::strings::rewrite_strings;
use crate::fixture::Fixture;
use crate::registry::ScenarioState;
use crate::temporary_repository::strip_timestamps;

/// Replaces `tmp-scenario-<title>-<timestamp>` with `<title>` in the path,
/// the `location` header and every string of the request and response
/// bodies.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemporaryRepositoryNames;

impl FieldNormalizer for TemporaryRepositoryNames {
    fn name(&self) -> &'static str {
        "temporary-repository-names"
    }

    fn apply(&self, _state: &mut ScenarioState, fixture: &mut Fixture) {
        if let Some(path) = stripped(&fixture.path) {
            fixture.path = path;
        }
        if let Some(location) = fixture.headers.get_mut("location") {
            if let Some(replaced) = stripped(location) {
                *location = replaced;
            }
        }
        if let Some(body) = fixture.body.as_mut() {
            rewrite_strings(body, &mut stripped);
        }
        if fixture.has_structured_response() {
            rewrite_strings(&mut fixture.response, &mut stripped);
        }
    }
}

fn stripped(text: &str) -> Option<String> {
    match strip_timestamps(text) {
        Cow::Owned(replaced) => Some(replaced),
        Cow::Borrowed(_) => None,
    }
}
