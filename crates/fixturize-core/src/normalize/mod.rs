//! Fixture normalization pipeline.
//!
//! Rewrites every volatile value in a recorded fixture set to a
//! deterministic placeholder, so two recordings of the same scenario taken
//! at different times produce byte-identical documents.
//!
//! # Pipeline Order
//!
//! 1. [`ResponseTiming`]: clears `durationMs`
//! 2. [`AuthorizationHeader`]: zeroes `authorization: token <40 chars>`
//! 3. [`VolatileHeaders`]: zeroes or drops per-request response headers
//! 4. [`TemporaryRepositoryNames`]: strips timestamps from temporary
//!    repository names
//! 5. [`Timestamps`]: fixes RFC 3339 timestamps under known keys
//! 6. [`CommitShas`]: commit SHAs to registry placeholders
//! 7. [`EntityIds`]: numeric ids, `node_id`s and URL ids to registry
//!    placeholders
//! 8. [`ContentLength`]: recomputes `content-length`
//!
//! Static rewrites run first so the registry only ever sees values that are
//! already free of temporary names. `content-length` is derived from the
//! final body and therefore runs last.
//!
//! # Properties
//!
//! - **Determinism**: output depends only on the input records. No clock,
//!   randomness or environment is read.
//! - **Idempotency**: normalizing a normalized set is a no-op.
//! - **Order**: records keep their capture order; ignored records are
//!   dropped before any rule sees them, so they never shift placeholders.
//!
//! # Example
//!
//! ```
//! use fixturize_core::fixture::{Fixture, Headers};
//! use fixturize_core::normalize::normalize_fixture_set;
//! use serde_json::json;
//!
//! let raw = Fixture {
//!     scope: "https://api.github.com:443".to_string(),
//!     method: "get".to_string(),
//!     path: "/repos/o/r/commits".to_string(),
//!     body: None,
//!     status: 200,
//!     response: json!([{ "sha": "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3" }]),
//!     reqheaders: Headers::new(),
//!     headers: Headers::new(),
//!     response_is_binary: false,
//!     duration_ms: Some(87),
//! };
//!
//! let normalized = normalize_fixture_set(&[raw]);
//! assert_eq!(
//!     normalized[0].response[0]["sha"],
//!     "0000000000000000000000000000000000000001"
//! );
//! assert_eq!(normalized[0].duration_ms, None);
//! ```

mod commit_sha;
mod entity_ids;
mod headers;
pub mod rules;
mod strings;
mod temporary_names;
mod timestamps;

use std::fmt;

use tracing::debug;

pub use commit_sha::CommitShas;
pub use entity_ids::{EntityIds, node_id};
pub use headers::{AuthorizationHeader, ContentLength, ResponseTiming, VolatileHeaders};
pub use temporary_names::TemporaryRepositoryNames;
pub use timestamps::Timestamps;

use crate::fixture::Fixture;
use crate::registry::ScenarioState;

/// One class of volatile data and the rule that rewrites it.
///
/// Implementations skip fields that are missing or have an unexpected
/// shape; a normalizer never fails. Applying a normalizer to its own output
/// must not change it.
pub trait FieldNormalizer: Send + Sync {
    /// Short stable name, used in logs.
    fn name(&self) -> &'static str;

    /// Rewrites `fixture` in place, registering identifiers in `state`.
    fn apply(&self, state: &mut ScenarioState, fixture: &mut Fixture);
}

/// An ordered list of normalizers.
pub struct Pipeline {
    normalizers: Vec<Box<dyn FieldNormalizer>>,
}

impl Pipeline {
    /// Creates a pipeline with a custom normalizer list, applied in order.
    #[must_use]
    pub fn new(normalizers: Vec<Box<dyn FieldNormalizer>>) -> Self {
        Self { normalizers }
    }

    /// Names of the normalizers, in application order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.normalizers.iter().map(|n| n.name())
    }

    /// Applies every normalizer to one record.
    ///
    /// Does not apply the ignore filter; see [`Pipeline::normalize_set`].
    pub fn normalize_fixture(&self, state: &mut ScenarioState, fixture: &mut Fixture) {
        for normalizer in &self.normalizers {
            normalizer.apply(state, fixture);
        }
    }

    /// Normalizes a fixture set with a fresh [`ScenarioState`].
    ///
    /// Records carrying [`IGNORE_HEADER`](crate::fixture::IGNORE_HEADER) are
    /// dropped first. The remaining records are normalized in order and
    /// share one registry.
    #[must_use]
    pub fn normalize_set(&self, raw: &[Fixture]) -> Vec<Fixture> {
        let mut state = ScenarioState::new();
        let mut normalized = Vec::with_capacity(raw.len());

        for fixture in raw {
            if fixture.is_ignored() {
                debug!(method = %fixture.method, path = %fixture.path, "skipping ignored fixture");
                continue;
            }
            let mut fixture = fixture.clone();
            self.normalize_fixture(&mut state, &mut fixture);
            normalized.push(fixture);
        }

        debug!(
            raw = raw.len(),
            normalized = normalized.len(),
            commit_shas = state.commit_sha_count(),
            "normalized fixture set"
        );
        normalized
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ResponseTiming),
            Box::new(AuthorizationHeader),
            Box::new(VolatileHeaders),
            Box::new(TemporaryRepositoryNames),
            Box::new(Timestamps),
            Box::new(CommitShas),
            Box::new(EntityIds),
            Box::new(ContentLength),
        ])
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Normalizes a raw fixture set with the default pipeline.
///
/// Pure: the same input always yields the same output.
#[must_use]
pub fn normalize_fixture_set(raw: &[Fixture]) -> Vec<Fixture> {
    Pipeline::default().normalize_set(raw)
}
