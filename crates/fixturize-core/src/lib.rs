//! Recording and normalization of GitHub API fixtures.
//!
//! Scenarios are scripted sequences of API calls. Recording one captures
//! every request/response pair as a [`Fixture`]; the normalization pipeline
//! then rewrites everything that changes between recordings (timestamps,
//! ids, commit SHAs, rate-limit headers, tokens) to stable placeholders, so
//! the stored fixtures change only when the API's behavior does.
//!
//! # Modules
//!
//! - [`fixture`]: the fixture record
//! - [`registry`]: per-run placeholder tables
//! - [`normalize`]: the normalization pipeline and its rules
//! - [`recorder`]: scenario recording over a [`recorder::Transport`]
//! - [`scenarios`]: the built-in scenario catalog
//! - [`drift`]: comparing fresh fixtures with stored ones
//! - [`store`]: fixture documents on disk
//! - [`config`]: recorder configuration
//! - [`log`]: secret redaction

#![warn(missing_docs)]

pub mod config;
pub mod drift;
pub mod fixture;
pub mod log;
pub mod normalize;
pub mod recorder;
pub mod registry;
pub mod scenarios;
pub mod store;
pub mod temporary_repository;

pub use drift::{FixtureDrift, detect_drift};
pub use fixture::{Fixture, FixtureSet};
pub use normalize::{FieldNormalizer, Pipeline, normalize_fixture_set};
pub use registry::{IdKind, ScenarioState};
pub use store::{FixtureStore, ScenarioId};
