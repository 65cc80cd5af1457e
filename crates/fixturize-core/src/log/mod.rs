//! Logging helpers.
//!
//! Logging itself goes through `tracing`; this module only keeps secrets
//! out of what gets logged or reported.

mod redact;

pub use redact::{REDACTED, SecretRedactor, redact};
