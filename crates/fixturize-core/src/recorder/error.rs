//! Recording error types.

use thiserror::Error;

/// Errors that abort a scenario recording.
///
/// Any error is fatal for the scenario: the fixtures captured so far are
/// discarded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordError {
    /// The request never produced a response.
    #[error("{method} {path} failed: {message}")]
    Transport {
        /// HTTP method.
        method: String,
        /// Request path.
        path: String,
        /// Redacted transport error.
        message: String,
    },

    /// The API answered with an error status.
    #[error("{method} {path} returned {status}: {body}")]
    Status {
        /// HTTP method.
        method: String,
        /// Request path.
        path: String,
        /// Response status code.
        status: u16,
        /// Redacted response body.
        body: String,
    },

    /// A request could not be built.
    #[error("invalid request {method} {path}: {reason}")]
    InvalidRequest {
        /// HTTP method.
        method: String,
        /// Request path.
        path: String,
        /// Why the request is invalid.
        reason: String,
    },

    /// The HTTP client could not be initialized.
    #[error("failed to initialize HTTP client: {0}")]
    Client(String),

    /// A response did not have the shape the scenario expects.
    #[error("unexpected response to {path}: {reason}")]
    UnexpectedResponse {
        /// Request path.
        path: String,
        /// What was missing or wrong.
        reason: String,
    },
}
