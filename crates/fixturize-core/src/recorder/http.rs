//! HTTP transport seam.
//!
//! The recorder talks to the API through [`Transport`] so scenario logic and
//! fixture capture can be tested against a scripted transport.
//! [`HttpTransport`] is the production implementation.

use std::time::Duration;

use serde_json::Value;

use super::error::RecordError;
use crate::fixture::Headers;
use crate::log::redact;

/// Timeout for establishing a connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// A request as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Uppercase HTTP method.
    pub method: String,
    /// Absolute URL.
    pub url: String,
    /// Request headers, lowercase names.
    pub headers: Headers,
    /// JSON body.
    pub body: Option<Value>,
}

/// A response as received on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers, lowercase names. Repeated headers are joined with
    /// `, `.
    pub headers: Headers,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

/// Sends one request and returns its response.
///
/// Implementations must not follow redirects: a redirect is recorded as a
/// fixture of its own.
pub trait Transport {
    /// Sends `request`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Transport`] if no response was received. Error
    /// statuses are responses, not errors.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RecordError>;
}

/// Blocking `reqwest` transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Creates a transport with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, RecordError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("fixturize/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| RecordError::Client(error.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RecordError> {
        let transport_error = |message: String| RecordError::Transport {
            method: request.method.clone(),
            path: request.url.clone(),
            message: redact(&message).into_owned(),
        };

        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            RecordError::InvalidRequest {
                method: request.method.clone(),
                path: request.url.clone(),
                reason: "invalid HTTP method".to_string(),
            }
        })?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .map_err(|error| transport_error(error.to_string()))?;

        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert_with(|| value.clone());
        }
        let body = response
            .bytes()
            .map_err(|error| transport_error(error.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
