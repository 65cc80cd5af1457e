//! Secret redaction for log output and error reports.
//!
//! Recording failures print the response that caused them, and request
//! headers carry the fixture user's access token. Everything that leaves the
//! process through a log line or an error message is passed through
//! [`redact`] first.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

/// Replaces every redacted value.
pub const REDACTED: &str = "[REDACTED]";

/// Credential shapes that are always redacted.
const SECRET_PATTERNS: &[&str] = &[
    // ghp_, gho_, ghu_, ghs_ and ghr_ tokens
    r"gh[pousr]_[A-Za-z0-9_]{36,}",
    // fine-grained personal access tokens
    r"github_pat_[A-Za-z0-9_]{22,}",
    // `authorization: token <value>` as sent by the recorder
    r"(?i)\btoken\s+[A-Za-z0-9_]{40,}",
    r"(?i)bearer\s+[a-zA-Z0-9_.=-]+",
    // access_token=..., client_secret: ... in query strings and JSON
    r#"(?i)(access[_-]?token|auth[_-]?token|client[_-]?secret)['"]?\s*[:=]\s*['"]?[a-zA-Z0-9_.=-]{20,}['"]?"#,
    // GitHub App private keys
    r"-----BEGIN\s+(RSA\s+)?PRIVATE\s+KEY-----",
];

static COMPILED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SECRET_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("invalid secret pattern"))
        .collect()
});

/// Strips credentials from text before it is logged or reported.
///
/// Known credential shapes are always removed. Values registered with
/// [`SecretRedactor::with_secret`] are removed verbatim, whatever their
/// shape.
///
/// # Example
///
/// ```
/// use fixturize_core::log::SecretRedactor;
/// use secrecy::SecretString;
///
/// let redactor = SecretRedactor::new().with_secret(&SecretString::from("hunter2-hunter2".to_string()));
/// let output = redactor.redact("login with hunter2-hunter2");
/// assert_eq!(output, "login with [REDACTED]");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SecretRedactor {
    secrets: Vec<String>,
}

impl SecretRedactor {
    /// A redactor that only knows the built-in credential shapes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an exact value to redact. Empty secrets are ignored.
    #[must_use]
    pub fn with_secret(mut self, secret: &SecretString) -> Self {
        let value = secret.expose_secret();
        if !value.is_empty() {
            self.secrets.push(value.to_string());
        }
        self
    }

    /// Returns `input` with every secret replaced by [`REDACTED`]. Borrows
    /// when nothing matched.
    #[must_use]
    pub fn redact<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let mut output = Cow::Borrowed(input);

        for secret in &self.secrets {
            if output.contains(secret.as_str()) {
                output = Cow::Owned(output.replace(secret.as_str(), REDACTED));
            }
        }

        for regex in COMPILED_PATTERNS.iter() {
            if regex.is_match(&output) {
                output = Cow::Owned(regex.replace_all(&output, REDACTED).into_owned());
            }
        }

        output
    }
}

/// Redacts the built-in credential shapes from `input`.
#[must_use]
pub fn redact(input: &str) -> Cow<'_, str> {
    SecretRedactor::new().redact(input)
}
