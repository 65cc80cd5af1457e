//! Recorder configuration.
//!
//! Configuration lives in a TOML file (`fixturize.toml` by default). Every
//! field has a default, so an empty file (or no file at all) is valid.
//! Access tokens are never written to the file: it only names the
//! environment variable that holds each token.
//!
//! ```toml
//! scenarios_dir = "scenarios"
//!
//! [github]
//! base_url = "https://api.github.com"
//! organization = "octokit-fixture-org"
//! token_env = "FIXTURES_USER_A_TOKEN_FULL_ACCESS"
//!
//! [recording]
//! throttle_ms = 3000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "fixturize.toml";

/// Environment variable holding the full-access token of the fixture user.
pub const DEFAULT_TOKEN_ENV: &str = "FIXTURES_USER_A_TOKEN_FULL_ACCESS";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding `<domain>/<title>/` fixture documents.
    #[serde(default = "default_scenarios_dir")]
    pub scenarios_dir: PathBuf,

    /// GitHub connection settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Recording behavior.
    #[serde(default)]
    pub recording: RecordingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scenarios_dir: default_scenarios_dir(),
            github: GitHubConfig::default(),
            recording: RecordingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Load configuration from `path`, falling back to defaults if the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a value is out of range.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let base_url = &self.github.base_url;
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "github.base_url must be an http(s) URL, got '{base_url}'"
            )));
        }
        if self.github.token_env.is_empty() {
            return Err(ConfigError::Validation(
                "github.token_env must name an environment variable".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads the access token from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] if the variable is unset or
    /// empty.
    pub fn token(&self) -> Result<SecretString, ConfigError> {
        let name = &self.github.token_env;
        match std::env::var(name) {
            Ok(value) if !value.is_empty() => Ok(SecretString::from(value)),
            _ => Err(ConfigError::MissingToken { env: name.clone() }),
        }
    }
}

/// GitHub connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GitHubConfig {
    /// REST API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Organization that owns the fixture repositories.
    #[serde(default = "default_organization")]
    pub organization: String,

    /// Environment variable holding the access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            organization: default_organization(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GitHubConfig {
    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Recording behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RecordingConfig {
    /// Minimum spacing between mutating requests, in milliseconds.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
        }
    }
}

impl RecordingConfig {
    /// Minimum spacing between mutating requests.
    #[must_use]
    pub const fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

fn default_scenarios_dir() -> PathBuf {
    PathBuf::from("scenarios")
}

fn default_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_organization() -> String {
    "octokit-fixture-org".to_string()
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_throttle_ms() -> u64 {
    3000
}

/// Configuration errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// I/O error reading configuration file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// The token environment variable is unset or empty.
    #[error("environment variable {env} is not set; it must hold a GitHub access token")]
    MissingToken {
        /// Variable name.
        env: String,
    },
}
