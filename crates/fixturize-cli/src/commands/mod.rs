//! CLI command implementations.

pub mod cleanup;
pub mod list;
pub mod normalize;
pub mod record;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use fixturize_core::config::Config;
use fixturize_core::recorder::{
    HttpTransport, RecordSession, Scenario, SessionOptions, Throttle,
};
use fixturize_core::scenarios::{self, GITHUB_DOMAIN};
use fixturize_core::store::ScenarioId;
use secrecy::SecretString;

/// Exit codes shared by `record` and `normalize`.
pub mod exit_codes {
    /// Fixtures are up to date (or were updated).
    pub const SUCCESS: u8 = 0;
    /// At least one scenario's fixtures are out of date.
    pub const FIXTURES_OUT_OF_DATE: u8 = 1;
    /// Recording or I/O failed.
    pub const FAILED: u8 = 2;
}

/// Resolves scenario arguments to built-in scenarios.
///
/// An argument is either a full id (`api.github.com/get-root`) or a bare
/// title, which is looked up under `api.github.com`. No arguments selects
/// every scenario.
pub fn select_scenarios(names: &[String]) -> Result<Vec<Box<dyn Scenario>>> {
    if names.is_empty() {
        return Ok(scenarios::all());
    }

    names
        .iter()
        .map(|name| {
            let id = parse_scenario_id(name)?;
            match scenarios::find(&id) {
                Some(scenario) => Ok(scenario),
                None => bail!("unknown scenario '{id}'"),
            }
        })
        .collect()
}

/// Parses a scenario argument, defaulting the domain to `api.github.com`.
pub fn parse_scenario_id(name: &str) -> Result<ScenarioId> {
    let name = name.trim_end_matches('/');
    if name.contains('/') {
        return name
            .parse()
            .with_context(|| format!("invalid scenario '{name}'"));
    }
    format!("{GITHUB_DOMAIN}/{name}")
        .parse()
        .with_context(|| format!("invalid scenario '{name}'"))
}

/// Live GitHub connection shared by every session of one command.
pub struct Connection {
    transport: HttpTransport,
    token: SecretString,
    started_at: DateTime<Utc>,
}

impl Connection {
    /// Reads the token and builds the HTTP client.
    pub fn open(config: &Config) -> Result<Self> {
        let token = config.token()?;
        let transport = HttpTransport::new(config.github.timeout())
            .context("failed to create HTTP client")?;
        Ok(Self {
            transport,
            token,
            started_at: Utc::now(),
        })
    }

    /// Starts an authenticated recording session.
    pub fn session(&self, config: &Config) -> Result<RecordSession<'_>> {
        let options = SessionOptions {
            base_url: config.github.base_url.clone(),
            organization: config.github.organization.clone(),
            throttle: Throttle::new(config.recording.throttle()),
            started_at: self.started_at,
        };
        let session = RecordSession::new(&self.transport, options)
            .context("invalid GitHub base URL")?
            .with_token(&self.token);
        Ok(session)
    }
}
