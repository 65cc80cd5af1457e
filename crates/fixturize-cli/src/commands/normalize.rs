//! `fixturize normalize`: re-normalizes stored raw fixtures.
//!
//! Used after a normalization rule changes, so stored fixtures can be
//! brought up to date without recording against the live API.

use anyhow::{Context, Result};
use clap::Args;
use fixturize_core::config::Config;
use fixturize_core::drift::FixtureDrift;
use fixturize_core::store::{FixtureStore, ScenarioId};
use fixturize_core::{detect_drift, normalize_fixture_set};
use tracing::{info, warn};

use super::{exit_codes, parse_scenario_id};

/// Arguments for `fixturize normalize`.
#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Report differences instead of writing them.
    #[arg(long)]
    pub check: bool,

    /// Stored scenarios to normalize, by id or title. Normalizes every
    /// stored scenario when omitted.
    pub scenarios: Vec<String>,
}

/// Runs `fixturize normalize` and returns the exit code.
pub fn run_normalize(config: &Config, args: &NormalizeArgs) -> u8 {
    let store = FixtureStore::new(&config.scenarios_dir);
    match normalize(&store, args) {
        Ok(0) => exit_codes::SUCCESS,
        Ok(out_of_date) => {
            println!("{out_of_date} scenario(s) out of date");
            exit_codes::FIXTURES_OUT_OF_DATE
        },
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_codes::FAILED
        },
    }
}

fn normalize(store: &FixtureStore, args: &NormalizeArgs) -> Result<usize> {
    let ids = if args.scenarios.is_empty() {
        store.list().context("failed to list stored scenarios")?
    } else {
        args.scenarios
            .iter()
            .map(|name| parse_scenario_id(name))
            .collect::<Result<Vec<_>>>()?
    };

    let mut out_of_date = 0;
    for id in &ids {
        if normalize_one(store, id, args.check)? {
            out_of_date += 1;
        }
    }
    Ok(out_of_date)
}

/// Returns `true` if the stored normalized document differs and was not
/// rewritten.
fn normalize_one(store: &FixtureStore, id: &ScenarioId, check: bool) -> Result<bool> {
    let Some(raw) = store
        .read_raw(id)
        .with_context(|| format!("failed to read raw fixtures for {id}"))?
    else {
        warn!(scenario = %id, "no raw fixtures stored, skipping");
        return Ok(false);
    };

    let normalized = normalize_fixture_set(&raw);
    let stored = store
        .read_normalized(id)
        .with_context(|| format!("failed to read normalized fixtures for {id}"))?;

    match detect_drift(stored.as_deref(), &normalized) {
        FixtureDrift::UpToDate => {
            println!("{id}: up to date");
            Ok(false)
        },
        drift if check => {
            println!("{id}: normalized fixtures are not up to date");
            if let FixtureDrift::Changed { changes } = drift {
                for change in changes {
                    println!("  {change}");
                }
            }
            Ok(true)
        },
        _ => {
            store
                .write_normalized(id, &normalized)
                .with_context(|| format!("failed to write normalized fixtures for {id}"))?;
            info!(scenario = %id, fixtures = normalized.len(), "rewrote normalized fixtures");
            println!("{id}: normalized fixtures updated");
            Ok(false)
        },
    }
}
