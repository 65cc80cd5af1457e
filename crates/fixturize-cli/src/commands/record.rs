//! `fixturize record`: records scenarios against the live API and compares
//! the normalized result with the stored fixtures.
//!
//! # Exit Codes
//!
//! - 0: every scenario is up to date, or `--update` wrote the changes
//! - 1: at least one scenario is new or out of date
//! - 2: recording failed

use anyhow::{Context, Result};
use clap::Args;
use fixturize_core::config::Config;
use fixturize_core::drift::FixtureDrift;
use fixturize_core::recorder::{Scenario, record_scenario};
use fixturize_core::store::{FixtureStore, ScenarioId};
use fixturize_core::{detect_drift, normalize_fixture_set};
use tracing::info;

use super::{Connection, exit_codes, select_scenarios};

/// Arguments for `fixturize record`.
#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Write new and changed fixtures instead of reporting them.
    #[arg(long)]
    pub update: bool,

    /// Scenarios to record, by id or title. Records all when omitted.
    pub scenarios: Vec<String>,
}

/// Runs `fixturize record` and returns the exit code.
pub fn run_record(config: &Config, args: &RecordArgs) -> u8 {
    match record(config, args) {
        Ok(0) => exit_codes::SUCCESS,
        Ok(out_of_date) => {
            println!("{out_of_date} scenario(s) out of date");
            println!("Update fixtures with `fixturize record --update`");
            exit_codes::FIXTURES_OUT_OF_DATE
        },
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_codes::FAILED
        },
    }
}

/// Records every selected scenario and returns how many are out of date
/// and were not updated.
fn record(config: &Config, args: &RecordArgs) -> Result<usize> {
    let scenarios = select_scenarios(&args.scenarios)?;
    let connection = Connection::open(config)?;
    let store = FixtureStore::new(&config.scenarios_dir);

    let mut out_of_date = 0;
    for scenario in &scenarios {
        let id = scenario.id();
        let session = connection.session(config)?;
        let raw = record_scenario(scenario.as_ref(), session)
            .with_context(|| format!("error while recording {id}"))?;
        let normalized = normalize_fixture_set(&raw);

        let stored = store
            .read_normalized(&id)
            .with_context(|| format!("failed to read stored fixtures for {id}"))?;
        let drift = detect_drift(stored.as_deref(), &normalized);
        report(&id, &drift, args.update);

        if !drift.is_out_of_date() {
            continue;
        }
        if args.update {
            store
                .write_raw(&id, &raw)
                .and_then(|()| store.write_normalized(&id, &normalized))
                .with_context(|| format!("failed to write fixtures for {id}"))?;
            info!(scenario = %id, fixtures = normalized.len(), "updated fixtures");
        } else {
            out_of_date += 1;
        }
    }

    Ok(out_of_date)
}

fn report(id: &ScenarioId, drift: &FixtureDrift, update: bool) {
    match (drift, update) {
        (FixtureDrift::UpToDate, _) => println!("{id}: up to date"),
        (FixtureDrift::New, true) => println!("{id}: new fixtures recorded"),
        (FixtureDrift::New, false) => println!("{id}: looks like a new fixture"),
        (FixtureDrift::Changed { changes }, update) => {
            if update {
                println!("{id}: fixture updates recorded");
            } else {
                println!("{id}: fixtures are not up to date");
            }
            for change in changes {
                println!("  {change}");
            }
        },
    }
}
