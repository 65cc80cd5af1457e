//! `fixturize list`: lists built-in scenarios and whether fixtures are
//! stored for them.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use fixturize_core::config::Config;
use fixturize_core::scenarios;
use fixturize_core::store::{FixtureStore, ScenarioId};

/// Runs `fixturize list`.
pub fn run_list(config: &Config) -> Result<()> {
    let store = FixtureStore::new(&config.scenarios_dir);
    for line in list_lines(&store)? {
        println!("{line}");
    }
    Ok(())
}

fn list_lines(store: &FixtureStore) -> Result<Vec<String>> {
    let stored: BTreeSet<ScenarioId> = store
        .list()
        .with_context(|| format!("failed to list {}", store.root().display()))?
        .into_iter()
        .collect();
    let builtin: BTreeSet<ScenarioId> = scenarios::all().iter().map(|s| s.id()).collect();

    Ok(builtin
        .union(&stored)
        .map(|id| {
            let status = match (builtin.contains(id), stored.contains(id)) {
                (true, true) => "recorded",
                (true, false) => "not recorded",
                (false, _) => "stored only",
            };
            format!("{id}\t{status}")
        })
        .collect())
}
