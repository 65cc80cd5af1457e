//! `fixturize remove-temporary-repositories`: deletes temporary
//! repositories left behind by interrupted recordings.

use anyhow::{Context, Result};
use fixturize_core::config::Config;
use fixturize_core::temporary_repository::remove_temporary_repositories;

use super::Connection;

/// Runs `fixturize remove-temporary-repositories`.
pub fn run_cleanup(config: &Config) -> Result<()> {
    let connection = Connection::open(config)?;
    let mut session = connection.session(config)?;

    let deleted = remove_temporary_repositories(&mut session).with_context(|| {
        format!(
            "failed to remove temporary repositories in {}",
            config.github.organization
        )
    })?;

    if deleted.is_empty() {
        println!("No temporary repositories found");
    }
    for name in &deleted {
        println!("{name} deleted");
    }
    Ok(())
}
