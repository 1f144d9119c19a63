//! Session management commands

use crate::config::Config;
use crate::error::Result;
use crate::storage::SessionStore;
use colored::Colorize;

/// Open the session store configured for this run
pub fn open_store(config: &Config) -> Result<SessionStore> {
    match &config.session.dir {
        Some(dir) => SessionStore::new_with_dir(dir.clone()),
        None => SessionStore::new(),
    }
}

/// List saved sessions
pub fn run_list(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let names = store.list()?;

    if names.is_empty() {
        println!("No saved sessions.");
        return Ok(());
    }

    println!("{}", "Saved sessions:".bold());
    for name in names {
        println!("  {}", name);
    }

    Ok(())
}

/// Delete a saved session by name
pub fn run_delete(config: &Config, name: &str) -> Result<()> {
    let store = open_store(config)?;

    if !store.exists(name) {
        println!("{} {}", "No such session:".yellow(), name);
        return Ok(());
    }

    store.delete(name)?;
    println!("{} {}", "Deleted session:".green(), name);

    Ok(())
}
