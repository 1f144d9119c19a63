//! Login gate for Polychat
//!
//! When the configuration carries a non-empty account map, chat mode asks
//! for an account name and password before starting. An empty map disables
//! the gate entirely.

use crate::config::Config;
use crate::error::{PolychatError, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Check a username/password pair against the account map.
///
/// Passwords are compared as SHA-256 digests so the comparison shape does
/// not depend on where the strings first differ.
pub fn verify_credentials(
    accounts: &HashMap<String, String>,
    username: &str,
    password: &str,
) -> bool {
    let Some(expected) = accounts.get(username) else {
        return false;
    };
    Sha256::digest(expected.as_bytes()) == Sha256::digest(password.as_bytes())
}

/// Prompt for credentials on the terminal until they verify
///
/// Returns immediately when the account map is empty. The user gets three
/// attempts before the gate rejects them.
///
/// # Errors
///
/// Returns an `Authentication` error after three failed attempts, or an
/// IO error if the terminal cannot be read
pub fn prompt_login(config: &Config) -> Result<()> {
    if config.accounts.is_empty() {
        return Ok(());
    }

    let mut editor = rustyline::DefaultEditor::new()
        .map_err(|e| PolychatError::Authentication(format!("Terminal unavailable: {}", e)))?;

    for attempt in 1..=3 {
        let username = editor
            .readline("Account: ")
            .map_err(|e| PolychatError::Authentication(format!("Login aborted: {}", e)))?;
        let password = editor
            .readline("Password: ")
            .map_err(|e| PolychatError::Authentication(format!("Login aborted: {}", e)))?;

        if verify_credentials(&config.accounts, username.trim(), &password) {
            tracing::info!("Login accepted for {}", username.trim());
            return Ok(());
        }

        tracing::warn!("Login attempt {} failed", attempt);
        println!("Invalid account or password.");
    }

    Err(PolychatError::Authentication("Too many failed login attempts".to_string()).into())
}
