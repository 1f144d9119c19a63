//! Session persistence for Polychat
//!
//! Each session is one JSON file in the session directory, named
//! `<session>.json` and containing the full message array. The directory
//! defaults to the platform data dir and can be overridden with the
//! `POLYCHAT_SESSION_DIR` environment variable or configuration.

use crate::error::{PolychatError, Result};
use crate::providers::Message;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension for persisted sessions
pub const SESSION_FILE_EXT: &str = "json";

/// File-backed session store
///
/// # Examples
///
/// ```no_run
/// use polychat::storage::SessionStore;
/// use polychat::providers::Message;
///
/// # fn example() -> polychat::error::Result<()> {
/// let store = SessionStore::new()?;
/// store.save("my_session", &[Message::user("hello")])?;
/// let messages = store.load("my_session")?;
/// # Ok(())
/// # }
/// ```
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Create a session store at the default location
    ///
    /// Respects the `POLYCHAT_SESSION_DIR` environment variable; otherwise
    /// uses the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be determined or created
    pub fn new() -> Result<Self> {
        if let Ok(dir) = std::env::var("POLYCHAT_SESSION_DIR") {
            return Self::new_with_dir(PathBuf::from(dir));
        }

        let proj_dirs = ProjectDirs::from("com", "polychat", "polychat").ok_or_else(|| {
            PolychatError::Storage("Could not determine data directory".to_string())
        })?;

        Self::new_with_dir(proj_dirs.data_dir().join("sessions"))
    }

    /// Create a session store rooted at a specific directory
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory to hold session files (created if missing)
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn new_with_dir(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(|e| {
            PolychatError::Storage(format!(
                "Failed to create session directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        tracing::debug!("Session store at {}", dir.display());

        Ok(Self { dir })
    }

    /// The directory holding session files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing a session name
    pub fn session_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, SESSION_FILE_EXT))
    }

    /// Save a session, replacing any previous contents
    ///
    /// # Arguments
    ///
    /// * `name` - Session name (must not contain path separators)
    /// * `messages` - Full message list to persist
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid or the file cannot be written
    pub fn save(&self, name: &str, messages: &[Message]) -> Result<()> {
        validate_name(name)?;

        let json = serde_json::to_string_pretty(messages)
            .map_err(|e| PolychatError::Storage(format!("Failed to encode session: {}", e)))?;

        let path = self.session_path(name);
        fs::write(&path, json).map_err(|e| {
            PolychatError::Storage(format!("Failed to write {}: {}", path.display(), e))
        })?;

        tracing::debug!("Saved session {} ({} messages)", name, messages.len());
        Ok(())
    }

    /// Load a session's messages
    ///
    /// A missing session loads as an empty message list; a file that exists
    /// but cannot be parsed is an error.
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid, the file is unreadable, or its
    /// contents are not a valid message array
    pub fn load(&self, name: &str) -> Result<Vec<Message>> {
        validate_name(name)?;

        let path = self.session_path(name);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            PolychatError::Storage(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            PolychatError::Storage(format!(
                "Corrupt session file {}: {}",
                path.display(),
                e
            ))
            .into()
        })
    }

    /// List saved session names, sorted
    ///
    /// Only files carrying the session extension are considered.
    ///
    /// # Errors
    ///
    /// Returns error if the session directory cannot be read
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            PolychatError::Storage(format!(
                "Failed to read session directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext == SESSION_FILE_EXT)
                    .unwrap_or(false)
            })
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(String::from)
            })
            .collect();

        names.sort();
        Ok(names)
    }

    /// Delete a session
    ///
    /// Deleting a session that does not exist is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid or the file cannot be removed
    pub fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        let path = self.session_path(name);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                PolychatError::Storage(format!("Failed to delete {}: {}", path.display(), e))
            })?;
            tracing::debug!("Deleted session {}", name);
        }

        Ok(())
    }

    /// Whether a session with this name exists on disk
    pub fn exists(&self, name: &str) -> bool {
        self.session_path(name).exists()
    }
}

/// Reject names that would escape the session directory
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.contains('\0')
    {
        return Err(PolychatError::Storage(format!("Invalid session name: {:?}", name)).into());
    }
    Ok(())
}
