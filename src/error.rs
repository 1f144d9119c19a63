//! Error types for Polychat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Polychat operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, provider interactions, streaming, session
/// persistence, and controller state transitions.
#[derive(Error, Debug)]
pub enum PolychatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (request construction, non-success status, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Transport failure while consuming a streamed response.
    ///
    /// Fragments delivered before the failure are the partial result; the
    /// controller preserves them rather than discarding the turn.
    #[error("Stream error: {0}")]
    Stream(String),

    /// Session persistence errors (corrupt or unreadable session file)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Action attempted in the wrong controller state (e.g. sending a
    /// prompt with no active session). Surfaced as a warning, never fatal.
    #[error("Session error: {0}")]
    Session(String),

    /// Attachment rejected (not a decodable image)
    #[error("Attachment error: {0}")]
    Attachment(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// Authentication errors (login gate rejection)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for Polychat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = PolychatError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_provider_error_display() {
        let error = PolychatError::Provider("API timeout".to_string());
        assert_eq!(error.to_string(), "Provider error: API timeout");
    }

    #[test]
    fn test_stream_error_display() {
        let error = PolychatError::Stream("connection reset".to_string());
        assert_eq!(error.to_string(), "Stream error: connection reset");
    }

    #[test]
    fn test_storage_error_display() {
        let error = PolychatError::Storage("corrupt session file".to_string());
        assert_eq!(error.to_string(), "Storage error: corrupt session file");
    }

    #[test]
    fn test_session_error_display() {
        let error = PolychatError::Session("no active session".to_string());
        assert_eq!(error.to_string(), "Session error: no active session");
    }

    #[test]
    fn test_attachment_error_display() {
        let error = PolychatError::Attachment("not an image".to_string());
        assert_eq!(error.to_string(), "Attachment error: not an image");
    }

    #[test]
    fn test_missing_credentials_error_display() {
        let error = PolychatError::MissingCredentials("openai".to_string());
        assert_eq!(
            error.to_string(),
            "Missing credentials for provider: openai"
        );
    }

    #[test]
    fn test_authentication_error_display() {
        let error = PolychatError::Authentication("unknown account".to_string());
        assert_eq!(error.to_string(), "Authentication error: unknown account");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: PolychatError = io_error.into();
        assert!(matches!(error, PolychatError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_str = "{invalid json}";
        let json_error = serde_json::from_str::<serde_json::Value>(json_str).unwrap_err();
        let error: PolychatError = json_error.into();
        assert!(matches!(error, PolychatError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_str = "invalid: : yaml";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: PolychatError = yaml_error.into();
        assert!(matches!(error, PolychatError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PolychatError>();
    }
}
