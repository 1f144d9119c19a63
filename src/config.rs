//! Configuration management for Polychat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{PolychatError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure for Polychat
///
/// Holds the provider settings, session storage settings, and the
/// optional login-gate account map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Provider configuration (OpenAI, Ollama)
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Session persistence configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Login gate: account name -> password. An empty map disables the gate.
    #[serde(default)]
    pub accounts: HashMap<String, String>,
}

/// Provider configuration
///
/// Specifies which backend to use by default and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use ("openai" or "ollama")
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// OpenAI configuration
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

fn default_provider_type() -> String {
    "ollama".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Model to use
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// API key. When unset, the key is resolved from the `OPENAI_API_KEY`
    /// environment variable and then the OS keyring.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Optional API base URL (useful for tests and local mocks)
    ///
    /// When set, this base is used to build the streaming endpoint
    /// (e.g. `/responses`), which allows tests to point the provider
    /// at a mock server.
    #[serde(default)]
    pub api_base: Option<String>,

    /// Let the model search the web during a turn. Forced off for
    /// reasoning-series models regardless of this value.
    #[serde(default = "default_web_search")]
    pub web_search: bool,

    /// How much search context the backend should return
    #[serde(default)]
    pub search_context_size: SearchContextSize,
}

fn default_openai_model() -> String {
    "gpt-4.1".to_string()
}

fn default_web_search() -> bool {
    true
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: default_openai_model(),
            api_key: None,
            api_base: None,
            web_search: default_web_search(),
            search_context_size: SearchContextSize::default(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding session files. When unset, the platform data
    /// directory is used (see `SessionStore::new`).
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Web-search context size
///
/// Controls how much detail the search tool returns per query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchContextSize {
    /// Minimal context, fastest responses
    Low,
    /// Balanced context and latency
    #[default]
    Medium,
    /// Maximum context, slowest responses
    High,
}

impl SearchContextSize {
    /// Wire name as sent to the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for SearchContextSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchContextSize {
    type Err = PolychatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(PolychatError::Config(format!(
                "Invalid search context size: {} (expected low, medium, or high)",
                other
            ))),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PolychatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| PolychatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("POLYCHAT_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(openai_model) = std::env::var("POLYCHAT_OPENAI_MODEL") {
            self.provider.openai.model = openai_model;
        }

        if let Ok(ollama_host) = std::env::var("POLYCHAT_OLLAMA_HOST") {
            self.provider.ollama.host = ollama_host;
        }

        if let Ok(ollama_model) = std::env::var("POLYCHAT_OLLAMA_MODEL") {
            self.provider.ollama.model = ollama_model;
        }

        if let Ok(dir) = std::env::var("POLYCHAT_SESSION_DIR") {
            self.session.dir = Some(PathBuf::from(dir));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let crate::cli::Commands::Chat {
            provider,
            model,
            session_dir,
            ..
        } = &cli.command
        {
            if let Some(p) = provider {
                self.provider.provider_type = p.clone();
            }
            if let Some(m) = model {
                match self.provider.provider_type.as_str() {
                    "openai" => self.provider.openai.model = m.clone(),
                    _ => self.provider.ollama.model = m.clone(),
                }
            }
            if let Some(dir) = session_dir {
                self.session.dir = Some(dir.clone());
            }
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the provider type is unknown or the Ollama host
    /// is not a valid URL
    pub fn validate(&self) -> Result<()> {
        if !crate::providers::PROVIDER_NAMES.contains(&self.provider.provider_type.as_str()) {
            return Err(PolychatError::Config(format!(
                "Unknown provider type: {} (expected one of: {})",
                self.provider.provider_type,
                crate::providers::PROVIDER_NAMES.join(", ")
            ))
            .into());
        }

        Url::parse(&self.provider.ollama.host).map_err(|e| {
            PolychatError::Config(format!(
                "Invalid Ollama host {}: {}",
                self.provider.ollama.host, e
            ))
        })?;

        Ok(())
    }
}
