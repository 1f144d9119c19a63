//! Chat backend providers for Polychat
//!
//! This module contains the Provider trait and implementations for the
//! supported backends: a local Ollama server and the hosted OpenAI API.

pub mod base;
pub mod ollama;
pub mod openai;

pub use base::{
    chat_history, ChatStream, Message, Provider, StreamFragment, FILETYPE_IMAGE, ROLE_ASSISTANT,
    ROLE_USER,
};
pub use ollama::{OllamaProvider, FALLBACK_MODELS};
pub use openai::{is_reasoning_model, OpenAiProvider, OPENAI_MODELS};

use crate::config::ProviderConfig;
use crate::error::{PolychatError, Result};

/// Names of the supported provider types
pub const PROVIDER_NAMES: &[&str] = &["openai", "ollama"];

/// Create a provider instance from configuration
///
/// # Arguments
///
/// * `config` - Provider configuration specifying type and settings
///
/// # Returns
///
/// Returns a boxed provider trait object
///
/// # Errors
///
/// Returns error if the provider type is unknown or initialization fails
/// (for OpenAI this includes a missing API key)
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    create_provider_with_override(config, None, None)
}

/// Create a provider instance with optional type and model overrides
///
/// # Arguments
///
/// * `config` - Provider configuration
/// * `provider_override` - Optional provider type to use instead of the
///   configured one
/// * `model_override` - Optional model to use instead of the configured one
///
/// # Errors
///
/// Returns error if the selected provider type is unknown or
/// initialization fails
pub fn create_provider_with_override(
    config: &ProviderConfig,
    provider_override: Option<&str>,
    model_override: Option<&str>,
) -> Result<Box<dyn Provider>> {
    let provider_type = provider_override.unwrap_or(&config.provider_type);

    tracing::debug!("Creating provider: {}", provider_type);

    match provider_type {
        "openai" => {
            let mut openai_config = config.openai.clone();
            if let Some(model) = model_override {
                openai_config.model = model.to_string();
            }
            Ok(Box::new(OpenAiProvider::new(openai_config)?))
        }
        "ollama" => {
            let mut ollama_config = config.ollama.clone();
            if let Some(model) = model_override {
                ollama_config.model = model.to_string();
            }
            Ok(Box::new(OllamaProvider::new(ollama_config)?))
        }
        unknown => Err(PolychatError::Provider(format!(
            "Unknown provider type: {} (expected one of: {})",
            unknown,
            PROVIDER_NAMES.join(", ")
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names() {
        assert!(PROVIDER_NAMES.contains(&"openai"));
        assert!(PROVIDER_NAMES.contains(&"ollama"));
    }

    #[test]
    fn test_create_ollama_provider() {
        let config = ProviderConfig::default();
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.current_model(), "llama3");
    }

    #[test]
    fn test_create_provider_unknown_type() {
        let mut config = ProviderConfig::default();
        config.provider_type = "gemini".to_string();
        let result = create_provider(&config);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown provider type"));
    }

    #[test]
    fn test_create_provider_with_model_override() {
        let config = ProviderConfig::default();
        let provider =
            create_provider_with_override(&config, Some("ollama"), Some("mistral")).unwrap();
        assert_eq!(provider.current_model(), "mistral");
    }

    #[test]
    fn test_create_openai_provider_with_key() {
        let mut config = ProviderConfig::default();
        config.provider_type = "openai".to_string();
        config.openai.api_key = Some("sk-test".to_string());
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.current_model(), "gpt-4.1");
    }
}
