//! Provider module for Mindchat
//!
//! This module contains the completion backend abstraction and the Ollama
//! implementation used to talk to a local model server.

pub mod base;
pub mod ollama;

pub use base::{CompletionOptions, CompletionProvider};
pub use ollama::OllamaProvider;

use crate::config::ProviderConfig;
use crate::error::{MindchatError, Result};

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `config` - Provider configuration
///
/// # Returns
///
/// Returns a boxed provider instance
///
/// # Errors
///
/// Returns error if the provider type is unknown or initialization fails
///
/// # Examples
///
/// ```
/// use mindchat::config::ProviderConfig;
/// use mindchat::providers::create_provider;
///
/// let provider = create_provider(&ProviderConfig::default()).unwrap();
/// assert!(provider.describe().starts_with("ollama"));
/// ```
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn CompletionProvider>> {
    match config.provider_type.as_str() {
        "ollama" => Ok(Box::new(OllamaProvider::new(config.ollama.clone())?)),
        other => Err(MindchatError::Provider(format!("Unknown provider type: {}", other)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_provider() {
        let provider = create_provider(&ProviderConfig::default());
        assert!(provider.is_ok());
    }

    #[test]
    fn test_create_unknown_provider() {
        let config = ProviderConfig {
            provider_type: "openai".to_string(),
            ..ProviderConfig::default()
        };
        let result = create_provider(&config);
        assert!(result.is_err());
        assert!(result
            .err()
            .map(|e| e.to_string().contains("Unknown provider type: openai"))
            .unwrap_or(false));
    }
}
