//! Ollama provider implementation for Mindchat
//!
//! This module implements [`CompletionProvider`] for Ollama, sending
//! non-streaming chat requests to a local or remote Ollama server.

use crate::config::OllamaConfig;
use crate::error::{MindchatError, Result};
use crate::prompt::Turn;
use crate::providers::{CompletionOptions, CompletionProvider};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API provider
///
/// # Examples
///
/// ```no_run
/// use mindchat::config::OllamaConfig;
/// use mindchat::prompt::Turn;
/// use mindchat::providers::{CompletionOptions, CompletionProvider, OllamaProvider};
///
/// # async fn example() -> mindchat::error::Result<()> {
/// let provider = OllamaProvider::new(OllamaConfig::default())?;
/// let reply = provider
///     .complete(&[Turn::user("Hello!")], &CompletionOptions::default())
///     .await?;
/// println!("{}", reply);
/// # Ok(())
/// # }
/// ```
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Request structure for Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

/// Message structure for Ollama API
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
}

/// Sampling options in Ollama's naming
#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
}

/// Response structure from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Arguments
    ///
    /// * `config` - Ollama configuration containing host, model, and timeout
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use mindchat::config::OllamaConfig;
    /// use mindchat::providers::OllamaProvider;
    ///
    /// let provider = OllamaProvider::new(OllamaConfig::default());
    /// assert!(provider.is_ok());
    /// ```
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("mindchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MindchatError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama provider: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Ollama server host
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Model used for completions
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.host.trim_end_matches('/'))
    }

    fn convert_turns(turns: &[Turn]) -> Vec<OllamaMessage> {
        turns
            .iter()
            .map(|turn| OllamaMessage {
                role: turn.role.as_str().to_string(),
                content: turn.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    async fn complete(&self, turns: &[Turn], options: &CompletionOptions) -> Result<String> {
        let request = OllamaRequest {
            model: &self.config.model,
            messages: Self::convert_turns(turns),
            stream: false,
            options: OllamaOptions {
                num_predict: options.max_tokens,
                temperature: options.temperature,
                top_p: options.top_p,
            },
        };

        tracing::debug!(
            "Sending Ollama request: {} turns, model={}",
            request.messages.len(),
            request.model
        );

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ollama request failed: {}", e);
                MindchatError::Provider(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(MindchatError::Provider(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            MindchatError::Provider(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::debug!(
            "Ollama response: done={}, prompt_tokens={}, completion_tokens={}",
            ollama_response.done,
            ollama_response.prompt_eval_count,
            ollama_response.eval_count
        );

        let reply = ollama_response.message.content.trim();
        if reply.is_empty() {
            tracing::error!("Ollama returned an empty reply");
            return Err(MindchatError::Provider("Ollama returned an empty reply".to_string()).into());
        }

        Ok(reply.to_string())
    }

    fn describe(&self) -> String {
        format!("ollama ({} at {})", self.config.model, self.config.host)
    }
}
