//! Base provider trait and common types for Mindchat

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::prompt::Turn;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sampling parameters sent with a completion request
///
/// # Examples
///
/// ```
/// use mindchat::config::GenerationConfig;
/// use mindchat::providers::CompletionOptions;
///
/// let options = CompletionOptions::from(&GenerationConfig::default());
/// assert_eq!(options.max_tokens, 512);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling probability mass
    pub top_p: f32,
}

impl From<&GenerationConfig> for CompletionOptions {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

/// Model-completion capability
///
/// Implementations turn an ordered list of role-tagged turns into the
/// model's reply text. The turns never carry a system role; mode
/// instructions are folded into user turns by
/// [`assemble_prompt`](crate::prompt::assemble_prompt).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Completes a conversation
    ///
    /// # Arguments
    ///
    /// * `turns` - Conversation turns, oldest first
    /// * `options` - Sampling parameters
    ///
    /// # Returns
    ///
    /// Returns the reply text with surrounding whitespace removed
    ///
    /// # Errors
    ///
    /// Returns `MindchatError::Provider` if the backend is unreachable,
    /// answers with an error, or produces no usable reply
    async fn complete(&self, turns: &[Turn], options: &CompletionOptions) -> Result<String>;

    /// Human-readable backend description for status output
    fn describe(&self) -> String {
        "completion provider".to_string()
    }
}
