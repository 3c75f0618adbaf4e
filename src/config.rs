//! Configuration management for Mindchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{MindchatError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Mindchat
///
/// Holds the model backend settings, generation parameters, history limits,
/// and the table of conversation modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider configuration (local model backend)
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Sampling parameters passed with every completion request
    #[serde(default)]
    pub generation: GenerationConfig,

    /// History storage location and limits
    #[serde(default)]
    pub history: HistoryConfig,

    /// Configured conversation modes
    #[serde(default = "default_modes")]
    pub modes: Vec<ModeConfig>,

    /// Key of the mode selected at startup
    #[serde(default = "default_mode_key")]
    pub default_mode: String,
}

/// Provider configuration
///
/// Specifies which model backend to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

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
            ollama: OllamaConfig::default(),
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

    /// Request timeout in seconds; local generation can take a while
    #[serde(default = "default_ollama_timeout")]
    pub timeout_seconds: u64,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "gemma2:2b".to_string()
}

fn default_ollama_timeout() -> u64 {
    300
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
            timeout_seconds: default_ollama_timeout(),
        }
    }
}

/// Sampling parameters for completions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of tokens in a reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling probability mass
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

/// History storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Directory holding one history file per mode.
    ///
    /// When unset, the platform data directory is used.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Upper bound on stored conversations per mode
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,

    /// Upper bound on favorite conversations per mode
    #[serde(default = "default_max_favorites")]
    pub max_favorites: usize,

    /// Maximum number of characters kept in a derived conversation title
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
}

fn default_max_conversations() -> usize {
    60
}

fn default_max_favorites() -> usize {
    50
}

fn default_title_max_chars() -> usize {
    30
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_conversations: default_max_conversations(),
            max_favorites: default_max_favorites(),
            title_max_chars: default_title_max_chars(),
        }
    }
}

/// A named conversation profile with its own history file
///
/// # Examples
///
/// ```
/// use mindchat::config::ModeConfig;
/// use std::path::Path;
///
/// let mode = ModeConfig {
///     key: "plain_chat".to_string(),
///     display_name: "Plain chat".to_string(),
///     history_file: "history_plain.json".to_string(),
///     system_prompt: None,
/// };
/// assert_eq!(
///     mode.history_path(Path::new("/data")),
///     Path::new("/data/history_plain.json")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    /// Stable identifier used on the command line
    pub key: String,

    /// Human readable name
    pub display_name: String,

    /// File name of the history file inside the data directory
    pub history_file: String,

    /// Instruction injected ahead of the conversation, if any
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl ModeConfig {
    /// Resolve this mode's history file inside `data_dir`
    pub fn history_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.history_file)
    }
}

const COUNSELOR_PROMPT: &str = "You are a polite and empathetic counselor. \
Respect the other person's feelings so they feel safe talking to you. \
Answer in natural language that is neither too short nor too long, \
and suggest concrete insights or a next step. \
When advice is difficult, put acknowledging their feelings first.";

fn default_modes() -> Vec<ModeConfig> {
    vec![
        ModeConfig {
            key: "mind_chat".to_string(),
            display_name: "Mind-Chat".to_string(),
            history_file: "history_mindchat.json".to_string(),
            system_prompt: Some(COUNSELOR_PROMPT.to_string()),
        },
        ModeConfig {
            key: "plain_chat".to_string(),
            display_name: "Plain chat".to_string(),
            history_file: "history_plain.json".to_string(),
            system_prompt: None,
        },
    ]
}

fn default_mode_key() -> String {
    "mind_chat".to_string()
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
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            provider: ProviderConfig::default(),
            generation: GenerationConfig::default(),
            history: HistoryConfig::default(),
            modes: default_modes(),
            default_mode: default_mode_key(),
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MindchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MindchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("MINDCHAT_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(ollama_host) = std::env::var("MINDCHAT_OLLAMA_HOST") {
            self.provider.ollama.host = ollama_host;
        }

        if let Ok(ollama_model) = std::env::var("MINDCHAT_OLLAMA_MODEL") {
            self.provider.ollama.model = ollama_model;
        }

        if let Ok(data_dir) = std::env::var("MINDCHAT_DATA_DIR") {
            self.history.data_dir = Some(PathBuf::from(data_dir));
        }

        if let Ok(max_conversations) = std::env::var("MINDCHAT_MAX_CONVERSATIONS") {
            if let Ok(value) = max_conversations.parse() {
                self.history.max_conversations = value;
            } else {
                tracing::warn!("Invalid MINDCHAT_MAX_CONVERSATIONS: {}", max_conversations);
            }
        }

        if let Ok(max_favorites) = std::env::var("MINDCHAT_MAX_FAVORITES") {
            if let Ok(value) = max_favorites.parse() {
                self.history.max_favorites = value;
            } else {
                tracing::warn!("Invalid MINDCHAT_MAX_FAVORITES: {}", max_favorites);
            }
        }

        if let Ok(temperature) = std::env::var("MINDCHAT_TEMPERATURE") {
            if let Ok(value) = temperature.parse() {
                self.generation.temperature = value;
            } else {
                tracing::warn!("Invalid MINDCHAT_TEMPERATURE: {}", temperature);
            }
        }

        if let Ok(default_mode) = std::env::var("MINDCHAT_DEFAULT_MODE") {
            self.default_mode = default_mode;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(data_dir) = &cli.data_dir {
            tracing::debug!("Using data directory override from CLI: {}", data_dir.display());
            self.history.data_dir = Some(data_dir.clone());
        }
    }

    /// Look up a mode by key
    ///
    /// # Errors
    ///
    /// Returns `UnknownMode` if no mode has that key
    pub fn mode(&self, key: &str) -> Result<&ModeConfig> {
        self.modes
            .iter()
            .find(|mode| mode.key == key)
            .ok_or_else(|| MindchatError::UnknownMode(key.to_string()).into())
    }

    /// Directory holding the per-mode history files
    ///
    /// Uses `history.data_dir` when set, otherwise the platform data directory.
    pub fn history_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.history.data_dir {
            return Ok(dir.clone());
        }

        let proj_dirs = ProjectDirs::from("com", "mindchat", "mindchat").ok_or_else(|| {
            MindchatError::Storage("Could not determine data directory".to_string())
        })?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let valid_providers = ["ollama"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(MindchatError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.provider.ollama.timeout_seconds == 0 {
            return Err(MindchatError::Config(
                "provider.ollama.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.generation.max_tokens == 0 {
            return Err(MindchatError::Config(
                "generation.max_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(MindchatError::Config(
                "generation.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if self.generation.top_p <= 0.0 || self.generation.top_p > 1.0 {
            return Err(MindchatError::Config(
                "generation.top_p must be greater than 0.0 and at most 1.0".to_string(),
            )
            .into());
        }

        if self.history.max_conversations == 0 {
            return Err(MindchatError::Config(
                "history.max_conversations must be greater than 0".to_string(),
            )
            .into());
        }

        if self.history.max_favorites == 0 {
            return Err(MindchatError::Config(
                "history.max_favorites must be greater than 0".to_string(),
            )
            .into());
        }

        if self.history.max_favorites >= self.history.max_conversations {
            return Err(MindchatError::Config(format!(
                "history.max_favorites ({}) must be less than history.max_conversations ({})",
                self.history.max_favorites, self.history.max_conversations
            ))
            .into());
        }

        if self.history.title_max_chars == 0 {
            return Err(MindchatError::Config(
                "history.title_max_chars must be greater than 0".to_string(),
            )
            .into());
        }

        if self.modes.is_empty() {
            return Err(
                MindchatError::Config("At least one mode must be configured".to_string()).into(),
            );
        }

        let mut seen = std::collections::HashSet::new();
        for mode in &self.modes {
            if mode.key.trim().is_empty() {
                return Err(MindchatError::Config("Mode key cannot be empty".to_string()).into());
            }
            if mode.history_file.trim().is_empty() {
                return Err(MindchatError::Config(format!(
                    "Mode {} must name a history file",
                    mode.key
                ))
                .into());
            }
            if !seen.insert(mode.key.as_str()) {
                return Err(
                    MindchatError::Config(format!("Duplicate mode key: {}", mode.key)).into(),
                );
            }
        }

        if !self.modes.iter().any(|mode| mode.key == self.default_mode) {
            return Err(MindchatError::Config(format!(
                "default_mode {} is not a configured mode",
                self.default_mode
            ))
            .into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
