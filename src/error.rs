//! Error types for Mindchat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Mindchat operations
///
/// Covers history store business rules, configuration problems, and
/// failures reported by the completion backend. Corrupted history files are
/// not represented here: the store recovers from them locally.
#[derive(Error, Debug)]
pub enum MindchatError {
    /// A conversation id (or id prefix) did not match any stored conversation
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// Marking another conversation as favorite would exceed the configured cap
    #[error("Favorite limit exceeded: at most {limit} conversations can be favorites")]
    FavoriteLimitExceeded {
        /// The configured favorite limit
        limit: usize,
    },

    /// Favorites fill the store, so a new conversation would be evicted at once
    #[error(
        "No room for a new conversation: favorites fill all {limit} slots; unfavorite or delete one first"
    )]
    HistoryFull {
        /// The configured conversation limit
        limit: usize,
    },

    /// A completion is already running for this session
    #[error("A reply is already being generated; wait for it to finish")]
    CompletionInProgress,

    /// A message with no visible content was submitted
    #[error("Message is empty")]
    EmptyMessage,

    /// The requested mode key is not configured
    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Completion backend errors (connection, HTTP status, malformed reply)
    #[error("Provider error: {0}")]
    Provider(String),

    /// History file errors (write, rename, directory creation)
    #[error("Storage error: {0}")]
    Storage(String),

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
}

/// Result type alias for Mindchat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation. Callers that
/// need to branch on a specific failure can `downcast_ref::<MindchatError>()`.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error_display() {
        let error = MindchatError::ConversationNotFound("abc123".to_string());
        assert_eq!(error.to_string(), "Conversation not found: abc123");
    }

    #[test]
    fn test_favorite_limit_error_includes_limit() {
        let error = MindchatError::FavoriteLimitExceeded { limit: 50 };
        assert!(error.to_string().contains("at most 50"));
    }

    #[test]
    fn test_history_full_error_includes_limit() {
        let error = MindchatError::HistoryFull { limit: 2 };
        assert!(error.to_string().contains("all 2 slots"));
    }

    #[test]
    fn test_completion_in_progress_display() {
        let error = MindchatError::CompletionInProgress;
        assert!(error.to_string().contains("already being generated"));
    }

    #[test]
    fn test_empty_message_display() {
        assert_eq!(MindchatError::EmptyMessage.to_string(), "Message is empty");
    }

    #[test]
    fn test_unknown_mode_display() {
        let error = MindchatError::UnknownMode("poetry".to_string());
        assert_eq!(error.to_string(), "Unknown mode: poetry");
    }

    #[test]
    fn test_config_error_display() {
        let error = MindchatError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_provider_error_display() {
        let error = MindchatError::Provider("connection refused".to_string());
        assert_eq!(error.to_string(), "Provider error: connection refused");
    }

    #[test]
    fn test_storage_error_display() {
        let error = MindchatError::Storage("disk full".to_string());
        assert_eq!(error.to_string(), "Storage error: disk full");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: MindchatError = io_error.into();
        assert!(matches!(error, MindchatError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: MindchatError = json_error.into();
        assert!(matches!(error, MindchatError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: MindchatError = yaml_error.into();
        assert!(matches!(error, MindchatError::Yaml(_)));
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let result: Result<()> = Err(MindchatError::FavoriteLimitExceeded { limit: 3 }.into());
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MindchatError>(),
            Some(MindchatError::FavoriteLimitExceeded { limit: 3 })
        ));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MindchatError>();
    }
}
