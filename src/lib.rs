//! Mindchat - local chat assistant library
//!
//! This library provides the core of Mindchat: durable per-mode conversation
//! history, prompt assembly for small local models, a completion provider
//! abstraction with an Ollama backend, and the session coordinator that ties
//! a chat turn together.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `history`: Conversations, messages, and the bounded recency-ordered store
//! - `prompt`: Turn coalescing and system-instruction injection
//! - `providers`: Completion backend abstraction and the Ollama implementation
//! - `session`: Mode registry and the single-flight chat coordinator
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Handlers behind the CLI subcommands
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mindchat::{providers, ChatSession, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let provider = Arc::from(providers::create_provider(&config.provider)?);
//!     let mut session = ChatSession::from_config(&config, provider, None)?;
//!     let conversation = session.send("I have trouble sleeping").await?;
//!     println!("{}", conversation.messages.last().map(|m| m.content.as_str()).unwrap_or(""));
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod prompt;
pub mod providers;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use error::{MindchatError, Result};
pub use history::{ChatMessage, Conversation, HistoryLimits, HistoryStore, Role};
pub use prompt::{assemble_prompt, Turn};
pub use session::{ChatSession, ModeRegistry, PendingReply};
