//! Command-line interface definition for Mindchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chatting, managing history, and listing modes.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mindchat - local chat assistant
///
/// Talk to a local model in one of several modes, each with its own
/// conversation history.
#[derive(Parser, Debug, Clone)]
#[command(name = "mindchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long)]
    pub json_logs: bool,

    /// Directory holding the history files (overrides config)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Mindchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat
    Chat {
        /// Mode to start in (defaults to `default_mode` from config)
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// Manage stored conversations
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// List configured modes
    Modes,
}

/// History management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List conversations, most recent first
    List {
        /// Mode whose history to show
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// Delete a conversation
    Delete {
        /// Conversation id or unique id prefix
        id: String,

        /// Mode the conversation belongs to
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// Toggle the favorite flag of a conversation
    Favorite {
        /// Conversation id or unique id prefix
        id: String,

        /// Mode the conversation belongs to
        #[arg(short, long)]
        mode: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            data_dir: None,
            command: Commands::Chat { mode: None },
        }
    }
}
