//! Special commands parser for interactive chat mode
//!
//! This module parses the special commands that can be entered during an
//! interactive chat session. Special commands allow users to:
//! - Start, list, open, favorite, and delete conversations
//! - Switch between modes
//! - Display help information
//! - Exit the session
//!
//! Commands are prefixed with `/`; the command word is case-insensitive while
//! its argument is kept as typed.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an argument it does not take
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// These commands act on the session or the history rather than being sent
/// to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new conversation in the current mode
    NewConversation,

    /// List conversations of the current mode
    ListConversations,

    /// Open a conversation by id or id prefix
    OpenConversation(String),

    /// Toggle the favorite flag; `None` targets the active conversation
    ToggleFavorite(Option<String>),

    /// Delete a conversation by id or id prefix
    DeleteConversation(String),

    /// Switch to another mode
    SwitchMode(String),

    /// List configured modes
    ListModes,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the model as a chat message.
    None,
}

/// Parse a user input string into a special command
///
/// # Arguments
///
/// * `input` - The user input string to parse
///
/// # Returns
///
/// Returns Ok(SpecialCommand) for valid commands or SpecialCommand::None for
/// ordinary chat input.
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command receives an argument it does not take.
/// Returns CommandError::MissingArgument if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use mindchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/mode plain_chat").unwrap();
/// assert_eq!(cmd, SpecialCommand::SwitchMode("plain_chat".to_string()));
///
/// let cmd = parse_special_command("/fav").unwrap();
/// assert_eq!(cmd, SpecialCommand::ToggleFavorite(None));
///
/// let cmd = parse_special_command("I had a long day").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// // Invalid command returns error
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // Only "exit" and "quit" are recognized without a leading "/"
    if !trimmed.starts_with('/') {
        return Ok(match lower.as_str() {
            "exit" | "quit" => SpecialCommand::Exit,
            _ => SpecialCommand::None,
        });
    }

    let (word, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), Some(rest.trim()).filter(|a| !a.is_empty())),
        None => (lower, None),
    };

    match (word.as_str(), arg) {
        ("/new", None) => Ok(SpecialCommand::NewConversation),
        ("/list" | "/history", None) => Ok(SpecialCommand::ListConversations),
        ("/modes", None) => Ok(SpecialCommand::ListModes),
        ("/help" | "/?", None) => Ok(SpecialCommand::Help),
        ("/exit" | "/quit", None) => Ok(SpecialCommand::Exit),

        ("/open", Some(id)) => Ok(SpecialCommand::OpenConversation(id.to_string())),
        ("/delete", Some(id)) => Ok(SpecialCommand::DeleteConversation(id.to_string())),
        ("/mode", Some(key)) => Ok(SpecialCommand::SwitchMode(key.to_string())),
        ("/fav" | "/favorite", id) => Ok(SpecialCommand::ToggleFavorite(id.map(str::to_string))),

        ("/open", None) => Err(missing("/open", "/open <id-prefix>")),
        ("/delete", None) => Err(missing("/delete", "/delete <id-prefix>")),
        ("/mode", None) => Err(missing("/mode", "/mode <key>")),

        (
            command @ ("/new" | "/list" | "/history" | "/modes" | "/help" | "/?" | "/exit"
            | "/quit"),
            Some(arg),
        ) => Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        }),

        (command, _) => Err(CommandError::UnknownCommand(command.to_string())),
    }
}

fn missing(command: &str, usage: &str) -> CommandError {
    CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

/// Display help text for special commands
///
/// # Examples
///
/// ```
/// use mindchat::commands::special_commands::print_help;
///
/// print_help();
/// ```
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

CONVERSATIONS:
  /new              - Start a new conversation
  /list             - List conversations in the current mode
  /open <id>        - Open a conversation (a unique id prefix is enough)
  /fav [id]         - Toggle favorite (defaults to the open conversation)
  /delete <id>      - Delete a conversation

MODES:
  /modes            - List available modes
  /mode <key>       - Switch to another mode

OTHER:
  /help             - Show this help message
  /exit             - Exit the session (also: exit, quit)

Anything else is sent to the model as your message.
"#
    );
}
