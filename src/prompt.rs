//! Prompt assembly for completion backends
//!
//! Converts stored conversation messages into the role-tagged turns sent to
//! the model. Small local models often ship chat templates that reject a
//! distinct system role and consecutive turns from the same speaker, so the
//! assembler merges adjacent same-role messages and folds the mode's system
//! instruction into the first user turn.

use crate::history::{ChatMessage, Role};
use serde::{Deserialize, Serialize};

/// Separator placed between merged contents
const TURN_SEPARATOR: &str = "\n\n";

/// One role-tagged unit of content submitted to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Speaker of the turn
    pub role: Role,
    /// Turn text
    pub content: String,
}

impl Turn {
    /// Create a turn
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Build the turn sequence for a conversation
///
/// Adjacent messages with the same role are merged into one turn, joined by a
/// blank line. When `system_instruction` is present and non-empty it is
/// prepended to the first turn if that turn is from the user, or emitted as a
/// leading user turn otherwise. The input is never modified.
///
/// # Arguments
///
/// * `messages` - Conversation messages in append order
/// * `system_instruction` - Optional mode instruction
///
/// # Returns
///
/// The ordered turns to submit; empty when there are no messages and no
/// instruction
///
/// # Examples
///
/// ```
/// use mindchat::history::ChatMessage;
/// use mindchat::prompt::{assemble_prompt, Turn};
///
/// let messages = vec![ChatMessage::user("a"), ChatMessage::user("b")];
/// assert_eq!(
///     assemble_prompt(&messages, Some("S")),
///     vec![Turn::user("S\n\na\n\nb")]
/// );
/// ```
pub fn assemble_prompt(messages: &[ChatMessage], system_instruction: Option<&str>) -> Vec<Turn> {
    let mut turns = coalesce(messages);

    let Some(instruction) = system_instruction.filter(|s| !s.is_empty()) else {
        return turns;
    };

    match turns.first_mut() {
        None => turns.push(Turn::user(instruction)),
        Some(first) if first.role == Role::User => {
            first.content = format!("{}{}{}", instruction, TURN_SEPARATOR, first.content);
        }
        Some(_) => turns.insert(0, Turn::user(instruction)),
    }

    turns
}

fn coalesce(messages: &[ChatMessage]) -> Vec<Turn> {
    let mut turns: Vec<Turn> = Vec::with_capacity(messages.len());
    for message in messages {
        match turns.last_mut() {
            Some(last) if last.role == message.role => {
                last.content.push_str(TURN_SEPARATOR);
                last.content.push_str(&message.content);
            }
            _ => turns.push(Turn::new(message.role, message.content.clone())),
        }
    }
    turns
}
