use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::Result;
use crate::history::Conversation;
use crate::session::ModeRegistry;
use colored::Colorize;
use prettytable::{format, Table};

/// Characters of a conversation id shown in listings
const SHORT_ID_LEN: usize = 8;

/// Characters of a title shown in listings
const LIST_TITLE_LEN: usize = 40;

/// Handle history commands
///
/// Operates directly on the mode's history file; no model backend is
/// contacted.
pub fn handle_history(config: &Config, command: HistoryCommand) -> Result<()> {
    let mut registry = ModeRegistry::open(config)?;

    match command {
        HistoryCommand::List { mode } => {
            let mode = registry.mode(mode.as_deref().unwrap_or(&config.default_mode))?;
            let conversations = registry.store(&mode.key)?.list();

            if conversations.is_empty() {
                println!(
                    "{}",
                    format!("No conversation history found for {}.", mode.display_name).yellow()
                );
                return Ok(());
            }

            println!("\nConversation History ({}):", mode.display_name);
            conversation_table(&conversations, None).printstd();
            println!();
            println!(
                "Run {} and use {} to continue a conversation.",
                "mindchat chat".cyan(),
                "/open <ID>".cyan()
            );
            println!();
        }
        HistoryCommand::Delete { id, mode } => {
            let key = mode.unwrap_or_else(|| config.default_mode.clone());
            let store = registry.store_mut(&key)?;
            let full_id = store.resolve_id(&id)?;
            store.delete(&full_id)?;
            println!("{}", format!("Deleted conversation {}", full_id).green());
        }
        HistoryCommand::Favorite { id, mode } => {
            let key = mode.unwrap_or_else(|| config.default_mode.clone());
            let store = registry.store_mut(&key)?;
            let full_id = store.resolve_id(&id)?;
            let conversation = store.toggle_favorite(&full_id)?;
            if conversation.is_favorite {
                println!("{}", format!("Marked {} as favorite", full_id).green());
            } else {
                println!("{}", format!("Removed {} from favorites", full_id).green());
            }
        }
    }

    Ok(())
}

/// Build the listing table for a set of conversations
///
/// The active conversation, when given, is marked with `>`.
pub fn conversation_table(conversations: &[Conversation], active_id: Option<&str>) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "",
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for conversation in conversations {
        let marker = match (
            active_id == Some(conversation.conversation_id.as_str()),
            conversation.is_favorite,
        ) {
            (true, true) => ">★",
            (true, false) => "> ",
            (false, true) => " ★",
            (false, false) => "  ",
        };
        let updated = conversation
            .updated_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();

        table.add_row(prettytable::row![
            marker,
            short_id(&conversation.conversation_id).cyan(),
            clip(&conversation.title, LIST_TITLE_LEN),
            conversation.messages.len(),
            updated
        ]);
    }

    table
}

/// Leading characters of a conversation id
pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", head)
}
