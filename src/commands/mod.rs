/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`: Interactive chat loop
- `history`: Listing and editing stored conversations
- `modes`: Listing configured modes

The handlers stay thin: history rules live in `history`, turn coordination
in `session`.
*/

use crate::config::Config;
use crate::error::{MindchatError, Result};
use crate::providers::{create_provider, CompletionProvider};
use crate::session::ChatSession;
use std::sync::Arc;

// Special commands parser for the chat loop
pub mod special_commands;

// History subcommands
pub mod history;

// Mode listing
pub mod modes;

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Creates the provider and a `ChatSession`, then runs a readline loop
    //! that sends plain lines to the model and dispatches `/` commands.

    use super::*;
    use crate::commands::history::{conversation_table, short_id};
    use crate::commands::modes::print_mode_list;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::history::{Conversation, Role};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Whether the loop should keep reading input
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LoopControl {
        /// Read the next line
        Continue,
        /// Leave the chat
        Exit,
    }

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `mode` - Optional mode key overriding `default_mode`
    ///
    /// # Examples
    ///
    /// ```
    /// use mindchat::commands::chat;
    /// use mindchat::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default(), None).await?;
    /// ```
    pub async fn run_chat(config: Config, mode: Option<String>) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let provider: Arc<dyn CompletionProvider> = Arc::from(create_provider(&config.provider)?);
        let mut session = ChatSession::from_config(&config, provider, mode.as_deref())?;
        let conversation = session.ensure_active_conversation()?;

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&session);
        print_transcript(&conversation);

        loop {
            let prompt = format_prompt(&session);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    if handle_input(&mut session, trimmed).await == LoopControl::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Process one line of user input
    ///
    /// Errors are printed rather than returned so the loop keeps running.
    pub async fn handle_input(session: &mut ChatSession, input: &str) -> LoopControl {
        let command = match parse_special_command(input) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e.to_string().red());
                return LoopControl::Continue;
            }
        };

        let result = match command {
            SpecialCommand::None => send_message(session, input).await,
            SpecialCommand::Exit => return LoopControl::Exit,
            other => execute_command(session, other),
        };

        if let Err(e) = result {
            report_error(&e);
        }
        LoopControl::Continue
    }

    async fn send_message(session: &mut ChatSession, text: &str) -> Result<()> {
        println!("{}", "Thinking...".dimmed());
        let conversation = session.send(text).await?;
        if let Some(reply) = conversation
            .last_message()
            .filter(|m| m.role == Role::Assistant)
        {
            println!(
                "\n{}\n{}\n",
                format!("{}:", session.active_mode().display_name).green().bold(),
                reply.content
            );
        }
        Ok(())
    }

    /// Execute a special command against the session
    pub fn execute_command(session: &mut ChatSession, command: SpecialCommand) -> Result<()> {
        match command {
            SpecialCommand::NewConversation => {
                let conversation = session.new_conversation()?;
                println!(
                    "Started conversation {}\n",
                    short_id(&conversation.conversation_id).cyan()
                );
            }
            SpecialCommand::ListConversations => {
                let conversations = session.store()?.list();
                if conversations.is_empty() {
                    println!("{}", "No conversations yet.".yellow());
                } else {
                    conversation_table(&conversations, session.active_conversation_id())
                        .printstd();
                    println!();
                }
            }
            SpecialCommand::OpenConversation(id) => {
                let conversation = session.select_conversation(&id)?;
                print_transcript(&conversation);
            }
            SpecialCommand::ToggleFavorite(id) => {
                let target = match id {
                    Some(id) => id,
                    None => session.ensure_active_conversation()?.conversation_id,
                };
                let conversation = session.toggle_favorite(&target)?;
                let state = if conversation.is_favorite {
                    "added to"
                } else {
                    "removed from"
                };
                println!(
                    "Conversation {} {} favorites\n",
                    short_id(&conversation.conversation_id).cyan(),
                    state
                );
            }
            SpecialCommand::DeleteConversation(id) => {
                let deleted = session.delete_conversation(&id)?;
                println!("Deleted conversation {}\n", short_id(&deleted).cyan());
            }
            SpecialCommand::SwitchMode(key) => {
                session.switch_mode(&key)?;
                println!(
                    "Switched to {}\n",
                    session.active_mode().display_name.green()
                );
                let conversation = session.ensure_active_conversation()?;
                print_transcript(&conversation);
            }
            SpecialCommand::ListModes => {
                let active = session.active_mode().key.clone();
                print_mode_list(session.registry().modes(), &active);
            }
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
        Ok(())
    }

    fn report_error(error: &anyhow::Error) {
        let message = match error.downcast_ref::<MindchatError>() {
            Some(MindchatError::Provider(detail)) => {
                format!("Failed to generate a reply: {}", detail)
            }
            _ => error.to_string(),
        };
        eprintln!("{}\n", message.red());
    }

    fn format_prompt(session: &ChatSession) -> String {
        format!("[{}] >> ", session.active_mode().key.cyan())
    }

    /// Display welcome banner at the start of interactive chat mode
    fn print_welcome_banner(session: &ChatSession) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              Mindchat Interactive Chat - Welcome!            ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Mode:    {}", session.active_mode().display_name.green());
        println!("Backend: {}", session.provider().describe());
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    /// Print a conversation's messages
    fn print_transcript(conversation: &Conversation) {
        println!(
            "{} {}",
            short_id(&conversation.conversation_id).cyan(),
            conversation.title.bold()
        );
        for message in &conversation.messages {
            let speaker = match message.role {
                Role::User => "You".blue().bold(),
                Role::Assistant => "Assistant".green().bold(),
            };
            println!("{}: {}", speaker, message.content);
        }
        println!();
    }

}
