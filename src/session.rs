//! Chat session coordination
//!
//! [`ModeRegistry`] owns one [`HistoryStore`] per configured mode for the
//! lifetime of the process. [`ChatSession`] sits on top of it and drives a
//! conversation turn: it records the user message, assembles the prompt with
//! the mode's instruction, runs the completion as a single background task,
//! and then either stores the reply or rolls the user turn back.

use crate::config::{Config, ModeConfig};
use crate::error::{MindchatError, Result};
use crate::history::{ChatMessage, Conversation, HistoryLimits, HistoryStore};
use crate::prompt::assemble_prompt;
use crate::providers::{CompletionOptions, CompletionProvider};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::task::{AbortHandle, JoinHandle};

/// A configured mode together with its history store
#[derive(Debug)]
struct ModeEntry {
    mode: ModeConfig,
    store: HistoryStore,
}

/// Mapping from mode key to that mode's history store
///
/// Built once at startup and passed explicitly to whoever needs history
/// access.
#[derive(Debug)]
pub struct ModeRegistry {
    entries: Vec<ModeEntry>,
}

impl ModeRegistry {
    /// Open the history store of every configured mode
    ///
    /// History files live in [`Config::history_dir`]; missing files are
    /// created empty.
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be determined or a store
    /// cannot be opened
    ///
    /// # Examples
    ///
    /// ```
    /// use mindchat::config::Config;
    /// use mindchat::session::ModeRegistry;
    ///
    /// # fn main() -> mindchat::error::Result<()> {
    /// let dir = tempfile::tempdir()?;
    /// let mut config = Config::default();
    /// config.history.data_dir = Some(dir.path().to_path_buf());
    ///
    /// let registry = ModeRegistry::open(&config)?;
    /// assert!(registry.store("mind_chat")?.is_empty());
    /// assert!(dir.path().join("history_mindchat.json").exists());
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(config: &Config) -> Result<Self> {
        let dir = config.history_dir()?;
        let limits = HistoryLimits::from(&config.history);

        let mut entries = Vec::with_capacity(config.modes.len());
        for mode in &config.modes {
            let store = HistoryStore::open(mode.history_path(&dir), limits)?;
            tracing::debug!(
                "Opened history for mode {} ({} conversations)",
                mode.key,
                store.len()
            );
            entries.push(ModeEntry {
                mode: mode.clone(),
                store,
            });
        }

        tracing::info!(
            "Opened {} mode histories in {}",
            entries.len(),
            dir.display()
        );
        Ok(Self { entries })
    }

    /// Configured modes in declaration order
    pub fn modes(&self) -> impl Iterator<Item = &ModeConfig> {
        self.entries.iter().map(|entry| &entry.mode)
    }

    /// Whether a mode key is configured
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.mode.key == key)
    }

    /// Look up a mode
    ///
    /// # Errors
    ///
    /// Returns `UnknownMode` if the key is not configured
    pub fn mode(&self, key: &str) -> Result<&ModeConfig> {
        Ok(&self.entry(key)?.mode)
    }

    /// History store of a mode
    ///
    /// # Errors
    ///
    /// Returns `UnknownMode` if the key is not configured
    pub fn store(&self, key: &str) -> Result<&HistoryStore> {
        Ok(&self.entry(key)?.store)
    }

    /// Mutable history store of a mode
    ///
    /// # Errors
    ///
    /// Returns `UnknownMode` if the key is not configured
    pub fn store_mut(&mut self, key: &str) -> Result<&mut HistoryStore> {
        self.entries
            .iter_mut()
            .find(|entry| entry.mode.key == key)
            .map(|entry| &mut entry.store)
            .ok_or_else(|| MindchatError::UnknownMode(key.to_string()).into())
    }

    fn position(&self, key: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|entry| entry.mode.key == key)
            .ok_or_else(|| MindchatError::UnknownMode(key.to_string()).into())
    }

    fn entry(&self, key: &str) -> Result<&ModeEntry> {
        self.entries
            .iter()
            .find(|entry| entry.mode.key == key)
            .ok_or_else(|| MindchatError::UnknownMode(key.to_string()).into())
    }
}

/// A completion running in the background
///
/// Returned by [`ChatSession::submit`] and consumed by
/// [`ChatSession::resolve`] or [`ChatSession::cancel`]. While it is alive
/// the session refuses to start another completion. Dropping it unresolved
/// abandons the reply: the next mutating session call stops the task and
/// rolls the user turn back.
#[derive(Debug)]
pub struct PendingReply {
    mode_key: String,
    conversation_id: String,
    handle: JoinHandle<Result<String>>,
    claim: Arc<()>,
}

impl PendingReply {
    /// Mode the reply belongs to
    pub fn mode_key(&self) -> &str {
        &self.mode_key
    }

    /// Conversation awaiting the reply
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Whether the completion task has finished
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the completion; resolving afterwards rolls the user turn back
    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Session-side record of the outstanding reply
#[derive(Debug)]
struct InFlight {
    mode_key: String,
    conversation_id: String,
    abort: AbortHandle,
    claim: Weak<()>,
}

impl InFlight {
    /// False once the matching `PendingReply` is gone
    fn is_claimed(&self) -> bool {
        self.claim.strong_count() > 0
    }
}

/// Interactive chat coordinator
///
/// Tracks the active mode, the active conversation of every mode, and
/// whether a reply is outstanding.
pub struct ChatSession {
    registry: ModeRegistry,
    provider: Arc<dyn CompletionProvider>,
    options: CompletionOptions,
    active: usize,
    active_ids: HashMap<String, String>,
    in_flight: Option<InFlight>,
}

impl ChatSession {
    /// Create a session starting in `initial_mode`
    ///
    /// # Errors
    ///
    /// Returns `UnknownMode` if `initial_mode` is not in the registry
    pub fn new(
        registry: ModeRegistry,
        provider: Arc<dyn CompletionProvider>,
        options: CompletionOptions,
        initial_mode: &str,
    ) -> Result<Self> {
        let active = registry.position(initial_mode)?;

        Ok(Self {
            registry,
            provider,
            options,
            active,
            active_ids: HashMap::new(),
            in_flight: None,
        })
    }

    /// Open the mode registry from configuration and create a session
    ///
    /// Starts in `mode` when given, otherwise in `config.default_mode`.
    ///
    /// # Errors
    ///
    /// Returns error if the registry cannot be opened or the mode is unknown
    pub fn from_config(
        config: &Config,
        provider: Arc<dyn CompletionProvider>,
        mode: Option<&str>,
    ) -> Result<Self> {
        let registry = ModeRegistry::open(config)?;
        let initial_mode = mode.unwrap_or(&config.default_mode);
        Self::new(
            registry,
            provider,
            CompletionOptions::from(&config.generation),
            initial_mode,
        )
    }

    /// The mode registry
    pub fn registry(&self) -> &ModeRegistry {
        &self.registry
    }

    /// The completion backend
    pub fn provider(&self) -> &dyn CompletionProvider {
        self.provider.as_ref()
    }

    /// The active mode
    pub fn active_mode(&self) -> &ModeConfig {
        &self.registry.entries[self.active].mode
    }

    /// History store of the active mode
    pub fn store(&self) -> Result<&HistoryStore> {
        self.registry.store(self.active_key())
    }

    /// Whether a reply is outstanding
    ///
    /// An abandoned reply does not count; it is cleaned up by the next
    /// mutating call.
    pub fn is_busy(&self) -> bool {
        self.in_flight.as_ref().map_or(false, InFlight::is_claimed)
    }

    /// Id of the active conversation in the active mode, if any
    pub fn active_conversation_id(&self) -> Option<&str> {
        self.active_ids.get(self.active_key()).map(String::as_str)
    }

    /// Switch to another mode
    ///
    /// # Errors
    ///
    /// Returns `UnknownMode` if the key is not configured, or
    /// `CompletionInProgress` while a reply is outstanding
    pub fn switch_mode(&mut self, key: &str) -> Result<&ModeConfig> {
        self.ensure_idle()?;
        let index = self.registry.position(key)?;
        if self.active != index {
            tracing::info!("Switched to mode {}", key);
            self.active = index;
        }
        Ok(self.active_mode())
    }

    /// Make sure the active mode has an active conversation
    ///
    /// Keeps the current one if it still exists, otherwise picks the most
    /// recent conversation, otherwise creates a new one.
    pub fn ensure_active_conversation(&mut self) -> Result<Conversation> {
        self.reclaim_abandoned();
        let mode_key = self.active_key().to_string();

        if let Some(id) = self.active_ids.get(&mode_key) {
            if let Ok(conversation) = self.registry.store(&mode_key)?.get(id) {
                return Ok(conversation);
            }
            tracing::debug!("Active conversation {} no longer exists", id);
        }

        let store = self.registry.store_mut(&mode_key)?;
        let conversation = match store.list().into_iter().next() {
            Some(most_recent) => most_recent,
            None => store.create()?,
        };
        self.active_ids
            .insert(mode_key, conversation.conversation_id.clone());
        Ok(conversation)
    }

    /// Start a fresh conversation and make it active
    ///
    /// # Errors
    ///
    /// Returns `HistoryFull` if favorites leave no room for it; the active
    /// conversation is unchanged then.
    pub fn new_conversation(&mut self) -> Result<Conversation> {
        self.ensure_idle()?;
        let mode_key = self.active_key().to_string();
        let conversation = self.registry.store_mut(&mode_key)?.create()?;
        self.active_ids
            .insert(mode_key, conversation.conversation_id.clone());
        Ok(conversation)
    }

    /// Make a conversation active by id or unique id prefix
    ///
    /// # Errors
    ///
    /// Returns `ConversationNotFound` if nothing matches
    pub fn select_conversation(&mut self, id_or_prefix: &str) -> Result<Conversation> {
        self.ensure_idle()?;
        let mode_key = self.active_key().to_string();
        let store = self.registry.store(&mode_key)?;
        let id = store.resolve_id(id_or_prefix)?;
        let conversation = store.get(&id)?;
        self.active_ids.insert(mode_key, id);
        Ok(conversation)
    }

    /// Flip the favorite flag of a conversation in the active mode
    ///
    /// # Errors
    ///
    /// Returns `ConversationNotFound` or `FavoriteLimitExceeded`
    pub fn toggle_favorite(&mut self, id_or_prefix: &str) -> Result<Conversation> {
        self.ensure_idle()?;
        let mode_key = self.active_key().to_string();
        let store = self.registry.store_mut(&mode_key)?;
        let id = store.resolve_id(id_or_prefix)?;
        store.toggle_favorite(&id)
    }

    /// Delete a conversation in the active mode
    ///
    /// Clears the active conversation if it was the one deleted. Returns the
    /// deleted conversation's id.
    pub fn delete_conversation(&mut self, id_or_prefix: &str) -> Result<String> {
        self.ensure_idle()?;
        let mode_key = self.active_key().to_string();
        let store = self.registry.store_mut(&mode_key)?;
        let id = store.resolve_id(id_or_prefix)?;
        store.delete(&id)?;

        if self.active_ids.get(&mode_key) == Some(&id) {
            self.active_ids.remove(&mode_key);
        }
        Ok(id)
    }

    /// Record a user message and start generating the reply
    ///
    /// The user message is persisted before the completion starts. Must be
    /// called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `CompletionInProgress` if a reply is outstanding, or
    /// `EmptyMessage` if `text` is blank
    pub fn submit(&mut self, text: &str) -> Result<PendingReply> {
        self.ensure_idle()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(MindchatError::EmptyMessage.into());
        }

        let conversation_id = self.ensure_active_conversation()?.conversation_id;
        let mode_key = self.active_key().to_string();
        let system_prompt = self.registry.mode(&mode_key)?.system_prompt.clone();

        let conversation = self
            .registry
            .store_mut(&mode_key)?
            .append_message(&conversation_id, ChatMessage::user(text))?;
        let turns = assemble_prompt(&conversation.messages, system_prompt.as_deref());

        let provider = Arc::clone(&self.provider);
        let options = self.options;
        tracing::debug!(
            "Requesting reply for {} ({} turns)",
            conversation_id,
            turns.len()
        );
        let handle = tokio::spawn(async move { provider.complete(&turns, &options).await });
        let claim = Arc::new(());
        self.in_flight = Some(InFlight {
            mode_key: mode_key.clone(),
            conversation_id: conversation_id.clone(),
            abort: handle.abort_handle(),
            claim: Arc::downgrade(&claim),
        });

        Ok(PendingReply {
            mode_key,
            conversation_id,
            handle,
            claim,
        })
    }

    /// Wait for a pending reply and record the outcome
    ///
    /// On success the reply is appended and the updated conversation is
    /// returned. On failure, including an aborted or panicked task, the
    /// unanswered user message is removed and a `Provider` error is returned.
    pub async fn resolve(&mut self, pending: PendingReply) -> Result<Conversation> {
        let PendingReply {
            mode_key,
            conversation_id,
            handle,
            claim: _claim,
        } = pending;

        let outcome = match handle.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_cancelled() => {
                Err(MindchatError::Provider("Reply generation was cancelled".to_string()).into())
            }
            Err(join_error) => Err(MindchatError::Provider(format!(
                "Reply generation failed: {}",
                join_error
            ))
            .into()),
        };
        self.in_flight = None;

        let store = self.registry.store_mut(&mode_key)?;
        match outcome {
            Ok(reply) => store.append_message(&conversation_id, ChatMessage::assistant(reply)),
            Err(e) => {
                tracing::warn!("Reply for {} failed: {}", conversation_id, e);
                if let Err(rollback) = store.remove_trailing_user_message(&conversation_id) {
                    tracing::error!(
                        "Failed to roll back user message in {}: {}",
                        conversation_id,
                        rollback
                    );
                }

                match e.downcast_ref::<MindchatError>() {
                    Some(MindchatError::Provider(_)) => Err(e),
                    _ => Err(MindchatError::Provider(e.to_string()).into()),
                }
            }
        }
    }

    /// Stop a pending reply and roll its user turn back
    ///
    /// Returns the conversation as it is after the rollback.
    pub fn cancel(&mut self, pending: PendingReply) -> Result<Conversation> {
        pending.abort();
        self.in_flight = None;
        tracing::info!("Cancelled reply for {}", pending.conversation_id);
        self.registry
            .store_mut(&pending.mode_key)?
            .remove_trailing_user_message(&pending.conversation_id)
    }

    /// Submit a message and wait for the reply
    pub async fn send(&mut self, text: &str) -> Result<Conversation> {
        let pending = self.submit(text)?;
        self.resolve(pending).await
    }

    fn active_key(&self) -> &str {
        &self.active_mode().key
    }

    fn ensure_idle(&mut self) -> Result<()> {
        if self.is_busy() {
            return Err(MindchatError::CompletionInProgress.into());
        }
        self.reclaim_abandoned();
        Ok(())
    }

    /// Roll back a reply whose `PendingReply` was dropped unresolved
    fn reclaim_abandoned(&mut self) {
        let abandoned = match self.in_flight.take() {
            Some(flight) if !flight.is_claimed() => flight,
            other => {
                self.in_flight = other;
                return;
            }
        };

        abandoned.abort.abort();
        tracing::warn!(
            "Reply for {} was abandoned; removing the unanswered message",
            abandoned.conversation_id
        );
        let rollback = self
            .registry
            .store_mut(&abandoned.mode_key)
            .and_then(|store| store.remove_trailing_user_message(&abandoned.conversation_id));
        if let Err(e) = rollback {
            tracing::error!(
                "Failed to roll back user message in {}: {}",
                abandoned.conversation_id,
                e
            );
        }
    }
}
