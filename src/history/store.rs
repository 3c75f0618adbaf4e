use crate::config::HistoryConfig;
use crate::error::{MindchatError, Result};
use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::types::{ChatMessage, Conversation, Role};

/// Limits applied by a [`HistoryStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    /// Maximum number of conversations kept; favorites may exceed it
    pub max_conversations: usize,
    /// Maximum number of favorite conversations
    pub max_favorites: usize,
    /// Maximum characters in a derived title
    pub title_max_chars: usize,
}

impl From<&HistoryConfig> for HistoryLimits {
    fn from(config: &HistoryConfig) -> Self {
        Self {
            max_conversations: config.max_conversations,
            max_favorites: config.max_favorites,
            title_max_chars: config.title_max_chars,
        }
    }
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self::from(&HistoryConfig::default())
    }
}

/// Durable, recency-ordered, bounded collection of conversations
///
/// One store owns one JSON history file. Index 0 of the in-memory collection
/// is the most recently created or touched conversation. Every mutating call
/// builds the next collection, writes it to disk, and only then replaces the
/// in-memory state, so a failed write or a rejected operation leaves the
/// store exactly as it was.
///
/// # Examples
///
/// ```
/// use mindchat::history::{ChatMessage, HistoryLimits, HistoryStore};
///
/// # fn main() -> mindchat::error::Result<()> {
/// let dir = tempfile::tempdir()?;
/// let mut store = HistoryStore::open(dir.path().join("history.json"), HistoryLimits::default())?;
///
/// let conversation = store.create()?;
/// store.append_message(&conversation.conversation_id, ChatMessage::user("Hello"))?;
///
/// assert_eq!(store.list()[0].title, "Hello");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    limits: HistoryLimits,
    conversations: Vec<Conversation>,
}

impl HistoryStore {
    /// Open the store backed by `path`
    ///
    /// Creates the parent directory and an empty history file when missing.
    /// A malformed file is treated as an empty collection; individual
    /// malformed records are skipped.
    ///
    /// # Errors
    ///
    /// Returns `MindchatError::Storage` if the directory or the initial file
    /// cannot be created.
    pub fn open(path: impl Into<PathBuf>, limits: HistoryLimits) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create history directory")
                .map_err(|e| MindchatError::Storage(e.to_string()))?;
        }

        if !path.exists() {
            fs::write(&path, "[]")
                .context("Failed to create history file")
                .map_err(|e| MindchatError::Storage(e.to_string()))?;
        }

        let conversations = load_conversations(&path);
        tracing::debug!(
            "Loaded {} conversations from {}",
            conversations.len(),
            path.display()
        );

        Ok(Self {
            path,
            limits,
            conversations,
        })
    }

    /// Path of the backing history file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Limits enforced by this store
    pub fn limits(&self) -> HistoryLimits {
        self.limits
    }

    /// Number of stored conversations
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Whether the store holds no conversations
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Snapshot of all conversations, most recent first
    pub fn list(&self) -> Vec<Conversation> {
        self.conversations.clone()
    }

    /// Fetch a conversation by id
    ///
    /// # Errors
    ///
    /// Returns `ConversationNotFound` if no conversation has that id
    pub fn get(&self, id: &str) -> Result<Conversation> {
        let index = self.position(id)?;
        Ok(self.conversations[index].clone())
    }

    /// Resolve a full id or a unique id prefix to a full conversation id
    ///
    /// # Errors
    ///
    /// Returns `ConversationNotFound` if nothing matches or the prefix is
    /// ambiguous.
    pub fn resolve_id(&self, id_or_prefix: &str) -> Result<String> {
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return Err(MindchatError::ConversationNotFound(needle.to_string()).into());
        }

        if let Some(exact) = self
            .conversations
            .iter()
            .find(|c| c.conversation_id == needle)
        {
            return Ok(exact.conversation_id.clone());
        }

        let mut matches = self
            .conversations
            .iter()
            .filter(|c| c.conversation_id.starts_with(needle));

        match (matches.next(), matches.next()) {
            (Some(only), None) => Ok(only.conversation_id.clone()),
            (Some(_), Some(_)) => Err(MindchatError::ConversationNotFound(format!(
                "{} (ambiguous prefix)",
                needle
            ))
            .into()),
            _ => Err(MindchatError::ConversationNotFound(needle.to_string()).into()),
        }
    }

    /// Number of favorite conversations
    pub fn favorite_count(&self) -> usize {
        self.conversations.iter().filter(|c| c.is_favorite).count()
    }

    /// Create an empty conversation at the top of the list
    ///
    /// # Errors
    ///
    /// Returns `HistoryFull` when favorites already fill the store, since the
    /// new conversation would be the only eviction candidate. Nothing is
    /// written in that case.
    pub fn create(&mut self) -> Result<Conversation> {
        let conversation = Conversation::new();
        let mut next = self.conversations.clone();
        next.insert(0, conversation.clone());
        enforce_capacity(&mut next, self.limits.max_conversations);
        if !next
            .iter()
            .any(|c| c.conversation_id == conversation.conversation_id)
        {
            return Err(MindchatError::HistoryFull {
                limit: self.limits.max_conversations,
            }
            .into());
        }
        self.commit(next)?;

        tracing::debug!("Created conversation {}", conversation.conversation_id);
        Ok(conversation)
    }

    /// Replace a conversation with the same id in place, or insert it at the top
    pub fn upsert(&mut self, conversation: Conversation) -> Result<()> {
        let mut next = self.conversations.clone();
        match next
            .iter()
            .position(|c| c.conversation_id == conversation.conversation_id)
        {
            Some(index) => next[index] = conversation,
            None => {
                next.insert(0, conversation);
                enforce_capacity(&mut next, self.limits.max_conversations);
            }
        }
        self.commit(next)
    }

    /// Append a message and promote the conversation to the top
    ///
    /// # Errors
    ///
    /// Returns `ConversationNotFound` if no conversation has that id
    pub fn append_message(&mut self, id: &str, message: ChatMessage) -> Result<Conversation> {
        let index = self.position(id)?;
        let mut next = self.conversations.clone();
        {
            let conversation = &mut next[index];
            conversation.messages.push(message);
            conversation.refresh_title(self.limits.title_max_chars);
            conversation.touch();
        }
        promote_to_top(&mut next, index);
        let updated = next[0].clone();
        self.commit(next)?;
        Ok(updated)
    }

    /// Remove the last message if it was written by the user
    ///
    /// Used to undo an unanswered user turn after a failed completion. When
    /// the conversation is empty or ends with an assistant message nothing
    /// changes and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `ConversationNotFound` if no conversation has that id
    pub fn remove_trailing_user_message(&mut self, id: &str) -> Result<Conversation> {
        let index = self.position(id)?;
        let ends_with_user = matches!(
            self.conversations[index].last_message(),
            Some(message) if message.role == Role::User
        );
        if !ends_with_user {
            return Ok(self.conversations[index].clone());
        }

        let mut next = self.conversations.clone();
        {
            let conversation = &mut next[index];
            conversation.messages.pop();
            conversation.refresh_title(self.limits.title_max_chars);
            conversation.touch();
        }
        let updated = next[index].clone();
        self.commit(next)?;

        tracing::debug!("Removed trailing user message from {}", id);
        Ok(updated)
    }

    /// Flip the favorite flag of a conversation
    ///
    /// # Errors
    ///
    /// Returns `ConversationNotFound` if no conversation has that id, or
    /// `FavoriteLimitExceeded` if enabling it would exceed the favorite cap.
    pub fn toggle_favorite(&mut self, id: &str) -> Result<Conversation> {
        let index = self.position(id)?;
        let target = !self.conversations[index].is_favorite;
        if target && self.favorite_count() >= self.limits.max_favorites {
            return Err(MindchatError::FavoriteLimitExceeded {
                limit: self.limits.max_favorites,
            }
            .into());
        }

        let mut next = self.conversations.clone();
        {
            let conversation = &mut next[index];
            conversation.is_favorite = target;
            conversation.touch();
        }
        promote_to_top(&mut next, index);
        let updated = next[0].clone();
        enforce_capacity(&mut next, self.limits.max_conversations);
        self.commit(next)?;
        Ok(updated)
    }

    /// Delete a conversation, favorite or not
    ///
    /// # Errors
    ///
    /// Returns `ConversationNotFound` if no conversation has that id
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let index = self.position(id)?;
        let mut next = self.conversations.clone();
        next.remove(index);
        self.commit(next)?;

        tracing::debug!("Deleted conversation {}", id);
        Ok(())
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.conversations
            .iter()
            .position(|c| c.conversation_id == id)
            .ok_or_else(|| MindchatError::ConversationNotFound(id.to_string()).into())
    }

    fn commit(&mut self, next: Vec<Conversation>) -> Result<()> {
        write_conversations(&self.path, &next)?;
        self.conversations = next;
        Ok(())
    }
}

/// Move the conversation at `index` to the front, keeping the others in order
fn promote_to_top(conversations: &mut [Conversation], index: usize) {
    if index == 0 {
        return;
    }
    conversations[..=index].rotate_right(1);
}

/// Evict the least recently updated non-favorites until the bound holds
///
/// Among equally old candidates the one furthest from the top goes first.
/// Stops early when only favorites remain.
fn enforce_capacity(conversations: &mut Vec<Conversation>, max_conversations: usize) {
    while conversations.len() > max_conversations {
        let mut oldest: Option<usize> = None;
        for (index, conversation) in conversations.iter().enumerate() {
            if conversation.is_favorite {
                continue;
            }
            match oldest {
                Some(current) if conversation.updated_at > conversations[current].updated_at => {}
                _ => oldest = Some(index),
            }
        }

        let Some(index) = oldest else {
            tracing::debug!(
                "History holds {} favorites beyond the limit of {}",
                conversations.len(),
                max_conversations
            );
            break;
        };

        let evicted = conversations.remove(index);
        tracing::info!(
            "Evicted conversation {} to stay within {} conversations",
            evicted.conversation_id,
            max_conversations
        );
    }
}

/// Read and parse a history file, recovering from any corruption
fn load_conversations(path: &Path) -> Vec<Conversation> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(
                "Failed to read history file {}: {}; starting empty",
                path.display(),
                e
            );
            return Vec::new();
        }
    };

    if contents.trim().is_empty() {
        return Vec::new();
    }

    let records = match serde_json::from_str::<serde_json::Value>(&contents) {
        Ok(serde_json::Value::Array(records)) => records,
        Ok(_) => {
            tracing::warn!(
                "History file {} is not a JSON array; starting empty",
                path.display()
            );
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(
                "History file {} is malformed: {}; starting empty",
                path.display(),
                e
            );
            return Vec::new();
        }
    };

    let mut conversations: Vec<Conversation> = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Conversation>(record) {
            Ok(conversation) => conversations.push(conversation),
            Err(e) => tracing::warn!(
                "Skipping malformed conversation record {} in {}: {}",
                index,
                path.display(),
                e
            ),
        }
    }

    // Recency order is recomputed from timestamps; the sort is stable so
    // equal timestamps keep their file order.
    conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let mut seen = std::collections::HashSet::new();
    conversations.retain(|c| {
        let first = seen.insert(c.conversation_id.clone());
        if !first {
            tracing::warn!(
                "Dropping duplicate conversation id {} in {}",
                c.conversation_id,
                path.display()
            );
        }
        first
    });

    conversations
}

/// Write the collection to a sibling temp file, then rename it into place
fn write_conversations(path: &Path, conversations: &[Conversation]) -> Result<()> {
    let json = serde_json::to_string_pretty(conversations)
        .context("Failed to serialize conversations")
        .map_err(|e| MindchatError::Storage(e.to_string()))?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "history.json".to_string());
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let mut tmp_file = fs::File::create(&tmp_path)
        .context("Failed to create temporary history file")
        .map_err(|e| MindchatError::Storage(e.to_string()))?;
    tmp_file
        .write_all(json.as_bytes())
        .and_then(|_| tmp_file.sync_all())
        .context("Failed to write temporary history file")
        .map_err(|e| MindchatError::Storage(e.to_string()))?;
    drop(tmp_file);

    fs::rename(&tmp_path, path)
        .context("Failed to replace history file")
        .map_err(|e| MindchatError::Storage(e.to_string()))?;

    Ok(())
}
