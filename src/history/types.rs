use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Title shown for conversations without any user message yet
pub const PLACEHOLDER_TITLE: &str = "New conversation";

/// Author of a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting
    User,
    /// The model
    Assistant,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a stored conversation
///
/// # Examples
///
/// ```
/// use mindchat::history::{ChatMessage, Role};
///
/// let msg = ChatMessage::user("Hello");
/// assert_eq!(msg.role, Role::User);
/// assert_eq!(msg.content, "Hello");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message
    pub role: Role,
    /// Message text
    pub content: String,
    /// Creation time, second precision UTC
    #[serde(
        default = "epoch",
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message with the given role stamped with the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: now_utc(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A stored conversation
///
/// Conversations are created and mutated through
/// [`HistoryStore`](super::HistoryStore); the field layout matches the
/// on-disk JSON record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique, immutable identifier
    pub conversation_id: String,
    /// Display title derived from the first user message
    #[serde(default = "placeholder_title")]
    pub title: String,
    /// Messages in append order
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Favorites are exempt from capacity eviction
    #[serde(default)]
    pub is_favorite: bool,
    /// Creation time
    #[serde(
        default = "epoch",
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: DateTime<Utc>,
    /// Time of the last mutation; drives recency order
    #[serde(
        default = "epoch",
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation with a fresh id
    pub fn new() -> Self {
        let now = now_utc();
        Self {
            conversation_id: Uuid::new_v4().to_string(),
            title: PLACEHOLDER_TITLE.to_string(),
            messages: Vec::new(),
            is_favorite: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Last message, if any
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Refresh `updated_at`, never moving it before `created_at`
    pub(crate) fn touch(&mut self) {
        self.updated_at = now_utc().max(self.created_at);
    }

    /// Recompute the title from the current messages
    pub(crate) fn refresh_title(&mut self, max_chars: usize) {
        self.title = derive_title(&self.messages, max_chars);
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a display title from the first user message
///
/// Uses the first non-blank line of the first user message, truncated to
/// `max_chars` characters with a trailing ellipsis. Falls back to
/// [`PLACEHOLDER_TITLE`] when there is no usable user message.
///
/// # Examples
///
/// ```
/// use mindchat::history::{derive_title, ChatMessage, PLACEHOLDER_TITLE};
///
/// assert_eq!(derive_title(&[], 10), PLACEHOLDER_TITLE);
///
/// let messages = vec![ChatMessage::user("I can't sleep at night lately")];
/// assert_eq!(derive_title(&messages, 9), "I can't s…");
/// ```
pub fn derive_title(messages: &[ChatMessage], max_chars: usize) -> String {
    let first_line = messages
        .iter()
        .find(|m| m.role == Role::User)
        .and_then(|m| m.content.lines().map(str::trim).find(|l| !l.is_empty()));

    let Some(line) = first_line else {
        return PLACEHOLDER_TITLE.to_string();
    };

    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    line.chars().take(max_chars).collect::<String>() + "…"
}

/// Current time truncated to whole seconds
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

fn placeholder_title() -> String {
    PLACEHOLDER_TITLE.to_string()
}

/// Parse an ISO-8601 timestamp, treating anything unparseable as the epoch
///
/// Offset-less values are read as UTC.
pub fn parse_timestamp(value: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }
    tracing::debug!("Unparseable timestamp {:?}, treating as epoch", value);
    epoch()
}

fn serialize_timestamp<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Secs, false))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::String(s) => parse_timestamp(&s),
        _ => epoch(),
    })
}
