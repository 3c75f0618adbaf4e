//! Conversation history persistence
//!
//! Each chat mode owns one [`HistoryStore`] backed by a JSON file holding an
//! array of [`Conversation`] records. The store keeps conversations ordered
//! by recency, bounds their number (favorites excepted), and survives
//! corrupted or hand-edited files by skipping what it cannot read.

mod store;
mod types;

pub use store::{HistoryLimits, HistoryStore};
pub use types::{
    derive_title, now_utc, parse_timestamp, ChatMessage, Conversation, Role, PLACEHOLDER_TITLE,
};
