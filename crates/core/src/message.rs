//! Chat events — the unit of work flowing into the classifier.
//!
//! An ingest adapter extracts sender, text and emotes from whatever the host
//! platform delivers and hands over one [`ChatEvent`] per message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single chat message as delivered by an ingest adapter.
///
/// Immutable once built; the classifier consumes each event exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Platform-specific sender identifier
    pub sender_id: String,

    /// Message text with emotes already extracted
    #[serde(default)]
    pub raw_text: String,

    /// Emote codes in the order they appeared in the message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emote_tokens: Vec<String>,

    /// Privileged sender (moderator, broadcaster, ...) as decided by the host
    #[serde(default)]
    pub is_exempt: bool,

    /// Whether the message is a reply to another message
    #[serde(default)]
    pub is_reply: bool,

    /// When the message was received
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ChatEvent {
    /// Create a plain text event stamped with the current time.
    pub fn new(sender_id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            raw_text: raw_text.into(),
            emote_tokens: Vec::new(),
            is_exempt: false,
            is_reply: false,
            timestamp: Utc::now(),
        }
    }

    /// Attach emote codes.
    pub fn with_emotes<I, S>(mut self, emotes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emote_tokens = emotes.into_iter().map(Into::into).collect();
        self
    }

    /// Override the receive time.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn exempt(mut self) -> Self {
        self.is_exempt = true;
        self
    }

    pub fn reply(mut self) -> Self {
        self.is_reply = true;
        self
    }

    /// Truncated text for log lines.
    pub fn preview(&self) -> String {
        const MAX: usize = 60;
        if self.raw_text.chars().count() <= MAX {
            self.raw_text.clone()
        } else {
            let cut: String = self.raw_text.chars().take(MAX).collect();
            format!("{cut}…")
        }
    }
}
