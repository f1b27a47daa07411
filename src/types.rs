use std::fmt;

use chrono::{DateTime, Utc};

/// How a message reached us, or how the answer went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Voice,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Voice => "voice",
        }
    }

    #[cfg(test)]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "text" => Some(MessageKind::Text),
            "voice" => Some(MessageKind::Voice),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who sent an inbound message.
#[derive(Debug, Clone)]
pub struct Sender {
    pub user_id: i64,
    /// Telegram username without the leading `@`; empty when the user has none.
    pub username: String,
}

/// What an inbound message carries.
#[derive(Debug, Clone)]
pub enum Payload {
    Text(String),
    /// A voice note, referenced by the channel's file id. Downloaded lazily,
    /// after the quota gate.
    Voice { file_id: String },
    Command { name: String, arg: String },
}

/// One inbound message, already stripped of transport details.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub sender: Sender,
    pub payload: Payload,
}

impl InboundMessage {
    pub fn input_kind(&self) -> MessageKind {
        match self.payload {
            Payload::Voice { .. } => MessageKind::Voice,
            _ => MessageKind::Text,
        }
    }
}

/// One successfully delivered exchange.
#[derive(Debug, Clone)]
pub struct InteractionRecord {
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub username: String,
    pub input_kind: MessageKind,
    pub input_text: String,
    pub output_kind: MessageKind,
    pub output_text: String,
}

pub const DEFAULT_NOTE_CATEGORY: &str = "general";

/// A captured note.
#[derive(Debug, Clone)]
pub struct NoteRecord {
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub category: String,
}

impl NoteRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            text: text.into(),
            category: DEFAULT_NOTE_CATEGORY.to_string(),
        }
    }
}

/// Per-user daily request counter, as read back from storage.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuota {
    pub user_id: i64,
    pub username: String,
    pub window: chrono::NaiveDate,
    pub count: u32,
}
