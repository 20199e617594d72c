//! Message types.
//!
//! # Hierarchy
//!
//! ```text
//! RawMessage { id, content, flock_id, flock_name, nest_id, nest_name, created_at, user }
//! └── (TryFrom) Message { id, content, flock, nest, created_at, user }
//!     ├── MessageFlock { id, name }
//!     ├── MessageNest  { id, name }
//!     └── MessageUser  { id, username, is_bot, avatar_url }
//! ```
//!
//! [`RawMessage`] mirrors the platform's JSON payload field-for-field. The
//! polling loop converts it into a [`Message`] once, then shares it read-only
//! behind an `Arc` with every subscriber and handler.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// Wire Types
// ============================================================================

/// Author information as sent by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUser {
    /// User ID.
    pub id: u64,
    /// Username.
    pub username: String,
    /// Whether the author is a bot.
    #[serde(default)]
    pub is_bot: bool,
    /// Avatar URL.
    #[serde(default, alias = "photo_url", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A message exactly as returned by the message-polling endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Message ID.
    pub id: u64,
    /// Text content.
    pub content: String,
    /// Origin flock ID.
    pub flock_id: u64,
    /// Origin flock name.
    #[serde(default)]
    pub flock_name: String,
    /// Origin nest ID.
    pub nest_id: u64,
    /// Origin nest name.
    #[serde(default)]
    pub nest_name: String,
    /// Creation time, `YYYY-MM-DDTHH:MM:SSZ`.
    pub created_at: String,
    /// Author.
    pub user: RawUser,
}

/// The `created_at` field of a [`RawMessage`] is not a valid timestamp.
#[derive(Debug, Clone, Error)]
#[error("invalid created_at timestamp '{value}': {reason}")]
pub struct TimestampError {
    /// The offending value.
    pub value: String,
    /// Parser diagnostic.
    pub reason: String,
}

// ============================================================================
// Message
// ============================================================================

/// The flock a message was posted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFlock {
    pub id: u64,
    pub name: String,
}

/// The nest a message was posted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNest {
    pub id: u64,
    pub name: String,
}

/// The author of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageUser {
    pub id: u64,
    pub username: String,
    pub is_bot: bool,
    pub avatar_url: Option<String>,
}

/// A chat message received from the platform.
///
/// Messages are immutable once constructed and are shared as
/// `Arc<Message>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message ID.
    pub id: u64,
    /// Text content.
    pub content: String,
    /// Origin flock.
    pub flock: MessageFlock,
    /// Origin nest.
    pub nest: MessageNest,
    /// Creation time (UTC).
    pub created_at: OffsetDateTime,
    /// Author.
    pub user: MessageUser,
}

impl Message {
    /// Returns the `(flock_id, nest_id)` pair replies should be posted to.
    pub fn origin(&self) -> (u64, u64) {
        (self.flock.id, self.nest.id)
    }

    /// Returns true if the message was written by a bot account.
    pub fn is_from_bot(&self) -> bool {
        self.user.is_bot
    }
}

impl TryFrom<RawMessage> for Message {
    type Error = TimestampError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let created_at =
            OffsetDateTime::parse(&raw.created_at, &Rfc3339).map_err(|e| TimestampError {
                value: raw.created_at.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            id: raw.id,
            content: raw.content,
            flock: MessageFlock {
                id: raw.flock_id,
                name: raw.flock_name,
            },
            nest: MessageNest {
                id: raw.nest_id,
                name: raw.nest_name,
            },
            created_at,
            user: MessageUser {
                id: raw.user.id,
                username: raw.user.username,
                is_bot: raw.user.is_bot,
                avatar_url: raw.user.avatar_url,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const SAMPLE: &str = r#"{
        "id": 101,
        "content": "!echo hi",
        "flock_name": "Birds",
        "flock_id": 7,
        "nest_name": "general",
        "nest_id": 3,
        "created_at": "2025-03-01T12:30:45Z",
        "user": { "id": 55, "username": "robin", "is_bot": false }
    }"#;

    #[test]
    fn test_decode_and_convert() {
        let raw: RawMessage = serde_json::from_str(SAMPLE).unwrap();
        let message = Message::try_from(raw).unwrap();

        assert_eq!(message.id, 101);
        assert_eq!(message.content, "!echo hi");
        assert_eq!(message.origin(), (7, 3));
        assert_eq!(message.flock.name, "Birds");
        assert_eq!(message.nest.name, "general");
        assert_eq!(message.user.username, "robin");
        assert!(!message.is_from_bot());
        assert_eq!(message.user.avatar_url, None);
        assert_eq!(message.created_at, datetime!(2025-03-01 12:30:45 UTC));
    }

    #[test]
    fn test_photo_url_alias() {
        let json = r#"{ "id": 1, "username": "crow", "is_bot": true, "photo_url": "https://x/y.png" }"#;
        let user: RawUser = serde_json::from_str(json).unwrap();
        assert!(user.is_bot);
        assert_eq!(user.avatar_url.as_deref(), Some("https://x/y.png"));
    }

    #[test]
    fn test_invalid_timestamp() {
        let mut raw: RawMessage = serde_json::from_str(SAMPLE).unwrap();
        raw.created_at = "yesterday".into();
        let err = Message::try_from(raw).unwrap_err();
        assert_eq!(err.value, "yesterday");
    }
}
