//! JSON bodies exchanged with the REST API.

use corvy_core::{BotIdentity, FetchBatch, RawMessage, TransportResult};
use serde::{Deserialize, Serialize};

/// `POST /auth` response.
#[derive(Debug, Deserialize)]
pub(super) struct AuthResponse {
    bot: AuthBot,
}

#[derive(Debug, Deserialize)]
struct AuthBot {
    #[serde(default)]
    id: Option<u64>,
    name: String,
}

impl From<AuthResponse> for BotIdentity {
    fn from(response: AuthResponse) -> Self {
        Self {
            id: response.bot.id,
            name: response.bot.name,
        }
    }
}

/// `GET /messages` response. Both fields may be absent.
#[derive(Debug, Deserialize)]
pub(super) struct MessagesResponse {
    #[serde(default)]
    cursor: Option<u64>,
    #[serde(default)]
    messages: Option<Vec<RawMessage>>,
}

impl From<MessagesResponse> for FetchBatch {
    fn from(response: MessagesResponse) -> Self {
        FetchBatch::new(response.cursor, response.messages.unwrap_or_default())
    }
}

/// `POST /flocks/{flock}/nests/{nest}/messages` body.
#[derive(Debug, Serialize)]
pub(super) struct SendMessageBody<'a> {
    pub content: &'a str,
}

pub(super) fn decode_identity(body: &str) -> TransportResult<BotIdentity> {
    let response: AuthResponse = serde_json::from_str(body)?;
    Ok(response.into())
}

pub(super) fn decode_batch(body: &str) -> TransportResult<FetchBatch> {
    let response: MessagesResponse = serde_json::from_str(body)?;
    Ok(response.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvy_core::TransportError;

    #[test]
    fn test_decode_identity() {
        let identity = decode_identity(r#"{"bot":{"id":7,"name":"Jackdaw"}}"#).unwrap();
        assert_eq!(identity.id, Some(7));
        assert_eq!(identity.name, "Jackdaw");

        let identity = decode_identity(r#"{"bot":{"name":"Rook"}}"#).unwrap();
        assert_eq!(identity.id, None);
    }

    #[test]
    fn test_decode_batch() {
        let body = r#"{
            "cursor": 105,
            "messages": [{
                "id": 105,
                "content": "!echo hi",
                "flock_id": 1,
                "flock_name": "Corvids",
                "nest_id": 2,
                "nest_name": "general",
                "created_at": "2025-03-01T12:00:00Z",
                "user": {"id": 9, "username": "crow", "is_bot": false}
            }]
        }"#;

        let batch = decode_batch(body).unwrap();
        assert_eq!(batch.cursor, Some(105));
        assert_eq!(batch.messages.len(), 1);
        assert_eq!(batch.messages[0].content, "!echo hi");
        assert_eq!(batch.messages[0].user.avatar_url, None);
    }

    #[test]
    fn test_decode_batch_missing_fields() {
        let batch = decode_batch("{}").unwrap();
        assert_eq!(batch.cursor, None);
        assert!(batch.messages.is_empty());

        let batch = decode_batch(r#"{"cursor":null,"messages":null}"#).unwrap();
        assert_eq!(batch.cursor, None);
        assert!(batch.messages.is_empty());
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_batch("<html>bad gateway</html>"),
            Err(TransportError::Decode(_))
        ));
        assert!(matches!(
            decode_identity(r#"{"ok":true}"#),
            Err(TransportError::Decode(_))
        ));
    }

    #[test]
    fn test_send_body() {
        let body = serde_json::to_string(&SendMessageBody { content: "hi" }).unwrap();
        assert_eq!(body, r#"{"content":"hi"}"#);
    }
}
