//! The transport capability.
//!
//! The framework never talks to the network itself. Everything it needs from
//! the platform is expressed by the [`Transport`] trait:
//!
//! - `authenticate`: validate credentials and learn the bot's identity
//! - `fetch_since`: fetch the messages newer than a [`Cursor`]
//! - `post_message`: post text into a nest
//!
//! The polling loop owns the transport exclusively. Handlers and event
//! subscribers only ever see an [`Outbox`], which exposes posting and nothing
//! else, so they cannot touch the cursor or the session lifecycle.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cursor::Cursor;
use crate::error::TransportResult;
use crate::message::{Message, RawMessage};

/// Identity returned by a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    /// Bot user ID, if the platform reports one.
    #[serde(default)]
    pub id: Option<u64>,
    /// Display name.
    pub name: String,
}

/// One page of the message-polling endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchBatch {
    /// The server's current high-water mark, if reported.
    #[serde(default)]
    pub cursor: Option<u64>,
    /// New messages, oldest first.
    #[serde(default)]
    pub messages: Vec<RawMessage>,
}

impl FetchBatch {
    /// Creates a batch with a cursor and messages.
    pub fn new(cursor: Option<u64>, messages: Vec<RawMessage>) -> Self {
        Self { cursor, messages }
    }

    /// Creates an empty batch that reports no cursor.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// The platform capability consumed by the framework.
///
/// Implementations must be cheap to share (`Arc<dyn Transport>`); the runtime
/// never calls two methods concurrently on the same instance but handlers may
/// post through an [`Outbox`] while the loop is idle.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Authenticates the bot.
    async fn authenticate(&self) -> TransportResult<BotIdentity>;

    /// Fetches every message newer than `cursor`.
    ///
    /// A cursor of [`Cursor::START`] is used once at startup to learn the
    /// server's current watermark.
    async fn fetch_since(&self, cursor: Cursor) -> TransportResult<FetchBatch>;

    /// Posts `content` into the given nest.
    async fn post_message(&self, flock_id: u64, nest_id: u64, content: &str)
    -> TransportResult<()>;

    /// Releases the underlying session.
    async fn close(&self) {}
}

/// Shared transport handle.
pub type BoxedTransport = Arc<dyn Transport>;

/// Send-only view of a [`Transport`].
///
/// This is the capability handed to command handlers and event subscribers.
#[derive(Clone)]
pub struct Outbox {
    transport: BoxedTransport,
}

impl Outbox {
    /// Wraps a transport.
    pub fn new(transport: BoxedTransport) -> Self {
        Self { transport }
    }

    /// Posts a message into a nest.
    pub async fn send_message(
        &self,
        flock_id: u64,
        nest_id: u64,
        content: &str,
    ) -> TransportResult<()> {
        trace!(flock_id, nest_id, len = content.len(), "Posting message");
        let result = self.transport.post_message(flock_id, nest_id, content).await;
        if let Err(e) = &result {
            debug!(flock_id, nest_id, error = %e, "Posting message failed");
        }
        result
    }

    /// Posts a message into the nest `message` came from.
    pub async fn reply(&self, message: &Message, content: &str) -> TransportResult<()> {
        let (flock_id, nest_id) = message.origin();
        self.send_message(flock_id, nest_id, content).await
    }
}

impl fmt::Debug for Outbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outbox").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        posted: Mutex<Vec<(u64, u64, String)>>,
        reject: bool,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn authenticate(&self) -> TransportResult<BotIdentity> {
            Err(TransportError::Closed)
        }

        async fn fetch_since(&self, _cursor: Cursor) -> TransportResult<FetchBatch> {
            Ok(FetchBatch::empty())
        }

        async fn post_message(
            &self,
            flock_id: u64,
            nest_id: u64,
            content: &str,
        ) -> TransportResult<()> {
            if self.reject {
                return Err(TransportError::SendFailed("nest is read-only".into()));
            }
            self.posted
                .lock()
                .await
                .push((flock_id, nest_id, content.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_outbox_forwards_to_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let outbox = Outbox::new(transport.clone());

        outbox.send_message(1, 2, "hello").await.unwrap();

        let posted = transport.posted.lock().await;
        assert_eq!(posted.as_slice(), &[(1, 2, "hello".to_string())]);
    }

    #[tokio::test]
    async fn test_outbox_returns_send_failure() {
        let transport = Arc::new(RecordingTransport {
            reject: true,
            ..Default::default()
        });
        let outbox = Outbox::new(transport.clone());

        let result = outbox.send_message(1, 2, "hello").await;

        assert!(matches!(result, Err(TransportError::SendFailed(_))));
        assert!(transport.posted.lock().await.is_empty());
    }

    #[test]
    fn test_fetch_batch_tolerates_missing_fields() {
        let batch: FetchBatch = serde_json::from_str("{}").unwrap();
        assert_eq!(batch, FetchBatch::empty());

        let batch: FetchBatch = serde_json::from_str(r#"{"cursor": null}"#).unwrap();
        assert_eq!(batch.cursor, None);

        let batch: FetchBatch = serde_json::from_str(r#"{"cursor": 17, "messages": []}"#).unwrap();
        assert_eq!(batch.cursor, Some(17));
    }
}
