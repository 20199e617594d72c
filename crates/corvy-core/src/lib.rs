//! # Corvy Core
//!
//! The data model and external capability boundary of the Corvy bot framework.
//!
//! ## Contents
//!
//! - **Messages**: the immutable [`Message`] produced from the platform's
//!   [`RawMessage`] JSON payload
//! - **Cursor**: the monotonic [`Cursor`] watermark owned by the polling loop
//! - **Transport**: the [`Transport`] capability (authenticate, fetch, post)
//!   and the narrower [`Outbox`] send capability handed to handlers
//! - **Errors**: the [`TransportError`] taxonomy shared by every layer
//!
//! ```text
//! ┌──────────────┐  fetch_since   ┌──────────────┐  Arc<Message>  ┌────────────┐
//! │  Transport   │───────────────▶│ Polling loop │───────────────▶│ Dispatcher │
//! │ (HTTP, mock) │◀───────────────│   (cursor)   │                │ (handlers) │
//! └──────────────┘  post_message  └──────────────┘                └────────────┘
//! ```

pub mod cursor;
pub mod error;
pub mod message;
pub mod transport;

pub use cursor::Cursor;
pub use error::{TransportError, TransportResult};
pub use message::{
    Message, MessageFlock, MessageNest, MessageUser, RawMessage, RawUser, TimestampError,
};
pub use transport::{BotIdentity, BoxedTransport, FetchBatch, Outbox, Transport};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{Cursor, FetchBatch, Message, Outbox, Transport, TransportError};
}
