//! Named-event fan-out.
//!
//! The dispatcher publishes three events per the lifecycle of a message:
//!
//! | name                   | when                                              |
//! |------------------------|---------------------------------------------------|
//! | `message-received-raw` | every fetched message, including the bot's own    |
//! | `message-received`     | a non-bot message that matched no command         |
//! | `command-exception`    | a matched command failed to tokenize, bind or run |
//!
//! Subscribers run one after another in registration order. A subscriber that
//! returns an error or panics is logged and skipped; the remaining subscribers
//! still run.

use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;

use corvy_core::Message;
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::{trace, warn};

use crate::error::{BoxError, CommandError};
use crate::handler::panic_message;

/// The events published by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MessageReceivedRaw,
    MessageReceived,
    CommandException,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        Self::MessageReceivedRaw,
        Self::MessageReceived,
        Self::CommandException,
    ];

    /// The event name subscribers register under.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MessageReceivedRaw => "message-received-raw",
            Self::MessageReceived => "message-received",
            Self::CommandException => "command-exception",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown event '{s}'"))
    }
}

/// Payload delivered to event subscribers.
#[derive(Debug, Clone)]
pub enum BotEvent {
    MessageReceivedRaw(Arc<Message>),
    MessageReceived(Arc<Message>),
    CommandException {
        /// The prefix of the command that failed.
        prefix: String,
        message: Arc<Message>,
        error: Arc<CommandError>,
    },
}

impl BotEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MessageReceivedRaw(_) => EventKind::MessageReceivedRaw,
            Self::MessageReceived(_) => EventKind::MessageReceived,
            Self::CommandException { .. } => EventKind::CommandException,
        }
    }

    /// The message this event is about.
    pub fn message(&self) -> &Arc<Message> {
        match self {
            Self::MessageReceivedRaw(message)
            | Self::MessageReceived(message)
            | Self::CommandException { message, .. } => message,
        }
    }
}

/// Conversion from a subscriber's return value.
pub trait EventOutcome: Send {
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl EventOutcome for () {
    fn into_outcome(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError> + Send> EventOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// An event subscriber.
///
/// Implemented for every `Fn(BotEvent) -> Fut` where `Fut` resolves to `()`
/// or `Result<(), E>`.
pub trait EventHandler: Send + Sync + 'static {
    fn call(&self, event: BotEvent) -> BoxFuture<'static, Result<(), BoxError>>;
}

impl<F, Fut, R> EventHandler for F
where
    F: Fn(BotEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: EventOutcome + 'static,
{
    fn call(&self, event: BotEvent) -> BoxFuture<'static, Result<(), BoxError>> {
        (self)(event).map(EventOutcome::into_outcome).boxed()
    }
}

pub type BoxedEventHandler = Arc<dyn EventHandler>;

/// Subscribers keyed by event name.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<String, Vec<BoxedEventHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a subscriber for `name`.
    pub fn subscribe<H: EventHandler>(&self, name: impl Into<String>, handler: H) {
        self.subscribers
            .write()
            .entry(name.into())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Appends a subscriber for one of the dispatcher's events.
    pub fn on<H: EventHandler>(&self, kind: EventKind, handler: H) {
        self.subscribe(kind.as_str(), handler);
    }

    /// Runs every subscriber of `name` in order. Unknown names are a no-op.
    pub async fn publish(&self, name: &str, event: BotEvent) {
        // Snapshot so subscribers may subscribe without deadlocking.
        let handlers = self.subscribers.read().get(name).cloned();
        let Some(handlers) = handlers else {
            return;
        };

        trace!(event = name, subscribers = handlers.len(), "Publishing event");

        for (index, handler) in handlers.iter().enumerate() {
            let event = event.clone();
            let outcome = AssertUnwindSafe(async move { handler.call(event).await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(event = name, subscriber = index, error = %e, "Event subscriber failed"),
                Err(payload) => warn!(
                    event = name,
                    subscriber = index,
                    panic = %panic_message(payload),
                    "Event subscriber panicked"
                ),
            }
        }
    }

    /// Publishes `event` under its kind's name.
    pub async fn emit(&self, event: BotEvent) {
        self.publish(event.kind().as_str(), event).await;
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.subscribers.read().get(name).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.subscribers.read();
        let mut map = f.debug_map();
        for (name, handlers) in subscribers.iter() {
            map.entry(name, &handlers.len());
        }
        map.finish()
    }
}
