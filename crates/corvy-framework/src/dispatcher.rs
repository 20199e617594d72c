//! Per-message dispatch.
//!
//! For every incoming message the dispatcher:
//!
//! 1. publishes `message-received-raw`;
//! 2. stops if the author is a bot;
//! 3. looks up the first command whose prefix starts the content;
//! 4. on a match, strips the prefix, tokenizes and binds the rest, runs the
//!    handler and posts its reply, publishing `command-exception` on failure;
//! 5. otherwise publishes `message-received`.
//!
//! Nothing a handler or subscriber does can make [`Dispatcher::dispatch`]
//! fail.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use corvy_core::{Message, Outbox};
use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{Instrument, debug, debug_span, trace, warn};

use crate::command::{Signature, bind, shell_split};
use crate::error::{CommandError, RegisterError};
use crate::event::{BotEvent, EventBus, EventHandler, EventKind};
use crate::handler::{CommandHandler, panic_message};
use crate::registry::{Command, CommandRegistry};

/// What [`Dispatcher::dispatch`] did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The author is a bot; only the raw event was published.
    Ignored,
    /// A command matched. Its handler ran, or its failure was published.
    Command {
        /// The registered prefix of the matched command.
        prefix: String,
    },
    /// No command matched; `message-received` was published.
    Unmatched,
}

/// Routes messages to commands and event subscribers.
pub struct Dispatcher {
    registry: RwLock<CommandRegistry>,
    events: Arc<EventBus>,
    outbox: Outbox,
}

impl Dispatcher {
    /// Creates a dispatcher that replies through `outbox`.
    pub fn new(outbox: Outbox) -> Self {
        Self {
            registry: RwLock::new(CommandRegistry::new()),
            events: Arc::new(EventBus::new()),
            outbox,
        }
    }

    /// Registers a command. See [`CommandRegistry::register`].
    pub fn register_command<H: CommandHandler>(
        &self,
        prefix: impl Into<String>,
        signature: Signature,
        handler: H,
    ) -> Result<(), RegisterError> {
        self.registry.write().register(prefix, signature, handler)
    }

    /// Subscribes to one of the dispatcher's events.
    pub fn register_event<H: EventHandler>(&self, kind: EventKind, handler: H) {
        self.events.on(kind, handler);
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Registered prefixes, in registration order.
    pub fn prefixes(&self) -> Vec<String> {
        self.registry.read().prefixes().map(str::to_string).collect()
    }

    /// Handles one message. Never fails.
    pub async fn dispatch(&self, message: Arc<Message>) -> DispatchOutcome {
        let span = debug_span!("dispatch", message_id = message.id);
        self.dispatch_inner(message).instrument(span).await
    }

    async fn dispatch_inner(&self, message: Arc<Message>) -> DispatchOutcome {
        self.events
            .emit(BotEvent::MessageReceivedRaw(Arc::clone(&message)))
            .await;

        if message.is_from_bot() {
            trace!(author = %message.user.username, "Ignoring bot message");
            return DispatchOutcome::Ignored;
        }

        // Clone out of the lock; handlers may register commands.
        let matched = self
            .registry
            .read()
            .find(&message.content)
            .map(|(command, rest)| (command.clone(), rest.trim().to_string()));

        let Some((command, args_text)) = matched else {
            self.events
                .emit(BotEvent::MessageReceived(Arc::clone(&message)))
                .await;
            return DispatchOutcome::Unmatched;
        };

        debug!(prefix = %command.prefix(), author = %message.user.username, "Command matched");

        match run_command(&command, &args_text, &message).await {
            Ok(Some(reply)) => {
                if let Err(e) = self.outbox.reply(&message, &reply).await {
                    warn!(prefix = %command.prefix(), error = %e, "Failed to send reply");
                }
            }
            Ok(None) => {}
            Err(error) => {
                debug!(prefix = %command.prefix(), error = %error, "Command failed");
                self.events
                    .emit(BotEvent::CommandException {
                        prefix: command.prefix().to_string(),
                        message: Arc::clone(&message),
                        error: Arc::new(error),
                    })
                    .await;
            }
        }

        DispatchOutcome::Command {
            prefix: command.prefix().to_string(),
        }
    }
}

async fn run_command(
    command: &Command,
    args_text: &str,
    message: &Arc<Message>,
) -> Result<Option<String>, CommandError> {
    let tokens = shell_split(args_text)?;
    let args = bind(command.signature(), &tokens, message)?;

    let handler = Arc::clone(command.handler());
    match AssertUnwindSafe(async move { handler.call(args).await })
        .catch_unwind()
        .await
    {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(e)) => Err(CommandError::Handler(e)),
        Err(payload) => Err(CommandError::Panicked(panic_message(payload))),
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &*self.registry.read())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
