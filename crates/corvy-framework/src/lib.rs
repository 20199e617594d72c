//! # Corvy Framework
//!
//! Command handling and event fan-out for Corvy bots.
//!
//! This layer provides:
//! - A quoting-aware tokenizer for command arguments
//! - Declarative handler signatures ([`Signature`]) checked at registration
//! - The argument binder that maps tokens onto a signature, including the
//!   injected message parameter and greedy parameters
//! - The [`CommandRegistry`] (first registered prefix wins)
//! - The [`EventBus`] for `message-received-raw`, `message-received` and
//!   `command-exception` subscribers
//! - The [`Dispatcher`] tying it all together for one incoming message
//!
//! Nothing here knows about polling or cursors; the runtime layer feeds
//! messages into [`Dispatcher::dispatch`] one at a time.

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod handler;
pub mod registry;

pub use command::{
    ArgValue, Args, FromArg, ParamSpec, ParamType, Signature, SignatureBuilder, bind, coerce,
    shell_split,
};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{
    BindError, BoxError, CoerceError, CommandError, ExtractError, ExtractResult, RegisterError,
    TokenizeError,
};
pub use event::{BotEvent, BoxedEventHandler, EventBus, EventHandler, EventKind, EventOutcome};
pub use handler::{BoxedCommandHandler, CommandHandler, IntoReply, Reply};
pub use registry::{Command, CommandRegistry};
