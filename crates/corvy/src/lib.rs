//! # Corvy
//!
//! A typed, async command-bot framework for the Corvy chat platform.
//!
//! ## Architecture
//!
//! A bot polls the platform for new messages and routes each one through a
//! dispatcher:
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌─────────┐     ┌─────────┐
//! │ PollingLoop │────▶│ Dispatcher │────▶│ binder  │────▶│ handler │──▶ reply
//! │  (cursor)   │     │            │     └─────────┘     └─────────┘
//! └─────────────┘     └────────────┘────▶ EventBus subscribers
//! ```
//!
//! - **PollingLoop**: authenticates, establishes a baseline cursor, then fetches
//!   new messages on an interval
//! - **Dispatcher**: matches a command prefix (case-insensitive, first
//!   registered wins) and publishes events
//! - **Binder**: maps shell-style tokens onto the handler's [`Signature`]
//! - **Handlers**: async closures returning text to reply with
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use corvy::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     init_from_config(&config.logging);
//!
//!     let bot = CorvyBot::from_config(&config.bot)?;
//!     bot.register_command(
//!         "!echo",
//!         Signature::builder().message("msg").greedy_text("text").build()?,
//!         |args: Args| async move { args.named::<String>("text") },
//!     )?;
//!
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output
//! - `http-client` *(default)*: the REST transport
//!
//! [`Signature`]: corvy_framework::Signature

pub use corvy_core as core;
pub use corvy_framework as framework;
pub use corvy_runtime as runtime;
pub use corvy_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use corvy::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use corvy_runtime::{CorvyBot, PollSettings, RuntimeError, RuntimeResult};

    // Configuration and logging
    pub use corvy_runtime::config::{load_config, load_config_from_file, validate_config};
    pub use corvy_runtime::logging::init_from_config;

    // Commands - for declaring handlers
    pub use corvy_framework::{
        ArgValue, Args, CommandError, FromArg, ParamSpec, ParamType, Signature,
    };

    // Events
    pub use corvy_framework::{BotEvent, EventKind};

    // Messages and sending
    pub use corvy_core::{Message, Outbox, TransportError};
}
