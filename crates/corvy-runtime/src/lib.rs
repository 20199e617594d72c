//! Corvy Runtime - Orchestration layer for the Corvy bot framework.
//!
//! This crate provides:
//! - The bot surface ([`CorvyBot`]) for registering commands and subscribers
//! - The cursor-driven [`PollingLoop`]
//! - Layered configuration (defaults, files, `CORVY_*` environment)
//! - Logging configuration
//!
//! ```ignore
//! use corvy_runtime::{CorvyBot, config::load_config, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let bot = CorvyBot::from_config(&config.bot)?;
//!     // register commands here
//!
//!     // Run until Ctrl+C
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output
//! - `http-client`: the HTTP transport and [`CorvyBot::from_config`]

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod polling;
pub mod signal;

// Re-exports
pub use bot::CorvyBot;
pub use config::{
    BotConfig, ConfigError, ConfigLoader, ConfigResult, CorvyConfig, LoggingConfig,
    validate_config,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use polling::{LoopState, PollSettings, PollStats, PollingLoop};
pub use signal::shutdown_signal;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
