//! Configuration for Corvy bots.
//!
//! Settings are layered with figment (defaults, files, `CORVY_*` environment
//! variables, programmatic overrides) and checked by [`validate_config`]
//! before a bot is built from them.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, CorvyConfig, DEFAULT_API_BASE_URL, LogFormat, LogLevel, LogOutput, LogRotation,
    LoggingConfig, SpanEventConfig,
};
pub use validation::validate_config;
