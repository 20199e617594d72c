//! Runtime error types.

use corvy_core::TransportError;
use corvy_framework::RegisterError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop a bot from starting or running.
///
/// Transport failures while polling are not in here; the loop logs and
/// retries them.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The platform rejected the bot's credentials, or could not be reached.
    #[error("Authentication failed: {0}")]
    Authentication(#[source] TransportError),

    /// The initial fetch that positions the cursor failed.
    #[error("Failed to establish message baseline: {0}")]
    Baseline(#[source] TransportError),

    /// The transport could not be constructed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Register(#[from] RegisterError),

    /// `start` was called while the bot is already polling.
    #[error("Bot is already running")]
    AlreadyRunning,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
