//! # Corvy Transport
//!
//! Network implementations of the [`Transport`](corvy_core::Transport)
//! capability defined in `corvy-core`.
//!
//! ## Features
//!
//! - `http-client`: REST client for the Corvy platform
//! - `full`: All transports
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  corvy-runtime      │  (polling loop, CorvyBot)
//! ├─────────────────────┤
//! │  corvy-core         │  (Transport trait, wire types)
//! ├─────────────────────┤
//! │  corvy-transport    │  <- This crate (implementations)
//! ├─────────────────────┤
//! │  Network (HTTP)     │
//! └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use corvy_transport::http::{HttpTransport, HttpTransportConfig};
//! use corvy_core::{Cursor, Transport};
//!
//! let transport = HttpTransport::new(HttpTransportConfig::new("my-token"))?;
//!
//! let me = transport.authenticate().await?;
//! let batch = transport.fetch_since(Cursor::START).await?;
//! ```

// Transport implementations (feature-gated)
#[cfg(feature = "http-client")]
pub mod http;

#[cfg(feature = "http-client")]
pub use http::{HttpTransport, HttpTransportConfig};
