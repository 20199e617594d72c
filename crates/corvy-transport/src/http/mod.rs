//! HTTP transport.
//!
//! This module provides the REST client for the Corvy platform.

mod client;
mod wire;

pub use client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HttpTransport, HttpTransportConfig};
