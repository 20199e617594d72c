//! Command argument handling.
//!
//! A command's argument text goes through three stages before it reaches a
//! handler:
//!
//! ```text
//! "!echo 'hello there' 3"
//!   │  strip prefix "!echo", trim
//!   ▼
//! split   ──▶ ["hello there", "3"]
//!   │
//!   ▼
//! binder  ──▶ [Message(..), Text("hello there"), Integer(3)]   (Signature-driven)
//!   │
//!   ▼
//! Args    ──▶ args.get::<i64>(2)
//! ```
//!
//! Signatures are declared explicitly when a command is registered:
//!
//! ```rust,ignore
//! use corvy_framework::{ParamSpec, ParamType, Signature};
//!
//! let signature = Signature::builder()
//!     .message("message")
//!     .greedy_text("text")
//!     .param(ParamSpec::new("times", ParamType::Integer).with_default(1))
//!     .build()?;
//! ```

pub mod args;
pub mod binder;
pub mod coerce;
pub mod signature;
pub mod split;

pub use args::{ArgValue, Args, FromArg};
pub use binder::bind;
pub use coerce::{coerce, parse_bool};
pub use signature::{ParamSpec, ParamType, Signature, SignatureBuilder};
pub use split::shell_split;
