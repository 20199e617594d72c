//! Command handlers.
//!
//! A command handler is any `Fn(Args) -> impl Future` whose output implements
//! [`IntoReply`]. The reply, if any, is posted back to the nest the command
//! came from.
//!
//! ```rust,ignore
//! // No reply
//! async fn ping(_args: Args) {}
//!
//! // Always replies
//! async fn hello(_args: Args) -> &'static str {
//!     "Hello!"
//! }
//!
//! // Extraction failures become handler errors
//! async fn add(args: Args) -> Result<String, ExtractError> {
//!     let a: i64 = args.named("a")?;
//!     let b: i64 = args.named("b")?;
//!     Ok((a + b).to_string())
//! }
//! ```

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::command::Args;
use crate::error::BoxError;

/// What a handler invocation produced: optional reply text, or a failure.
pub type Reply = Result<Option<String>, BoxError>;

// ============================================================================
// IntoReply - Handler return values
// ============================================================================

/// Conversion from a handler's return value into a [`Reply`].
pub trait IntoReply: Send {
    fn into_reply(self) -> Reply;
}

/// `()` sends nothing.
impl IntoReply for () {
    fn into_reply(self) -> Reply {
        Ok(None)
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Reply {
        Ok(Some(self))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Reply {
        Ok(Some(self.to_string()))
    }
}

/// `None` sends nothing.
impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Reply {
        match self {
            Some(inner) => inner.into_reply(),
            None => Ok(None),
        }
    }
}

/// `Err` is reported as a handler failure.
impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError> + Send,
{
    fn into_reply(self) -> Reply {
        match self {
            Ok(inner) => inner.into_reply(),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// CommandHandler
// ============================================================================

/// A type-erased command handler.
///
/// Implemented for every `Fn(Args) -> Fut` where `Fut` resolves to an
/// [`IntoReply`] value.
pub trait CommandHandler: Send + Sync + 'static {
    /// Invokes the handler with bound arguments.
    fn call(&self, args: Args) -> BoxFuture<'static, Reply>;
}

impl<F, Fut, R> CommandHandler for F
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + 'static,
{
    fn call(&self, args: Args) -> BoxFuture<'static, Reply> {
        (self)(args).map(IntoReply::into_reply).boxed()
    }
}

/// A shareable command handler.
pub type BoxedCommandHandler = Arc<dyn CommandHandler>;

/// Renders a panic payload for diagnostics.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Signature;
    use crate::error::ExtractError;

    fn empty_args() -> Args {
        Args::new(Signature::empty(), Vec::new())
    }

    #[test]
    fn test_into_reply_variants() {
        assert!(matches!(().into_reply(), Ok(None)));
        assert!(matches!("hi".into_reply(), Ok(Some(ref s)) if s == "hi"));
        assert!(matches!(None::<String>.into_reply(), Ok(None)));
        assert!(matches!(Some("x".to_string()).into_reply(), Ok(Some(_))));

        let failed: Result<String, ExtractError> = Err(ExtractError::UnknownName("a".into()));
        let err = failed.into_reply().unwrap_err();
        assert_eq!(err.to_string(), "no parameter named 'a'");
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let handler: BoxedCommandHandler =
            Arc::new(|args: Args| async move { format!("{} args", args.len()) });
        let reply = handler.call(empty_args()).await.unwrap();
        assert_eq!(reply.as_deref(), Some("0 args"));
    }

    #[tokio::test]
    async fn test_fn_item_handler() {
        async fn silent(_args: Args) {}

        let reply = CommandHandler::call(&silent, empty_args()).await.unwrap();
        assert!(reply.is_none());
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(7_u8)), "unknown panic payload");
    }
}
