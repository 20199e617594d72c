//! Error types for the Corvy framework.
//!
//! Every error in this module is scoped to a single command invocation (or a
//! single registration call). None of them is ever allowed to escape the
//! dispatcher: invocation failures are reported through the
//! `command-exception` event instead.

use thiserror::Error;

use crate::command::ParamType;

/// Boxed error returned by user handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to split a command's argument text into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// A quoted section was never closed.
    #[error("no closing quotation for {quote}")]
    UnterminatedQuote {
        /// The opening quote character.
        quote: char,
    },

    /// The input ended with a lone backslash.
    #[error("no escaped character after trailing backslash")]
    DanglingEscape,
}

/// Failure to convert a single token into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
    /// The token is not a valid literal of the target type.
    #[error("cannot convert '{token}' to {expected}")]
    TypeCast {
        /// Target type.
        expected: ParamType,
        /// The offending token.
        token: String,
    },

    /// The target type cannot be produced from text.
    #[error("type {0} cannot be converted from text")]
    Unsupported(ParamType),
}

/// Failure to bind tokens onto a handler signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// Tokens ran out before a required parameter.
    #[error("missing required argument '{name}'")]
    MissingArgument {
        /// Parameter name.
        name: String,
    },

    /// A token could not be converted to the parameter's type.
    #[error("invalid value for argument '{name}': cannot convert '{token}' to {expected}")]
    TypeCast {
        /// Parameter name.
        name: String,
        /// Declared type.
        expected: ParamType,
        /// The offending token.
        token: String,
    },

    /// A second, non-nullable message parameter was declared.
    #[error("argument '{name}' would receive the message a second time")]
    DuplicateInjection {
        /// Parameter name.
        name: String,
    },

    /// The parameter's declaration cannot be bound.
    #[error("unsupported parameter '{name}': {reason}")]
    UnsupportedType {
        /// Parameter name.
        name: String,
        /// What is wrong with the declaration.
        reason: String,
    },
}

impl BindError {
    /// Creates an unsupported-type error.
    pub fn unsupported(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedType {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Attaches a parameter name to a coercion failure.
    pub(crate) fn from_coerce(name: &str, err: CoerceError) -> Self {
        match err {
            CoerceError::TypeCast { expected, token } => Self::TypeCast {
                name: name.to_string(),
                expected,
                token,
            },
            CoerceError::Unsupported(kind) => {
                Self::unsupported(name, format!("type {kind} cannot be converted from text"))
            }
        }
    }
}

/// Failure while registering a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// The prefix is empty or whitespace only.
    #[error("command prefix must not be empty")]
    EmptyPrefix,
}

/// Any failure raised while running a matched command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The argument text could not be tokenized.
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    /// The tokens could not be bound to the handler's signature.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// The handler returned an error.
    #[error("{0}")]
    Handler(BoxError),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Errors that can occur while extracting a typed value from bound arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// No argument at the requested position.
    #[error("no argument at position {index} (handler has {len})")]
    OutOfRange {
        /// Requested position.
        index: usize,
        /// Number of bound arguments.
        len: usize,
    },

    /// No parameter with the requested name.
    #[error("no parameter named '{0}'")]
    UnknownName(String),

    /// The bound value has a different type.
    #[error("argument type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Requested type name.
        expected: &'static str,
        /// Bound value's type name.
        got: &'static str,
    },
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
