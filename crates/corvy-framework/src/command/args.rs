//! Bound argument values and typed extraction.
//!
//! Handlers receive their arguments as [`Args`], aligned with the handler's
//! [`Signature`]. Values can be read positionally or by parameter name, and
//! converted to Rust types through [`FromArg`]:
//!
//! ```rust,ignore
//! async fn add(args: Args) -> Result<String, ExtractError> {
//!     let a: i64 = args.get(1)?;
//!     let b: i64 = args.named("b")?;
//!     Ok(format!("{}", a + b))
//! }
//! ```

use std::sync::Arc;

use corvy_core::Message;

use super::signature::{ParamType, Signature};
use crate::error::{ExtractError, ExtractResult};

/// A single bound argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// The absent value bound to nullable parameters.
    None,
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    /// The injected message.
    Message(Arc<Message>),
}

impl ArgValue {
    /// Returns the name of this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Boolean(_) => "boolean",
            Self::Message(_) => "message",
        }
    }

    /// Returns the parameter type this value belongs to, `None` for the absent value.
    pub fn param_type(&self) -> Option<ParamType> {
        match self {
            Self::None => None,
            Self::Text(_) => Some(ParamType::Text),
            Self::Integer(_) => Some(ParamType::Integer),
            Self::Real(_) => Some(ParamType::Real),
            Self::Boolean(_) => Some(ParamType::Boolean),
            Self::Message(_) => Some(ParamType::Message),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

/// Conversion from a bound argument into a Rust value.
pub trait FromArg: Sized {
    /// Converts a bound argument.
    fn from_arg(value: &ArgValue) -> ExtractResult<Self>;
}

fn mismatch<T>(expected: &'static str, value: &ArgValue) -> ExtractResult<T> {
    Err(ExtractError::TypeMismatch {
        expected,
        got: value.type_name(),
    })
}

impl FromArg for ArgValue {
    fn from_arg(value: &ArgValue) -> ExtractResult<Self> {
        Ok(value.clone())
    }
}

impl FromArg for String {
    fn from_arg(value: &ArgValue) -> ExtractResult<Self> {
        match value {
            ArgValue::Text(text) => Ok(text.clone()),
            other => mismatch("text", other),
        }
    }
}

impl FromArg for i64 {
    fn from_arg(value: &ArgValue) -> ExtractResult<Self> {
        match value {
            ArgValue::Integer(n) => Ok(*n),
            other => mismatch("integer", other),
        }
    }
}

impl FromArg for f64 {
    fn from_arg(value: &ArgValue) -> ExtractResult<Self> {
        match value {
            ArgValue::Real(n) => Ok(*n),
            other => mismatch("real", other),
        }
    }
}

impl FromArg for bool {
    fn from_arg(value: &ArgValue) -> ExtractResult<Self> {
        match value {
            ArgValue::Boolean(b) => Ok(*b),
            other => mismatch("boolean", other),
        }
    }
}

impl FromArg for Arc<Message> {
    fn from_arg(value: &ArgValue) -> ExtractResult<Self> {
        match value {
            ArgValue::Message(message) => Ok(Arc::clone(message)),
            other => mismatch("message", other),
        }
    }
}

impl<T: FromArg> FromArg for Option<T> {
    fn from_arg(value: &ArgValue) -> ExtractResult<Self> {
        match value {
            ArgValue::None => Ok(None),
            other => T::from_arg(other).map(Some),
        }
    }
}

/// The arguments bound for one handler invocation.
#[derive(Debug, Clone)]
pub struct Args {
    signature: Signature,
    values: Vec<ArgValue>,
}

impl Args {
    pub(crate) fn new(signature: Signature, values: Vec<ArgValue>) -> Self {
        debug_assert_eq!(signature.len(), values.len());
        Self { signature, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns all values in signature order.
    pub fn values(&self) -> &[ArgValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<ArgValue> {
        self.values
    }

    /// Returns the raw value at `index`.
    pub fn value(&self, index: usize) -> Option<&ArgValue> {
        self.values.get(index)
    }

    /// Extracts the value at `index`.
    pub fn get<T: FromArg>(&self, index: usize) -> ExtractResult<T> {
        let value = self.values.get(index).ok_or(ExtractError::OutOfRange {
            index,
            len: self.values.len(),
        })?;
        T::from_arg(value)
    }

    /// Extracts the value of the parameter called `name`.
    pub fn named<T: FromArg>(&self, name: &str) -> ExtractResult<T> {
        let index = self
            .signature
            .position(name)
            .ok_or_else(|| ExtractError::UnknownName(name.to_string()))?;
        self.get(index)
    }

    /// Returns the injected message, if the signature declares one.
    pub fn message(&self) -> Option<Arc<Message>> {
        self.values.iter().find_map(|value| match value {
            ArgValue::Message(message) => Some(Arc::clone(message)),
            _ => None,
        })
    }
}
