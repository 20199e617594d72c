//! Declarative handler signatures.
//!
//! A [`Signature`] is the ordered list of parameters a command handler
//! accepts. It is built once, when the command is registered, and validated
//! at that point so that malformed declarations are rejected up front rather
//! than on the first matching message.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::args::ArgValue;
use crate::error::BindError;

/// The declared type of a handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// Free text.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit floating point number.
    Real,
    /// Boolean (see [`parse_bool`](super::parse_bool)).
    Boolean,
    /// The triggering message, injected rather than parsed.
    Message,
}

impl ParamType {
    /// Returns the canonical name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Boolean => "boolean",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "str" | "string" | "text" => Ok(Self::Text),
            "int" | "integer" => Ok(Self::Integer),
            "float" | "real" => Ok(Self::Real),
            "bool" | "boolean" => Ok(Self::Boolean),
            "message" => Ok(Self::Message),
            other => Err(format!("unknown parameter type '{other}'")),
        }
    }
}

/// Description of one handler parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    name: String,
    kind: ParamType,
    nullable: bool,
    greedy: bool,
    default: Option<ArgValue>,
}

impl ParamSpec {
    /// Creates a required, non-greedy parameter.
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            greedy: false,
            default: None,
        }
    }

    /// Marks the parameter as nullable.
    ///
    /// A nullable parameter binds to [`ArgValue::None`] when tokens run out or
    /// when its token is the literal `none` (any case).
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the parameter as greedy.
    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    /// Sets the value bound when tokens run out.
    pub fn with_default(mut self, value: impl Into<ArgValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamType {
        self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    pub fn default(&self) -> Option<&ArgValue> {
        self.default.as_ref()
    }

    /// Returns true if the parameter may be omitted.
    pub fn is_optional(&self) -> bool {
        self.nullable || self.default.is_some()
    }

    /// Returns true if this is a message-injection slot.
    pub fn is_message(&self) -> bool {
        self.kind == ParamType::Message
    }

    fn validate(&self) -> Result<(), BindError> {
        if self.is_message() {
            if self.greedy {
                return Err(BindError::unsupported(
                    &self.name,
                    "message parameters cannot be greedy",
                ));
            }
            if self.default.is_some() {
                return Err(BindError::unsupported(
                    &self.name,
                    "message parameters cannot have a default value",
                ));
            }
            return Ok(());
        }

        match &self.default {
            Some(ArgValue::None) if !self.nullable => Err(BindError::unsupported(
                &self.name,
                "a none default requires a nullable parameter",
            )),
            Some(ArgValue::None) | None => Ok(()),
            Some(value) if value.param_type() == Some(self.kind) => Ok(()),
            Some(value) => Err(BindError::unsupported(
                &self.name,
                format!(
                    "default value of type {} does not match declared type {}",
                    value.type_name(),
                    self.kind
                ),
            )),
        }
    }
}

/// The validated, ordered parameter list of a handler.
///
/// Cloning is cheap; the parameter list is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    params: Arc<[ParamSpec]>,
}

impl Signature {
    /// Starts building a signature.
    pub fn builder() -> SignatureBuilder {
        SignatureBuilder::default()
    }

    /// Validates and wraps a parameter list.
    pub fn new(params: Vec<ParamSpec>) -> Result<Self, BindError> {
        for param in &params {
            param.validate()?;
        }
        Ok(Self {
            params: params.into(),
        })
    }

    /// A signature with no parameters.
    pub fn empty() -> Self {
        Self {
            params: Arc::from(Vec::new()),
        }
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the position of the parameter called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builder for [`Signature`].
///
/// Errors from type names given as strings are remembered and reported by
/// [`build`](Self::build), so the builder can be chained freely.
#[derive(Debug, Default)]
pub struct SignatureBuilder {
    params: Vec<ParamSpec>,
    error: Option<BindError>,
}

impl SignatureBuilder {
    /// Appends a parameter.
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Appends a parameter whose type is given by name (`"int"`, `"str"`, ...).
    pub fn typed(self, name: impl Into<String>, type_name: &str) -> Self {
        let name = name.into();
        match type_name.parse::<ParamType>() {
            Ok(kind) => self.param(ParamSpec::new(name, kind)),
            Err(reason) => self.fail(BindError::unsupported(name, reason)),
        }
    }

    /// Appends the message-injection parameter.
    pub fn message(self, name: impl Into<String>) -> Self {
        self.param(ParamSpec::new(name, ParamType::Message))
    }

    pub fn text(self, name: impl Into<String>) -> Self {
        self.param(ParamSpec::new(name, ParamType::Text))
    }

    pub fn integer(self, name: impl Into<String>) -> Self {
        self.param(ParamSpec::new(name, ParamType::Integer))
    }

    pub fn real(self, name: impl Into<String>) -> Self {
        self.param(ParamSpec::new(name, ParamType::Real))
    }

    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.param(ParamSpec::new(name, ParamType::Boolean))
    }

    /// Appends a greedy text parameter.
    pub fn greedy_text(self, name: impl Into<String>) -> Self {
        self.param(ParamSpec::new(name, ParamType::Text).greedy())
    }

    /// Validates the parameters and builds the signature.
    pub fn build(self) -> Result<Signature, BindError> {
        match self.error {
            Some(err) => Err(err),
            None => Signature::new(self.params),
        }
    }

    fn fail(mut self, err: BindError) -> Self {
        self.error.get_or_insert(err);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_type_from_str() {
        assert_eq!("int".parse::<ParamType>(), Ok(ParamType::Integer));
        assert_eq!("STR".parse::<ParamType>(), Ok(ParamType::Text));
        assert_eq!("float".parse::<ParamType>(), Ok(ParamType::Real));
        assert_eq!("Boolean".parse::<ParamType>(), Ok(ParamType::Boolean));
        assert_eq!("message".parse::<ParamType>(), Ok(ParamType::Message));
        assert!("list".parse::<ParamType>().is_err());
    }

    #[test]
    fn test_builder_preserves_order() {
        let signature = Signature::builder()
            .message("msg")
            .greedy_text("text")
            .integer("count")
            .build()
            .unwrap();

        let names: Vec<_> = signature.params().iter().map(ParamSpec::name).collect();
        assert_eq!(names, vec!["msg", "text", "count"]);
        assert!(signature.params()[1].is_greedy());
        assert_eq!(signature.position("count"), Some(2));
    }

    #[test]
    fn test_unknown_type_name_rejected_at_build() {
        let err = Signature::builder()
            .message("msg")
            .typed("items", "list")
            .typed("count", "int")
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::UnsupportedType { ref name, .. } if name == "items"));
    }

    #[test]
    fn test_greedy_message_rejected() {
        let err = Signature::builder()
            .param(ParamSpec::new("msg", ParamType::Message).greedy())
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::UnsupportedType { .. }));
    }

    #[test]
    fn test_default_must_match_type() {
        let err = Signature::builder()
            .param(ParamSpec::new("count", ParamType::Integer).with_default("three"))
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::UnsupportedType { .. }));

        let ok = Signature::builder()
            .param(ParamSpec::new("count", ParamType::Integer).with_default(3))
            .param(
                ParamSpec::new("label", ParamType::Text)
                    .nullable()
                    .with_default(ArgValue::None),
            )
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_optional_flags() {
        let required = ParamSpec::new("a", ParamType::Text);
        let nullable = ParamSpec::new("b", ParamType::Text).nullable();
        let defaulted = ParamSpec::new("c", ParamType::Boolean).with_default(false);
        assert!(!required.is_optional());
        assert!(nullable.is_optional());
        assert!(defaulted.is_optional());
    }
}
