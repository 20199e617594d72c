//! Token to value conversion.

use super::args::ArgValue;
use super::signature::ParamType;
use crate::error::CoerceError;

/// Tokens that convert to `true`, compared case-insensitively.
///
/// Every other token converts to `false`; boolean conversion never fails.
const TRUTHY: [&str; 5] = ["1", "true", "yes", "y", "t"];

/// Converts `token` into a value of type `kind`.
///
/// - `Text` is the identity.
/// - `Integer` accepts a base-10 signed 64-bit integer, ignoring surrounding
///   whitespace.
/// - `Real` accepts a decimal floating point literal.
/// - `Boolean` follows [`parse_bool`].
/// - `Message` cannot be produced from text.
pub fn coerce(kind: ParamType, token: &str) -> Result<ArgValue, CoerceError> {
    let cast_error = || CoerceError::TypeCast {
        expected: kind,
        token: token.to_string(),
    };

    match kind {
        ParamType::Text => Ok(ArgValue::Text(token.to_string())),
        ParamType::Integer => token
            .trim()
            .parse::<i64>()
            .map(ArgValue::Integer)
            .map_err(|_| cast_error()),
        ParamType::Real => token
            .trim()
            .parse::<f64>()
            .map(ArgValue::Real)
            .map_err(|_| cast_error()),
        ParamType::Boolean => Ok(ArgValue::Boolean(parse_bool(token))),
        ParamType::Message => Err(CoerceError::Unsupported(kind)),
    }
}

/// Returns `true` iff the lowercased token is one of `1`, `true`, `yes`, `y`, `t`.
///
/// `"0"`, `"false"`, `"no"` and every unrecognised token yield `false`.
pub fn parse_bool(token: &str) -> bool {
    TRUTHY.iter().any(|truthy| token.eq_ignore_ascii_case(truthy))
}
