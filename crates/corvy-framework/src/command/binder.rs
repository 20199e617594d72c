//! Signature-driven argument binding.

use std::sync::Arc;

use corvy_core::Message;

use super::args::{ArgValue, Args};
use super::coerce::coerce;
use super::signature::{ParamSpec, Signature};
use crate::error::BindError;

/// Binds `tokens` onto `signature`, injecting `message`.
///
/// Parameters are visited in declared order with a cursor into `tokens`:
///
/// 1. **Message** parameters consume no tokens. The first one receives the
///    message; any later one must be nullable and receives
///    [`ArgValue::None`], otherwise binding fails with
///    [`BindError::DuplicateInjection`].
/// 2. **Greedy** parameters take every remaining token except one per
///    parameter declared after them, joined with single spaces. Taking zero
///    tokens is legal and yields an empty string for text.
/// 3. **Scalar** parameters take one token. Once tokens are exhausted the
///    default is used, then `None` for nullable parameters, otherwise binding
///    fails with [`BindError::MissingArgument`]. For nullable parameters the
///    token `none` (any case) binds `None`.
///
/// Tokens left over after the last parameter are ignored.
pub fn bind(
    signature: &Signature,
    tokens: &[String],
    message: &Arc<Message>,
) -> Result<Args, BindError> {
    let params = signature.params();
    let mut values = Vec::with_capacity(params.len());
    let mut idx = 0;
    let mut injected = false;

    for (position, param) in params.iter().enumerate() {
        let value = if param.is_message() {
            if !injected {
                injected = true;
                ArgValue::Message(Arc::clone(message))
            } else if param.is_nullable() {
                ArgValue::None
            } else {
                return Err(BindError::DuplicateInjection {
                    name: param.name().to_string(),
                });
            }
        } else if param.is_greedy() {
            let reserved = params.len() - position - 1;
            let take = (tokens.len() - idx).saturating_sub(reserved);
            let joined = tokens[idx..idx + take].join(" ");
            idx += take;
            coerce_param(param, &joined)?
        } else if let Some(token) = tokens.get(idx) {
            idx += 1;
            if param.is_nullable() && token.eq_ignore_ascii_case("none") {
                ArgValue::None
            } else {
                coerce_param(param, token)?
            }
        } else if let Some(default) = param.default() {
            default.clone()
        } else if param.is_nullable() {
            ArgValue::None
        } else {
            return Err(BindError::MissingArgument {
                name: param.name().to_string(),
            });
        };

        values.push(value);
    }

    Ok(Args::new(signature.clone(), values))
}

fn coerce_param(param: &ParamSpec, token: &str) -> Result<ArgValue, BindError> {
    coerce(param.kind(), token).map_err(|e| BindError::from_coerce(param.name(), e))
}
