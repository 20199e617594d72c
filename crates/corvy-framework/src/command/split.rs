use std::str::Chars;

use crate::error::TokenizeError;

/// Shell-like argument splitting.
///
/// Handles:
/// - Space, tab and newline separated arguments
/// - Single quotes (everything literal until the closing quote)
/// - Double quotes (backslash escapes `\`, `"`, `$` and `` ` ``)
/// - Backslash escapes outside quotes
/// - Empty quoted arguments (`""` yields an empty token)
///
/// An unclosed quote or a trailing lone backslash is an error.
pub fn shell_split(input: &str) -> Result<Vec<String>, TokenizeError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_token = true;
                read_single_quoted(&mut chars, &mut current)?;
            }
            '"' => {
                in_token = true;
                read_double_quoted(&mut chars, &mut current)?;
            }
            '\\' => {
                let escaped = chars.next().ok_or(TokenizeError::DanglingEscape)?;
                current.push(escaped);
                in_token = true;
            }
            ' ' | '\t' | '\n' | '\r' => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            _ => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if in_token {
        args.push(current);
    }

    Ok(args)
}

fn read_single_quoted(chars: &mut Chars<'_>, out: &mut String) -> Result<(), TokenizeError> {
    for ch in chars.by_ref() {
        if ch == '\'' {
            return Ok(());
        }
        out.push(ch);
    }
    Err(TokenizeError::UnterminatedQuote { quote: '\'' })
}

fn read_double_quoted(chars: &mut Chars<'_>, out: &mut String) -> Result<(), TokenizeError> {
    const UNTERMINATED: TokenizeError = TokenizeError::UnterminatedQuote { quote: '"' };

    while let Some(ch) = chars.next() {
        match ch {
            '"' => return Ok(()),
            '\\' => match chars.next() {
                Some(next @ ('\\' | '"' | '$' | '`')) => out.push(next),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => return Err(UNTERMINATED),
            },
            _ => out.push(ch),
        }
    }
    Err(UNTERMINATED)
}
