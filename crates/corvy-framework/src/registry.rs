//! Prefix-keyed command registry.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::command::Signature;
use crate::error::RegisterError;
use crate::handler::{BoxedCommandHandler, CommandHandler};

/// A registered command: a prefix bound to a signature and a handler.
#[derive(Clone)]
pub struct Command {
    prefix: String,
    signature: Signature,
    handler: BoxedCommandHandler,
}

impl Command {
    /// The prefix as registered (case preserved).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn handler(&self) -> &BoxedCommandHandler {
        &self.handler
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("prefix", &self.prefix)
            .field("params", &self.signature.len())
            .finish_non_exhaustive()
    }
}

/// Commands in registration order.
///
/// Lookup is a case-insensitive "starts with" test against each prefix in
/// turn, so an earlier, shorter prefix shadows a later, longer one that
/// shares its beginning.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command.
    ///
    /// Registering a prefix that is already present (ignoring case) replaces
    /// the earlier command but keeps its position.
    pub fn register<H>(
        &mut self,
        prefix: impl Into<String>,
        signature: Signature,
        handler: H,
    ) -> Result<(), RegisterError>
    where
        H: CommandHandler,
    {
        let prefix = prefix.into();
        if prefix.trim().is_empty() {
            return Err(RegisterError::EmptyPrefix);
        }

        let command = Command {
            prefix,
            signature,
            handler: Arc::new(handler),
        };

        let existing = self
            .commands
            .iter_mut()
            .find(|c| same_prefix(&c.prefix, &command.prefix));

        match existing {
            Some(slot) => {
                warn!(
                    prefix = %command.prefix,
                    previous = %slot.prefix,
                    "Command prefix registered twice, replacing earlier handler"
                );
                *slot = command;
            }
            None => {
                debug!(prefix = %command.prefix, params = command.signature.len(), "Registered command");
                self.commands.push(command);
            }
        }

        Ok(())
    }

    /// Finds the first command whose prefix starts `content`.
    ///
    /// Returns the command and the text after the prefix (untrimmed).
    pub fn find<'a>(&self, content: &'a str) -> Option<(&Command, &'a str)> {
        self.commands.iter().find_map(|command| {
            strip_prefix_ignore_case(content, &command.prefix).map(|rest| (command, rest))
        })
    }

    /// Registered prefixes, in registration order.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.prefix.as_str())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn same_prefix(a: &str, b: &str) -> bool {
    strip_prefix_ignore_case(a, b).is_some_and(str::is_empty)
}

/// Strips `prefix` from the front of `content`, comparing case-insensitively.
fn strip_prefix_ignore_case<'a>(content: &'a str, prefix: &str) -> Option<&'a str> {
    let mut rest = content.chars();
    for expected in prefix.chars() {
        let actual = rest.next()?;
        if actual != expected && !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    Some(rest.as_str())
}
