//! Echo Bot Example
//!
//! A simple demonstration of the Corvy framework: a few commands with typed
//! arguments, plus event subscribers for logging and error reporting.
//!
//! # Commands
//!
//! ```text
//! !echo <text...>      - Echo text back (quotes are honoured)
//! !hello               - Greet the author
//! !add <int> <int>     - Add two integers
//! !flip [guess: bool]  - Flip a coin, optionally guessing the side
//! !help                - List commands
//! ```
//!
//! # Usage
//!
//! ```bash
//! CORVY_BOT__API_TOKEN=... cargo run --package echo-bot
//! cargo run --package echo-bot -- --config ./corvy.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use corvy::prelude::*;
use corvy::framework::BindError;
use corvy::runtime::ConfigLoader;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "echo-bot", about = "A simple echo bot for Corvy")]
struct Cli {
    /// Configuration file to load instead of searching the default locations.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile (overrides `CORVY_PROFILE`).
    #[arg(short, long)]
    profile: Option<String>,
}

// ============================================================================
// Command Handlers
// ============================================================================

/// Echo command handler. A bare `!echo` gets no reply.
async fn echo(args: Args) -> Result<Option<String>> {
    let text: String = args.named("text")?;
    Ok((!text.is_empty()).then_some(text))
}

fn echo_signature() -> Result<Signature, BindError> {
    Signature::builder()
        .message("message")
        .greedy_text("text")
        .build()
}

async fn hello(args: Args) -> Result<String> {
    let message = args
        .message()
        .ok_or_else(|| anyhow!("no message to greet"))?;
    Ok(format!("Hello, {}!", message.user.username))
}

async fn add(args: Args) -> Result<String> {
    let a: i64 = args.named("a")?;
    let b: i64 = args.named("b")?;
    let sum = a
        .checked_add(b)
        .ok_or_else(|| anyhow!("{a} + {b} does not fit in 64 bits"))?;
    Ok(format!("{a} + {b} = {sum}"))
}

/// Derives the side from the message id.
async fn flip(args: Args) -> Result<String> {
    let message = args.message().ok_or_else(|| anyhow!("missing message"))?;
    let heads = message.id % 2 == 0;
    let side = if heads { "Heads" } else { "Tails" };

    let reply = match args.named::<Option<bool>>("guess")? {
        Some(guess) if guess == heads => format!("{side}! You guessed right."),
        Some(_) => format!("{side}. Better luck next time."),
        None => format!("{side}!"),
    };
    Ok(reply)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(profile) = &cli.profile {
        loader = loader.profile(profile);
    }
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    let config = loader.load().context("failed to load configuration")?;
    validate_config(&config).context("invalid configuration")?;

    init_from_config(&config.logging);

    let bot = CorvyBot::from_config(&config.bot)?;

    // ========================================================================
    // Register Commands
    // ========================================================================

    bot.register_command("!echo", echo_signature()?, echo)?;
    bot.register_command(
        "!hello",
        Signature::builder().message("message").build()?,
        hello,
    )?;
    bot.register_command(
        "!add",
        Signature::builder().integer("a").integer("b").build()?,
        add,
    )?;
    bot.register_command(
        "!flip",
        Signature::builder()
            .message("message")
            .param(ParamSpec::new("guess", ParamType::Boolean).nullable())
            .build()?,
        flip,
    )?;

    let dispatcher = Arc::downgrade(bot.dispatcher());
    bot.register_command("!help", Signature::empty(), move |_args: Args| {
        let commands = dispatcher
            .upgrade()
            .map(|d| d.prefixes().join(", "))
            .unwrap_or_default();
        async move { format!("Commands: {commands}") }
    })?;

    // ========================================================================
    // Register Event Subscribers
    // ========================================================================

    bot.register_event(EventKind::MessageReceived, |event: BotEvent| async move {
        if let BotEvent::MessageReceived(message) = event {
            info!(
                flock = %message.flock.name,
                nest = %message.nest.name,
                user = %message.user.username,
                "{}",
                message.content
            );
        }
    });

    let outbox = bot.outbox();
    bot.register_event(EventKind::CommandException, move |event: BotEvent| {
        let outbox = outbox.clone();
        async move {
            let BotEvent::CommandException {
                prefix,
                message,
                error,
            } = event
            else {
                return Ok(());
            };
            warn!(%prefix, error = %error, "Command failed");
            outbox
                .reply(&message, &format!("{prefix} failed: {error}"))
                .await
        }
    });

    // Run until Ctrl+C / SIGTERM
    let stats = bot.run().await?;
    info!(
        polls = stats.polls,
        dispatched = stats.dispatched,
        "Echo bot stopped"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvy::core::{RawMessage, RawUser};
    use corvy::framework::{bind, shell_split};

    fn message(content: &str) -> Arc<Message> {
        let raw = RawMessage {
            id: 42,
            content: content.to_string(),
            flock_id: 1,
            flock_name: "Corvids".into(),
            nest_id: 2,
            nest_name: "general".into(),
            created_at: "2025-03-01T12:00:00Z".into(),
            user: RawUser {
                id: 9,
                username: "crow".into(),
                is_bot: false,
                avatar_url: None,
            },
        };
        Arc::new(Message::try_from(raw).unwrap())
    }

    async fn run_echo(args_text: &str) -> Option<String> {
        let tokens = shell_split(args_text).unwrap();
        let args = bind(&echo_signature().unwrap(), &tokens, &message(args_text)).unwrap();
        echo(args).await.unwrap()
    }

    #[tokio::test]
    async fn test_echo_replies_with_text() {
        assert_eq!(run_echo(r#"hello "big world""#).await.as_deref(), Some("hello big world"));
    }

    #[tokio::test]
    async fn test_bare_echo_has_no_reply() {
        assert_eq!(run_echo("").await, None);
    }
}
