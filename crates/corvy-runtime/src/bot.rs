//! The bot surface.
//!
//! ```rust,ignore
//! use corvy_runtime::{CorvyBot, PollSettings};
//! use corvy_framework::{Args, Signature};
//!
//! let bot = CorvyBot::new(transport, PollSettings::default());
//!
//! bot.register_command(
//!     "!echo",
//!     Signature::builder().message("message").greedy_text("text").build()?,
//!     |args: Args| async move { args.named::<String>("text") },
//! )?;
//!
//! bot.run().await?;
//! ```

use std::sync::Arc;

use corvy_core::{BoxedTransport, Outbox, TransportResult};
use corvy_framework::{CommandHandler, Dispatcher, EventHandler, EventKind, Signature};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{RuntimeError, RuntimeResult};
use crate::polling::{LoopState, PollSettings, PollStats, PollingLoop};
use crate::signal::shutdown_signal;

/// A Corvy bot: commands, event subscribers and the polling loop that feeds
/// them.
///
/// Commands and subscribers can be registered at any time, including from
/// inside a handler while the bot is running.
pub struct CorvyBot {
    transport: BoxedTransport,
    dispatcher: Arc<Dispatcher>,
    settings: PollSettings,
    state: Arc<watch::Sender<LoopState>>,
    running: Mutex<Option<CancellationToken>>,
}

impl CorvyBot {
    pub fn new(transport: BoxedTransport, settings: PollSettings) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(Outbox::new(Arc::clone(&transport))));
        let (state, _) = watch::channel(LoopState::Idle);
        Self {
            transport,
            dispatcher,
            settings,
            state: Arc::new(state),
            running: Mutex::new(None),
        }
    }

    /// Builds a bot talking to the platform over HTTP.
    #[cfg(feature = "http-client")]
    pub fn from_config(config: &crate::config::BotConfig) -> RuntimeResult<Self> {
        use corvy_transport::http::{HttpTransport, HttpTransportConfig};

        let transport = HttpTransport::new(
            HttpTransportConfig::new(&config.api_token)
                .base_url(&config.api_base_url)
                .timeout(config.request_timeout()),
        )?;
        Ok(Self::new(Arc::new(transport), PollSettings::from(config)))
    }

    /// Registers a command under `prefix`.
    ///
    /// Prefixes are matched case-insensitively in registration order; the
    /// first one that starts a message wins.
    pub fn register_command<H: CommandHandler>(
        &self,
        prefix: impl Into<String>,
        signature: Signature,
        handler: H,
    ) -> RuntimeResult<()> {
        self.dispatcher
            .register_command(prefix, signature, handler)
            .map_err(RuntimeError::from)
    }

    /// Subscribes to one of the bot's events.
    pub fn register_event<H: EventHandler>(&self, kind: EventKind, handler: H) {
        self.dispatcher.register_event(kind, handler);
    }

    /// Posts a message into a nest.
    pub async fn send_message(
        &self,
        flock_id: u64,
        nest_id: u64,
        content: &str,
    ) -> TransportResult<()> {
        self.dispatcher
            .outbox()
            .send_message(flock_id, nest_id, content)
            .await
    }

    /// A send-only handle for use inside handlers and subscribers.
    pub fn outbox(&self) -> Outbox {
        self.dispatcher.outbox().clone()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Polls until `cancel` fires or [`stop`](Self::stop) is called.
    ///
    /// Returns an error if the bot cannot authenticate or establish its
    /// baseline, or if it is already running.
    pub async fn start(&self, cancel: CancellationToken) -> RuntimeResult<PollStats> {
        let token = cancel.child_token();
        {
            let mut running = self.running.lock();
            if running.is_some() {
                return Err(RuntimeError::AlreadyRunning);
            }
            *running = Some(token.clone());
        }
        let _guard = RunningGuard {
            running: &self.running,
            state: &self.state,
        };

        info!(prefixes = ?self.dispatcher.prefixes(), "Starting bot");

        let mut polling = PollingLoop::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.dispatcher),
            self.settings,
        )
        .with_state_channel(Arc::clone(&self.state));

        let result = polling.run(token).await;
        result.map(|()| polling.stats())
    }

    /// Asks a running bot to shut down. Has no effect otherwise.
    pub fn stop(&self) {
        if let Some(token) = self.running.lock().as_ref() {
            debug!("Stop requested");
            token.cancel();
        }
    }

    /// Polls until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<PollStats> {
        let cancel = CancellationToken::new();

        let watch_signals = async {
            tokio::select! {
                _ = shutdown_signal() => cancel.cancel(),
                _ = cancel.cancelled() => {}
            }
        };
        let poll = async {
            let result = self.start(cancel.clone()).await;
            cancel.cancel();
            result
        };

        let (result, ()) = tokio::join!(poll, watch_signals);
        result
    }
}

/// Frees the running slot when `start` returns or its future is dropped.
struct RunningGuard<'a> {
    running: &'a Mutex<Option<CancellationToken>>,
    state: &'a watch::Sender<LoopState>,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if let Some(token) = self.running.lock().take() {
            token.cancel();
        }
        self.state.send_if_modified(|state| {
            let changed = *state != LoopState::Stopped;
            *state = LoopState::Stopped;
            changed
        });
    }
}

impl std::fmt::Debug for CorvyBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorvyBot")
            .field("state", &self.state())
            .field("settings", &self.settings)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
