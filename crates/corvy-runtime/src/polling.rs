//! The cursor-driven polling loop.
//!
//! ```text
//! Idle ─▶ Authenticating ─▶ BaselineEstablishing ─▶ Polling ─▶ ShuttingDown ─▶ Stopped
//!              │ error               │ error          │  ▲
//!              ▼                     ▼                ▼  │ fetch, dispatch, sleep
//!            (fatal)              (fatal)             └──┘ (backoff on error)
//! ```
//!
//! The loop owns the [`Cursor`]. The baseline fetch only positions it, its
//! messages are discarded. Every later fetch asks for messages newer than the
//! cursor, advances the cursor when the server reports a newer one, and hands
//! the messages to the [`Dispatcher`] one at a time, in order.
//!
//! Cancellation is observed while waiting on the network and while sleeping;
//! a batch that is being dispatched always finishes first.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use corvy_core::{BoxedTransport, Cursor, FetchBatch, Message};
use corvy_framework::Dispatcher;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::BotConfig;
use crate::error::{RuntimeError, RuntimeResult};

/// Timing of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Sleep after a successful poll.
    pub poll_interval: Duration,
    /// Sleep after a failed poll.
    pub failure_backoff: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            failure_backoff: Duration::from_secs(5),
        }
    }
}

impl From<&BotConfig> for PollSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            failure_backoff: config.failure_backoff(),
        }
    }
}

/// Lifecycle state of a [`PollingLoop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopState {
    #[default]
    Idle,
    Authenticating,
    BaselineEstablishing,
    Polling,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Authenticating => "authenticating",
            Self::BaselineEstablishing => "baseline",
            Self::Polling => "polling",
            Self::ShuttingDown => "shutting-down",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Counters kept by a [`PollingLoop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Fetches after the baseline, successful or not.
    pub polls: u64,
    /// Fetches that failed.
    pub failures: u64,
    /// Messages handed to the dispatcher.
    pub dispatched: u64,
    /// Messages dropped because they could not be converted.
    pub skipped: u64,
}

pub struct PollingLoop {
    transport: BoxedTransport,
    dispatcher: Arc<Dispatcher>,
    settings: PollSettings,
    cursor: Cursor,
    state: Arc<watch::Sender<LoopState>>,
    stats: PollStats,
}

impl PollingLoop {
    pub fn new(
        transport: BoxedTransport,
        dispatcher: Arc<Dispatcher>,
        settings: PollSettings,
    ) -> Self {
        let (state, _) = watch::channel(LoopState::Idle);
        Self {
            transport,
            dispatcher,
            settings,
            cursor: Cursor::START,
            state: Arc::new(state),
            stats: PollStats::default(),
        }
    }

    /// Publishes state changes on an existing channel.
    pub fn with_state_channel(mut self, state: Arc<watch::Sender<LoopState>>) -> Self {
        state.send_replace(*self.state.borrow());
        self.state = state;
        self
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    /// Watches state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn stats(&self) -> PollStats {
        self.stats
    }

    /// Runs until `cancel` fires or startup fails.
    ///
    /// Authentication and baseline failures are returned. Poll failures are
    /// logged and retried after the backoff. The transport is closed and the
    /// state ends in [`LoopState::Stopped`] either way.
    pub async fn run(&mut self, cancel: CancellationToken) -> RuntimeResult<()> {
        let result = self.run_until_cancelled(&cancel).await;

        self.set_state(LoopState::ShuttingDown);
        self.transport.close().await;
        self.set_state(LoopState::Stopped);

        match &result {
            Ok(()) => info!(
                cursor = %self.cursor,
                polls = self.stats.polls,
                failures = self.stats.failures,
                dispatched = self.stats.dispatched,
                "Polling stopped"
            ),
            Err(e) => error!(error = %e, "Polling loop failed to start"),
        }

        result
    }

    async fn run_until_cancelled(&mut self, cancel: &CancellationToken) -> RuntimeResult<()> {
        self.set_state(LoopState::Authenticating);
        let transport = Arc::clone(&self.transport);
        let Some(identity) = until_cancelled(cancel, transport.authenticate()).await else {
            return Ok(());
        };
        let identity = identity.map_err(RuntimeError::Authentication)?;
        info!(bot = %identity.name, "Authenticated");

        self.set_state(LoopState::BaselineEstablishing);
        let Some(baseline) = until_cancelled(cancel, transport.fetch_since(Cursor::START)).await
        else {
            return Ok(());
        };
        let baseline = baseline.map_err(RuntimeError::Baseline)?;
        self.cursor.advance(baseline.cursor);
        info!(
            cursor = %self.cursor,
            discarded = baseline.messages.len(),
            "Baseline established"
        );

        self.set_state(LoopState::Polling);
        loop {
            let Some(fetched) = until_cancelled(cancel, transport.fetch_since(self.cursor)).await
            else {
                break;
            };
            self.stats.polls += 1;

            let delay = match fetched {
                Ok(batch) => {
                    self.handle_batch(batch).await;
                    self.settings.poll_interval
                }
                Err(e) => {
                    self.stats.failures += 1;
                    warn!(
                        error = %e,
                        cursor = %self.cursor,
                        retry_in = ?self.settings.failure_backoff,
                        "Poll failed"
                    );
                    self.settings.failure_backoff
                }
            };

            if until_cancelled(cancel, tokio::time::sleep(delay))
                .await
                .is_none()
            {
                break;
            }
        }

        Ok(())
    }

    async fn handle_batch(&mut self, batch: FetchBatch) {
        let previous = self.cursor;
        if self.cursor.advance(batch.cursor) {
            trace!(from = %previous, to = %self.cursor, "Cursor advanced");
        } else if let Some(reported) = batch.cursor.filter(|c| *c < previous.value()) {
            debug!(reported, current = %previous, "Ignoring stale cursor");
        }

        if batch.messages.is_empty() {
            return;
        }
        debug!(count = batch.messages.len(), "Dispatching batch");

        for raw in batch.messages {
            let id = raw.id;
            match Message::try_from(raw) {
                Ok(message) => {
                    let outcome = self.dispatcher.dispatch(Arc::new(message)).await;
                    self.stats.dispatched += 1;
                    trace!(message_id = id, ?outcome, "Dispatched");
                }
                Err(e) => {
                    self.stats.skipped += 1;
                    warn!(message_id = id, error = %e, "Skipping malformed message");
                }
            }
        }
    }

    fn set_state(&self, state: LoopState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "Loop state changed");
        }
    }
}

impl fmt::Debug for PollingLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingLoop")
            .field("state", &self.state())
            .field("cursor", &self.cursor)
            .field("settings", &self.settings)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Awaits `fut` unless `cancel` fires first.
async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use corvy_core::{
        BotIdentity, Outbox, RawMessage, RawUser, Transport, TransportError, TransportResult,
    };
    use corvy_framework::{Args, BotEvent, EventKind, Signature};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio_test::{assert_err, assert_ok};

    /// Replays scripted fetch results, then cancels the loop.
    struct ScriptedTransport {
        auth: Mutex<Option<TransportResult<BotIdentity>>>,
        fetches: Mutex<VecDeque<TransportResult<FetchBatch>>>,
        requested: Mutex<Vec<u64>>,
        posted: Mutex<Vec<(u64, u64, String)>>,
        closed: AtomicBool,
        cancel: CancellationToken,
    }

    impl ScriptedTransport {
        fn new(
            cancel: &CancellationToken,
            fetches: Vec<TransportResult<FetchBatch>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                auth: Mutex::new(Some(Ok(BotIdentity {
                    id: Some(1),
                    name: "corvid".into(),
                }))),
                fetches: Mutex::new(fetches.into()),
                requested: Mutex::new(Vec::new()),
                posted: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
                cancel: cancel.clone(),
            })
        }

        fn requested(&self) -> Vec<u64> {
            self.requested.lock().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn authenticate(&self) -> TransportResult<BotIdentity> {
            self.auth.lock().take().unwrap_or(Err(TransportError::Closed))
        }

        async fn fetch_since(&self, cursor: Cursor) -> TransportResult<FetchBatch> {
            self.requested.lock().push(cursor.value());
            let next = self.fetches.lock().pop_front();
            next.unwrap_or_else(|| {
                self.cancel.cancel();
                Ok(FetchBatch::empty())
            })
        }

        async fn post_message(
            &self,
            flock_id: u64,
            nest_id: u64,
            content: &str,
        ) -> TransportResult<()> {
            self.posted
                .lock()
                .push((flock_id, nest_id, content.to_string()));
            Ok(())
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn raw(id: u64, content: &str) -> RawMessage {
        RawMessage {
            id,
            content: content.into(),
            flock_id: 1,
            flock_name: "flock".into(),
            nest_id: 2,
            nest_name: "nest".into(),
            created_at: "2025-05-05T10:00:00Z".into(),
            user: RawUser {
                id: 77,
                username: "rook".into(),
                is_bot: false,
                avatar_url: None,
            },
        }
    }

    fn fast() -> PollSettings {
        PollSettings {
            poll_interval: Duration::from_millis(1),
            failure_backoff: Duration::from_millis(1),
        }
    }

    fn setup(transport: &Arc<ScriptedTransport>) -> (PollingLoop, Arc<Mutex<Vec<u64>>>) {
        let dispatcher = Arc::new(Dispatcher::new(Outbox::new(transport.clone())));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        dispatcher.register_event(EventKind::MessageReceivedRaw, move |event: BotEvent| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().push(event.message().id);
            }
        });
        (
            PollingLoop::new(transport.clone(), dispatcher, fast()),
            seen,
        )
    }

    #[tokio::test]
    async fn test_baseline_then_poll() {
        let cancel = CancellationToken::new();
        let transport = ScriptedTransport::new(
            &cancel,
            vec![
                Ok(FetchBatch::new(Some(100), vec![raw(99, "old"), raw(100, "old")])),
                Ok(FetchBatch::new(
                    Some(105),
                    vec![raw(104, "first"), raw(105, "second")],
                )),
            ],
        );
        let (mut polling, seen) = setup(&transport);

        assert_ok!(polling.run(cancel).await);

        assert_eq!(*seen.lock(), vec![104, 105]);
        assert_eq!(polling.cursor(), Cursor::new(105));
        assert_eq!(transport.requested()[..2], [0, 100]);
        assert_eq!(polling.stats().dispatched, 2);
        assert_eq!(polling.state(), LoopState::Stopped);
        assert!(transport.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cursor_never_moves_backwards() {
        let cancel = CancellationToken::new();
        let transport = ScriptedTransport::new(
            &cancel,
            vec![
                Ok(FetchBatch::new(Some(50), vec![])),
                Ok(FetchBatch::new(None, vec![raw(51, "no cursor")])),
                Ok(FetchBatch::new(Some(20), vec![])),
                Ok(FetchBatch::new(Some(60), vec![])),
            ],
        );
        let (mut polling, seen) = setup(&transport);

        polling.run(cancel).await.unwrap();

        assert_eq!(*seen.lock(), vec![51]);
        assert_eq!(polling.cursor(), Cursor::new(60));
        assert_eq!(transport.requested()[..5], [0, 50, 50, 50, 60]);
    }

    #[tokio::test]
    async fn test_poll_failure_is_retried_with_same_cursor() {
        let cancel = CancellationToken::new();
        let transport = ScriptedTransport::new(
            &cancel,
            vec![
                Ok(FetchBatch::new(Some(10), vec![])),
                Err(TransportError::ConnectionFailed {
                    url: "http://localhost/messages".into(),
                    reason: "refused".into(),
                }),
                Err(TransportError::Http {
                    status: 502,
                    body: "bad gateway".into(),
                }),
                Ok(FetchBatch::new(Some(11), vec![raw(11, "after outage")])),
            ],
        );
        let (mut polling, seen) = setup(&transport);

        polling.run(cancel).await.unwrap();

        assert_eq!(transport.requested()[..4], [0, 10, 10, 10]);
        assert_eq!(*seen.lock(), vec![11]);
        let stats = polling.stats();
        assert_eq!(stats.failures, 2);
        assert!(stats.polls >= 3);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_the_loop() {
        let cancel = CancellationToken::new();
        let transport = ScriptedTransport::new(
            &cancel,
            vec![
                Ok(FetchBatch::new(Some(1), vec![])),
                Ok(FetchBatch::new(
                    Some(3),
                    vec![raw(2, "!explode"), raw(3, "!explode quietly")],
                )),
                Ok(FetchBatch::new(Some(4), vec![raw(4, "!ok")])),
            ],
        );
        let (mut polling, _) = setup(&transport);
        let dispatcher = Arc::clone(&polling.dispatcher);
        dispatcher
            .register_command("!explode", Signature::empty(), |_args: Args| async {
                Err::<String, _>("kaboom")
            })
            .unwrap();
        dispatcher
            .register_command("!ok", Signature::empty(), |_args: Args| async { "fine" })
            .unwrap();

        let exceptions = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&exceptions);
        dispatcher.register_event(EventKind::CommandException, move |_event: BotEvent| {
            let counter = Arc::clone(&counter);
            async move {
                *counter.lock() += 1;
            }
        });

        polling.run(cancel).await.unwrap();

        assert_eq!(*exceptions.lock(), 2);
        assert_eq!(*transport.posted.lock(), vec![(1, 2, "fine".to_string())]);
        assert_eq!(polling.cursor(), Cursor::new(4));
    }

    #[tokio::test]
    async fn test_malformed_message_is_skipped() {
        let cancel = CancellationToken::new();
        let mut broken = raw(8, "bad clock");
        broken.created_at = "yesterday".into();
        let transport = ScriptedTransport::new(
            &cancel,
            vec![
                Ok(FetchBatch::new(Some(7), vec![])),
                Ok(FetchBatch::new(Some(9), vec![broken, raw(9, "fine")])),
            ],
        );
        let (mut polling, seen) = setup(&transport);

        polling.run(cancel).await.unwrap();

        assert_eq!(*seen.lock(), vec![9]);
        assert_eq!(polling.stats().skipped, 1);
    }

    #[tokio::test]
    async fn test_authentication_failure_is_fatal() {
        let cancel = CancellationToken::new();
        let transport = ScriptedTransport::new(&cancel, vec![]);
        *transport.auth.lock() = Some(Err(TransportError::authentication("bad token")));
        let (mut polling, _) = setup(&transport);

        let err = assert_err!(polling.run(cancel).await);

        assert!(matches!(err, RuntimeError::Authentication(_)));
        assert!(transport.requested().is_empty());
        assert_eq!(polling.state(), LoopState::Stopped);
    }

    #[tokio::test]
    async fn test_baseline_failure_is_fatal() {
        let cancel = CancellationToken::new();
        let transport = ScriptedTransport::new(
            &cancel,
            vec![Err(TransportError::Http {
                status: 500,
                body: String::new(),
            })],
        );
        let (mut polling, _) = setup(&transport);

        let err = polling.run(cancel).await.unwrap_err();

        assert!(matches!(err, RuntimeError::Baseline(_)));
        assert_eq!(transport.requested(), vec![0]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let transport = ScriptedTransport::new(&cancel, vec![]);
        let (mut polling, _) = setup(&transport);
        let mut states = polling.subscribe_state();

        polling.run(cancel).await.unwrap();

        assert!(transport.requested().is_empty());
        assert_eq!(*states.borrow_and_update(), LoopState::Stopped);
    }
}
