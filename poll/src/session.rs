//! Poll sessions backed by a tokio interval and a watchdog task.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Shortest interval a session will tick at. Tokio intervals cannot have a
/// zero period.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// How a poll session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The consumer called [`PollSession::stop`].
    Stopped,
    /// The configured maximum duration elapsed.
    DurationElapsed,
    /// The external timeout signal fired.
    TimedOut,
}

impl SessionEnd {
    /// Whether the session ended without the consumer asking it to.
    pub fn is_timeout(&self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

/// Immutable polling parameters.
#[derive(Clone, Debug)]
pub struct PollConfig {
    /// Spacing between ticks. The first tick fires one interval after start.
    pub interval: Duration,
    /// Maximum lifetime of a session.
    pub duration: Duration,
    /// Terminates the session once it observes `true`.
    pub timeout_signal: Option<watch::Receiver<bool>>,
}

impl PollConfig {
    pub fn new(interval: Duration, duration: Duration) -> Self {
        Self {
            interval,
            duration,
            timeout_signal: None,
        }
    }

    pub fn with_timeout_signal(mut self, signal: watch::Receiver<bool>) -> Self {
        self.timeout_signal = Some(signal);
        self
    }
}

/// Factory for poll sessions sharing one configuration.
#[derive(Clone, Debug)]
pub struct Poll {
    config: PollConfig,
}

impl Poll {
    /// Intervals below [`MIN_INTERVAL`] are raised to it.
    pub fn new(mut config: PollConfig) -> Self {
        if config.interval < MIN_INTERVAL {
            tracing::warn!(
                interval_ms = config.interval.as_millis() as u64,
                min_ms = MIN_INTERVAL.as_millis() as u64,
                "poll interval too short, clamping"
            );
            config.interval = MIN_INTERVAL;
        }
        Self { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Start a new, independent session.
    ///
    /// Must be called from within a tokio runtime: the session spawns a
    /// watchdog task that enforces the duration and the timeout signal.
    pub fn start(&self) -> PollSession {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let (end_tx, end_rx) = watch::channel(None);
        let end_tx = Arc::new(end_tx);

        let first_tick = Instant::now() + self.config.interval;
        let mut interval = tokio::time::interval_at(first_tick, self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let deadline = Instant::now() + self.config.duration;
        let watchdog = tokio::spawn(run_watchdog(
            id,
            deadline,
            self.config.timeout_signal.clone(),
            Arc::clone(&end_tx),
        ));

        tracing::debug!(
            session = id,
            interval_ms = self.config.interval.as_millis() as u64,
            duration_ms = self.config.duration.as_millis() as u64,
            "poll session started"
        );

        PollSession {
            id,
            interval,
            ticks: 0,
            end_tx,
            end_rx,
            watchdog,
        }
    }
}

/// One running poll.
///
/// Dropping the session aborts its watchdog; the session can no longer end
/// on its own after that.
pub struct PollSession {
    id: u64,
    interval: tokio::time::Interval,
    ticks: u64,
    end_tx: Arc<watch::Sender<Option<SessionEnd>>>,
    end_rx: watch::Receiver<Option<SessionEnd>>,
    watchdog: tokio::task::JoinHandle<()>,
}

impl PollSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of ticks delivered so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Why the session ended, or `None` while it is still running.
    pub fn end_reason(&self) -> Option<SessionEnd> {
        *self.end_rx.borrow()
    }

    pub fn is_ended(&self) -> bool {
        self.end_reason().is_some()
    }

    /// Subscribe to the session-end signal. The value moves from `None` to
    /// `Some(_)` exactly once.
    pub fn subscribe_end(&self) -> watch::Receiver<Option<SessionEnd>> {
        self.end_rx.clone()
    }

    /// Wait for the next tick. Returns the 1-based tick number, or `None`
    /// once the session has ended.
    pub async fn next_tick(&mut self) -> Option<u64> {
        if self.is_ended() {
            return None;
        }

        let mut end_rx = self.end_rx.clone();
        let ticked = tokio::select! {
            biased;
            _ = end_rx.wait_for(Option::is_some) => false,
            _ = self.interval.tick() => true,
        };

        if !ticked || self.is_ended() {
            return None;
        }

        self.ticks += 1;
        tracing::trace!(session = self.id, tick = self.ticks, "poll tick");
        Some(self.ticks)
    }

    /// Run `fut` unless the session ends first.
    ///
    /// Consumers wrap the side effect of each tick in this so that a duration
    /// elapse or timeout signal during an in-flight call still ends the poll.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, SessionEnd> {
        if let Some(end) = self.end_reason() {
            return Err(end);
        }

        let mut end_rx = self.end_rx.clone();
        tokio::select! {
            biased;
            _ = end_rx.wait_for(Option::is_some) => {
                Err(self.end_reason().unwrap_or(SessionEnd::Stopped))
            }
            out = fut => Ok(out),
        }
    }

    /// Stop the session. Returns `true` if this call ended it; stopping an
    /// already-ended session is a no-op and returns `false`.
    pub fn stop(&self) -> bool {
        let ended = finish(&self.end_tx, SessionEnd::Stopped);
        if ended {
            tracing::debug!(session = self.id, ticks = self.ticks, "poll session stopped");
        }
        ended
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.watchdog.abort();
    }
}

/// Record the end reason if the session is still running.
fn finish(end_tx: &watch::Sender<Option<SessionEnd>>, reason: SessionEnd) -> bool {
    end_tx.send_if_modified(|current| {
        if current.is_some() {
            return false;
        }
        *current = Some(reason);
        true
    })
}

async fn run_watchdog(
    id: u64,
    deadline: Instant,
    timeout_signal: Option<watch::Receiver<bool>>,
    end_tx: Arc<watch::Sender<Option<SessionEnd>>>,
) {
    let mut end_rx = end_tx.subscribe();

    let timeout = async move {
        match timeout_signal {
            Some(mut signal) => {
                if signal.wait_for(|fired| *fired).await.is_err() {
                    // Signal source dropped without firing.
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = end_rx.wait_for(Option::is_some) => {}
        _ = timeout => {
            if finish(&end_tx, SessionEnd::TimedOut) {
                tracing::warn!(session = id, "poll session aborted by timeout signal");
            }
        }
        _ = tokio::time::sleep_until(deadline) => {
            if finish(&end_tx, SessionEnd::DurationElapsed) {
                tracing::warn!(session = id, "poll session exceeded its duration");
            }
        }
    }
}
