//! Single-shot cancelable timers.
//!
//! Components never sleep. They ask a [`TimerService`] to deliver a
//! [`TimerEvent`] after a delay and keep the returned [`CancelToken`].
//! The owner of the service hands fired timers back to the session,
//! which routes each one to the component that armed it.
//!
//! Two implementations are provided:
//!
//! - [`ManualTimers`] -- a virtual clock advanced explicitly. Used by
//!   tests and by any caller that wants deterministic stepping.
//! - [`TokioTimers`] -- real delays via [`tokio::time::sleep`], with
//!   fired timers delivered over an unbounded channel.
//!
//! Cancellation is total: once [`TimerService::cancel`] returns, the
//! token is never delivered. Canceling an unknown, fired, or already
//! canceled token is a no-op.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CancelToken(u64);

impl CancelToken {
    /// Raw token value, for logging.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// What a fired timer means. Each variant is owned by one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerEvent {
    /// Rotate the gathering status message.
    StatusRotation,
    /// The simulated demo investigation delay has elapsed.
    DemoDelay,
    /// The investigating turn's think time has elapsed.
    ThinkTime,
    /// The pause between two turns has elapsed.
    TurnGap,
    /// The pause between two clips has elapsed.
    ClipGap,
}

/// A timer that reached its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    /// Token returned by [`TimerService::after`].
    pub token: CancelToken,
    /// Event the timer was armed with.
    pub event: TimerEvent,
}

/// Schedules delayed single-shot events.
pub trait TimerService {
    /// Arrange for `event` to be delivered after `delay`.
    fn after(&mut self, delay: Duration, event: TimerEvent) -> CancelToken;

    /// Prevent delivery of `token`. Idempotent.
    fn cancel(&mut self, token: CancelToken);
}

/// Monotonic token source shared by both implementations.
#[derive(Debug, Default)]
struct TokenSource(u64);

impl TokenSource {
    fn next(&mut self) -> CancelToken {
        self.0 = self.0.wrapping_add(1);
        CancelToken(self.0)
    }
}

// ---------------------------------------------------------------------------
// Manual (virtual clock)
// ---------------------------------------------------------------------------

/// Virtual-clock timer service.
///
/// Time only moves when [`pop_due`](Self::pop_due) or
/// [`set_now`](Self::set_now) is called. Timers with equal deadlines
/// fire in the order they were armed.
#[derive(Debug, Default)]
pub struct ManualTimers {
    now: Duration,
    tokens: TokenSource,
    queue: BTreeMap<(Duration, CancelToken), TimerEvent>,
    deadlines: HashMap<CancelToken, Duration>,
}

impl ManualTimers {
    /// Create a virtual clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether `token` is still armed.
    pub fn is_pending(&self, token: CancelToken) -> bool {
        self.deadlines.contains_key(&token)
    }

    /// Deadline of the earliest armed timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove the earliest timer due at or before `until`, moving the
    /// clock to its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<FiredTimer> {
        let (&(deadline, token), _) = self.queue.iter().next()?;
        if deadline > until {
            return None;
        }
        let event = self.queue.remove(&(deadline, token))?;
        self.deadlines.remove(&token);
        if deadline > self.now {
            self.now = deadline;
        }
        Some(FiredTimer { token, event })
    }

    /// Move the clock forward to `until` without firing anything.
    pub fn set_now(&mut self, until: Duration) {
        if until > self.now {
            self.now = until;
        }
    }
}

impl TimerService for ManualTimers {
    fn after(&mut self, delay: Duration, event: TimerEvent) -> CancelToken {
        let token = self.tokens.next();
        let deadline = self.now.saturating_add(delay);
        self.queue.insert((deadline, token), event);
        self.deadlines.insert(token, deadline);
        token
    }

    fn cancel(&mut self, token: CancelToken) {
        if let Some(deadline) = self.deadlines.remove(&token) {
            self.queue.remove(&(deadline, token));
        }
    }
}

// ---------------------------------------------------------------------------
// Tokio
// ---------------------------------------------------------------------------

/// Real-time timer service backed by Tokio tasks.
///
/// Each armed timer is a task that sleeps and then sends a
/// [`FiredTimer`] on the channel returned by [`TokioTimers::new`].
/// Because a task may have sent before it was canceled, the receiver
/// must pass every message through [`accept`](Self::accept), which
/// drops tokens that are no longer armed.
#[derive(Debug)]
pub struct TokioTimers {
    tokens: TokenSource,
    tasks: HashMap<CancelToken, JoinHandle<()>>,
    tx: mpsc::UnboundedSender<FiredTimer>,
}

impl TokioTimers {
    /// Create the service and the receiving end of its fired-timer channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FiredTimer>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let timers = Self {
            tokens: TokenSource::default(),
            tasks: HashMap::new(),
            tx,
        };
        (timers, rx)
    }

    /// Filter a received timer. Returns it only if it is still armed,
    /// and disarms it.
    pub fn accept(&mut self, fired: FiredTimer) -> Option<FiredTimer> {
        self.tasks.remove(&fired.token).map(|_| fired)
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }
}

impl TimerService for TokioTimers {
    fn after(&mut self, delay: Duration, event: TimerEvent) -> CancelToken {
        let token = self.tokens.next();
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone only during shutdown.
            let _ = tx.send(FiredTimer { token, event });
        });
        self.tasks.insert(token, task);
        token
    }

    fn cancel(&mut self, token: CancelToken) {
        if let Some(task) = self.tasks.remove(&token) {
            task.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
