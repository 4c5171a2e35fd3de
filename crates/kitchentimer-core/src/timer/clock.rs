//! Time sources for the countdown loop.
//!
//! The engine never reads the system clock directly. It asks a
//! [`TimeSource`] for the current instant and for a pacing delay, so tests
//! can swap in [`ManualTimeSource`] and fast-forward virtual time without
//! sleeping.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

/// Yields granted to woken tasks after each virtual-time step so they can
/// run up to their next delay before time moves on.
const SETTLE_YIELDS: usize = 4;

/// Clock and pacing port for the tick loop.
///
/// `now()` is monotonic and only differences between two readings are
/// meaningful. `delay()` suspends the calling task without blocking the
/// executor thread.
pub trait TimeSource: Send + Sync + 'static {
    fn now(&self) -> Duration;

    fn delay(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Production time source backed by the tokio timer.
#[derive(Debug, Clone)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn delay(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

struct Sleeper {
    deadline: Duration,
    wake: oneshot::Sender<()>,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    bound: bool,
    sleepers: Vec<Sleeper>,
}

/// Deterministic time source for tests.
///
/// Virtual time only moves when [`advance_time_by`](Self::advance_time_by)
/// is awaited. Advancing steps through every pending delay deadline in
/// order, letting the woken task run before moving on, so a loop paced at
/// 100 ms sees twenty-one separate ticks across a 2.1 s advance rather than
/// one large one.
///
/// Designed for a current-thread runtime (the `#[tokio::test]` default),
/// where the handoff between advancing and the woken task is deterministic.
///
/// Exactly one delay handler may be bound: call [`bind`](Self::bind) once
/// before the loop starts.
#[derive(Clone, Default)]
pub struct ManualTimeSource {
    inner: Arc<Mutex<ManualClock>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the delay handler.
    ///
    /// # Panics
    ///
    /// Panics if a handler is already bound.
    pub fn bind(&self) {
        let mut clock = self.lock();
        assert!(!clock.bound, "a delay handler is already bound to this time source");
        clock.bound = true;
    }

    pub fn is_bound(&self) -> bool {
        self.lock().bound
    }

    /// Number of delays currently waiting on virtual time.
    pub fn pending_delays(&self) -> usize {
        self.lock().sleepers.len()
    }

    /// Move virtual time forward by `by`, waking each pending delay at its
    /// own deadline.
    pub async fn advance_time_by(&self, by: Duration) {
        let target = self.lock().now + by;
        loop {
            let due = {
                let mut clock = self.lock();
                let next = clock
                    .sleepers
                    .iter()
                    .map(|s| s.deadline)
                    .filter(|deadline| *deadline <= target)
                    .min();
                let Some(deadline) = next else {
                    clock.now = target;
                    break;
                };
                clock.now = clock.now.max(deadline);
                let now = clock.now;
                let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut clock.sleepers)
                    .into_iter()
                    .partition(|s| s.deadline <= now);
                clock.sleepers = pending;
                due
            };

            for sleeper in due {
                // The delaying task may already be gone (cancelled loop).
                let _ = sleeper.wake.send(());
            }
            settle().await;
        }
        settle().await;
    }

    fn lock(&self) -> MutexGuard<'_, ManualClock> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Duration {
        self.lock().now
    }

    /// # Panics
    ///
    /// Panics if no delay handler has been bound.
    fn delay(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        let waiter = {
            let mut clock = self.lock();
            assert!(clock.bound, "delay called before a delay handler was bound");
            if duration.is_zero() {
                None
            } else {
                let (wake, rx) = oneshot::channel();
                let deadline = clock.now + duration;
                clock.sleepers.push(Sleeper { deadline, wake });
                Some(rx)
            }
        };

        async move {
            match waiter {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => tokio::task::yield_now().await,
            }
        }
    }
}

async fn settle() {
    for _ in 0..SETTLE_YIELDS {
        tokio::task::yield_now().await;
    }
}
