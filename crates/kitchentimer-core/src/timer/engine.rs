//! Countdown engine implementation.
//!
//! The engine advances the main timer and every extra timer in lockstep.
//! It is the only writer of `TimerState` progress; the lifecycle manager
//! seeds and clears entries, the engine counts them down.
//!
//! ## Per-timer transitions
//!
//! ```text
//! Running --(remaining < 1s)--> Finished (alert + haptic, once)
//! Finished --(tick)--> Finished (unchanged)
//! ```
//!
//! ## Loop
//!
//! [`CountdownEngine::execute`] samples the [`TimeSource`] at a fixed
//! target rate. Each tick consumes the *measured* elapsed time rather than
//! the nominal interval, so scheduler jitter never accumulates as drift.
//!
//! ```ignore
//! let engine = CountdownEngine::new(stores, SystemTimeSource::new(), bell, NoopSink);
//! engine.execute(token).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use super::clock::TimeSource;
use super::sinks::{AlertSink, HapticSink};
use super::state::{TimerRef, TimerState};
use super::store::TimerStores;
use crate::error::{InvariantError, Result};
use crate::events::Event;

pub const DEFAULT_TICK_RATE_HZ: u32 = 10;

/// Outcome of advancing one countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Already finished; state untouched.
    Skipped,
    /// Still counting.
    Counting,
    /// Crossed the end threshold on this tick. `alert` is false only when
    /// the alert had already been triggered by an earlier run.
    Finished { alert: bool },
}

/// Advance a single countdown by `elapsed`.
pub fn advance(state: &mut TimerState, elapsed: Duration) -> Advance {
    if state.is_finished {
        return Advance::Skipped;
    }

    state.remaining = state.remaining.saturating_sub(elapsed);
    if !state.has_ended() {
        return Advance::Counting;
    }

    let alert = !state.alert_triggered;
    state.is_finished = true;
    state.alert_triggered = true;
    Advance::Finished { alert }
}

/// Tick-driven countdown engine.
///
/// Generic over its time source and sinks so tests can drive it with a
/// [`ManualTimeSource`](super::ManualTimeSource) and recording sinks.
pub struct CountdownEngine<T, A, H> {
    stores: Arc<TimerStores>,
    time: T,
    alert: A,
    haptic: H,
    tick_interval: Duration,
}

impl<T: TimeSource, A: AlertSink, H: HapticSink> CountdownEngine<T, A, H> {
    pub fn new(stores: Arc<TimerStores>, time: T, alert: A, haptic: H) -> Self {
        Self {
            stores,
            time,
            alert,
            haptic,
            tick_interval: interval_for(DEFAULT_TICK_RATE_HZ),
        }
    }

    /// Override the target tick rate. Zero is treated as 1 Hz.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_interval = interval_for(hz);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn stores(&self) -> &Arc<TimerStores> {
        &self.stores
    }

    pub fn time_source(&self) -> &T {
        &self.time
    }

    // ── Loop ─────────────────────────────────────────────────────────

    /// Run the tick loop until `cancel` fires.
    ///
    /// Returns `Ok(())` on cancellation. Any other exit is an error from
    /// [`tick`](Self::tick) and leaves the stores as of the last complete
    /// tick.
    pub async fn execute(&self, cancel: CancellationToken) -> Result<()> {
        tracing::info!(interval_ms = self.tick_interval.as_millis() as u64, "countdown loop started");
        let mut last_tick = self.time.now();

        while !cancel.is_cancelled() {
            let now = self.time.now();
            let mut since_tick = now.saturating_sub(last_tick);
            if since_tick >= self.tick_interval {
                self.tick(since_tick)?;
                last_tick = now;
                since_tick = Duration::ZERO;
            }

            let wait = self.tick_interval.saturating_sub(since_tick);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.time.delay(wait) => {}
            }
        }

        tracing::info!("countdown loop stopped");
        Ok(())
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// Advance every timer by `elapsed` and publish both stores.
    ///
    /// No-op while the main timer is absent, paused, or finished. Extra
    /// timers have no pause flag of their own: the main timer gates them.
    /// Returns a `TimerFinished` event for each timer that ended on this
    /// tick.
    ///
    /// Fails with [`InvariantError::MissingCountdownEntry`] when an id that
    /// has derived observables is absent from the countdown collection;
    /// nothing is published in that case.
    pub fn tick(&self, elapsed: Duration) -> Result<Vec<Event>> {
        let _gate = self.stores.write();

        let Some(main) = self.stores.main.get() else {
            return Ok(Vec::new());
        };
        if main.is_paused || main.is_finished {
            return Ok(Vec::new());
        }

        let countdowns = self.stores.extras.snapshot();
        let mut batch: Vec<(TimerRef, TimerState)> = Vec::with_capacity(countdowns.len() + 1);
        batch.push((TimerRef::Main, main));
        for id in self.stores.extras.tracked_ids() {
            if !countdowns.contains_key(&id) {
                return Err(InvariantError::MissingCountdownEntry(id).into());
            }
        }
        batch.extend(
            countdowns
                .iter()
                .map(|(id, state)| (TimerRef::Extra(*id), *state)),
        );

        let mut events = Vec::new();
        for (timer, state) in batch.iter_mut() {
            if let Advance::Finished { alert } = advance(state, elapsed) {
                if alert {
                    self.alert.alert();
                    self.haptic.vibrate();
                }
                tracing::info!(timer = ?timer, "timer finished");
                events.push(Event::TimerFinished {
                    timer: *timer,
                    at: Utc::now(),
                });
            }
        }

        let mut extras = IndexMap::with_capacity(countdowns.len());
        for (timer, state) in batch {
            match timer {
                TimerRef::Main => self.stores.main.publish(Some(state)),
                TimerRef::Extra(id) => {
                    extras.insert(id, state);
                }
            }
        }
        self.stores.extras.publish(extras);

        Ok(events)
    }
}

fn interval_for(hz: u32) -> Duration {
    Duration::from_secs(1) / hz.max(1)
}
