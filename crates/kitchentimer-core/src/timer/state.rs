//! Countdown state model.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Below this much remaining time a countdown displays as zero and counts
/// as ended.
pub const END_THRESHOLD: Duration = Duration::from_secs(1);

/// Snapshot of a single countdown.
///
/// `remaining` is a `Duration` and can never go negative. `is_finished`
/// and `alert_triggered` only ever flip from `false` to `true`; a new
/// `TimerState` (via reset or start) is the only way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerState {
    pub remaining: Duration,
    pub is_paused: bool,
    pub is_finished: bool,
    pub alert_triggered: bool,
}

impl TimerState {
    /// A fresh running countdown of `remaining`.
    pub fn running(remaining: Duration) -> Self {
        Self {
            remaining,
            ..Self::default()
        }
    }

    /// Whole seconds remaining, as shown to the user.
    pub fn display_seconds(&self) -> u64 {
        self.remaining.as_secs()
    }

    /// Would the user see `00:00`?
    pub fn has_ended(&self) -> bool {
        self.remaining < END_THRESHOLD
    }

    pub fn with_remaining(self, remaining: Duration) -> Self {
        Self { remaining, ..self }
    }

    pub fn with_paused(self, is_paused: bool) -> Self {
        Self { is_paused, ..self }
    }
}

/// Stable identifier of an extra timer.
///
/// Shared between the input collection and the countdown collection.
/// Generated from a random v4 UUID, so ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraTimerId(Uuid);

impl ExtraTimerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ExtraTimerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExtraTimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An extra timer's id paired with its countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerCountdownEntry {
    pub id: ExtraTimerId,
    pub state: TimerState,
}

/// Identifies which countdown an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum TimerRef {
    Main,
    Extra(ExtraTimerId),
}

/// Both stores read at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub main: Option<TimerState>,
    pub extras: Vec<TimerCountdownEntry>,
}

impl Snapshot {
    /// True once the main timer and every extra timer have finished.
    pub fn all_finished(&self) -> bool {
        self.is_settled() && self.extras.iter().all(|e| e.state.is_finished)
    }

    /// True once the main timer has finished. Extra timers stop with it, so
    /// nothing changes until the next start.
    pub fn is_settled(&self) -> bool {
        self.main.is_some_and(|m| m.is_finished)
    }
}

/// Render a duration as `MM:SS`, or `H:MM:SS` past an hour.
pub fn format_clock(duration: Duration) -> String {
    let total = duration.as_secs();
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle_zero() {
        let state = TimerState::default();
        assert_eq!(state.remaining, Duration::ZERO);
        assert!(!state.is_paused);
        assert!(!state.is_finished);
        assert!(!state.alert_triggered);
    }

    #[test]
    fn has_ended_below_one_second() {
        assert!(!TimerState::running(Duration::from_secs(1)).has_ended());
        assert!(TimerState::running(Duration::from_millis(999)).has_ended());
        assert!(TimerState::running(Duration::ZERO).has_ended());
    }

    #[test]
    fn display_seconds_floors() {
        assert_eq!(TimerState::running(Duration::from_millis(1_999)).display_seconds(), 1);
        assert_eq!(TimerState::running(Duration::from_millis(999)).display_seconds(), 0);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(ExtraTimerId::new(), ExtraTimerId::new());
    }

    #[test]
    fn format_clock_minutes_and_hours() {
        assert_eq!(format_clock(Duration::from_secs(65)), "01:05");
        assert_eq!(format_clock(Duration::from_millis(999)), "00:00");
        assert_eq!(format_clock(Duration::from_secs(3_725)), "1:02:05");
    }

    #[test]
    fn snapshot_all_finished_requires_main() {
        let snap = Snapshot { main: None, extras: vec![] };
        assert!(!snap.all_finished());

        let done = TimerState {
            is_finished: true,
            alert_triggered: true,
            ..TimerState::default()
        };
        let snap = Snapshot {
            main: Some(done),
            extras: vec![TimerCountdownEntry {
                id: ExtraTimerId::new(),
                state: TimerState::running(Duration::from_secs(3)),
            }],
        };
        assert!(snap.is_settled());
        assert!(!snap.all_finished());
    }
}
