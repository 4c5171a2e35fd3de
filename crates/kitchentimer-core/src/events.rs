use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{ExtraTimerId, TimerRef};

/// Every state change in the system produces an Event.
/// The UI renders from the stores; events are for logs and `--json` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        main: Duration,
        extras: usize,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining: Duration,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining: Duration,
        at: DateTime<Utc>,
    },
    /// A countdown crossed below one second and its alert fired.
    TimerFinished {
        timer: TimerRef,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    ExtraTimerAdded {
        id: ExtraTimerId,
        label: String,
        at: DateTime<Utc>,
    },
    ExtraTimerRemoved {
        id: ExtraTimerId,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerResumed { at, .. }
            | Event::TimerFinished { at, .. }
            | Event::TimerReset { at }
            | Event::ExtraTimerAdded { at, .. }
            | Event::ExtraTimerRemoved { at, .. } => *at,
        }
    }
}
