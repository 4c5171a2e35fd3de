//! Duration input parsing and the extra-timer input model.

use std::fmt;
use std::num::IntErrorKind;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::state::ExtraTimerId;
use crate::error::ValidationReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Minutes,
    Seconds,
}

impl DurationUnit {
    pub fn to_duration(self, amount: u64) -> Duration {
        match self {
            DurationUnit::Minutes => Duration::from_secs(amount * 60),
            DurationUnit::Seconds => Duration::from_secs(amount),
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationUnit::Minutes => write!(f, "minutes"),
            DurationUnit::Seconds => write!(f, "seconds"),
        }
    }
}

/// Unit and inclusive upper bound for one input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationLimit {
    pub unit: DurationUnit,
    pub max: u32,
}

impl DurationLimit {
    pub const fn minutes(max: u32) -> Self {
        Self {
            unit: DurationUnit::Minutes,
            max,
        }
    }

    pub const fn seconds(max: u32) -> Self {
        Self {
            unit: DurationUnit::Seconds,
            max,
        }
    }
}

/// Turns user text into a countdown duration.
///
/// Only consulted by the lifecycle manager's `start()`, never by the tick.
pub trait DurationInputParser: Send + Sync {
    fn parse(&self, text: &str, limit: DurationLimit) -> Result<Duration, ValidationReason>;
}

/// Accepts a positive whole number of `limit.unit`, up to `limit.max`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeNumberParser;

impl DurationInputParser for WholeNumberParser {
    fn parse(&self, text: &str, limit: DurationLimit) -> Result<Duration, ValidationReason> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationReason::Empty);
        }

        let amount = match text.parse::<i64>() {
            Ok(n) => n,
            Err(e) => {
                return Err(match e.kind() {
                    IntErrorKind::PosOverflow => ValidationReason::OutOfRange {
                        max: limit.max,
                        unit: limit.unit,
                    },
                    IntErrorKind::NegOverflow => ValidationReason::NotPositive,
                    _ => ValidationReason::NotANumber(text.to_string()),
                })
            }
        };

        if amount <= 0 {
            return Err(ValidationReason::NotPositive);
        }
        if amount > i64::from(limit.max) {
            return Err(ValidationReason::OutOfRange {
                max: limit.max,
                unit: limit.unit,
            });
        }
        Ok(limit.unit.to_duration(amount as u64))
    }
}

/// What the user typed for one extra timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraTimerInput {
    pub id: ExtraTimerId,
    pub label: String,
    pub duration_text: String,
}

impl ExtraTimerInput {
    pub fn new(label: impl Into<String>, duration_text: impl Into<String>) -> Self {
        Self {
            id: ExtraTimerId::new(),
            label: label.into(),
            duration_text: duration_text.into(),
        }
    }
}
