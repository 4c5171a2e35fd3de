//! Core error types for kitchentimer-core.
//!
//! Errors fall into four classes:
//!
//! - **Validation**: bad duration input. Expected and recoverable, returned
//!   from `start()` before any state changes.
//! - **Illegal state**: pause while not running, resume while not paused.
//!   These are caller bugs; the UI is expected to gate the actions.
//! - **Invariant**: an observed extra timer has no countdown entry. Fatal.
//! - **Config**: loading or saving the TOML configuration failed.
//!
//! Cancellation of the tick loop is not an error and has no variant here.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::timer::{DurationUnit, ExtraTimerId};

/// Core error type for kitchentimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// One or more duration inputs failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Operation not permitted in the current timer state
    #[error("Illegal state: {0}")]
    IllegalState(#[from] IllegalStateError),

    /// Internal consistency violation
    #[error("Internal invariant violated: {0}")]
    Invariant(#[from] InvariantError),

    /// The tick loop panicked (typically inside an alert sink)
    #[error("Countdown loop panicked: {0}")]
    LoopPanicked(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Which input field a validation error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputField {
    Main,
    Extra(ExtraTimerId),
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputField::Main => write!(f, "main timer"),
            InputField::Extra(id) => write!(f, "extra timer {id}"),
        }
    }
}

/// Why a duration input was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    #[error("a duration is required")]
    Empty,

    #[error("'{0}' is not a whole number")]
    NotANumber(String),

    #[error("duration must be greater than zero")]
    NotPositive,

    #[error("duration must be at most {max} {unit}")]
    OutOfRange { max: u32, unit: DurationUnit },
}

/// A single rejected input field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: InputField,
    pub reason: ValidationReason,
}

/// Every rejected field of one `start()` call.
///
/// Collected rather than short-circuited so each offending field can show
/// its own inline message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// The error attached to `field`, if any.
    pub fn for_field(&self, field: InputField) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        Self { errors: vec![err] }
    }
}

/// Lifecycle operations called in the wrong state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IllegalStateError {
    #[error("main timer is not running")]
    NotRunning,

    #[error("timer is already paused")]
    AlreadyPaused,

    #[error("timer is not paused")]
    NotPaused,

    #[error("no extra timer with id {0}")]
    UnknownExtraTimer(ExtraTimerId),
}

/// Broken internal invariants. Never expected in correct operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    #[error("countdown entry missing for extra timer {0}")]
    MissingCountdownEntry(ExtraTimerId),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_display_joins_fields() {
        let id = ExtraTimerId::new();
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError {
            field: InputField::Main,
            reason: ValidationReason::NotPositive,
        });
        errors.push(ValidationError {
            field: InputField::Extra(id),
            reason: ValidationReason::NotANumber("abc".into()),
        });

        let text = errors.to_string();
        assert!(text.starts_with("main timer: duration must be greater than zero; "));
        assert!(text.contains("'abc' is not a whole number"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn for_field_finds_matching_error() {
        let id = ExtraTimerId::new();
        let errors = ValidationErrors::from(ValidationError {
            field: InputField::Extra(id),
            reason: ValidationReason::Empty,
        });
        assert!(errors.for_field(InputField::Main).is_none());
        assert_eq!(
            errors.for_field(InputField::Extra(id)).map(|e| &e.reason),
            Some(&ValidationReason::Empty)
        );
    }

    #[test]
    fn core_error_wraps_illegal_state() {
        let err: CoreError = IllegalStateError::AlreadyPaused.into();
        assert_eq!(err.to_string(), "Illegal state: timer is already paused");
    }
}
