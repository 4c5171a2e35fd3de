//! # Kitchen Timer Core Library
//!
//! This library provides the countdown engine behind the Kitchen Timer
//! cooking/baking timer: one main countdown plus any number of extra
//! countdowns (rice, eggs, sauce...) advanced in lockstep against a single
//! clock. The CLI binary is a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Time sources**: the loop reads time and sleeps through a swappable
//!   port, so tests fast-forward virtual time instead of sleeping
//! - **Stores**: `watch`-backed observable holders; every publish replaces
//!   the whole value
//! - **Engine**: the tick loop and per-timer transition logic, the only
//!   writer of countdown progress
//! - **Lifecycle**: start/pause/resume/reset and extra-timer input
//!   management, with all-or-nothing input validation
//!
//! ## Key Components
//!
//! - [`CountdownEngine`]: tick loop and transition logic
//! - [`TimerLifecycleManager`]: user-facing commands
//! - [`TimerStores`]: published state for UIs to observe
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use error::{
    ConfigError, CoreError, IllegalStateError, InputField, InvariantError, ValidationError,
    ValidationErrors, ValidationReason,
};
pub use events::Event;
pub use storage::Config;
pub use timer::{
    spawn_countdown, CountdownEngine, CountdownHandle, ExtraTimerId, ManualTimeSource,
    Snapshot, SystemTimeSource, TimeSource, TimerLifecycleManager, TimerState, TimerStores,
};
