mod clock;
mod engine;
mod host;
mod input;
mod lifecycle;
mod sinks;
mod state;
mod store;

pub use clock::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use engine::{advance, Advance, CountdownEngine, DEFAULT_TICK_RATE_HZ};
pub use host::{spawn_countdown, CountdownHandle, LoopExit};
pub use input::{
    DurationInputParser, DurationLimit, DurationUnit, ExtraTimerInput, WholeNumberParser,
};
pub use lifecycle::{TimerLifecycleManager, TimerLimits};
pub use sinks::{AlertSink, ErrorReporter, HapticSink, NoopSink, TracingErrorReporter};
pub use state::{
    format_clock, ExtraTimerId, Snapshot, TimerCountdownEntry, TimerRef, TimerState,
    END_THRESHOLD,
};
pub use store::{Countdowns, DerivedObservables, ExtraTimerStore, MainTimerStore, Store, TimerStores};

pub use tokio_util::sync::CancellationToken;
