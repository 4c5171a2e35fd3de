//! Shared fixtures for countdown integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kitchentimer_core::error::CoreError;
use kitchentimer_core::timer::{
    spawn_countdown, AlertSink, CountdownEngine, CountdownHandle, DurationLimit, ErrorReporter,
    HapticSink, ManualTimeSource, TimeSource, TimerLifecycleManager, TimerLimits, TimerStores,
};
use tokio_util::sync::CancellationToken;

pub const TICK: Duration = Duration::from_millis(100);

/// Counts alert and haptic invocations.
#[derive(Default)]
pub struct Counter(AtomicUsize);

impl Counter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl AlertSink for Counter {
    fn alert(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl HapticSink for Counter {
    fn vibrate(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Keeps every reported error message.
#[derive(Default)]
pub struct RecordingReporter(Mutex<Vec<String>>);

impl RecordingReporter {
    pub fn reports(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, error: &CoreError) {
        self.0.lock().unwrap().push(error.to_string());
    }
}

pub type TestEngine = CountdownEngine<ManualTimeSource, Arc<Counter>, Arc<Counter>>;

/// Stores, lifecycle, engine and recording sinks wired around one
/// manual time source. Inputs are in seconds to keep scenarios short.
pub struct Harness {
    pub stores: Arc<TimerStores>,
    pub time: ManualTimeSource,
    pub lifecycle: TimerLifecycleManager,
    pub engine: Arc<TestEngine>,
    pub alerts: Arc<Counter>,
    pub haptics: Arc<Counter>,
    pub reporter: Arc<RecordingReporter>,
}

impl Harness {
    pub fn new() -> Self {
        let stores = Arc::new(TimerStores::new());
        let time = ManualTimeSource::new();
        let alerts = Arc::new(Counter::default());
        let haptics = Arc::new(Counter::default());
        let limits = TimerLimits {
            main: DurationLimit::seconds(3_600),
            extra: DurationLimit::seconds(3_600),
        };
        let engine = Arc::new(CountdownEngine::new(
            stores.clone(),
            time.clone(),
            alerts.clone(),
            haptics.clone(),
        ));
        Self {
            lifecycle: TimerLifecycleManager::new(stores.clone(), limits),
            stores,
            time,
            engine,
            alerts,
            haptics,
            reporter: Arc::new(RecordingReporter::default()),
        }
    }

    /// Bind the time source, spawn the loop, and wait until it is parked
    /// on its first delay.
    pub async fn spawn(&self) -> CountdownHandle {
        self.time.bind();
        let handle = spawn_countdown(
            self.engine.clone(),
            CancellationToken::new(),
            self.reporter.clone(),
        );
        wait_for_delay(&self.time).await;
        handle
    }
}

/// Yield until a task is waiting on `time`.
pub async fn wait_for_delay(time: &ManualTimeSource) {
    for _ in 0..100 {
        if time.pending_delays() > 0 {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("countdown loop never reached its first delay");
}

/// Wraps a manual source and oversleeps every delay by a fixed amount,
/// the way a busy scheduler would.
#[derive(Clone)]
pub struct JitteryTime {
    pub inner: ManualTimeSource,
    pub oversleep: Duration,
}

impl TimeSource for JitteryTime {
    fn now(&self) -> Duration {
        self.inner.now()
    }

    fn delay(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.inner.delay(duration + self.oversleep)
    }
}
