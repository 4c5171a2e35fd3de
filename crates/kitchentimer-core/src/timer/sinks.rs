//! Outbound notification ports.
//!
//! Completion alerts are fire-and-forget: implementations must return
//! quickly and the engine neither retries nor catches them. A panicking
//! sink unwinds into the host wrapper, which reports it through an
//! [`ErrorReporter`].

use std::sync::Arc;

use crate::error::CoreError;

/// Audible completion alert.
pub trait AlertSink: Send + Sync + 'static {
    fn alert(&self);
}

/// Vibration completion alert.
pub trait HapticSink: Send + Sync + 'static {
    fn vibrate(&self);
}

/// Where the host wrapper records loop failures.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, error: &CoreError);
}

impl<T: AlertSink + ?Sized> AlertSink for Arc<T> {
    fn alert(&self) {
        (**self).alert()
    }
}

impl<T: HapticSink + ?Sized> HapticSink for Arc<T> {
    fn vibrate(&self) {
        (**self).vibrate()
    }
}

impl<T: ErrorReporter + ?Sized> ErrorReporter for Arc<T> {
    fn report(&self, error: &CoreError) {
        (**self).report(error)
    }
}

impl AlertSink for Box<dyn AlertSink> {
    fn alert(&self) {
        (**self).alert()
    }
}

impl HapticSink for Box<dyn HapticSink> {
    fn vibrate(&self) {
        (**self).vibrate()
    }
}

/// Sink that does nothing; used when an alert channel is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl AlertSink for NoopSink {
    fn alert(&self) {}
}

impl HapticSink for NoopSink {
    fn vibrate(&self) {}
}

/// Reports loop failures as `tracing` errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, error: &CoreError) {
        tracing::error!(%error, "countdown loop failed");
    }
}
