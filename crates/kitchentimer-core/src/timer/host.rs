//! Host wrapper that runs the tick loop as a background task.
//!
//! Failures inside the loop (an invariant violation, a panicking sink) are
//! reported once through the [`ErrorReporter`] and the loop is abandoned.
//! There is no automatic restart; a new `start()` plus a new
//! [`spawn_countdown`] is the way back. Cancellation is a normal exit and is
//! never reported.

use std::any::Any;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::clock::TimeSource;
use super::engine::CountdownEngine;
use super::sinks::{AlertSink, ErrorReporter, HapticSink};
use crate::error::CoreError;

/// How the loop task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Cancelled,
    Failed,
}

/// Handle to a running countdown loop.
pub struct CountdownHandle {
    token: CancellationToken,
    task: JoinHandle<LoopExit>,
}

impl CountdownHandle {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the loop and wait for it to wind down.
    pub async fn stop(self) -> LoopExit {
        self.token.cancel();
        self.join().await
    }

    /// Wait for the loop to end on its own (failure or external cancel).
    pub async fn join(self) -> LoopExit {
        self.task.await.unwrap_or(LoopExit::Failed)
    }
}

/// Spawn `engine`'s tick loop on the current tokio runtime.
pub fn spawn_countdown<T, A, H, R>(
    engine: Arc<CountdownEngine<T, A, H>>,
    token: CancellationToken,
    reporter: R,
) -> CountdownHandle
where
    T: TimeSource,
    A: AlertSink,
    H: HapticSink,
    R: ErrorReporter,
{
    let loop_token = token.clone();
    let inner = tokio::spawn(async move { engine.execute(loop_token).await });

    let task = tokio::spawn(async move {
        match inner.await {
            Ok(Ok(())) => LoopExit::Cancelled,
            Ok(Err(error)) => {
                reporter.report(&error);
                LoopExit::Failed
            }
            Err(join) if join.is_cancelled() => LoopExit::Cancelled,
            Err(join) => {
                let error = CoreError::LoopPanicked(panic_message(join.into_panic()));
                reporter.report(&error);
                LoopExit::Failed
            }
        }
    });

    CountdownHandle { token, task }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
