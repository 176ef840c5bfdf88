//! Per-request context: trace identity, deadline and cancellation.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::trace::TraceContext;

/// Why a request context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context cancelled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancels every context derived from the one it was created with.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Request-scoped context passed to every downstream call.
///
/// Cloning is cheap; clones share the cancellation signal.
#[derive(Debug, Clone)]
pub struct RequestContext {
    trace: TraceContext,
    deadline: Option<Instant>,
    cancelled: watch::Receiver<bool>,
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        // Dropping the sender leaves the receiver permanently at `false`.
        let (_, cancelled) = watch::channel(false);
        Self {
            trace: TraceContext::root(),
            deadline: None,
            cancelled,
        }
    }

    /// A context that can be cancelled through the returned handle.
    pub fn with_cancel(trace: TraceContext) -> (Self, CancelHandle) {
        let (tx, cancelled) = watch::channel(false);
        let ctx = Self {
            trace,
            deadline: None,
            cancelled,
        };
        (ctx, CancelHandle(tx))
    }

    /// Replaces the trace context.
    pub fn with_trace(mut self, trace: TraceContext) -> Self {
        self.trace = trace;
        self
    }

    /// Derives a context whose deadline is at most `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a context with the earlier of its current deadline and `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };
        Self {
            trace: self.trace.clone(),
            deadline: Some(deadline),
            cancelled: self.cancelled.clone(),
        }
    }

    pub fn trace(&self) -> &TraceContext {
        &self.trace
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns why the context is done, or `None` if it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if *self.cancelled.borrow() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        let mut cancelled = self.cancelled.clone();
        let cancellation = async move {
            loop {
                if *cancelled.borrow_and_update() {
                    return;
                }
                if cancelled.changed().await.is_err() {
                    // Sender gone without cancelling: never fires.
                    std::future::pending::<()>().await;
                }
            }
        };
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            () = cancellation => ContextError::Cancelled,
            () = deadline => ContextError::DeadlineExceeded,
        }
    }

    /// Runs `fut` bounded by this context.
    ///
    /// Fails immediately without polling `fut` if the context is already done.
    pub async fn run<F, T, E>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<ContextError>,
    {
        if let Some(err) = self.err() {
            return Err(err.into());
        }
        tokio::select! {
            result = fut => result,
            err = self.done() => Err(err.into()),
        }
    }
}
