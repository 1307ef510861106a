//! Single-timer debounce.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

type Action<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Runs an action once input has been quiet for a fixed interval.
///
/// Each [`trigger`](Self::trigger) cancels the armed timer and arms a new one,
/// so a burst of inputs runs the action once with the last value. Timers are
/// Tokio tasks; triggering requires a running runtime.
pub struct Debouncer<T> {
    interval: Duration,
    action: Action<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer that calls `action` after `interval` of quiet.
    pub fn new(interval: Duration, action: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            interval,
            action: Arc::new(action),
            pending: Mutex::new(None),
        }
    }

    /// Quiet interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Record an input, restarting the quiet interval.
    pub fn trigger(&self, value: T) {
        // Held across abort and spawn so concurrent triggers arm exactly one timer.
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let action = Arc::clone(&self.action);
        let interval = self.interval;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            action(value);
        }));
    }

    /// Drop the armed timer, if any, without running the action.
    pub fn cancel(&self) {
        if let Some(timer) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            timer.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(timer) = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            timer.abort();
        }
    }
}
