//! Time source and one-shot timers.
//!
//! The typing debouncer reads the current time and schedules its debounce
//! timer through the [`Clock`] trait. [`TokioClock`] is backed by
//! `tokio::time`, so tests can drive it with a paused runtime
//! (`#[tokio::test(start_paused = true)]` plus `tokio::time::advance`).

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Callback run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a scheduled one-shot timer.
///
/// Dropping the handle does NOT cancel the timer; call
/// [`cancel`](Self::cancel).
pub struct TimerHandle {
    cancel: Box<dyn FnOnce() + Send + 'static>,
}

impl TimerHandle {
    /// Wrap the action that cancels a scheduled timer.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    /// Cancel the timer. Has no effect if it already fired.
    pub fn cancel(self) {
        (self.cancel)();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle").finish_non_exhaustive()
    }
}

/// Source of time and timers.
pub trait Clock: Send + Sync + 'static {
    /// Current instant. Only differences between instants are used.
    fn now(&self) -> Instant;

    /// Run `callback` once after `delay`.
    ///
    /// The callback runs on the timer's own task; it must hand any state
    /// change back to its owner rather than mutate shared state directly.
    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
}

/// [`Clock`] backed by the tokio runtime's timer.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        TimerHandle::new(move || task.abort())
    }
}
