//! The typing-notification state machine.
//!
//! [`TypingState`] holds no timers and makes no network calls. Each input
//! (an edit, a timer expiry, a gateway reply) returns the list of
//! [`TypingAction`]s its owner must carry out. This keeps the debounce
//! decision deterministic and testable with plain [`Instant`] arithmetic.
//!
//! # Episode lifecycle
//!
//! 1. First edit with text: schedule a timer for the window, send typing-start
//! 2. Further edits while the timer is pending: only remember the time
//! 3. The start is acknowledged: forget the remembered time
//! 4. Timer fires: if the user typed since step 3, re-arm for the rest of
//!    the window and refresh; otherwise close with typing-stop
//! 5. Text cleared, message sent or view left: cancel and send typing-stop

use std::time::Duration;

use tokio::time::Instant;

use roomchat_proto::typing::TypingNotice;

/// Default local debounce window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

/// Timing parameters for the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingConfig {
    /// Local coalescing window: at most one typing-start per window.
    pub window: Duration,
    /// How long the server keeps the typing state without a refresh.
    pub remote_ttl: Duration,
}

impl TypingConfig {
    /// Config for `window`, with the remote TTL set to twice the window so
    /// the server never expires the state before the next local refresh.
    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            remote_ttl: window.saturating_mul(2),
        }
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }
}

/// Identifies one scheduled debounce timer.
///
/// Ids only grow, so a timer that fires after being replaced or cancelled
/// can be recognized as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Something the owner of a [`TypingState`] must do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypingAction {
    /// Start a one-shot timer; report its expiry via
    /// [`TypingState::on_timer_fired`].
    Schedule {
        /// Id to report back on expiry.
        timer: TimerId,
        /// Delay, always within `(0, window]`.
        delay: Duration,
    },
    /// Cancel a previously scheduled timer.
    Cancel(TimerId),
    /// Send a typing notification; report the outcome via
    /// [`TypingState::on_notice_succeeded`] / [`TypingState::on_notice_failed`].
    Notify {
        /// The notice to send.
        notice: TypingNotice,
        /// Timer scheduled alongside a start notice; `None` for stops.
        timer: Option<TimerId>,
    },
}

/// Typing state for one room view.
#[derive(Debug)]
pub struct TypingState {
    config: TypingConfig,
    /// A typing-start was sent and no typing-stop has followed.
    is_typing: bool,
    /// Last local typing that has not yet been covered by an acknowledged start.
    last_typing_at: Option<Instant>,
    /// The one outstanding debounce timer.
    pending_timer: Option<TimerId>,
    next_timer: u64,
}

impl TypingState {
    /// Fresh state: no episode, no timer.
    #[must_use]
    pub const fn new(config: TypingConfig) -> Self {
        Self {
            config,
            is_typing: false,
            last_typing_at: None,
            pending_timer: None,
            next_timer: 0,
        }
    }

    /// Whether a typing episode is open.
    #[must_use]
    pub const fn is_typing(&self) -> bool {
        self.is_typing
    }

    /// The outstanding debounce timer, if any.
    #[must_use]
    pub const fn pending_timer(&self) -> Option<TimerId> {
        self.pending_timer
    }

    /// Last observed local typing not yet covered by an acknowledged start.
    #[must_use]
    pub const fn last_typing_at(&self) -> Option<Instant> {
        self.last_typing_at
    }

    /// The input box changed; `has_text` is whether it is non-empty.
    pub fn on_edit(&mut self, has_text: bool, now: Instant) -> Vec<TypingAction> {
        if has_text {
            self.typed(now)
        } else {
            self.stop()
        }
    }

    /// The message was sent or the view is closing.
    pub fn force_stop(&mut self) -> Vec<TypingAction> {
        self.stop()
    }

    /// A debounce timer fired. Stale ids are ignored.
    pub fn on_timer_fired(&mut self, timer: TimerId, now: Instant) -> Vec<TypingAction> {
        if self.pending_timer != Some(timer) {
            tracing::trace!(?timer, "ignoring stale typing timer");
            return Vec::new();
        }
        self.pending_timer = None;
        let still_typing = self.last_typing_at.is_some();
        self.on_edit(still_typing, now)
    }

    /// The gateway accepted a notice sent for `timer`.
    pub fn on_notice_succeeded(&mut self, notice: TypingNotice, timer: Option<TimerId>) {
        if notice.typing && timer.is_some() && timer == self.pending_timer {
            self.last_typing_at = None;
        }
    }

    /// The gateway rejected a notice sent for `timer`.
    ///
    /// Nothing is retried: a failed start closes the episode locally, and
    /// the server-side state (if any) expires on its own.
    pub fn on_notice_failed(
        &mut self,
        notice: TypingNotice,
        timer: Option<TimerId>,
    ) -> Vec<TypingAction> {
        if !notice.typing || timer.is_none() || timer != self.pending_timer {
            return Vec::new();
        }
        self.is_typing = false;
        self.last_typing_at = None;
        self.pending_timer
            .take()
            .map(TypingAction::Cancel)
            .into_iter()
            .collect()
    }

    fn typed(&mut self, now: Instant) -> Vec<TypingAction> {
        if self.pending_timer.is_some() {
            self.last_typing_at = Some(now);
            return Vec::new();
        }

        let window = self.config.window;
        let remaining = match self.last_typing_at {
            Some(at) => window.saturating_sub(now.saturating_duration_since(at)),
            None => {
                self.last_typing_at = Some(now);
                window
            }
        };

        if remaining.is_zero() {
            tracing::debug!("typing signal older than the window, not notifying");
            return self.stop();
        }

        let timer = self.allocate_timer();
        self.pending_timer = Some(timer);
        self.is_typing = true;
        vec![
            TypingAction::Schedule {
                timer,
                delay: remaining.min(window),
            },
            TypingAction::Notify {
                notice: TypingNotice::started(self.config.remote_ttl),
                timer: Some(timer),
            },
        ]
    }

    fn stop(&mut self) -> Vec<TypingAction> {
        let mut actions = Vec::new();
        if let Some(timer) = self.pending_timer.take() {
            actions.push(TypingAction::Cancel(timer));
        }
        self.last_typing_at = None;
        if std::mem::take(&mut self.is_typing) {
            actions.push(TypingAction::Notify {
                notice: TypingNotice::stopped(),
                timer: None,
            });
        }
        actions
    }

    const fn allocate_timer(&mut self) -> TimerId {
        self.next_timer += 1;
        TimerId(self.next_timer)
    }
}
