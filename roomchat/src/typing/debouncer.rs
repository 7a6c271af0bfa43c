//! Single-owner task that drives a [`TypingState`].
//!
//! The host calls [`TypingDebouncer::on_edit`] / [`on_send`] from its event
//! loop. Those calls, debounce timer expiries, and gateway replies are all
//! posted to one inbox and handled in order by a background task, which is
//! the only code that touches the state.
//!
//! ```text
//! host ──────┐
//! timer ─────┼──> inbox ──> worker (owns TypingState) ──> spawned gateway call
//! reply ─────┘                                                  │
//!   ^───────────────────────────────────────────────────────────┘
//! ```
//!
//! [`on_send`]: TypingDebouncer::on_send

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use roomchat_proto::error::GatewayError;
use roomchat_proto::typing::TypingNotice;

use crate::clock::{Clock, TimerHandle};
use crate::gateway::RoomGateway;

use super::state::{TimerId, TypingAction, TypingConfig, TypingState};

/// Errors returned by [`TypingDebouncer`] calls.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypingError {
    /// The debouncer task is no longer running.
    #[error("typing debouncer has shut down")]
    Closed,
}

/// Everything the worker reacts to.
#[derive(Debug)]
enum TypingInput {
    Edit { has_text: bool },
    Sent,
    LeaveView,
    TimerFired(TimerId),
    NoticeCompleted {
        notice: TypingNotice,
        timer: Option<TimerId>,
        result: Result<(), GatewayError>,
    },
}

/// Handle to a running typing debouncer for one room view.
///
/// Dropping the handle without calling [`on_leave_view`](Self::on_leave_view)
/// still flushes a typing-stop once in-flight work has drained.
#[derive(Debug)]
pub struct TypingDebouncer {
    inbox: mpsc::UnboundedSender<TypingInput>,
    task: JoinHandle<()>,
}

impl TypingDebouncer {
    /// Spawn the debouncer task for one room view.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<G, C>(gateway: Arc<G>, clock: C, config: TypingConfig) -> Self
    where
        G: RoomGateway + 'static,
        C: Clock,
    {
        let (inbox, rx) = mpsc::unbounded_channel();
        let worker = TypingWorker {
            state: TypingState::new(config),
            gateway,
            clock,
            inbox: inbox.downgrade(),
            timer: None,
        };
        let task = tokio::spawn(worker.run(rx).instrument(tracing::Span::current()));
        Self { inbox, task }
    }

    /// The input box changed; `has_text` is whether it is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`TypingError::Closed`] if the debouncer has shut down.
    pub fn on_edit(&self, has_text: bool) -> Result<(), TypingError> {
        self.post(TypingInput::Edit { has_text })
    }

    /// The draft was sent: end any typing episode.
    ///
    /// # Errors
    ///
    /// Returns [`TypingError::Closed`] if the debouncer has shut down.
    pub fn on_send(&self) -> Result<(), TypingError> {
        self.post(TypingInput::Sent)
    }

    /// The room view is closing: cancel the timer, flush a typing-stop if
    /// an episode is open, and stop the task.
    ///
    /// Returns once the timer is cancelled; the stop notification itself
    /// is not awaited.
    ///
    /// # Errors
    ///
    /// Returns [`TypingError::Closed`] if the debouncer had already shut down.
    pub async fn on_leave_view(self) -> Result<(), TypingError> {
        self.post(TypingInput::LeaveView)?;
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "typing debouncer task ended abnormally");
        }
        Ok(())
    }

    fn post(&self, input: TypingInput) -> Result<(), TypingError> {
        self.inbox.send(input).map_err(|_| TypingError::Closed)
    }
}

/// Background task state. Only [`TypingWorker::run`] mutates it.
struct TypingWorker<G, C> {
    state: TypingState,
    gateway: Arc<G>,
    clock: C,
    /// Weak so that in-flight timers alone do not keep the inbox open.
    inbox: mpsc::WeakUnboundedSender<TypingInput>,
    /// Handle for `state.pending_timer()`.
    timer: Option<(TimerId, TimerHandle)>,
}

impl<G, C> TypingWorker<G, C>
where
    G: RoomGateway + 'static,
    C: Clock,
{
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<TypingInput>) {
        tracing::debug!("typing debouncer started");

        while let Some(input) = rx.recv().await {
            let now = self.clock.now();
            let actions = match input {
                TypingInput::Edit { has_text } => self.state.on_edit(has_text, now),
                TypingInput::Sent => self.state.force_stop(),
                TypingInput::LeaveView => {
                    let actions = self.state.force_stop();
                    self.apply(actions);
                    tracing::debug!("typing debouncer stopped (view left)");
                    return;
                }
                TypingInput::TimerFired(timer) => {
                    if self.timer.as_ref().is_some_and(|(id, _)| *id == timer) {
                        self.timer = None;
                    }
                    self.state.on_timer_fired(timer, now)
                }
                TypingInput::NoticeCompleted {
                    notice,
                    timer,
                    result,
                } => match result {
                    Ok(()) => {
                        self.state.on_notice_succeeded(notice, timer);
                        Vec::new()
                    }
                    Err(e) => {
                        tracing::debug!(
                            typing = notice.typing,
                            error = %e,
                            "typing notification failed, not retrying"
                        );
                        self.state.on_notice_failed(notice, timer)
                    }
                },
            };
            self.apply(actions);
        }

        // Every handle is gone: close any open episode on the way out.
        let actions = self.state.force_stop();
        self.apply(actions);
        tracing::debug!("typing debouncer stopped (handle dropped)");
    }

    fn apply(&mut self, actions: Vec<TypingAction>) {
        for action in actions {
            match action {
                TypingAction::Schedule { timer, delay } => self.schedule(timer, delay),
                TypingAction::Cancel(timer) => {
                    if let Some((id, handle)) = self.timer.take() {
                        if id == timer {
                            handle.cancel();
                        } else {
                            self.timer = Some((id, handle));
                        }
                    }
                }
                TypingAction::Notify { notice, timer } => self.notify(notice, timer),
            }
        }
    }

    fn schedule(&mut self, timer: TimerId, delay: std::time::Duration) {
        let inbox = self.inbox.clone();
        let handle = self.clock.schedule_once(
            delay,
            Box::new(move || {
                if let Some(tx) = inbox.upgrade() {
                    let _ = tx.send(TypingInput::TimerFired(timer));
                }
            }),
        );
        if let Some((_, previous)) = self.timer.replace((timer, handle)) {
            previous.cancel();
        }
    }

    /// Send `notice` without waiting; the reply comes back through the inbox.
    fn notify(&self, notice: TypingNotice, timer: Option<TimerId>) {
        tracing::debug!(
            typing = notice.typing,
            ttl_ms = notice.ttl_millis(),
            "sending typing notification"
        );
        let gateway = Arc::clone(&self.gateway);
        let inbox = self.inbox.upgrade();
        tokio::spawn(
            async move {
                let result = gateway
                    .send_typing_notification(notice.typing, notice.ttl)
                    .await;
                if let Some(tx) = inbox {
                    let _ = tx.send(TypingInput::NoticeCompleted {
                        notice,
                        timer,
                        result,
                    });
                }
            }
            .in_current_span(),
        );
    }
}
