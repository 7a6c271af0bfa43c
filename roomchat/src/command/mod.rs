//! Command dispatch for submitted chat input.
//!
//! Classification lives in [`roomchat_proto::command`]; this module turns a
//! classified [`Command`] into exactly one [`RoomGateway`] call (or none,
//! for ignored lines) and reports permission failures to the user through
//! a [`DispatchNotice`] channel.

use std::sync::Arc;

use tokio::sync::mpsc;

use roomchat_proto::command::{Command, DEFAULT_POWER_LEVEL, Ignored, classify};
use roomchat_proto::error::GatewayError;
use roomchat_proto::room::{RoomId, UserId};

use crate::gateway::RoomGateway;

/// What happened to a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The line was sent to the room as a chat message.
    SentMessage,
    /// A directive was executed.
    Executed,
    /// `/join` succeeded; the host may navigate to the room.
    JoinedRoom(RoomId),
    /// Nothing was sent.
    Ignored(Ignored),
}

impl DispatchOutcome {
    /// Whether the line was consumed as a directive rather than sent as a
    /// chat message.
    #[must_use]
    pub const fn is_directive(&self) -> bool {
        !matches!(self, Self::SentMessage | Self::Ignored(Ignored::EmptyInput))
    }
}

/// Short-lived notices for the user, published by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchNotice {
    /// The server refused a directive for lack of permission.
    Forbidden {
        /// The server's human-readable explanation.
        message: String,
    },
}

/// Executes classified commands against one room.
pub struct CommandDispatcher<G> {
    gateway: Arc<G>,
    notice_tx: mpsc::Sender<DispatchNotice>,
}

impl<G: RoomGateway> CommandDispatcher<G> {
    /// Create a dispatcher and the receiver for its user notices.
    #[must_use]
    pub fn new(gateway: Arc<G>, notice_buffer: usize) -> (Self, mpsc::Receiver<DispatchNotice>) {
        let (notice_tx, notice_rx) = mpsc::channel(notice_buffer.max(1));
        (Self { gateway, notice_tx }, notice_rx)
    }

    /// Classify `line` without executing it.
    #[must_use]
    pub fn classify(line: &str) -> Command {
        classify(line)
    }

    /// Classify and dispatch one submitted line.
    ///
    /// # Errors
    ///
    /// Returns the [`GatewayError`] if the room rejected the operation.
    pub async fn submit(&self, line: &str) -> Result<DispatchOutcome, GatewayError> {
        self.dispatch(classify(line)).await
    }

    /// Issue the gateway call for `command`.
    ///
    /// Each command maps to exactly one gateway operation; ignored commands
    /// make no call. A `Forbidden` error on a directive is also published
    /// as a [`DispatchNotice::Forbidden`].
    ///
    /// # Errors
    ///
    /// Returns the [`GatewayError`] if the room rejected the operation.
    pub async fn dispatch(&self, command: Command) -> Result<DispatchOutcome, GatewayError> {
        let is_directive = command.is_directive();
        let gw = &self.gateway;

        let result = match command {
            Command::PlainMessage(body) => gw
                .send_text_message(&body)
                .await
                .map(|()| DispatchOutcome::SentMessage),
            Command::ChangeDisplayName(name) => gw
                .update_display_name(&name)
                .await
                .map(|()| DispatchOutcome::Executed),
            Command::Emote(message) => gw
                .send_emote(&message)
                .await
                .map(|()| DispatchOutcome::Executed),
            Command::JoinRoom(alias) => gw.join_room(&alias).await.map(DispatchOutcome::JoinedRoom),
            Command::Kick(user) => gw.kick(&user).await.map(|()| DispatchOutcome::Executed),
            Command::Ban(user, reason) => gw
                .ban(&user, &reason)
                .await
                .map(|()| DispatchOutcome::Executed),
            Command::Unban(user) => gw.unban(&user).await.map(|()| DispatchOutcome::Executed),
            Command::SetPowerLevel(user, level) => gw
                .set_power_level(&user, level)
                .await
                .map(|()| DispatchOutcome::Executed),
            Command::ResetPowerLevel(user) => gw
                .set_power_level(&user, DEFAULT_POWER_LEVEL)
                .await
                .map(|()| DispatchOutcome::Executed),
            Command::Ignored(reason) => {
                tracing::debug!(%reason, "input ignored");
                return Ok(DispatchOutcome::Ignored(reason));
            }
        };

        result.map_err(|err| self.report(err, is_directive))
    }

    /// Invite `users` to the room. An empty list makes no call.
    ///
    /// Permission failures are published like those of a directive.
    ///
    /// # Errors
    ///
    /// Returns the [`GatewayError`] if the room rejected the invite.
    pub async fn invite(&self, users: &[UserId]) -> Result<(), GatewayError> {
        if users.is_empty() {
            tracing::debug!("no users to invite");
            return Ok(());
        }
        self.gateway
            .invite(users)
            .await
            .map_err(|err| self.report(err, true))
    }

    /// Leave the room.
    ///
    /// # Errors
    ///
    /// Returns the [`GatewayError`] if the room rejected the request.
    pub async fn leave(&self) -> Result<(), GatewayError> {
        self.gateway
            .leave()
            .await
            .map_err(|err| self.report(err, true))
    }

    fn report(&self, err: GatewayError, is_directive: bool) -> GatewayError {
        if is_directive && err.is_forbidden() {
            self.publish(DispatchNotice::Forbidden {
                message: err.message.clone(),
            });
        } else {
            tracing::debug!(error = %err, is_directive, "dispatch failed");
        }
        err
    }

    fn publish(&self, notice: DispatchNotice) {
        if let Err(e) = self.notice_tx.try_send(notice) {
            tracing::warn!(error = %e, "dropping dispatch notice");
        }
    }
}
