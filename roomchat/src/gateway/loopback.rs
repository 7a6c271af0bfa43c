//! Loopback gateway for testing and the console host.
//!
//! Records every call in order and mirrors it onto an unbounded
//! [`tokio::sync::mpsc`] channel so a test (or the console host) can
//! observe what the core asked the room to do. Failures can be scripted
//! per operation with [`LoopbackGateway::fail_next`].

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use roomchat_proto::error::GatewayError;
use roomchat_proto::room::{RoomId, UserId};
use roomchat_proto::typing::TypingNotice;

use super::RoomGateway;

/// Kind of gateway operation, used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    /// [`RoomGateway::send_typing_notification`]
    Typing,
    /// [`RoomGateway::send_text_message`]
    TextMessage,
    /// [`RoomGateway::send_emote`]
    Emote,
    /// [`RoomGateway::join_room`]
    JoinRoom,
    /// [`RoomGateway::kick`]
    Kick,
    /// [`RoomGateway::ban`]
    Ban,
    /// [`RoomGateway::unban`]
    Unban,
    /// [`RoomGateway::invite`]
    Invite,
    /// [`RoomGateway::leave`]
    Leave,
    /// [`RoomGateway::set_power_level`]
    SetPowerLevel,
    /// [`RoomGateway::update_display_name`]
    UpdateDisplayName,
}

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// A typing notification.
    Typing(TypingNotice),
    /// A plain text message.
    TextMessage(String),
    /// An emote.
    Emote(String),
    /// A join by alias or ID.
    JoinRoom(String),
    /// A kick.
    Kick(UserId),
    /// A ban with its (possibly empty) reason.
    Ban(UserId, String),
    /// An unban.
    Unban(UserId),
    /// An invite for one or more users.
    Invite(Vec<UserId>),
    /// Leaving the room.
    Leave,
    /// A power level change.
    SetPowerLevel(UserId, i64),
    /// A display name change.
    UpdateDisplayName(String),
}

impl GatewayCall {
    /// The operation this call was made through.
    #[must_use]
    pub const fn op(&self) -> GatewayOp {
        match self {
            Self::Typing(_) => GatewayOp::Typing,
            Self::TextMessage(_) => GatewayOp::TextMessage,
            Self::Emote(_) => GatewayOp::Emote,
            Self::JoinRoom(_) => GatewayOp::JoinRoom,
            Self::Kick(_) => GatewayOp::Kick,
            Self::Ban(..) => GatewayOp::Ban,
            Self::Unban(_) => GatewayOp::Unban,
            Self::Invite(_) => GatewayOp::Invite,
            Self::Leave => GatewayOp::Leave,
            Self::SetPowerLevel(..) => GatewayOp::SetPowerLevel,
            Self::UpdateDisplayName(_) => GatewayOp::UpdateDisplayName,
        }
    }
}

/// In-process [`RoomGateway`] that records calls instead of sending them.
pub struct LoopbackGateway {
    /// Room this gateway stands in for.
    room_id: RoomId,
    /// Every call made so far, in order (failed ones included).
    calls: Mutex<Vec<GatewayCall>>,
    /// Scripted failures, consumed one per matching call.
    failures: Mutex<HashMap<GatewayOp, VecDeque<GatewayError>>>,
    /// Mirror of `calls` for async observers.
    observer: mpsc::UnboundedSender<GatewayCall>,
}

impl LoopbackGateway {
    /// Create a gateway for `room_id` and the receiver that observes its calls.
    ///
    /// Dropping the receiver is fine; calls are still recorded.
    #[must_use]
    pub fn new(room_id: RoomId) -> (Self, mpsc::UnboundedReceiver<GatewayCall>) {
        let (observer, rx) = mpsc::unbounded_channel();
        let gateway = Self {
            room_id,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            observer,
        };
        (gateway, rx)
    }

    /// The room this gateway stands in for.
    #[must_use]
    pub const fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Make the next call of kind `op` fail with `error`.
    ///
    /// Calling this repeatedly queues several failures for the same kind.
    pub fn fail_next(&self, op: GatewayOp, error: GatewayError) {
        self.failures.lock().entry(op).or_default().push_back(error);
    }

    /// Snapshot of every call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    /// Snapshot of the typing notices sent so far.
    #[must_use]
    pub fn typing_notices(&self) -> Vec<TypingNotice> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                GatewayCall::Typing(notice) => Some(*notice),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GatewayCall) -> Result<(), GatewayError> {
        let op = call.op();
        tracing::trace!(room = %self.room_id, ?call, "loopback gateway call");
        self.calls.lock().push(call.clone());
        let _ = self.observer.send(call);

        match self
            .failures
            .lock()
            .get_mut(&op)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Resolve an alias to the room ID a join would return.
///
/// IDs (`!...`) pass through; aliases (`#name:server`) become `!name:server`.
fn resolve_alias(alias_or_id: &str) -> RoomId {
    if alias_or_id.starts_with('!') {
        RoomId::new(alias_or_id)
    } else {
        RoomId::new(format!("!{}", alias_or_id.trim_start_matches('#')))
    }
}

impl RoomGateway for LoopbackGateway {
    async fn send_typing_notification(
        &self,
        typing: bool,
        ttl: Option<Duration>,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::Typing(TypingNotice { typing, ttl }))
    }

    async fn send_text_message(&self, body: &str) -> Result<(), GatewayError> {
        self.record(GatewayCall::TextMessage(body.to_string()))
    }

    async fn send_emote(&self, message: &str) -> Result<(), GatewayError> {
        self.record(GatewayCall::Emote(message.to_string()))
    }

    async fn join_room(&self, alias_or_id: &str) -> Result<RoomId, GatewayError> {
        self.record(GatewayCall::JoinRoom(alias_or_id.to_string()))?;
        Ok(resolve_alias(alias_or_id))
    }

    async fn kick(&self, user: &UserId) -> Result<(), GatewayError> {
        self.record(GatewayCall::Kick(user.clone()))
    }

    async fn ban(&self, user: &UserId, reason: &str) -> Result<(), GatewayError> {
        self.record(GatewayCall::Ban(user.clone(), reason.to_string()))
    }

    async fn unban(&self, user: &UserId) -> Result<(), GatewayError> {
        self.record(GatewayCall::Unban(user.clone()))
    }

    async fn invite(&self, users: &[UserId]) -> Result<(), GatewayError> {
        self.record(GatewayCall::Invite(users.to_vec()))
    }

    async fn leave(&self) -> Result<(), GatewayError> {
        self.record(GatewayCall::Leave)
    }

    async fn set_power_level(&self, user: &UserId, level: i64) -> Result<(), GatewayError> {
        self.record(GatewayCall::SetPowerLevel(user.clone(), level))
    }

    async fn update_display_name(&self, name: &str) -> Result<(), GatewayError> {
        self.record(GatewayCall::UpdateDisplayName(name.to_string()))
    }
}
