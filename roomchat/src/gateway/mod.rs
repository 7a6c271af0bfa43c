//! Room gateway abstraction.
//!
//! Defines the [`RoomGateway`] trait: every operation the core performs
//! against the remote room. Concrete implementations include:
//! - [`loopback::LoopbackGateway`]: in-process gateway that records calls

pub mod loopback;

use std::future::Future;
use std::time::Duration;

use roomchat_proto::error::GatewayError;
use roomchat_proto::room::{RoomId, UserId};

/// Async interface to the remote room the local user is viewing.
///
/// Implementations own transport, retries and connection timeouts; the
/// core imposes no timeout of its own on these calls.
pub trait RoomGateway: Send + Sync {
    /// Tell the room whether the local user is typing.
    ///
    /// `ttl` is how long the server should keep the typing state alive
    /// without a refresh; `None` for stop notifications.
    fn send_typing_notification(
        &self,
        typing: bool,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Send a plain text message.
    fn send_text_message(&self, body: &str)
    -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Send an emote (`/me`) message.
    fn send_emote(&self, message: &str) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Join a room by alias or ID, returning the joined room's ID.
    fn join_room(
        &self,
        alias_or_id: &str,
    ) -> impl Future<Output = Result<RoomId, GatewayError>> + Send;

    /// Kick a user from the room.
    fn kick(&self, user: &UserId) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Ban a user from the room. An empty `reason` means none was given.
    fn ban(
        &self,
        user: &UserId,
        reason: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Lift a user's ban.
    fn unban(&self, user: &UserId) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Invite users to the room.
    fn invite(&self, users: &[UserId]) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Leave the room.
    fn leave(&self) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Set a user's power level in the room.
    fn set_power_level(
        &self,
        user: &UserId,
        level: i64,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Change the local user's display name.
    fn update_display_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
