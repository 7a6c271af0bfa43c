//! One open room view.
//!
//! [`RoomView`] is what a host UI holds while a room is on screen: it feeds
//! input-box changes to a [`TypingDebouncer`] and submitted lines to a
//! [`CommandDispatcher`], both bound to the same room gateway.
//!
//! # View lifecycle
//!
//! 1. Host calls [`RoomView::open`] when the room is shown
//! 2. Every input change goes through [`RoomView::on_input_changed`]
//! 3. The send button goes through [`RoomView::submit`]
//! 4. [`RoomView::invite`] invites users by name
//! 5. [`RoomView::switch_room`] moves the view to another room
//! 6. [`RoomView::close`] when the room is hidden, or [`RoomView::leave`]
//!    to leave the room for good

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::Instrument;
use uuid::Uuid;

use roomchat_proto::command::{Command, Ignored};
use roomchat_proto::error::GatewayError;
use roomchat_proto::room::{RoomId, UserId, parse_user_ids};

use crate::clock::Clock;
use crate::command::{CommandDispatcher, DispatchNotice, DispatchOutcome};
use crate::gateway::RoomGateway;
use crate::typing::{TypingConfig, TypingDebouncer, TypingError};

/// Settings for a room view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomViewConfig {
    /// The local user; its server part completes bare invitee names.
    pub user_id: UserId,
    /// Debouncer timing.
    pub typing: TypingConfig,
    /// Capacity of the dispatcher's notice channel.
    pub notice_buffer: usize,
}

impl Default for RoomViewConfig {
    fn default() -> Self {
        Self {
            user_id: UserId::new("@me:localhost"),
            typing: TypingConfig::default(),
            notice_buffer: 16,
        }
    }
}

/// Room interaction state for the room currently on screen.
pub struct RoomView<G, C> {
    /// Identifies this view in logs.
    session: Uuid,
    room_id: RoomId,
    clock: C,
    config: RoomViewConfig,
    typing: TypingDebouncer,
    dispatcher: CommandDispatcher<G>,
}

impl<G, C> RoomView<G, C>
where
    G: RoomGateway + 'static,
    C: Clock + Clone,
{
    /// Open a view on `room_id`.
    ///
    /// Returns the view and the receiver for user notices (e.g. permission
    /// errors). Must be called from within a tokio runtime.
    pub fn open(
        room_id: RoomId,
        gateway: Arc<G>,
        clock: C,
        config: RoomViewConfig,
    ) -> (Self, mpsc::Receiver<DispatchNotice>) {
        let session = Uuid::now_v7();
        let typing = Self::spawn_typing(session, &room_id, &gateway, &clock, config.typing);
        let (dispatcher, notices) = CommandDispatcher::new(gateway, config.notice_buffer);
        tracing::info!(%session, room = %room_id, "room view opened");

        let view = Self {
            session,
            room_id,
            clock,
            config,
            typing,
            dispatcher,
        };
        (view, notices)
    }

    /// The room this view is showing.
    #[must_use]
    pub const fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// The input box now contains `text`.
    ///
    /// # Errors
    ///
    /// Returns [`TypingError::Closed`] if the debouncer has shut down.
    pub fn on_input_changed(&self, text: &str) -> Result<(), TypingError> {
        self.typing.on_edit(!text.is_empty())
    }

    /// The user pressed send with `line` in the input box.
    ///
    /// Ends the typing episode (unless the line was empty, which sends
    /// nothing) and dispatches the line.
    ///
    /// # Errors
    ///
    /// Returns the [`GatewayError`] if the room rejected the operation.
    pub async fn submit(&self, line: &str) -> Result<DispatchOutcome, GatewayError> {
        let command = CommandDispatcher::<G>::classify(line);
        if command == Command::Ignored(Ignored::EmptyInput) {
            return Ok(DispatchOutcome::Ignored(Ignored::EmptyInput));
        }

        if let Err(e) = self.typing.on_send() {
            tracing::debug!(error = %e, "could not end typing episode on send");
        }

        let span = tracing::debug_span!("dispatch", session = %self.session, room = %self.room_id);
        self.dispatcher.dispatch(command).instrument(span).await
    }

    /// Invite the users named in `names`, a comma- or space-separated list.
    ///
    /// Bare names are completed with `@` and the local user's server, so
    /// `bob, carol` invites `@bob:<server>` and `@carol:<server>`. Returns
    /// the invited IDs; a blank list makes no call and returns none.
    ///
    /// # Errors
    ///
    /// Returns the [`GatewayError`] if the room rejected the invite.
    pub async fn invite(&self, names: &str) -> Result<Vec<UserId>, GatewayError> {
        let suffix = self.config.user_id.server_suffix().unwrap_or_default();
        let users = parse_user_ids(names, suffix);
        let span = tracing::debug_span!("invite", session = %self.session, room = %self.room_id);
        self.dispatcher.invite(&users).instrument(span).await?;
        if !users.is_empty() {
            tracing::info!(room = %self.room_id, count = users.len(), "invites sent");
        }
        Ok(users)
    }

    /// Move this view to another room.
    ///
    /// The old room's debouncer is shut down, sending its typing-stop if an
    /// episode was open; typing state never carries over between rooms.
    /// Returns the notice receiver for the new room; the previous one stops
    /// receiving.
    pub async fn switch_room(
        &mut self,
        room_id: RoomId,
        gateway: Arc<G>,
    ) -> mpsc::Receiver<DispatchNotice> {
        let typing = Self::spawn_typing(
            self.session,
            &room_id,
            &gateway,
            &self.clock,
            self.config.typing,
        );
        let old_typing = std::mem::replace(&mut self.typing, typing);
        let (dispatcher, notices) = CommandDispatcher::new(gateway, self.config.notice_buffer);
        self.dispatcher = dispatcher;

        let old_room = std::mem::replace(&mut self.room_id, room_id);
        tracing::info!(
            session = %self.session,
            from = %old_room,
            to = %self.room_id,
            "room view switched"
        );

        if let Err(e) = old_typing.on_leave_view().await {
            tracing::debug!(room = %old_room, error = %e, "previous typing debouncer already gone");
        }
        notices
    }

    /// Close the view, flushing a typing-stop if an episode is open.
    ///
    /// # Errors
    ///
    /// Returns [`TypingError::Closed`] if the debouncer had already shut down.
    pub async fn close(self) -> Result<(), TypingError> {
        tracing::info!(session = %self.session, room = %self.room_id, "room view closed");
        self.typing.on_leave_view().await
    }

    /// Leave the room and close the view.
    ///
    /// The typing-stop is flushed before the leave request goes out.
    ///
    /// # Errors
    ///
    /// Returns the [`GatewayError`] if the room rejected the request; the
    /// view is closed either way.
    pub async fn leave(self) -> Result<(), GatewayError> {
        tracing::info!(session = %self.session, room = %self.room_id, "leaving room");
        if let Err(e) = self.typing.on_leave_view().await {
            tracing::debug!(error = %e, "typing debouncer already gone");
        }
        self.dispatcher.leave().await
    }

    fn spawn_typing(
        session: Uuid,
        room_id: &RoomId,
        gateway: &Arc<G>,
        clock: &C,
        config: TypingConfig,
    ) -> TypingDebouncer {
        let span = tracing::debug_span!("typing", %session, room = %room_id);
        let _entered = span.enter();
        TypingDebouncer::spawn(Arc::clone(gateway), clock.clone(), config)
    }
}
