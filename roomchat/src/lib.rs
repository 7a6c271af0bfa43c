//! `RoomChat`: room interaction core for a chat client's room view.
//!
//! Two independent components sit between a host UI and the remote room:
//! the [`typing::TypingDebouncer`], which turns keystrokes into rate-limited
//! typing notifications, and the [`command::CommandDispatcher`], which turns
//! a submitted line into either a chat message or a room-management call.
//! [`room_view::RoomView`] wires both to one room.

pub mod clock;
pub mod command;
pub mod config;
pub mod gateway;
pub mod room_view;
pub mod typing;
