//! Shared value types for the `RoomChat` interaction core.

pub mod command;
pub mod error;
pub mod room;
pub mod typing;
