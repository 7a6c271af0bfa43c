//! Typing notifications for the local user.
//!
//! [`state::TypingState`] decides when to notify; [`debouncer::TypingDebouncer`]
//! owns one state per room view and carries out its decisions against a
//! [`RoomGateway`](crate::gateway::RoomGateway).

pub mod debouncer;
pub mod state;

pub use debouncer::{TypingDebouncer, TypingError};
pub use state::{DEFAULT_WINDOW, TypingConfig};
