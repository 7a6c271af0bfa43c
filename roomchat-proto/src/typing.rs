//! Typing notification payload.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A typing notification for the local user in one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingNotice {
    /// Whether the user is typing (`true`) or stopped (`false`).
    pub typing: bool,
    /// How long the server should keep showing the user as typing.
    /// `None` on stop notices.
    pub ttl: Option<Duration>,
}

impl TypingNotice {
    /// A typing-start notice that the server expires after `ttl`.
    #[must_use]
    pub const fn started(ttl: Duration) -> Self {
        Self {
            typing: true,
            ttl: Some(ttl),
        }
    }

    /// A typing-stop notice.
    #[must_use]
    pub const fn stopped() -> Self {
        Self {
            typing: false,
            ttl: None,
        }
    }

    /// TTL in milliseconds, or `-1` when there is none.
    #[must_use]
    pub fn ttl_millis(&self) -> i64 {
        self.ttl
            .map_or(-1, |ttl| i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
    }
}
