//! Room and user identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a room on the homeserver (e.g. `!abc123:example.org`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    /// Create a room identifier from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the string representation of this room ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a user as typed by the local user (e.g. `@bob:example.org`).
///
/// No validation is applied: directives pass whatever token the user
/// typed and the homeserver decides whether it names a real account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a user identifier from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the string representation of this user ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `:server` part of this ID, colon included, if it has one.
    #[must_use]
    pub fn server_suffix(&self) -> Option<&str> {
        self.0.find(':').map(|at| &self.0[at..])
    }
}

/// Split a comma- or whitespace-separated list of names into user IDs.
///
/// Names missing the `@` sigil get one; names without a server part get
/// `server_suffix` (e.g. `":example.org"`) appended. Empty entries are
/// skipped.
#[must_use]
pub fn parse_user_ids(text: &str, server_suffix: &str) -> Vec<UserId> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|name| !name.is_empty())
        .map(|name| {
            let mut id = String::with_capacity(name.len() + server_suffix.len() + 1);
            if !name.starts_with('@') {
                id.push('@');
            }
            id.push_str(name);
            if !name.contains(':') {
                id.push_str(server_suffix);
            }
            UserId(id)
        })
        .collect()
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
