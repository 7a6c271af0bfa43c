//! Chat input classification.
//!
//! A line of input is either a plain message or a directive. A directive is
//! any line whose trimmed form starts with [`DIRECTIVE_MARKER`]; its first
//! whitespace-delimited token is looked up in [`DIRECTIVES`] (first match
//! wins) and the rest of the line is handed to that entry's parser.
//!
//! Directive lines are never sent as chat messages. A directive with missing
//! or malformed arguments, or a keyword that is not in the table, classifies
//! as [`Command::Ignored`]: nothing is sent to the room and the user's text
//! is dropped.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::room::UserId;

/// Marks a line of input as a directive.
pub const DIRECTIVE_MARKER: char = '/';

/// Power level applied by `/deop`.
pub const DEFAULT_POWER_LEVEL: i64 = 0;

/// One classified line of chat input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// `/nick <name>`: change the local user's display name.
    ChangeDisplayName(String),
    /// `/me <message>`: send an emote.
    Emote(String),
    /// `/join <alias-or-id>`: join another room.
    JoinRoom(String),
    /// `/kick <user>`: remove a user from the room.
    Kick(UserId),
    /// `/ban <user> [reason]`: ban a user; the reason may be empty.
    Ban(UserId, String),
    /// `/unban <user>`: lift a ban.
    Unban(UserId),
    /// `/op <user> <level>`: set a user's power level (always within `i32` range).
    SetPowerLevel(UserId, i64),
    /// `/deop <user>`: reset a user's power level to [`DEFAULT_POWER_LEVEL`].
    ResetPowerLevel(UserId),
    /// Anything that is not a directive, carried verbatim.
    PlainMessage(String),
    /// A line that was consumed without producing any room operation.
    Ignored(Ignored),
}

impl Command {
    /// Whether this line was consumed as a directive (including ignored
    /// ones) rather than sent as a chat message.
    #[must_use]
    pub const fn is_directive(&self) -> bool {
        !matches!(
            self,
            Self::PlainMessage(_) | Self::Ignored(Ignored::EmptyInput)
        )
    }
}

/// Why a line produced no room operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ignored {
    /// The line was empty or whitespace.
    EmptyInput,
    /// A known directive was missing its required argument.
    MissingArgument {
        /// The directive that was recognized.
        directive: Directive,
    },
    /// `/op` named a user but the level was missing or not a 32-bit integer.
    MalformedPowerLevel {
        /// The user the level was meant for.
        user: UserId,
        /// The text that failed to parse.
        raw: String,
    },
    /// The line started with the marker but named no known directive.
    UnknownDirective {
        /// The unrecognized keyword, marker included.
        name: String,
    },
}

impl fmt::Display for Ignored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty input"),
            Self::MissingArgument { directive } => write!(f, "{directive} needs an argument"),
            Self::MalformedPowerLevel { user, raw } => {
                write!(f, "invalid power level {raw:?} for {user}")
            }
            Self::UnknownDirective { name } => write!(f, "unknown command {name}"),
        }
    }
}

/// The known directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Directive {
    /// `/nick`
    Nick,
    /// `/me`
    Me,
    /// `/join`
    Join,
    /// `/kick`
    Kick,
    /// `/ban`
    Ban,
    /// `/unban`
    Unban,
    /// `/op`
    Op,
    /// `/deop`
    Deop,
}

impl Directive {
    /// The keyword that selects this directive, marker included.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Nick => "/nick",
            Self::Me => "/me",
            Self::Join => "/join",
            Self::Kick => "/kick",
            Self::Ban => "/ban",
            Self::Unban => "/unban",
            Self::Op => "/op",
            Self::Deop => "/deop",
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Parses the (trimmed) text that follows a directive keyword.
pub type ParamsParser = fn(&str) -> Result<Command, Ignored>;

/// One row of the directive table.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveRule {
    /// The directive this row recognizes.
    pub directive: Directive,
    /// Builds the command from the text after the keyword.
    pub parse: ParamsParser,
}

/// Directive table, checked in order.
pub static DIRECTIVES: [DirectiveRule; 8] = [
    DirectiveRule {
        directive: Directive::Nick,
        parse: parse_nick,
    },
    DirectiveRule {
        directive: Directive::Me,
        parse: parse_me,
    },
    DirectiveRule {
        directive: Directive::Join,
        parse: parse_join,
    },
    DirectiveRule {
        directive: Directive::Kick,
        parse: parse_kick,
    },
    DirectiveRule {
        directive: Directive::Ban,
        parse: parse_ban,
    },
    DirectiveRule {
        directive: Directive::Unban,
        parse: parse_unban,
    },
    DirectiveRule {
        directive: Directive::Op,
        parse: parse_op,
    },
    DirectiveRule {
        directive: Directive::Deop,
        parse: parse_deop,
    },
];

/// Classify one line of chat input.
///
/// Never fails: lines that cannot be executed come back as
/// [`Command::Ignored`].
#[must_use]
pub fn classify(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Ignored(Ignored::EmptyInput);
    }
    if !trimmed.starts_with(DIRECTIVE_MARKER) {
        return Command::PlainMessage(line.to_string());
    }

    let (keyword, params) = trimmed
        .split_once(char::is_whitespace)
        .map_or((trimmed, ""), |(keyword, rest)| (keyword, rest.trim()));

    DIRECTIVES
        .iter()
        .find(|rule| rule.directive.keyword() == keyword)
        .map_or_else(
            || {
                Command::Ignored(Ignored::UnknownDirective {
                    name: keyword.to_string(),
                })
            },
            |rule| (rule.parse)(params).unwrap_or_else(Command::Ignored),
        )
}

// ---------------------------------------------------------------------------
// Parameter parsers
// ---------------------------------------------------------------------------

fn required(params: &str, directive: Directive) -> Result<String, Ignored> {
    if params.is_empty() {
        Err(Ignored::MissingArgument { directive })
    } else {
        Ok(params.to_string())
    }
}

/// Split `params` into the leading user token and the trimmed remainder.
fn user_and_rest(params: &str, directive: Directive) -> Result<(UserId, &str), Ignored> {
    let (user, rest) = params
        .split_once(char::is_whitespace)
        .map_or((params, ""), |(user, rest)| (user, rest.trim()));
    if user.is_empty() {
        return Err(Ignored::MissingArgument { directive });
    }
    Ok((UserId::new(user), rest))
}

fn parse_nick(params: &str) -> Result<Command, Ignored> {
    required(params, Directive::Nick).map(Command::ChangeDisplayName)
}

fn parse_me(params: &str) -> Result<Command, Ignored> {
    required(params, Directive::Me).map(Command::Emote)
}

fn parse_join(params: &str) -> Result<Command, Ignored> {
    required(params, Directive::Join).map(Command::JoinRoom)
}

fn parse_kick(params: &str) -> Result<Command, Ignored> {
    user_and_rest(params, Directive::Kick).map(|(user, _)| Command::Kick(user))
}

fn parse_ban(params: &str) -> Result<Command, Ignored> {
    user_and_rest(params, Directive::Ban)
        .map(|(user, reason)| Command::Ban(user, reason.to_string()))
}

fn parse_unban(params: &str) -> Result<Command, Ignored> {
    user_and_rest(params, Directive::Unban).map(|(user, _)| Command::Unban(user))
}

fn parse_op(params: &str) -> Result<Command, Ignored> {
    let (user, raw) = user_and_rest(params, Directive::Op)?;
    raw.parse::<i32>()
        .map(|level| Command::SetPowerLevel(user.clone(), i64::from(level)))
        .map_err(|_| Ignored::MalformedPowerLevel {
            user,
            raw: raw.to_string(),
        })
}

fn parse_deop(params: &str) -> Result<Command, Ignored> {
    user_and_rest(params, Directive::Deop).map(|(user, _)| Command::ResetPowerLevel(user))
}
