//! Property-based tests for chat input classification.
//!
//! Uses proptest to verify:
//! 1. Lines that do not start with the marker are sent verbatim.
//! 2. Lines that start with the marker are never sent as messages.
//! 3. `/op` accepts any 32-bit level and rejects non-numeric or wider ones.
//! 4. `/ban` splits off the user and keeps the rest as the reason.
//! 5. Arbitrary input never panics.

use proptest::prelude::*;
use roomchat_proto::command::{Command, DIRECTIVES, Ignored, classify};
use roomchat_proto::room::UserId;

/// Strategy for a user token: no whitespace, non-empty.
fn arb_user() -> impl Strategy<Value = String> {
    "@?[a-z][a-z0-9._-]{0,15}(:[a-z]{1,10}\\.org)?"
}

/// Strategy for a line that does not start with the marker once trimmed.
fn arb_plain_line() -> impl Strategy<Value = String> {
    "[ \t]{0,3}[^/\\s][^\n]{0,64}"
}

proptest! {
    #[test]
    fn plain_lines_are_sent_verbatim(line in arb_plain_line()) {
        prop_assert_eq!(classify(&line), Command::PlainMessage(line.clone()));
    }

    #[test]
    fn marker_lines_are_never_messages(rest in "[^\n]{0,64}") {
        let line = format!("/{rest}");
        let command = classify(&line);
        prop_assert!(!matches!(command, Command::PlainMessage(_)));
        prop_assert!(command.is_directive());
    }

    #[test]
    fn op_accepts_any_32_bit_level(user in arb_user(), level in any::<i32>()) {
        let command = classify(&format!("/op {user} {level}"));
        prop_assert_eq!(command, Command::SetPowerLevel(UserId::new(user), i64::from(level)));
    }

    #[test]
    fn op_rejects_levels_outside_32_bits(user in arb_user(), excess in 1..=i64::from(u32::MAX)) {
        let level = if excess % 2 == 0 {
            i64::from(i32::MAX) + excess
        } else {
            i64::from(i32::MIN) - excess
        };
        let command = classify(&format!("/op {user} {level}"));
        let is_malformed = matches!(command, Command::Ignored(Ignored::MalformedPowerLevel { .. }));
        prop_assert!(is_malformed);
    }

    #[test]
    fn op_rejects_non_numeric_levels(user in arb_user(), raw in "[a-z]{1,8}") {
        let command = classify(&format!("/op {user} {raw}"));
        prop_assert_eq!(
            command,
            Command::Ignored(Ignored::MalformedPowerLevel { user: UserId::new(user), raw })
        );
    }

    #[test]
    fn ban_reason_is_remainder(user in arb_user(), reason in "[a-z]{1,8}( [a-z]{1,8}){0,4}") {
        let command = classify(&format!("/ban {user} {reason}"));
        prop_assert_eq!(command, Command::Ban(UserId::new(user), reason));
    }

    #[test]
    fn unknown_keywords_are_dropped(word in "[a-z]{1,10}") {
        prop_assume!(DIRECTIVES.iter().all(|r| r.directive.keyword() != format!("/{word}")));
        let command = classify(&format!("/{word} some text"));
        prop_assert_eq!(
            command,
            Command::Ignored(Ignored::UnknownDirective { name: format!("/{word}") })
        );
    }

    #[test]
    fn arbitrary_input_does_not_panic(line in any::<String>()) {
        let _ = classify(&line);
    }
}
