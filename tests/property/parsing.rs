//! Property-based tests for the command grammar.
//!
//! Uses proptest to verify:
//! 1. A trailing priority code is always consumed and stripped from the title.
//! 2. Titles without a trailing code never get an explicit priority.
//! 3. Arbitrary input never panics, and text without the prefix is ignored.
//! 4. Index-bearing commands round-trip any non-negative index.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use taskbot_proto::command::{Command, ParseError, parse};
use taskbot_proto::task::Priority;

/// Strategy for a single title word that is not itself a priority code.
fn arb_word() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9]{0,8}".prop_filter("not a priority code", |w| {
        Priority::from_code(w).is_none()
    })
}

/// Strategy for 1..6 title words.
fn arb_words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_word(), 1..6)
}

/// Strategy for one of the four priorities.
fn arb_priority() -> impl Strategy<Value = Priority> {
    prop::sample::select(Priority::ALL.to_vec())
}

/// Strategy for a priority code in random letter case.
fn arb_priority_token() -> impl Strategy<Value = (Priority, String)> {
    (arb_priority(), any::<bool>()).prop_map(|(p, lower)| {
        let code = if lower {
            p.code().to_ascii_lowercase()
        } else {
            p.code().to_string()
        };
        (p, code)
    })
}

/// Strategy for runs of spaces and tabs between tokens.
fn arb_gap() -> impl Strategy<Value = String> {
    "[ \t]{1,4}"
}

proptest! {
    #[test]
    fn trailing_priority_is_consumed(
        words in arb_words(),
        (priority, token) in arb_priority_token(),
        gap in arb_gap(),
    ) {
        let input = format!("!add{gap}{}{gap}{token}", words.join(&gap));
        let cmd = parse(&input).unwrap();
        prop_assert_eq!(cmd, Command::Add { title: words.join(" "), priority: Some(priority) });
    }

    #[test]
    fn missing_priority_stays_unspecified(words in arb_words()) {
        let input = format!("!add {}", words.join(" "));
        let cmd = parse(&input).unwrap();
        prop_assert_eq!(cmd, Command::Add { title: words.join(" "), priority: None });
    }

    #[test]
    fn lone_priority_is_no_content((_, token) in arb_priority_token()) {
        prop_assert_eq!(parse(&format!("!add {token}")), Err(ParseError::MissingTitle));
    }

    #[test]
    fn arbitrary_input_never_panics(input in "\\PC{0,200}") {
        let _ = parse(&input);
    }

    #[test]
    fn unprefixed_text_is_unrecognized(input in "[^!\\s][^\n]{0,100}") {
        prop_assert_eq!(parse(&input), Ok(Command::Unrecognized));
    }

    #[test]
    fn index_commands_round_trip(index in any::<u16>()) {
        let index = usize::from(index);
        prop_assert_eq!(parse(&format!("!done {index}")), Ok(Command::Complete { index }));
        prop_assert_eq!(parse(&format!("!delete {index}")), Ok(Command::Delete { index }));
    }

    #[test]
    fn edit_priority_only_never_touches_title(
        index in any::<u16>(),
        (priority, token) in arb_priority_token(),
    ) {
        let index = usize::from(index);
        let cmd = parse(&format!("!edit {index} {token}")).unwrap();
        prop_assert_eq!(cmd, Command::Edit { index, title: None, priority: Some(priority) });
    }

    #[test]
    fn edit_words_only_never_touches_priority(index in any::<u16>(), words in arb_words()) {
        let index = usize::from(index);
        let cmd = parse(&format!("!edit {index} {}", words.join(" "))).unwrap();
        prop_assert_eq!(
            cmd,
            Command::Edit { index, title: Some(words.join(" ")), priority: None }
        );
    }
}
