//! Normalisation applied to extracted text before it is handed back to the
//! page for reading aloud.

use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^\w\s.,!?'"-]"#).expect("valid disallowed-character pattern"));
static NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").expect("valid newline pattern"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Strips characters outside word characters, whitespace and `.,!?'"-`,
/// then collapses newline and whitespace runs into single spaces.
///
/// Removal happens before collapsing so the result never contains a
/// whitespace run, which keeps the function idempotent.
///
/// `\w` and `\s` use the regex crate's Unicode classes: combining marks
/// count as word characters, `²` does not, and the ASCII separators
/// `\x1c`..`\x1f` are not whitespace, so they are stripped.
pub fn clean_text(text: &str) -> String {
    let text = DISALLOWED.replace_all(text, "");
    let text = NEWLINES.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn collapses_newlines_and_trailing_space() {
        assert_eq!(clean_text("Hello\n\nWorld!!  "), "Hello World!!");
    }

    #[test]
    fn keeps_allowed_punctuation() {
        assert_eq!(
            clean_text(r#"It's "fine", isn't it? Yes - really."#),
            r#"It's "fine", isn't it? Yes - really."#
        );
    }

    #[test]
    fn strips_symbols_without_leaving_double_spaces() {
        assert_eq!(clean_text("price @ 5$ ; total\t#2"), "price 5 total 2");
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(clean_text("Café\r\nniño™"), "Café niño");
    }

    #[test]
    fn unicode_class_edges() {
        assert_eq!(clean_text("cafe\u{301} x\u{b2}"), "cafe\u{301} x");
        assert_eq!(clean_text("a\x1cb\x1fc"), "abc");
    }

    #[test]
    fn empty_and_symbol_only_input_becomes_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n@@ ### \n"), "");
    }

    proptest! {
        #[test]
        fn cleaning_is_idempotent(input in any::<String>()) {
            let once = clean_text(&input);
            prop_assert_eq!(clean_text(&once), once);
        }

        #[test]
        fn output_has_no_whitespace_runs(input in "[a-z @#\n\t.,!?]{0,64}") {
            let cleaned = clean_text(&input);
            prop_assert!(!cleaned.contains("  "));
            prop_assert_eq!(cleaned.trim(), cleaned.as_str());
        }
    }
}
