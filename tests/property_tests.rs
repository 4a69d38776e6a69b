//! Property tests for the formatter's core invariants: idempotence,
//! semantic preservation, and the width budget.

use jsoncfmt::{FormatOptions, Formatter, Mode, TokenGenerator, TokenKind};
use proptest::prelude::*;

/// Generated documents keep keys and strings short so that no single pair
/// can legitimately overflow the width budget; the width property below
/// may then assert strictly.
fn json_value() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i64>().prop_map(serde_json::Value::from),
        (-1.0e12f64..1.0e12f64).prop_map(|f| serde_json::json!(f)),
        "[a-zA-Z0-9 _.-]{0,20}".prop_map(serde_json::Value::from),
    ];
    leaf.prop_recursive(3, 24, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(serde_json::Value::from),
            prop::collection::vec(("[a-z]{1,8}", inner), 0..8)
                .prop_map(|pairs| serde_json::Value::Object(pairs.into_iter().collect())),
        ]
    })
}

fn pretty(input: &str) -> String {
    Formatter::new().format(input).unwrap()
}

fn minify(input: &str) -> String {
    let mut options = FormatOptions::default();
    options.mode = Mode::Minify;
    Formatter::with_options(options).format(input).unwrap()
}

/// Token stream with comments and blank lines dropped. The tokenizer
/// canonicalizes numbers, so equal streams mean equal documents.
fn value_tokens(input: &str) -> Vec<(TokenKind, String)> {
    TokenGenerator::new(input)
        .map(|t| t.expect("document tokenizes"))
        .filter(|t| {
            !matches!(
                t.kind,
                TokenKind::LineComment | TokenKind::BlockComment | TokenKind::BlankLine
            )
        })
        .map(|t| (t.kind, t.text))
        .collect()
}

fn line_width(line: &str) -> usize {
    line.bytes().map(|b| if b == b'\t' { 8 } else { 1 }).sum()
}

proptest! {
    #[test]
    fn pretty_is_idempotent(value in json_value()) {
        let input = serde_json::to_string(&value).unwrap();
        let once = pretty(&input);
        prop_assert_eq!(pretty(&once), once);
    }

    #[test]
    fn minify_is_idempotent(value in json_value()) {
        let input = serde_json::to_string(&value).unwrap();
        let once = minify(&input);
        prop_assert_eq!(minify(&once), once.clone());
        prop_assert!(!once.ends_with('\n'));
    }

    #[test]
    fn formatting_preserves_the_token_stream(value in json_value()) {
        let input = serde_json::to_string(&value).unwrap();
        let output = pretty(&input);
        prop_assert_eq!(value_tokens(&input), value_tokens(&output));
    }

    #[test]
    fn minify_matches_pretty_tokens(value in json_value()) {
        let input = serde_json::to_string(&value).unwrap();
        prop_assert_eq!(value_tokens(&pretty(&input)), value_tokens(&minify(&input)));
    }

    #[test]
    fn lines_respect_the_width_budget(value in json_value()) {
        let input = serde_json::to_string(&value).unwrap();
        let output = pretty(&input);
        for line in output.lines() {
            prop_assert!(
                line_width(line) <= 80,
                "line exceeds 80 columns: {:?}",
                line
            );
        }
    }

    #[test]
    fn standardize_agrees_with_pretty_on_comment_free_input(value in json_value()) {
        let input = serde_json::to_string(&value).unwrap();
        let mut options = FormatOptions::default();
        options.mode = Mode::Standardize;
        let standardized = Formatter::with_options(options).format(&input).unwrap();
        prop_assert_eq!(standardized, pretty(&input));
    }

    #[test]
    fn format_value_agrees_with_format(value in json_value()) {
        let input = serde_json::to_string(&value).unwrap();
        let via_text = pretty(&input);
        let via_value = Formatter::new().format_value(&value).unwrap();
        prop_assert_eq!(via_value, via_text);
    }

    #[test]
    fn canonical_numbers_survive_reformatting(int in any::<i64>(), frac in 0u64..=999_999, exp in -30i32..30) {
        let input = format!("{}.{}e{}", int, frac, exp);
        let once = pretty(&input);
        prop_assert_eq!(pretty(&once), once);
    }
}
