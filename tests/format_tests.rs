use jsoncfmt::{FormatOptions, Formatter, Mode};

fn pretty(input: &str) -> String {
    Formatter::new().format(input).unwrap()
}

fn standardize(input: &str) -> String {
    let mut options = FormatOptions::default();
    options.mode = Mode::Standardize;
    Formatter::with_options(options).format(input).unwrap()
}

fn minify(input: &str) -> String {
    let mut options = FormatOptions::default();
    options.mode = Mode::Minify;
    Formatter::with_options(options).format(input).unwrap()
}

const CONFIG_INPUT: &str = "\
{
\t\"Management\": {
\t\t\"ServeAddress\": \"localhost:8080\", \"PasswordSalt\": \"\", \"PasswordHash\": \"\",
\t\t\"SMTP\": {\"RelayServer\": \"mail.example.com:587\", \"Password\":\"abcdefghijklmnopqrstuvwxyz\", \"From\":\"noreply@example.com\", \"To\":\"noreply@example.com\"},
\t},

\t// SSH comment.
\t\"SSH\": {
\t\t\"KeyFiles\":       [\"key.priv\"], // SSH key file
\t\t\"KnownHostFiles\": [], // SSH known hosts file
\t},

\t\"RateLimit\":    \"10Mi\",
\t\"AutoSnapshot\": {\"Cron\": \"* * * * *\", \"Count\": 3, \"TimeZone\": \"Local\"},
\t\"SendFlags\":    [\"-w\"],
\t\"RecvFlags\":    [\"-s\"],
\t\"Datasets\": [{
\t\t\"AutoSnapshot\": {\"Cron\": \"0 6 * * *\", \"TimeZone\": \"Local\", \"Count\": 30},
\t\t\"Source\":  \"//example.com/tank/fizz\",
\t\t\"Mirrors\": [\"//foo.example.com/tank/replicas/fizz-drive\"],
\t}, {
\t\t\"Source\":  \"//example.com/tank/buzz\",
\t\t\"Mirrors\": [\"//foo.example.com/tank/replicas/buzz-drive\"],
\t}, {
\t\t// Seperate dataset so it has its own readonly setting
\t\t\"Source\":  \"//example.com/tank/users\",
\t\t\"Mirrors\": [\"//foo.example.com/tank/replicas/users\"],
\t}],
}
";

const CONFIG_PRETTY: &str = "\
{
\t\"Management\": {
\t\t\"ServeAddress\": \"localhost:8080\",
\t\t\"PasswordSalt\": \"\",
\t\t\"PasswordHash\": \"\",
\t\t\"SMTP\": {
\t\t\t\"RelayServer\": \"mail.example.com:587\",
\t\t\t\"Password\":    \"abcdefghijklmnopqrstuvwxyz\",
\t\t\t\"From\":        \"noreply@example.com\",
\t\t\t\"To\":          \"noreply@example.com\",
\t\t},
\t},

\t// SSH comment.
\t\"SSH\": {
\t\t\"KeyFiles\":       [\"key.priv\"], // SSH key file
\t\t\"KnownHostFiles\": [],           // SSH known hosts file
\t},

\t\"RateLimit\":    \"10Mi\",
\t\"AutoSnapshot\": {\"Cron\": \"* * * * *\", \"Count\": 3, \"TimeZone\": \"Local\"},
\t\"SendFlags\":    [\"-w\"],
\t\"RecvFlags\":    [\"-s\"],
\t\"Datasets\": [
\t\t{
\t\t\t\"AutoSnapshot\": {
\t\t\t\t\"Cron\":     \"0 6 * * *\",
\t\t\t\t\"TimeZone\": \"Local\",
\t\t\t\t\"Count\":    30
\t\t\t},
\t\t\t\"Source\": \"//example.com/tank/fizz\",
\t\t\t\"Mirrors\": [
\t\t\t\t\"//foo.example.com/tank/replicas/fizz-drive\"
\t\t\t],
\t\t},
\t\t{
\t\t\t\"Source\": \"//example.com/tank/buzz\",
\t\t\t\"Mirrors\": [
\t\t\t\t\"//foo.example.com/tank/replicas/buzz-drive\"
\t\t\t],
\t\t},
\t\t{
\t\t\t// Seperate dataset so it has its own readonly setting
\t\t\t\"Source\":  \"//example.com/tank/users\",
\t\t\t\"Mirrors\": [\"//foo.example.com/tank/replicas/users\"],
\t\t}
\t],
}
";

#[test]
fn config_document_aligns_runs_and_keeps_comments() {
    assert_eq!(pretty(CONFIG_INPUT), CONFIG_PRETTY);
}

#[test]
fn pretty_is_idempotent_on_commented_documents() {
    let once = pretty(CONFIG_INPUT);
    assert_eq!(pretty(&once), once);
}

#[test]
fn every_comment_survives_in_order() {
    let comments = [
        "// SSH comment.",
        "// SSH key file",
        "// SSH known hosts file",
        "// Seperate dataset so it has its own readonly setting",
    ];
    let output = pretty(CONFIG_INPUT);
    let mut from = 0usize;
    for comment in comments {
        let at = output[from..]
            .find(comment)
            .unwrap_or_else(|| panic!("comment {:?} missing after byte {}", comment, from));
        from += at + comment.len();
    }
}

#[test]
fn minify_strips_everything_but_tokens() {
    let expected = concat!(
        "{\"Management\":{\"ServeAddress\":\"localhost:8080\",\"PasswordSalt\":\"\",",
        "\"PasswordHash\":\"\",\"SMTP\":{\"RelayServer\":\"mail.example.com:587\",",
        "\"Password\":\"abcdefghijklmnopqrstuvwxyz\",\"From\":\"noreply@example.com\",",
        "\"To\":\"noreply@example.com\"}},\"SSH\":{\"KeyFiles\":[\"key.priv\"],",
        "\"KnownHostFiles\":[]},\"RateLimit\":\"10Mi\",\"AutoSnapshot\":",
        "{\"Cron\":\"* * * * *\",\"Count\":3,\"TimeZone\":\"Local\"},",
        "\"SendFlags\":[\"-w\"],\"RecvFlags\":[\"-s\"],\"Datasets\":[{\"AutoSnapshot\":",
        "{\"Cron\":\"0 6 * * *\",\"TimeZone\":\"Local\",\"Count\":30},",
        "\"Source\":\"//example.com/tank/fizz\",",
        "\"Mirrors\":[\"//foo.example.com/tank/replicas/fizz-drive\"]},",
        "{\"Source\":\"//example.com/tank/buzz\",",
        "\"Mirrors\":[\"//foo.example.com/tank/replicas/buzz-drive\"]},",
        "{\"Source\":\"//example.com/tank/users\",",
        "\"Mirrors\":[\"//foo.example.com/tank/replicas/users\"]}]}",
    );
    let output = minify(CONFIG_INPUT);
    assert_eq!(output, expected);
    assert_eq!(minify(&output), output);
}

#[test]
fn empty_input_fails_at_one_one() {
    let err = Formatter::new().format("").unwrap_err();
    assert_eq!((err.line, err.column), (1, 1));
    assert_eq!(err.message, "unable to parse value: unexpected EOF");
    assert_eq!(err.partial, "");
}

#[test]
fn unterminated_string_returns_input_as_partial() {
    let err = Formatter::new().format(r#"["]"#).unwrap_err();
    assert_eq!((err.line, err.column), (1, 2));
    assert_eq!(err.message, r#"unable to parse string: "\"]""#);
    assert_eq!(err.partial, r#"["]"#);
}

#[test]
fn empty_composites_collapse_regardless_of_whitespace() {
    assert_eq!(pretty("[\n\n\n]"), "[]\n");
    assert_eq!(pretty("{\n\n\n}"), "{}\n");
}

#[test]
fn uniform_object_rows_become_a_table() {
    let input = r#"{"phoneNumbers":[{"type":"home","number":"212 555-1234"},{"type":"office","number":"646 555-4567"},{"type":"mobile","number":"123 456-7890"}]}"#;
    let expected = "\
{
\t\"phoneNumbers\": [
\t\t{\"type\": \"home\",   \"number\": \"212 555-1234\"},
\t\t{\"type\": \"office\", \"number\": \"646 555-4567\"},
\t\t{\"type\": \"mobile\", \"number\": \"123 456-7890\"}
\t]
}
";
    assert_eq!(pretty(input), expected);
}

#[test]
fn mismatched_keys_fall_back_to_one_element_per_line() {
    let input = "\
[
\t{\"keyX\": [1,2,3,4,5]},
\t{\"keyXX\": [1,2,3], \"keyZ\": {\"subkey\": \"value\"},},
\t{\"keyY\": \"val\", \"keyZZ\": [[[[[[[1,2,3]]]]]]]},
]";
    let expected = "\
[
\t{\"keyX\": [1, 2, 3, 4, 5]},
\t{\"keyXX\": [1, 2, 3], \"keyZ\": {\"subkey\": \"value\"}},
\t{\"keyY\": \"val\", \"keyZZ\": [[[[[[[1, 2, 3]]]]]]]},
]
";
    assert_eq!(pretty(input), expected);
}

#[test]
fn inline_rows_of_nested_arrays_stay_inline() {
    let input = r#"[[{"0123456789": "0123456789"}, {"0123456789": "0123456789"}], [{"0123456789": "0123456789"}, {"0123456789": "0123456789"}], [{"0123456789": "0123456789"}, {"0123456789": "0123456789"}]]"#;
    let expected = "\
[
\t[{\"0123456789\": \"0123456789\"}, {\"0123456789\": \"0123456789\"}],
\t[{\"0123456789\": \"0123456789\"}, {\"0123456789\": \"0123456789\"}],
\t[{\"0123456789\": \"0123456789\"}, {\"0123456789\": \"0123456789\"}]
]
";
    assert_eq!(pretty(input), expected);
}

#[test]
fn oversized_inner_array_expands_alone() {
    let input = r#"[[{"0123456789012345678901234567890123456789": "0123456789"}, {"0123456789": "0123456789012345678901234567890123456789"}], [{"0123456789": "0123456789"}, {"0123456789": "0123456789"}], [{"0123456789": "0123456789"}, {"0123456789": "0123456789"}]]"#;
    let expected = "\
[
\t[
\t\t{\"0123456789012345678901234567890123456789\": \"0123456789\"},
\t\t{\"0123456789\": \"0123456789012345678901234567890123456789\"}
\t],
\t[{\"0123456789\": \"0123456789\"}, {\"0123456789\": \"0123456789\"}],
\t[{\"0123456789\": \"0123456789\"}, {\"0123456789\": \"0123456789\"}]
]
";
    assert_eq!(pretty(input), expected);
}

#[test]
fn short_composites_with_trailing_commas_inline_without_them() {
    assert_eq!(
        pretty("[\n123456789,\n123456789,\n123456789,\n]"),
        "[123456789, 123456789, 123456789]\n"
    );
    assert_eq!(
        standardize("[\n123456789,\n123456789,\n123456789,\n]"),
        "[123456789, 123456789, 123456789]\n"
    );
    assert_eq!(
        minify("[\n123456789,\n123456789,\n123456789,\n]"),
        "[123456789,123456789,123456789]"
    );
}

#[test]
fn small_primes_document_fits_inline() {
    let input = r#"{"PrimeNumbers": [{}, 2, 3, 5, 7, 11, 13, 17, 19, {}]}"#;
    assert_eq!(pretty(input), format!("{}\n", input));
}

#[test]
fn numbers_are_canonicalized_and_stable() {
    assert_eq!(pretty("0.0000000000000000000033242000000"), "3.3242e-21\n");
    assert_eq!(pretty("3.3242e-21"), "3.3242e-21\n");
    let doc = pretty(r#"{"a": 1E+3, "b": 0.0001, "c": 25.10}"#);
    assert_eq!(doc, "{\"a\": 1e3, \"b\": 1e-4, \"c\": 25.1}\n");
    assert_eq!(pretty(&doc), doc);
}

#[test]
fn standardize_strips_comments_and_trailing_commas() {
    let input = "{\n// c\n\"a\": 1, // x\n\"b\": [1, 2,],\n}";
    assert_eq!(standardize(input), "{\"a\": 1, \"b\": [1, 2]}\n");
}

#[test]
fn minify_has_no_whitespace_outside_strings() {
    let output = minify(CONFIG_INPUT);
    let mut in_string = false;
    let mut escaped = false;
    for b in output.bytes() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        if b == b'"' {
            in_string = true;
            continue;
        }
        assert!(!b.is_ascii_whitespace(), "whitespace byte {:?} outside string", b as char);
        assert!(b != b'/', "comment byte survived minification");
    }
}

#[test]
fn inline_block_comments_share_the_line() {
    let input = r#"/**//**/{/**//**/"key"/**//**/:/**//**/"val"/**//**/}/**//**/"#;
    let output = pretty(input);
    assert_eq!(output.lines().count(), 1);
    assert_eq!(output.matches("/**/").count(), 12);
    assert!(output.starts_with("/**/ /**/ {"));
    assert!(output.ends_with("} /**/ /**/\n"));
}

#[test]
fn multiline_block_comments_reflow_asterisks() {
    let input = "\n\n\t\t\t/*\n\t\t\t* Block comment.\n\t\t\t*/\n\t\t\t\"Text\"\n";
    assert_eq!(pretty(input), "/*\n * Block comment.\n */\n\"Text\"\n");
}

#[test]
fn middle_comments_keep_their_place() {
    assert_eq!(
        pretty(r#"{"fwafwa" /*ffawe*/: "fewafwaf"}"#),
        "{\"fwafwa\" /*ffawe*/: \"fewafwaf\"}\n"
    );
    let spread = pretty("{\n\"k\":\n// why\n1,\n\"m\": 2,\n}");
    let expected = "\
{
\t\"k\":
\t\t// why
\t\t1,
\t\"m\": 2,
}
";
    assert_eq!(spread, expected);
    assert_eq!(pretty(&spread), spread);
}

#[test]
fn value_serialization_uses_the_same_layout() {
    #[derive(serde::Serialize)]
    struct Row {
        kind: &'static str,
        id: i32,
    }
    #[derive(serde::Serialize)]
    struct Doc {
        rows: Vec<Row>,
        title: &'static str,
    }

    let doc = Doc {
        rows: vec![
            Row { kind: "alpha", id: 1 },
            Row { kind: "b", id: 20000 },
            Row { kind: "gamma-ray", id: 3 },
        ],
        title: "very long title string padding the document beyond the inline width budget",
    };
    let output = Formatter::new().serialize(&doc).unwrap();
    let expected = "\
{
\t\"rows\": [
\t\t{\"kind\": \"alpha\",     \"id\": 1},
\t\t{\"kind\": \"b\",         \"id\": 20000},
\t\t{\"kind\": \"gamma-ray\", \"id\": 3}
\t],
\t\"title\": \"very long title string padding the document beyond the inline width budget\"
}
";
    assert_eq!(output, expected);
}
