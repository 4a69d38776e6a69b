use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use is_terminal::IsTerminal;
use jsoncfmt::{FormatOptions, Formatter, Mode, TokenGenerator, TokenKind};

/// A human-friendly JSONC formatter with column alignment.
///
/// jcfmt reads JSON-with-comments from stdin or files and writes it back
/// pretty-printed: short containers on one line, object keys and trailing
/// comments aligned into columns, arrays of similar objects as tables.
#[derive(Parser, Debug)]
#[command(name = "jcfmt")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input file(s). If not specified, reads from stdin.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Output file. If not specified, writes to stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Minify output: one line, no whitespace, no comments.
    #[arg(short, long, conflicts_with = "standardize")]
    minify: bool,

    /// Emit strict JSON: keep the layout, strip comments and trailing
    /// commas.
    #[arg(short, long)]
    standardize: bool,

    /// Maximum line width before containers are expanded.
    #[arg(short = 'w', long, default_value = "80")]
    max_width: usize,

    /// Indent with this many spaces instead of a tab.
    #[arg(long, value_name = "N")]
    spaces: Option<usize>,

    /// Colorize output for the terminal (stdout only).
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorModeArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorModeArg {
    Auto,
    Always,
    Never,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("jcfmt: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let input = if args.files.is_empty() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        let mut combined = String::new();
        for path in &args.files {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
            combined.push_str(&content);
        }
        combined
    };

    let mut options = FormatOptions::default();
    options.max_column = args.max_width;
    if let Some(n) = args.spaces {
        options.indent = " ".repeat(n);
    }
    options.mode = if args.minify {
        Mode::Minify
    } else if args.standardize {
        Mode::Standardize
    } else {
        Mode::Pretty
    };

    let output = Formatter::with_options(options).format(&input)?;
    let output = if args.output.is_none() && should_colorize(args.color) {
        colorize(&output)
    } else {
        output
    };

    if let Some(path) = args.output {
        fs::write(&path, &output)
            .map_err(|e| format!("cannot write '{}': {}", path.display(), e))?;
    } else {
        io::stdout().write_all(output.as_bytes())?;
    }
    Ok(())
}

fn should_colorize(mode: ColorModeArg) -> bool {
    match mode {
        ColorModeArg::Auto => io::stdout().is_terminal(),
        ColorModeArg::Always => true,
        ColorModeArg::Never => false,
    }
}

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_KEY: &str = "\x1b[94m";
const COLOR_STRING: &str = "\x1b[32m";
const COLOR_NUMBER: &str = "\x1b[36m";
const COLOR_LITERAL: &str = "\x1b[35m";
const COLOR_PUNCT: &str = "\x1b[2m";
const COLOR_COMMENT: &str = "\x1b[90m";

enum Container {
    Object { expect_key: bool },
    Array,
}

/// Wraps the formatter's own output in ANSI colors by re-tokenizing it.
/// Keys are told apart from string values by tracking the object/array
/// nesting through the structural tokens.
fn colorize(formatted: &str) -> String {
    let mut out = String::with_capacity(formatted.len() * 2);
    let mut cursor = 0usize;
    let mut containers: Vec<Container> = Vec::new();

    for token in TokenGenerator::new(formatted) {
        let token = match token {
            Ok(t) => t,
            // Not our own output after all; hand it back untouched.
            Err(_) => return formatted.to_string(),
        };
        if token.kind == TokenKind::BlankLine {
            continue;
        }

        let start = token.pos.offset;
        let end = start + token.text.len();
        out.push_str(&formatted[cursor..start]);
        cursor = end;

        let color = match token.kind {
            TokenKind::String => match containers.last() {
                Some(Container::Object { expect_key: true }) => COLOR_KEY,
                _ => COLOR_STRING,
            },
            TokenKind::Number => COLOR_NUMBER,
            TokenKind::True | TokenKind::False | TokenKind::Null => COLOR_LITERAL,
            TokenKind::LineComment | TokenKind::BlockComment => COLOR_COMMENT,
            TokenKind::BeginObject => {
                containers.push(Container::Object { expect_key: true });
                COLOR_PUNCT
            }
            TokenKind::BeginArray => {
                containers.push(Container::Array);
                COLOR_PUNCT
            }
            TokenKind::EndObject | TokenKind::EndArray => {
                containers.pop();
                COLOR_PUNCT
            }
            TokenKind::Colon => {
                if let Some(Container::Object { expect_key }) = containers.last_mut() {
                    *expect_key = false;
                }
                COLOR_PUNCT
            }
            TokenKind::Comma => {
                if let Some(Container::Object { expect_key }) = containers.last_mut() {
                    *expect_key = true;
                }
                COLOR_PUNCT
            }
            TokenKind::BlankLine => unreachable!(),
        };
        out.push_str(color);
        out.push_str(&formatted[start..end]);
        out.push_str(COLOR_RESET);
    }
    out.push_str(&formatted[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorize_highlights_tokens() {
        let input = "{\"key\": true, \"num\": -3.5, /*c*/ \"arr\": [1, \"hi\"]}\n";
        let output = colorize(input);

        assert!(output.contains(&format!("{COLOR_KEY}\"key\"{COLOR_RESET}")));
        assert!(output.contains(&format!("{COLOR_STRING}\"hi\"{COLOR_RESET}")));
        assert!(output.contains(&format!("{COLOR_NUMBER}-3.5{COLOR_RESET}")));
        assert!(output.contains(&format!("{COLOR_LITERAL}true{COLOR_RESET}")));
        assert!(output.contains(&format!("{COLOR_COMMENT}/*c*/{COLOR_RESET}")));
        assert!(output.contains(&format!("{COLOR_PUNCT}{{{COLOR_RESET}")));
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn colorize_passes_malformed_text_through() {
        assert_eq!(colorize("not json"), "not json");
    }
}
