//! # jsoncfmt
//!
//! A JSON/JSONC pretty-printer that produces human-readable, column-aligned
//! output, a strict-JSON variant, or a minified variant.
//!
//! jsoncfmt accepts a permissive superset of JSON: `//` line comments,
//! `/* */` block comments, and trailing commas. For every object and array
//! it decides between a single-line and an expanded rendering against a
//! width budget, aligns object keys, values, and trailing comments into
//! columns, and renders arrays of uniform objects as tables:
//!
//! ```json
//! {
//!     "firstName": "John",
//!     "lastName":  "Smith",
//!     "phoneNumbers": [
//!         {"type": "home",   "number": "212 555-1234"},
//!         {"type": "office", "number": "646 555-4567"}
//!     ]
//! }
//! ```
//!
//! ## Command-Line Tool
//!
//! The crate ships the `jcfmt` binary:
//!
//! ```sh
//! # Format JSONC from stdin
//! echo '{"a":1,"b":2}' | jcfmt
//!
//! # Strict JSON out, file in and out
//! jcfmt --standardize input.jsonc -o output.json
//!
//! # Minify
//! jcfmt --minify < input.json
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use jsoncfmt::Formatter;
//!
//! let input = r#"{"name":"Alice","scores":[95,87,92],"active":true}"#;
//! let output = Formatter::new().format(input).unwrap();
//! assert!(output.ends_with('\n'));
//! ```
//!
//! ## Serializing Rust Types
//!
//! Any type implementing [`serde::Serialize`] can be formatted directly:
//!
//! ```rust
//! use jsoncfmt::Formatter;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Player {
//!     name: String,
//!     scores: Vec<i32>,
//! }
//!
//! let player = Player { name: "Alice".into(), scores: vec![95, 87, 92] };
//! let output = Formatter::new().serialize(&player).unwrap();
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use jsoncfmt::{FormatOptions, Formatter, Mode};
//!
//! let mut options = FormatOptions::recommended();
//! options.max_column = 100;
//! options.indent = "  ".to_string();
//!
//! let output = Formatter::with_options(options)
//!     .format(r#"{"values":[1,2,3]}"#)
//!     .unwrap();
//! ```
//!
//! Comments are preserved in the default [`Mode::Pretty`]; standalone
//! comments keep their own lines, and a `//` comment trailing a value is
//! kept on that value's line and aligned into a column with its neighbors.
//! [`Mode::Standardize`] strips comments and trailing commas while keeping
//! the layout; [`Mode::Minify`] emits the document on a single line.

mod align;
mod buffer;
mod convert;
mod error;
mod layout;
mod model;
mod options;
mod parser;
mod tokenizer;

pub use crate::error::JsoncError;
pub use crate::model::{Position, Token, TokenKind};
pub use crate::options::{FormatOptions, Mode};
pub use crate::tokenizer::TokenGenerator;

/// Formats JSONC documents according to its [`FormatOptions`].
///
/// A `Formatter` is cheap to construct and holds no state between calls;
/// concurrent use from multiple threads on disjoint inputs is fine.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    pub options: FormatOptions,
}

impl Formatter {
    pub fn new() -> Self {
        Self { options: FormatOptions::default() }
    }

    pub fn with_options(options: FormatOptions) -> Self {
        Self { options }
    }

    /// Formats a JSONC document.
    ///
    /// On success the output ends with a newline iff the input was
    /// non-empty, except under [`Mode::Minify`] which never emits
    /// whitespace outside strings. On failure the returned error carries
    /// the position of the first malformed token and, in
    /// [`JsoncError::partial`], the best-effort output.
    pub fn format(&self, input: &str) -> Result<String, JsoncError> {
        let mut items = parser::parse(input, &self.options)
            .map_err(|e| e.with_partial(input))?;
        Ok(layout::render(&mut items, &self.options))
    }

    /// Formats an already-parsed [`serde_json::Value`] through the same
    /// layout engine.
    pub fn format_value(&self, value: &serde_json::Value) -> Result<String, JsoncError> {
        let mut items = vec![convert::value_to_node(value)?];
        Ok(layout::render(&mut items, &self.options))
    }

    /// Serializes any [`serde::Serialize`] type and formats the result.
    pub fn serialize<T: serde::Serialize>(&self, value: &T) -> Result<String, JsoncError> {
        let value = serde_json::to_value(value).map_err(|e| JsoncError {
            line: 1,
            column: 1,
            message: format!("unable to serialize value: {}", e),
            partial: String::new(),
        })?;
        self.format_value(&value)
    }
}

/// One-shot convenience for [`Formatter::format`] with default options.
pub fn format(input: &str) -> Result<String, JsoncError> {
    Formatter::new().format(input)
}
