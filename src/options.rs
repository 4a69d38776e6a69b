/// Output mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Expanded, column-aligned output. Comments and trailing commas from
    /// the input are preserved.
    #[default]
    Pretty,
    /// Same layout as [`Mode::Pretty`] but strict JSON: comments and
    /// trailing commas are stripped.
    Standardize,
    /// Single line, no whitespace outside strings, no comments, no trailing
    /// commas.
    Minify,
}

/// Configuration for [`Formatter`](crate::Formatter).
///
/// Use [`Default::default()`] or [`FormatOptions::recommended()`] and adjust
/// fields as needed.
///
/// # Example
///
/// ```rust
/// use jsoncfmt::{FormatOptions, Mode};
///
/// let mut options = FormatOptions::default();
/// options.max_column = 100;
/// options.indent = "  ".to_string();
/// options.mode = Mode::Standardize;
/// ```
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Output mode. Default: [`Mode::Pretty`].
    pub mode: Mode,

    /// Soft line-width target in bytes, with tabs expanded to `tab_width`.
    /// A composite is rendered inline only if it ends at or before this
    /// column. Default: 80.
    pub max_column: usize,

    /// Indentation unit, one per nesting level. Default: a single tab.
    pub indent: String,

    /// Width a tab counts for when measuring against `max_column`.
    /// Default: 8.
    pub tab_width: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Pretty,
            max_column: 80,
            indent: "\t".to_string(),
            tab_width: 8,
        }
    }
}

impl FormatOptions {
    /// Recommended settings; currently identical to [`Default::default()`].
    pub fn recommended() -> Self {
        Self::default()
    }

    /// Width of one indentation unit with tabs expanded.
    pub(crate) fn indent_width(&self) -> usize {
        crate::buffer::text_width(&self.indent, self.tab_width)
    }
}
