use thiserror::Error;

use crate::model::Position;

/// Error produced when a JSONC document cannot be tokenized or parsed.
///
/// The position is 1-based; `column` is a byte offset within the line. The
/// layout engine itself never fails, so this is the only error the crate
/// reports. `partial` holds the best-effort output for callers that want to
/// emit something anyway (the CLI passes it through); most callers ignore it.
///
/// # Example
///
/// ```rust
/// use jsoncfmt::Formatter;
///
/// let err = Formatter::new().format("").unwrap_err();
/// assert_eq!((err.line, err.column), (1, 1));
/// assert_eq!(err.message, "unable to parse value: unexpected EOF");
/// ```
#[derive(Debug, Clone, Error)]
#[error("{line}:{column}: {message}")]
pub struct JsoncError {
    pub line: usize,
    pub column: usize,
    pub message: String,
    /// Best-effort output produced before the failure.
    pub partial: String,
}

impl JsoncError {
    pub(crate) fn new(message: impl Into<String>, pos: Position) -> Self {
        Self {
            line: pos.line,
            column: pos.column,
            message: message.into(),
            partial: String::new(),
        }
    }

    pub(crate) fn with_partial(mut self, partial: &str) -> Self {
        self.partial = partial.to_string();
        self
    }
}
