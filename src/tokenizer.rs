use crate::error::JsoncError;
use crate::model::{Position, Token, TokenKind};

/// How many bytes of the offending input an error message quotes.
const ERROR_PREFIX_LEN: usize = 16;

struct ScannerState<'a> {
    input: &'a [u8],
    offset: usize,
    line: usize,
    line_start: usize,
    token_start: Position,
    text_on_line: bool,
}

impl<'a> ScannerState<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            offset: 0,
            line: 1,
            line_start: 0,
            token_start: Position::default(),
            text_on_line: false,
        }
    }

    fn position(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            column: self.offset - self.line_start + 1,
        }
    }

    fn current(&self) -> Option<u8> {
        self.input.get(self.offset).copied()
    }

    fn advance(&mut self) {
        if let Some(b) = self.current() {
            self.offset += 1;
            if b == b'\n' {
                self.line += 1;
                self.line_start = self.offset;
                self.text_on_line = false;
            } else if !b.is_ascii_whitespace() {
                self.text_on_line = true;
            }
        }
    }

    fn set_token_start(&mut self) {
        self.token_start = self.position();
    }

    fn token_text(&self) -> &str {
        // The scanner only splits at ASCII bytes, so the slice stays on
        // UTF-8 boundaries.
        std::str::from_utf8(&self.input[self.token_start.offset..self.offset])
            .expect("token spans a UTF-8 boundary")
    }

    fn make_token(&self, kind: TokenKind, text: String, follows_text: bool) -> Token {
        Token { kind, text, pos: self.token_start, follows_text }
    }

    fn error_at_token(&self, kind_name: &str) -> JsoncError {
        let start = self.token_start.offset;
        let end = self.input.len().min(start + ERROR_PREFIX_LEN);
        let prefix = String::from_utf8_lossy(&self.input[start..end]);
        JsoncError::new(
            format!("unable to parse {}: {:?}", kind_name, prefix.as_ref()),
            self.token_start,
        )
    }

    fn eof_error(&self, kind_name: &str) -> JsoncError {
        JsoncError::new(
            format!("unable to parse {}: unexpected EOF", kind_name),
            self.token_start,
        )
    }
}

/// Lazily turns the input into tokens. Fails fast at the first malformed
/// byte; the parser surfaces that error for the whole document.
pub struct TokenGenerator<'a> {
    state: ScannerState<'a>,
}

impl<'a> TokenGenerator<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { state: ScannerState::new(input) }
    }

    /// Position one past the last consumed byte.
    pub fn position(&self) -> Position {
        self.state.position()
    }
}

impl<'a> Iterator for TokenGenerator<'a> {
    type Item = Result<Token, JsoncError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let b = self.state.current()?;
            match b {
                b' ' | b'\t' | b'\r' => self.state.advance(),
                b'\n' => {
                    let blank = !self.state.text_on_line;
                    let pos = self.state.position();
                    self.state.advance();
                    if blank {
                        return Some(Ok(Token {
                            kind: TokenKind::BlankLine,
                            text: String::new(),
                            pos,
                            follows_text: false,
                        }));
                    }
                }
                b'{' => return Some(self.punct(TokenKind::BeginObject, "{")),
                b'}' => return Some(self.punct(TokenKind::EndObject, "}")),
                b'[' => return Some(self.punct(TokenKind::BeginArray, "[")),
                b']' => return Some(self.punct(TokenKind::EndArray, "]")),
                b':' => return Some(self.punct(TokenKind::Colon, ":")),
                b',' => return Some(self.punct(TokenKind::Comma, ",")),
                b't' => return Some(process_keyword(&mut self.state, "true", TokenKind::True)),
                b'f' => return Some(process_keyword(&mut self.state, "false", TokenKind::False)),
                b'n' => return Some(process_keyword(&mut self.state, "null", TokenKind::Null)),
                b'"' => return Some(process_string(&mut self.state)),
                b'/' => return Some(process_comment(&mut self.state)),
                b'-' | b'0'..=b'9' => return Some(process_number(&mut self.state)),
                _ => {
                    let pos = self.state.position();
                    let ch = char_at(self.state.input, self.state.offset);
                    return Some(Err(JsoncError::new(
                        format!("invalid character {:?}", ch),
                        pos,
                    )));
                }
            }
        }
    }
}

impl<'a> TokenGenerator<'a> {
    fn punct(&mut self, kind: TokenKind, text: &str) -> Result<Token, JsoncError> {
        let follows = self.state.text_on_line;
        self.state.set_token_start();
        self.state.advance();
        Ok(self.state.make_token(kind, text.to_string(), follows))
    }
}

fn char_at(input: &[u8], offset: usize) -> char {
    std::str::from_utf8(&input[offset..])
        .ok()
        .and_then(|s| s.chars().next())
        .unwrap_or(input[offset] as char)
}

fn process_keyword(
    state: &mut ScannerState,
    keyword: &str,
    kind: TokenKind,
) -> Result<Token, JsoncError> {
    let follows = state.text_on_line;
    state.set_token_start();
    for expected in keyword.bytes() {
        match state.current() {
            Some(b) if b == expected => state.advance(),
            Some(_) => return Err(state.error_at_token("value")),
            None => return Err(state.eof_error("value")),
        }
    }
    Ok(state.make_token(kind, keyword.to_string(), follows))
}

fn process_string(state: &mut ScannerState) -> Result<Token, JsoncError> {
    let follows = state.text_on_line;
    state.set_token_start();
    state.advance();

    let mut in_escape = false;
    let mut hex_left = 0usize;
    loop {
        let b = match state.current() {
            Some(b) => b,
            None => return Err(state.error_at_token("string")),
        };

        if hex_left > 0 {
            if !b.is_ascii_hexdigit() {
                return Err(state.error_at_token("string"));
            }
            hex_left -= 1;
            state.advance();
            continue;
        }

        if in_escape {
            if !matches!(b, b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' | b'u') {
                return Err(state.error_at_token("string"));
            }
            if b == b'u' {
                hex_left = 4;
            }
            in_escape = false;
            state.advance();
            continue;
        }

        if b < 0x20 {
            return Err(state.error_at_token("string"));
        }

        state.advance();
        match b {
            b'"' => {
                let text = state.token_text().to_string();
                return Ok(state.make_token(TokenKind::String, text, follows));
            }
            b'\\' => in_escape = true,
            _ => {}
        }
    }
}

fn process_comment(state: &mut ScannerState) -> Result<Token, JsoncError> {
    let follows = state.text_on_line;
    state.set_token_start();
    state.advance();

    let block = match state.current() {
        Some(b'*') => true,
        Some(b'/') => false,
        Some(_) => return Err(state.error_at_token("comment")),
        None => return Err(state.eof_error("comment")),
    };
    state.advance();

    if block {
        let mut prev_star = false;
        loop {
            let b = match state.current() {
                Some(b) => b,
                None => return Err(state.eof_error("comment")),
            };
            state.advance();
            if prev_star && b == b'/' {
                let text = state.token_text().to_string();
                return Ok(state.make_token(TokenKind::BlockComment, text, follows));
            }
            prev_star = b == b'*';
        }
    }

    while let Some(b) = state.current() {
        if b == b'\n' {
            break;
        }
        state.advance();
    }
    let text = state.token_text().trim_end().to_string();
    Ok(state.make_token(TokenKind::LineComment, text, follows))
}

fn process_number(state: &mut ScannerState) -> Result<Token, JsoncError> {
    let follows = state.text_on_line;
    state.set_token_start();
    let mut phase = NumberPhase::Beginning;
    loop {
        let b = state.current();
        let next = match (phase, b) {
            (NumberPhase::Beginning, Some(b'-')) => Step::To(NumberPhase::PastSign),
            (NumberPhase::Beginning | NumberPhase::PastSign, Some(b'0')) => {
                Step::To(NumberPhase::PastZero)
            }
            (NumberPhase::Beginning | NumberPhase::PastSign, Some(b'1'..=b'9')) => {
                Step::To(NumberPhase::Whole)
            }
            (NumberPhase::Whole, Some(b'0'..=b'9')) => Step::To(NumberPhase::Whole),
            (NumberPhase::PastZero | NumberPhase::Whole, Some(b'.')) => {
                Step::To(NumberPhase::PastDot)
            }
            (NumberPhase::PastZero | NumberPhase::Whole, Some(b'e' | b'E')) => {
                Step::To(NumberPhase::PastE)
            }
            (NumberPhase::PastDot | NumberPhase::Frac, Some(b'0'..=b'9')) => {
                Step::To(NumberPhase::Frac)
            }
            (NumberPhase::Frac, Some(b'e' | b'E')) => Step::To(NumberPhase::PastE),
            (NumberPhase::PastE, Some(b'+' | b'-')) => Step::To(NumberPhase::PastExpSign),
            (NumberPhase::PastE | NumberPhase::PastExpSign | NumberPhase::Exp, Some(b'0'..=b'9')) => {
                Step::To(NumberPhase::Exp)
            }
            (NumberPhase::PastZero | NumberPhase::Whole | NumberPhase::Frac | NumberPhase::Exp, _) => {
                Step::Done
            }
            (_, None) => return Err(state.eof_error("number")),
            _ => return Err(state.error_at_token("number")),
        };

        match next {
            Step::To(p) => {
                phase = p;
                state.advance();
            }
            Step::Done => {
                let text = canonical_number(state.token_text());
                return Ok(state.make_token(TokenKind::Number, text, follows));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberPhase {
    Beginning,
    PastSign,
    PastZero,
    Whole,
    PastDot,
    Frac,
    PastE,
    PastExpSign,
    Exp,
}

enum Step {
    To(NumberPhase),
    Done,
}

/// Rewrites a syntactically valid JSON number into its canonical textual
/// form. Purely textual: no digits are invented or rounded away.
///
/// With significand `d1…dn` and decimal exponent `k` (so the value is
/// `d1.d2…dn × 10^k`), scientific form is chosen when the magnitude falls
/// outside roughly 1e-4 … 1e+20 or when the scientific rendering is
/// strictly shorter; decimal form otherwise. The exponent letter is a
/// lowercase `e` with no `+` sign. Re-tokenizing the result reproduces it.
pub fn canonical_number(text: &str) -> String {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };

    let (mantissa, exp_part) = match rest.find(['e', 'E']) {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
        None => (rest, None),
    };
    let explicit_exp: i64 = match exp_part {
        Some(e) => match e.trim_start_matches('+').parse() {
            Ok(v) => v,
            // Exponent out of i64 range; leave it alone apart from the
            // letter case.
            Err(_) => return format!("{}{}", sign, rest.replace('E', "e")),
        },
        None => 0,
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };

    // Significant digits with leading and trailing zeros stripped, and the
    // exponent of the leading digit.
    let all: String = format!("{}{}", int_part, frac_part);
    let digits = all.trim_start_matches('0').trim_end_matches('0');
    if digits.is_empty() {
        return format!("{}0", sign);
    }
    let leading_zeros = all.len() - all.trim_start_matches('0').len();
    let k = int_part.len() as i64 - 1 - leading_zeros as i64 + explicit_exp;

    let scientific = render_scientific(digits, k);
    // Only materialize the decimal form once k is known to be small; a
    // huge in-range exponent like 1e2000000000 must not allocate its
    // digits.
    if k < -4 || k > 20 {
        return format!("{}{}", sign, scientific);
    }
    let decimal = render_decimal(digits, k);
    if scientific.len() < decimal.len() {
        format!("{}{}", sign, scientific)
    } else {
        format!("{}{}", sign, decimal)
    }
}

fn render_decimal(digits: &str, k: i64) -> String {
    let n = digits.len() as i64;
    if k >= n - 1 {
        let mut s = digits.to_string();
        s.extend(std::iter::repeat('0').take((k - (n - 1)) as usize));
        s
    } else if k >= 0 {
        let split = (k + 1) as usize;
        format!("{}.{}", &digits[..split], &digits[split..])
    } else {
        let zeros: String = std::iter::repeat('0').take((-k - 1) as usize).collect();
        format!("0.{}{}", zeros, digits)
    }
}

fn render_scientific(digits: &str, k: i64) -> String {
    if digits.len() == 1 {
        format!("{}e{}", digits, k)
    } else {
        format!("{}.{}e{}", &digits[..1], &digits[1..], k)
    }
}
