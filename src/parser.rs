use crate::error::JsoncError;
use crate::model::{Node, NodeKind, Position, Token, TokenKind};
use crate::options::{FormatOptions, Mode};
use crate::tokenizer::TokenGenerator;

/// Pull-based wrapper over the token stream. `current` is the most recently
/// consumed token, which after parsing a value is that value's last token.
struct TokenSource<'a> {
    generator: TokenGenerator<'a>,
    current: Option<Token>,
}

impl<'a> TokenSource<'a> {
    fn new(input: &'a str) -> Self {
        Self { generator: TokenGenerator::new(input), current: None }
    }

    fn advance(&mut self) -> Result<Option<&Token>, JsoncError> {
        match self.generator.next() {
            None => {
                self.current = None;
                Ok(None)
            }
            Some(Ok(token)) => {
                self.current = Some(token);
                Ok(self.current.as_ref())
            }
            Some(Err(err)) => Err(err),
        }
    }

    fn end_position(&self) -> Position {
        self.generator.position()
    }
}

pub struct Parser {
    /// Comments and blank lines survive only in Pretty mode; Standardize and
    /// Minify drop them here so the layout engine never sees them.
    keep_extras: bool,
}

impl Parser {
    pub fn new(options: &FormatOptions) -> Self {
        Self { keep_extras: options.mode == Mode::Pretty }
    }

    /// Parses a whole document: any number of comments and blank lines
    /// around exactly one value.
    pub fn parse_document(&self, input: &str) -> Result<Vec<Node>, JsoncError> {
        let mut source = TokenSource::new(input);
        let mut items: Vec<Node> = Vec::new();
        let mut value_seen = false;
        let mut bind_target: Option<(usize, usize)> = None;
        let mut fresh_comment: Option<(usize, usize)> = None;

        loop {
            let token = match source.advance()? {
                Some(t) => t.clone(),
                None => break,
            };
            if let Some((_, end_line)) = bind_target {
                if token.pos.line != end_line {
                    bind_target = None;
                }
            }
            resolve_fresh_comment(&mut items, &mut fresh_comment, &token);
            match token.kind {
                TokenKind::BlankLine => {}
                TokenKind::LineComment | TokenKind::BlockComment => {
                    if self.keep_extras {
                        if let Some((idx, _)) = bind_target {
                            if token.kind == TokenKind::LineComment
                                && items[idx].trailing_comment.is_none()
                            {
                                bind_trailing(&mut items[idx], &token);
                                bind_target = None;
                                continue;
                            }
                        }
                        items.push(comment_node(&token));
                        note_fresh_comment(&items, &mut fresh_comment, &token);
                        bind_target = None;
                    }
                }
                _ if is_value_start(token.kind) => {
                    if value_seen {
                        let ch = first_char(&token);
                        return Err(JsoncError::new(
                            format!("invalid character {:?} after top-level value", ch),
                            token.pos,
                        ));
                    }
                    let (node, end_line) = self.parse_value(&mut source)?;
                    items.push(node);
                    bind_target = Some((items.len() - 1, end_line));
                    value_seen = true;
                }
                _ => {
                    let ch = first_char(&token);
                    return Err(JsoncError::new(
                        format!("invalid character {:?} looking for beginning of value", ch),
                        token.pos,
                    ));
                }
            }
        }

        if !value_seen {
            return Err(JsoncError::new(
                "unable to parse value: unexpected EOF",
                source.end_position(),
            ));
        }
        Ok(items)
    }

    fn parse_value(&self, source: &mut TokenSource) -> Result<(Node, usize), JsoncError> {
        let token = source.current.clone().expect("parse_value without a current token");
        match token.kind {
            TokenKind::BeginArray => self.parse_array(source),
            TokenKind::BeginObject => self.parse_object(source),
            _ => {
                let kind = match token.kind {
                    TokenKind::Null => NodeKind::Null,
                    TokenKind::True => NodeKind::True,
                    TokenKind::False => NodeKind::False,
                    TokenKind::Number => NodeKind::Number,
                    TokenKind::String => NodeKind::String,
                    _ => unreachable!("not a value token"),
                };
                Ok((Node::primitive(kind, token.text.clone(), token.pos), token.pos.line))
            }
        }
    }

    fn parse_array(&self, source: &mut TokenSource) -> Result<(Node, usize), JsoncError> {
        let open_pos = source.current.as_ref().expect("array open token").pos;
        let mut arr = Node::composite(NodeKind::Array, open_pos);
        let mut comma = CommaStatus::Empty;
        // Index and source end line of the element a trailing comment could
        // still bind to.
        let mut bind_target: Option<(usize, usize)> = None;
        // Same-line block comments waiting for a value to prefix.
        let mut pending_prefix: Vec<Token> = Vec::new();

        loop {
            let token = match source.advance()? {
                Some(t) => t.clone(),
                None => {
                    return Err(JsoncError::new("unexpected EOF", source.end_position()));
                }
            };

            if let Some((_, end_line)) = bind_target {
                if token.pos.line != end_line {
                    bind_target = None;
                }
            }
            if !pending_prefix.is_empty()
                && (!is_value_start(token.kind)
                    || token.pos.line != pending_prefix[0].pos.line)
            {
                for held in pending_prefix.drain(..) {
                    let mut comment = comment_node(&held);
                    if token.pos.line == held.pos.line {
                        comment.own_line = false;
                    }
                    arr.children.push(comment);
                }
                bind_target = None;
            }

            match token.kind {
                TokenKind::EndArray => {
                    arr.trailing_comma = comma == CommaStatus::CommaSeen;
                    trim_blank_edges(&mut arr.children);
                    return Ok((arr, token.pos.line));
                }
                TokenKind::Comma => {
                    if comma != CommaStatus::ValueSeen {
                        return Err(JsoncError::new(
                            "invalid character ',' looking for beginning of value",
                            token.pos,
                        ));
                    }
                    comma = CommaStatus::CommaSeen;
                }
                TokenKind::BlankLine => {
                    if self.keep_extras {
                        push_blank(&mut arr.children, &token);
                    }
                }
                TokenKind::LineComment => {
                    if !self.keep_extras {
                        continue;
                    }
                    if let Some((idx, _)) = bind_target {
                        if arr.children[idx].trailing_comment.is_none() {
                            bind_trailing(&mut arr.children[idx], &token);
                            bind_target = None;
                            continue;
                        }
                    }
                    arr.children.push(comment_node(&token));
                    bind_target = None;
                }
                TokenKind::BlockComment => {
                    if !self.keep_extras {
                        continue;
                    }
                    if token.text.contains('\n') {
                        arr.children.push(comment_node(&token));
                        bind_target = None;
                    } else if comma == CommaStatus::ValueSeen && bind_target.is_some() {
                        let (idx, _) = bind_target.unwrap();
                        if arr.children[idx].trailing_comment.is_none() {
                            arr.children[idx].trailing_comment = Some(token.text.clone());
                            arr.children[idx].trailing_is_line = false;
                        } else {
                            arr.children.push(comment_node(&token));
                            bind_target = None;
                        }
                    } else {
                        pending_prefix.push(token);
                    }
                }
                _ if is_value_start(token.kind) => {
                    if comma == CommaStatus::ValueSeen {
                        let ch = first_char(&token);
                        return Err(JsoncError::new(
                            format!("invalid character {:?} after array element", ch),
                            token.pos,
                        ));
                    }
                    let (mut node, end_line) = self.parse_value(source)?;
                    if !pending_prefix.is_empty() {
                        node.prefix_comment = Some(join_comment_texts(&pending_prefix));
                        pending_prefix.clear();
                    }
                    arr.children.push(node);
                    bind_target = Some((arr.children.len() - 1, end_line));
                    comma = CommaStatus::ValueSeen;
                }
                _ => {
                    let ch = first_char(&token);
                    return Err(JsoncError::new(
                        format!("invalid character {:?} in array", ch),
                        token.pos,
                    ));
                }
            }
        }
    }

    fn parse_object(&self, source: &mut TokenSource) -> Result<(Node, usize), JsoncError> {
        let open_pos = source.current.as_ref().expect("object open token").pos;
        let mut obj = Node::composite(NodeKind::Object, open_pos);
        let mut phase = ObjectPhase::BeforeName;
        let mut key: Option<Token> = None;
        let mut middles: Vec<Token> = Vec::new();
        let mut bind_target: Option<(usize, usize)> = None;
        let mut fresh_comment: Option<(usize, usize)> = None;

        loop {
            let token = match source.advance()? {
                Some(t) => t.clone(),
                None => {
                    return Err(JsoncError::new("unexpected EOF", source.end_position()));
                }
            };

            if let Some((_, end_line)) = bind_target {
                if token.pos.line != end_line {
                    bind_target = None;
                }
            }
            resolve_fresh_comment(&mut obj.children, &mut fresh_comment, &token);

            match token.kind {
                TokenKind::EndObject => match phase {
                    ObjectPhase::AfterName => {
                        return Err(JsoncError::new(
                            "invalid character '}' after object key",
                            token.pos,
                        ));
                    }
                    ObjectPhase::AfterColon => {
                        return Err(JsoncError::new(
                            "invalid character '}' looking for beginning of value",
                            token.pos,
                        ));
                    }
                    _ => {
                        obj.trailing_comma = phase == ObjectPhase::AfterComma;
                        trim_blank_edges(&mut obj.children);
                        return Ok((obj, token.pos.line));
                    }
                },
                TokenKind::Comma => {
                    if phase != ObjectPhase::AfterValue {
                        return Err(JsoncError::new(
                            "invalid character ',' in object",
                            token.pos,
                        ));
                    }
                    phase = ObjectPhase::AfterComma;
                }
                TokenKind::Colon => {
                    if phase != ObjectPhase::AfterName {
                        return Err(JsoncError::new(
                            "invalid character ':' in object",
                            token.pos,
                        ));
                    }
                    phase = ObjectPhase::AfterColon;
                }
                TokenKind::BlankLine => {
                    if self.keep_extras
                        && !matches!(phase, ObjectPhase::AfterName | ObjectPhase::AfterColon)
                    {
                        push_blank(&mut obj.children, &token);
                    }
                }
                TokenKind::LineComment | TokenKind::BlockComment => {
                    if !self.keep_extras {
                        continue;
                    }
                    match phase {
                        ObjectPhase::AfterName | ObjectPhase::AfterColon => middles.push(token),
                        _ => {
                            if let Some((idx, _)) = bind_target {
                                let can_bind = obj.children[idx].trailing_comment.is_none()
                                    && (token.kind == TokenKind::LineComment
                                        || (phase == ObjectPhase::AfterValue
                                            && !token.text.contains('\n')));
                                if can_bind {
                                    bind_trailing(&mut obj.children[idx], &token);
                                    bind_target = None;
                                    continue;
                                }
                            }
                            obj.children.push(comment_node(&token));
                            note_fresh_comment(&obj.children, &mut fresh_comment, &token);
                            bind_target = None;
                        }
                    }
                }
                TokenKind::String
                    if matches!(phase, ObjectPhase::BeforeName | ObjectPhase::AfterComma) =>
                {
                    key = Some(token);
                    phase = ObjectPhase::AfterName;
                }
                _ if is_value_start(token.kind) => match phase {
                    ObjectPhase::AfterColon => {
                        let (mut node, end_line) = self.parse_value(source)?;
                        node.key = Some(key.take().expect("value without a key").text);
                        attach_middles(&mut node, &mut middles);
                        obj.children.push(node);
                        bind_target = Some((obj.children.len() - 1, end_line));
                        phase = ObjectPhase::AfterValue;
                    }
                    ObjectPhase::AfterName => {
                        let ch = first_char(&token);
                        return Err(JsoncError::new(
                            format!("invalid character {:?} after object key", ch),
                            token.pos,
                        ));
                    }
                    ObjectPhase::AfterValue => {
                        let ch = first_char(&token);
                        return Err(JsoncError::new(
                            format!("invalid character {:?} after object key:value pair", ch),
                            token.pos,
                        ));
                    }
                    _ => {
                        let ch = first_char(&token);
                        return Err(JsoncError::new(
                            format!(
                                "invalid character {:?} looking for beginning of object key string",
                                ch
                            ),
                            token.pos,
                        ));
                    }
                },
                _ => {
                    let ch = first_char(&token);
                    return Err(JsoncError::new(
                        format!("invalid character {:?} in object", ch),
                        token.pos,
                    ));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommaStatus {
    Empty,
    ValueSeen,
    CommaSeen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectPhase {
    BeforeName,
    AfterName,
    AfterColon,
    AfterValue,
    AfterComma,
}

fn is_value_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::BeginArray
            | TokenKind::BeginObject
            | TokenKind::String
            | TokenKind::Number
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
    )
}

fn comment_node(token: &Token) -> Node {
    let kind = if token.kind == TokenKind::LineComment {
        NodeKind::LineComment
    } else {
        NodeKind::BlockComment
    };
    let mut node = Node::primitive(kind, token.text.clone(), token.pos);
    node.own_line = !token.follows_text;
    node
}

fn push_blank(children: &mut Vec<Node>, token: &Token) {
    if children.is_empty() || children.last().map(|n| n.kind) == Some(NodeKind::BlankLine) {
        return;
    }
    children.push(Node::primitive(NodeKind::BlankLine, String::new(), token.pos));
}

fn trim_blank_edges(children: &mut Vec<Node>) {
    while children.last().map(|n| n.kind) == Some(NodeKind::BlankLine) {
        children.pop();
    }
}

/// A line-leading single-line block comment is provisionally standalone;
/// if the next token turns out to share its line, it is inline-style after
/// all (`/**/ /**/ {...}` stays on one line).
fn note_fresh_comment(children: &[Node], fresh: &mut Option<(usize, usize)>, token: &Token) {
    if token.kind == TokenKind::BlockComment
        && !token.follows_text
        && !token.text.contains('\n')
    {
        *fresh = Some((children.len() - 1, token.pos.line));
    }
}

fn resolve_fresh_comment(children: &mut [Node], fresh: &mut Option<(usize, usize)>, token: &Token) {
    if let Some((idx, line)) = fresh.take() {
        if token.pos.line == line {
            children[idx].own_line = false;
        }
    }
}

fn bind_trailing(node: &mut Node, token: &Token) {
    node.trailing_comment = Some(token.text.clone());
    node.trailing_is_line = token.kind == TokenKind::LineComment;
}

fn attach_middles(node: &mut Node, middles: &mut Vec<Token>) {
    if middles.is_empty() {
        return;
    }
    let has_newline = middles.iter().any(|t| {
        t.kind == TokenKind::LineComment || t.text.contains('\n') || !t.follows_text
    });
    let sep = if has_newline { "\n" } else { " " };
    node.middle_comment =
        Some(middles.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(sep));
    node.middle_has_newline = has_newline;
    middles.clear();
}

fn join_comment_texts(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ")
}

fn first_char(token: &Token) -> char {
    token.text.chars().next().unwrap_or('?')
}

/// Convenience used by the layout engine and tests.
pub fn parse(input: &str, options: &FormatOptions) -> Result<Vec<Node>, JsoncError> {
    Parser::new(options).parse_document(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FormatOptions;

    fn pretty(input: &str) -> Vec<Node> {
        parse(input, &FormatOptions::default()).unwrap()
    }

    #[test]
    fn builds_nested_tree_with_keys() {
        let items = pretty(r#"{"a": [1, 2], "b": {"c": null}}"#);
        assert_eq!(items.len(), 1);
        let obj = &items[0];
        assert_eq!(obj.kind, NodeKind::Object);
        assert_eq!(obj.children.len(), 2);
        assert_eq!(obj.children[0].key.as_deref(), Some("\"a\""));
        assert_eq!(obj.children[0].kind, NodeKind::Array);
        assert_eq!(obj.children[1].children[0].key.as_deref(), Some("\"c\""));
    }

    #[test]
    fn trailing_line_comment_binds_to_same_line_pair() {
        let items = pretty("{\n\"a\": 1, // one\n\"b\": 2\n}");
        let obj = &items[0];
        assert_eq!(obj.children[0].trailing_comment.as_deref(), Some("// one"));
        assert!(obj.children[0].trailing_is_line);
        assert!(obj.children[1].trailing_comment.is_none());
    }

    #[test]
    fn own_line_comment_becomes_a_sibling() {
        let items = pretty("{\n// lead\n\"a\": 1\n}");
        let obj = &items[0];
        assert_eq!(obj.children[0].kind, NodeKind::LineComment);
        assert!(obj.children[0].own_line);
        assert_eq!(obj.children[1].key.as_deref(), Some("\"a\""));
    }

    #[test]
    fn same_line_block_comment_prefixes_next_value() {
        let items = pretty("[1, /*c*/ 2]");
        let arr = &items[0];
        assert_eq!(arr.children.len(), 2);
        assert_eq!(arr.children[1].prefix_comment.as_deref(), Some("/*c*/"));
    }

    #[test]
    fn block_comment_after_value_binds_without_a_comma() {
        let items = pretty("[1 /*c*/, 2]");
        let arr = &items[0];
        assert_eq!(arr.children[0].trailing_comment.as_deref(), Some("/*c*/"));
        assert!(!arr.children[0].trailing_is_line);
    }

    #[test]
    fn middle_comments_attach_between_key_and_value() {
        let items = pretty(r#"{"k" /*a*/: /*b*/ 1}"#);
        let pair = &items[0].children[0];
        assert_eq!(pair.middle_comment.as_deref(), Some("/*a*/ /*b*/"));
        assert!(!pair.middle_has_newline);
    }

    #[test]
    fn trailing_commas_are_recorded() {
        let items = pretty("[1, 2,]");
        assert!(items[0].trailing_comma);
        let items = pretty(r#"{"a": 1,}"#);
        assert!(items[0].trailing_comma);
        let items = pretty("[1, 2]");
        assert!(!items[0].trailing_comma);
    }

    #[test]
    fn blank_lines_collapse_and_trim() {
        let items = pretty("[\n\n1,\n\n\n2\n\n]");
        let kinds: Vec<NodeKind> = items[0].children.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Number, NodeKind::BlankLine, NodeKind::Number]
        );
    }

    #[test]
    fn standardize_drops_comments_and_blanks() {
        let mut options = FormatOptions::default();
        options.mode = crate::options::Mode::Standardize;
        let items = parse("[\n// gone\n1,\n\n2 /*x*/\n]", &options).unwrap();
        let kinds: Vec<NodeKind> = items[0].children.iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NodeKind::Number, NodeKind::Number]);
    }

    #[test]
    fn second_top_level_value_is_rejected() {
        let err = parse("{} {}", &FormatOptions::default()).unwrap_err();
        assert_eq!(err.message, "invalid character '{' after top-level value");
    }

    #[test]
    fn missing_comma_is_reported() {
        let err = parse("[1 2]", &FormatOptions::default()).unwrap_err();
        assert_eq!(err.message, "invalid character '2' after array element");
        let err = parse(r#"{"a": 1 "b": 2}"#, &FormatOptions::default()).unwrap_err();
        assert_eq!(err.message, "invalid character '\"' after object key:value pair");
    }

    #[test]
    fn eof_positions_point_past_the_input() {
        let err = parse("", &FormatOptions::default()).unwrap_err();
        assert_eq!((err.line, err.column), (1, 1));
        assert_eq!(err.message, "unable to parse value: unexpected EOF");
        let err = parse("[1,", &FormatOptions::default()).unwrap_err();
        assert_eq!(err.message, "unexpected EOF");
        assert_eq!((err.line, err.column), (1, 4));
    }
}
