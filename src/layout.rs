//! Emission side of the layout engine: walks the measured tree and writes
//! the final text. Inline decisions come from the widths `align::measure`
//! attached to the nodes; this module must render exactly the widths that
//! pass predicted.

use crate::align::{
    self, fits_inline, member_shape, partition_runs, table_shape, MemberShape, Run, TableShape,
};
use crate::buffer::{text_width, OutputBuffer};
use crate::model::{Node, NodeKind};
use crate::options::{FormatOptions, Mode};

/// Renders a parsed document. `items` is the top-level list: comments and
/// blank markers around exactly one value (already filtered down to just
/// the value for Standardize/Minify).
pub fn render(items: &mut [Node], options: &FormatOptions) -> String {
    if options.mode == Mode::Minify {
        let mut out = String::new();
        for item in items.iter().filter(|n| n.kind.is_value()) {
            write_minified(item, &mut out);
        }
        return out;
    }

    for item in items.iter_mut() {
        align::measure(item, options.tab_width);
    }
    let mut engine = Layout {
        options,
        buf: OutputBuffer::new(&options.indent, options.tab_width),
        keep_commas: options.mode == Mode::Pretty,
    };
    engine.write_document(items);
    engine.buf.into_string()
}

struct Layout<'a> {
    options: &'a FormatOptions,
    buf: OutputBuffer,
    keep_commas: bool,
}

impl<'a> Layout<'a> {
    fn margin(&self, level: usize) -> usize {
        level * self.options.indent_width()
    }

    fn write_document(&mut self, items: &[Node]) {
        if self.try_single_line(items) {
            return;
        }
        for item in items {
            match item.kind {
                NodeKind::BlankLine => {}
                NodeKind::LineComment | NodeKind::BlockComment => {
                    self.write_comment_lines(item, 0);
                }
                _ => {
                    if item.kind.is_composite() && !fits_inline(item, 0, self.options) {
                        self.write_expanded(item, 0);
                    } else {
                        let text = render_inline(item);
                        self.buf.push(&text);
                    }
                    if let Some(comment) = &item.trailing_comment {
                        self.buf.push(" ").push(comment);
                    }
                    self.buf.end_line();
                }
            }
        }
    }

    /// Emits the whole document on one line when every piece can share it:
    /// only inline-style comments, an inline value, and a total width
    /// within the budget.
    fn try_single_line(&mut self, items: &[Node]) -> bool {
        let mut width = 0usize;
        let mut pieces: Vec<String> = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            let piece = match item.kind {
                NodeKind::BlankLine | NodeKind::LineComment => return false,
                NodeKind::BlockComment => {
                    if item.inline_width.is_none() {
                        return false;
                    }
                    item.text.clone()
                }
                _ => {
                    if item.inline_width.is_none() {
                        return false;
                    }
                    let mut piece = render_inline(item);
                    if let Some(comment) = &item.trailing_comment {
                        if item.trailing_is_line && idx + 1 != items.len() {
                            return false;
                        }
                        piece.push(' ');
                        piece.push_str(comment);
                    }
                    piece
                }
            };
            width += text_width(&piece, self.options.tab_width);
            pieces.push(piece);
        }
        width += pieces.len().saturating_sub(1);
        if width > self.options.max_column {
            return false;
        }
        self.buf.push(&pieces.join(" "));
        self.buf.end_line();
        true
    }

    /// Writes an expanded composite. The opener lands on the line under
    /// construction (after the caller's indent or `"key": ` lead); the
    /// closer is left on an open line so the caller can append a comma or
    /// trailing comment.
    fn write_expanded(&mut self, node: &Node, level: usize) {
        match node.kind {
            NodeKind::Object => self.write_object_expanded(node, level),
            NodeKind::Array => self.write_array_expanded(node, level),
            _ => unreachable!("only composites expand"),
        }
    }

    fn write_object_expanded(&mut self, node: &Node, level: usize) {
        self.buf.push("{").end_line();

        let interior = self.margin(level + 1);
        let shapes: Vec<MemberShape> = node
            .children
            .iter()
            .map(|m| member_shape(m, interior, self.options))
            .collect();
        let runs = partition_runs(&node.children, &shapes, interior, self.options);
        let run_of = run_lookup(&runs, node.children.len());
        let last_value = last_value_index(&node.children);

        for (idx, member) in node.children.iter().enumerate() {
            match shapes[idx] {
                MemberShape::Boundary => {
                    if member.kind == NodeKind::BlankLine {
                        self.buf.blank_line();
                    } else {
                        self.write_comment_lines(member, level + 1);
                    }
                }
                MemberShape::Aligned => {
                    let run = run_of[idx].map(|r| &runs[r]).expect("aligned pair has a run");
                    self.write_aligned_pair(member, run, level, self.has_comma(idx, last_value, node));
                }
                MemberShape::Spread => {
                    self.write_spread_pair(member, level, self.has_comma(idx, last_value, node));
                }
            }
        }

        self.buf.indent(level).push("}");
    }

    fn has_comma(&self, idx: usize, last_value: Option<usize>, node: &Node) -> bool {
        match last_value {
            Some(last) if idx < last => true,
            Some(last) if idx == last => self.keep_commas && node.trailing_comma,
            _ => false,
        }
    }

    fn write_aligned_pair(&mut self, member: &Node, run: &Run, level: usize, comma: bool) {
        let tab = self.options.tab_width;
        self.buf.indent(level + 1);

        let lead = lead_text(member);
        self.buf.push(&lead);
        self.buf.spaces(run.key_width - text_width(&lead, tab) + 1);

        let value = value_part_text(member);
        self.buf.push(&value);
        if comma {
            self.buf.push(",");
        }

        if let (Some(comment), true) = (&member.trailing_comment, member.trailing_is_line) {
            let written = text_width(&value, tab) + usize::from(comma);
            self.buf.spaces(run.value_width + 2 - written);
            self.buf.push(comment);
        }
        self.buf.end_line();
    }

    fn write_spread_pair(&mut self, member: &Node, level: usize, comma: bool) {
        if member.middle_has_newline {
            self.write_pair_with_comment_lines(member, level, comma);
            return;
        }

        self.buf.indent(level + 1);
        self.buf.push(&lead_text(member)).push(" ");
        self.write_expanded(member, level + 1);
        if comma {
            self.buf.push(",");
        }
        if let Some(comment) = &member.trailing_comment {
            self.buf.push(" ").push(comment);
        }
        self.buf.end_line();
    }

    /// A pair whose middle comments contain a newline: `"key":` stands
    /// alone, the comments follow on their own lines, and the value starts
    /// a fresh line, all one level deeper than the key.
    fn write_pair_with_comment_lines(&mut self, member: &Node, level: usize, comma: bool) {
        self.buf.indent(level + 1);
        self.buf.push(member.key.as_deref().unwrap_or_default()).push(":").end_line();

        let middle = member.middle_comment.as_deref().unwrap_or_default();
        for line in middle.split('\n') {
            self.buf.indent(level + 2).push(line.trim()).end_line();
        }

        self.buf.indent(level + 2);
        if member.kind.is_composite() && !fits_inline(member, self.margin(level + 2), self.options)
        {
            self.write_expanded(member, level + 2);
        } else {
            let text = render_inline(member);
            self.buf.push(&text);
        }
        if comma {
            self.buf.push(",");
        }
        if let Some(comment) = &member.trailing_comment {
            self.buf.push(" ").push(comment);
        }
        self.buf.end_line();
    }

    fn write_array_expanded(&mut self, node: &Node, level: usize) {
        self.buf.push("[").end_line();

        let interior = self.margin(level + 1);
        if let Some(shape) = table_shape(&node.children, interior, self.options) {
            self.write_table_rows(node, &shape, level);
        } else {
            self.write_packed_elements(node, level);
        }

        self.buf.indent(level).push("]");
    }

    fn write_table_rows(&mut self, node: &Node, shape: &TableShape, level: usize) {
        let tab = self.options.tab_width;
        let last = node.children.len() - 1;
        for (row_idx, row) in node.children.iter().enumerate() {
            self.buf.indent(level + 1).push("{");
            let cols = row.children.len();
            for (col, pair) in row.children.iter().enumerate() {
                self.buf.push(pair.key.as_deref().unwrap_or_default()).push(": ");
                let value = render_inline(pair);
                self.buf.push(&value);
                if col + 1 < cols {
                    let pad = shape.value_widths[col] - text_width(&value, tab);
                    self.buf.push(",").spaces(pad).push(" ");
                }
            }
            self.buf.push("}");
            if row_idx < last || (self.keep_commas && node.trailing_comma) {
                self.buf.push(",");
            }
            self.buf.end_line();
        }
    }

    fn write_packed_elements(&mut self, node: &Node, level: usize) {
        let interior = self.margin(level + 1);
        let last_value = last_value_index(&node.children);
        let mut packing = false;

        for (idx, member) in node.children.iter().enumerate() {
            match member.kind {
                NodeKind::BlankLine => {
                    if packing {
                        self.buf.end_line();
                        packing = false;
                    }
                    self.buf.blank_line();
                }
                NodeKind::LineComment | NodeKind::BlockComment => {
                    if packing {
                        self.buf.end_line();
                        packing = false;
                    }
                    self.write_comment_lines(member, level + 1);
                }
                _ => {
                    let comma = self.has_comma(idx, last_value, node);
                    // The comma is part of the packed line, so it counts
                    // against the budget when deciding to expand.
                    let expand = member.kind.is_composite()
                        && !member.children.is_empty()
                        && match member.inline_width {
                            None => true,
                            Some(w) => {
                                let piece = align::value_part_width(
                                    member,
                                    w,
                                    self.options.tab_width,
                                );
                                interior + piece + usize::from(comma) > self.options.max_column
                            }
                        };
                    if expand {
                        if packing {
                            self.buf.end_line();
                            packing = false;
                        }
                        self.buf.indent(level + 1);
                        if let Some(prefix) = &member.prefix_comment {
                            self.buf.push(prefix).push(" ");
                        }
                        self.write_expanded(member, level + 1);
                        if comma {
                            self.buf.push(",");
                        }
                        if let Some(comment) = &member.trailing_comment {
                            self.buf.push(" ").push(comment);
                        }
                        self.buf.end_line();
                        continue;
                    }

                    let piece = value_part_text(member);
                    let width =
                        text_width(&piece, self.options.tab_width) + usize::from(comma);
                    if packing && self.buf.line_width() + 1 + width > self.options.max_column {
                        self.buf.end_line();
                        packing = false;
                    }
                    if packing {
                        self.buf.push(" ");
                    } else {
                        self.buf.indent(level + 1);
                        packing = true;
                    }
                    self.buf.push(&piece);
                    if comma {
                        self.buf.push(",");
                    }
                    if let (Some(comment), true) = (&member.trailing_comment, member.trailing_is_line)
                    {
                        self.buf.push(" ").push(comment);
                        self.buf.end_line();
                        packing = false;
                    }
                }
            }
        }
        if packing {
            self.buf.end_line();
        }
    }

    /// A standalone comment on its own output line(s). Multiline block
    /// comments get their continuation lines re-indented; a line whose
    /// first non-blank byte is `*` is nudged one column so the asterisks
    /// stack under the opening `/*`.
    fn write_comment_lines(&mut self, node: &Node, level: usize) {
        if !node.text.contains('\n') {
            self.buf.indent(level).push(&node.text).end_line();
            return;
        }
        for (i, line) in node.text.split('\n').enumerate() {
            self.buf.indent(level);
            if i == 0 {
                self.buf.push(line.trim_end());
            } else {
                let trimmed = line.trim();
                if trimmed.starts_with('*') {
                    self.buf.push(" ");
                }
                self.buf.push(trimmed);
            }
            self.buf.end_line();
        }
    }
}

fn last_value_index(members: &[Node]) -> Option<usize> {
    members.iter().rposition(|m| m.kind.is_value())
}

fn run_lookup(runs: &[Run], member_count: usize) -> Vec<Option<usize>> {
    let mut lookup = vec![None; member_count];
    for (run_idx, run) in runs.iter().enumerate() {
        for &member_idx in &run.members {
            lookup[member_idx] = Some(run_idx);
        }
    }
    lookup
}

/// `"key":` with inline middle comments, or empty for keyless nodes.
fn lead_text(node: &Node) -> String {
    match &node.key {
        None => String::new(),
        Some(key) => match &node.middle_comment {
            Some(mid) if !node.middle_has_newline => format!("{} {}:", key, mid),
            _ => format!("{}:", key),
        },
    }
}

/// The value with its prefix comment and trailing block comment, no key.
fn value_part_text(node: &Node) -> String {
    let mut out = String::new();
    if let Some(prefix) = &node.prefix_comment {
        out.push_str(prefix);
        out.push(' ');
    }
    out.push_str(&render_inline(node));
    if let (Some(comment), false) = (&node.trailing_comment, node.trailing_is_line) {
        out.push(' ');
        out.push_str(comment);
    }
    out
}

/// Single-line rendering of a node's value: single spaces after `:` and
/// `,`, comments spaced on both sides, no trailing comma. Callers must
/// have checked `inline_width.is_some()`.
fn render_inline(node: &Node) -> String {
    match node.kind {
        NodeKind::Array | NodeKind::Object => {}
        _ => return node.text.clone(),
    }

    let (open, close) = if node.kind == NodeKind::Array { ("[", "]") } else { ("{", "}") };
    let mut out = String::from(open);
    let value_count = node.children.iter().filter(|c| c.kind.is_value()).count();
    let mut values_done = 0usize;
    let mut last_comment = false;
    for (i, child) in node.children.iter().enumerate() {
        let comment = child.kind.is_comment();
        if i == 0 {
            if comment {
                out.push(' ');
            }
        } else {
            out.push(' ');
        }
        if comment {
            out.push_str(&child.text);
        } else {
            let lead = lead_text(child);
            if !lead.is_empty() {
                out.push_str(&lead);
                out.push(' ');
            }
            out.push_str(&value_part_text(child));
            values_done += 1;
            if values_done < value_count {
                out.push(',');
            }
        }
        last_comment = comment;
    }
    if last_comment {
        out.push(' ');
    }
    out.push_str(close);
    out
}

fn write_minified(node: &Node, out: &mut String) {
    match node.kind {
        NodeKind::Array | NodeKind::Object => {
            let (open, close) = if node.kind == NodeKind::Array { ('[', ']') } else { ('{', '}') };
            out.push(open);
            let mut first = true;
            for child in node.children.iter().filter(|c| c.kind.is_value()) {
                if !first {
                    out.push(',');
                }
                first = false;
                if let Some(key) = &child.key {
                    out.push_str(key);
                    out.push(':');
                }
                write_minified(child, out);
            }
            out.push(close);
        }
        _ => out.push_str(&node.text),
    }
}
