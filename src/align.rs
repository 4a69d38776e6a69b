//! Measurement side of the layout engine: bottom-up inline widths, run
//! partitioning for object alignment, and table shapes for arrays of
//! uniform objects. The emission side lives in `layout.rs` and must agree
//! byte-for-byte with the widths computed here.

use crate::buffer::text_width;
use crate::model::{Node, NodeKind};
use crate::options::FormatOptions;

/// Fills `inline_width` for `node` and everything below it. `None` means
/// the node can never be rendered on a single line: it contains an
/// own-line comment, a line comment, a multiline block comment, or a
/// blank line.
pub fn measure(node: &mut Node, tab_width: usize) {
    for child in &mut node.children {
        measure(child, tab_width);
    }
    node.inline_width = match node.kind {
        NodeKind::Array | NodeKind::Object => composite_inline_width(node, tab_width),
        NodeKind::LineComment | NodeKind::BlankLine => None,
        NodeKind::BlockComment => {
            if node.own_line || node.text.contains('\n') {
                None
            } else {
                Some(text_width(&node.text, tab_width))
            }
        }
        _ => Some(text_width(&node.text, tab_width)),
    };
}

/// Width of the member rendering used inside inline composites and run
/// alignment: `"key" /*mid*/: /*prefix*/ value /*post*/`, without any comma.
pub fn member_width(node: &Node, tab_width: usize) -> Option<usize> {
    if node.middle_has_newline {
        return None;
    }
    if node.trailing_is_line && node.trailing_comment.is_some() {
        return None;
    }
    let value = node.inline_width?;
    Some(lead_width(node, tab_width) + value_part_width(node, value, tab_width))
}

/// Width of `"key":` including any inline middle comments, or 0 for
/// keyless nodes. The trailing space after the colon is not counted.
pub fn lead_width(node: &Node, tab_width: usize) -> usize {
    match &node.key {
        None => 0,
        Some(key) => {
            let mid = node
                .middle_comment
                .as_ref()
                .map(|m| 1 + text_width(m, tab_width))
                .unwrap_or(0);
            text_width(key, tab_width) + mid + 1
        }
    }
}

/// Width of the value with its prefix comment and trailing block comment.
pub fn value_part_width(node: &Node, value_width: usize, tab_width: usize) -> usize {
    let prefix = node
        .prefix_comment
        .as_ref()
        .map(|p| text_width(p, tab_width) + 1)
        .unwrap_or(0);
    let post = match &node.trailing_comment {
        Some(c) if !node.trailing_is_line => 1 + text_width(c, tab_width),
        _ => 0,
    };
    let sep = if node.key.is_some() { 1 } else { 0 };
    sep + prefix + value_width + post
}

fn composite_inline_width(node: &Node, tab_width: usize) -> Option<usize> {
    let mut width = 2;
    let mut pieces = 0usize;
    let mut values = 0usize;
    let mut last_is_comment = false;
    for child in &node.children {
        let piece = match child.kind {
            NodeKind::BlankLine | NodeKind::LineComment => return None,
            NodeKind::BlockComment => {
                last_is_comment = true;
                child.inline_width?
            }
            _ => {
                last_is_comment = false;
                values += 1;
                member_width(child, tab_width)?
            }
        };
        if pieces == 0 && last_is_comment {
            width += 1;
        } else if pieces > 0 {
            width += 1;
        }
        width += piece;
        pieces += 1;
    }
    if values > 1 {
        width += values - 1;
    }
    if last_is_comment {
        width += 1;
    }
    Some(width)
}

/// True when `node` should be rendered on one line starting at
/// `left_margin` columns. Empty composites always collapse inline.
pub fn fits_inline(node: &Node, left_margin: usize, options: &FormatOptions) -> bool {
    if node.kind.is_composite() && node.children.is_empty() {
        return true;
    }
    match node.inline_width {
        Some(w) => left_margin + w <= options.max_column,
        None => false,
    }
}

/// How an object member is laid out when its object is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberShape {
    /// Blank line or standalone comment: always a run boundary.
    Boundary,
    /// Plain `"key": value` pair eligible for column alignment.
    Aligned,
    /// Pair whose value is rendered expanded, or whose middle comments
    /// force the value onto its own line. Terminates the current run.
    Spread,
}

pub fn member_shape(node: &Node, interior_margin: usize, options: &FormatOptions) -> MemberShape {
    if !node.kind.is_value() {
        return MemberShape::Boundary;
    }
    if node.middle_has_newline {
        return MemberShape::Spread;
    }
    if node.kind.is_composite() {
        // The margin accounts for the comma the pair will usually carry.
        let lead = lead_width(node, options.tab_width);
        if !fits_inline(node, interior_margin + lead + 2, options) {
            return MemberShape::Spread;
        }
    }
    MemberShape::Aligned
}

/// Column metrics for one run of aligned pairs.
#[derive(Debug, Clone, Default)]
pub struct Run {
    /// Indices into the object's member list.
    pub members: Vec<usize>,
    /// Max width of `"key":` across the run.
    pub key_width: usize,
    /// Max width of the rendered value across the run.
    pub value_width: usize,
    /// At least one member carries a trailing line comment, so values are
    /// padded and the comments form a column.
    pub aligns_comments: bool,
    max_comment: usize,
}

impl Run {
    fn add(&mut self, idx: usize, m: &PairLayout) {
        self.members.push(idx);
        self.key_width = self.key_width.max(m.lead_width);
        self.value_width = self.value_width.max(m.value_width);
        if let Some(c) = m.line_comment_width {
            self.aligns_comments = true;
            self.max_comment = self.max_comment.max(c);
        }
    }

    fn line_budget_ok(&self, m: &PairLayout, interior_margin: usize, max_column: usize) -> bool {
        let key = self.key_width.max(m.lead_width);
        let value = self.value_width.max(m.value_width);
        let comment = match (self.comment_width(), m.line_comment_width) {
            (a, Some(b)) => Some(a.unwrap_or(0).max(b)),
            (a, None) => a,
        };
        let mut width = interior_margin + key + 1 + value + 1;
        if let Some(c) = comment {
            width += 1 + c;
        }
        width <= max_column
    }

    fn comment_width(&self) -> Option<usize> {
        if self.aligns_comments {
            Some(self.max_comment)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct PairLayout {
    pub lead_width: usize,
    pub value_width: usize,
    pub line_comment_width: Option<usize>,
}

/// Splits an expanded object's aligned pairs into runs. Boundaries are
/// blank lines, standalone comments, and spread pairs; additionally a pair
/// that would push the padded line past `max_column` starts a new run, so
/// one very long key or value cannot drag a whole column with it.
pub fn partition_runs(
    members: &[Node],
    shapes: &[MemberShape],
    interior_margin: usize,
    options: &FormatOptions,
) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    let mut current: Option<Run> = None;

    for (idx, member) in members.iter().enumerate() {
        if shapes[idx] != MemberShape::Aligned {
            if let Some(run) = current.take() {
                runs.push(run);
            }
            continue;
        }
        let layout = pair_layout(member, options.tab_width);
        match current.as_mut() {
            Some(run)
                if run.line_budget_ok(&layout, interior_margin, options.max_column) =>
            {
                run.add(idx, &layout);
            }
            _ => {
                if let Some(run) = current.take() {
                    runs.push(run);
                }
                let mut run = Run::default();
                run.add(idx, &layout);
                current = Some(run);
            }
        }
    }
    if let Some(run) = current.take() {
        runs.push(run);
    }
    runs
}

fn pair_layout(node: &Node, tab_width: usize) -> PairLayout {
    let value = node.inline_width.unwrap_or(0);
    let prefix = node
        .prefix_comment
        .as_ref()
        .map(|p| text_width(p, tab_width) + 1)
        .unwrap_or(0);
    let post = match &node.trailing_comment {
        Some(c) if !node.trailing_is_line => 1 + text_width(c, tab_width),
        _ => 0,
    };
    PairLayout {
        lead_width: lead_width(node, tab_width),
        value_width: prefix + value + post,
        line_comment_width: match &node.trailing_comment {
            Some(c) if node.trailing_is_line => Some(text_width(c, tab_width)),
            _ => None,
        },
    }
}

/// Per-column widths for an array rendered as a table of uniform objects.
#[derive(Debug, Clone)]
pub struct TableShape {
    pub key_widths: Vec<usize>,
    pub value_widths: Vec<usize>,
}

impl TableShape {
    pub fn row_width(&self) -> usize {
        let cells: usize = self
            .key_widths
            .iter()
            .zip(&self.value_widths)
            .map(|(k, v)| k + 1 + v)
            .sum();
        2 + cells + 2 * self.key_widths.len().saturating_sub(1)
    }
}

/// Decides whether every element of an expanded array is an inline object
/// with the same key sequence, and if so returns the padded column widths.
/// Any comment, blank line, or non-object element disqualifies the table,
/// as does a padded row that would not fit.
pub fn table_shape(
    members: &[Node],
    interior_margin: usize,
    options: &FormatOptions,
) -> Option<TableShape> {
    if members.len() < 2 {
        return None;
    }

    let mut keys: Option<Vec<&str>> = None;
    let mut shape: Option<TableShape> = None;
    for member in members {
        if member.kind != NodeKind::Object
            || member.inline_width.is_none()
            || member.prefix_comment.is_some()
            || member.trailing_comment.is_some()
        {
            return None;
        }
        let row_keys: Vec<&str> =
            member.children.iter().map(|p| p.key.as_deref().unwrap_or("")).collect();
        if member.children.iter().any(|p| {
            p.prefix_comment.is_some()
                || p.middle_comment.is_some()
                || p.trailing_comment.is_some()
                || !p.kind.is_value()
        }) {
            return None;
        }
        match &keys {
            None => {
                keys = Some(row_keys.clone());
                shape = Some(TableShape {
                    key_widths: row_keys
                        .iter()
                        .map(|k| text_width(k, options.tab_width) + 1)
                        .collect(),
                    value_widths: vec![0; row_keys.len()],
                });
            }
            Some(expected) => {
                if *expected != row_keys {
                    return None;
                }
            }
        }
        let shape = shape.as_mut().expect("shape initialized with keys");
        for (col, pair) in member.children.iter().enumerate() {
            let w = pair.inline_width.expect("inline row has inline pairs");
            shape.value_widths[col] = shape.value_widths[col].max(w);
        }
    }

    let shape = shape?;
    // The comma after a row is part of the measured line.
    if interior_margin + shape.row_width() + 1 > options.max_column {
        return None;
    }
    Some(shape)
}
