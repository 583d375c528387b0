//! Height estimation: greedy line wrapping over break opportunities

use crate::content::{ContentNode, NodeKind};
use crate::layout::metrics::{TextMetrics, CODE_PADDING_PX};
use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_segmentation::UnicodeSegmentation;

/// Measured shape of one content node at a given column width
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMeasure {
    /// Estimated height including spacing after the block
    pub height: f32,
    /// Wrapped lines, present only for splittable text blocks
    pub lines: Vec<String>,
    /// Per-item heights, present only for lists
    pub item_heights: Vec<f32>,
}

impl NodeMeasure {
    fn solid(height: f32) -> Self {
        Self {
            height,
            lines: Vec::new(),
            item_heights: Vec::new(),
        }
    }
}

/// Greedily wrap text into lines no wider than `max_width`.
///
/// Break opportunities come from UAX #14; a single unbreakable segment
/// wider than the column falls back to grapheme-level emergency breaks,
/// mirroring the usual editor behavior for long tokens.
pub fn wrap_lines<F>(text: &str, max_width: f32, width_of: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines: Vec<String> = Vec::new();
    if text.is_empty() {
        return lines;
    }

    let mut current = String::new();
    let mut cur_w = 0.0f32;
    let mut prev = 0usize;

    for (pos, op) in linebreaks(text) {
        let mandatory = op == BreakOpportunity::Mandatory;
        let mut segment = &text[prev..pos];
        prev = pos;
        if mandatory {
            segment = segment.trim_end_matches(|c| c == '\n' || c == '\r');
        }

        let seg_w: f32 = segment.graphemes(true).map(&width_of).sum();

        if cur_w > 0.0 && cur_w + seg_w > max_width {
            lines.push(std::mem::take(&mut current).trim_end().to_string());
            cur_w = 0.0;
        }

        if seg_w > max_width {
            for g in segment.graphemes(true) {
                let gw = width_of(g);
                if cur_w > 0.0 && cur_w + gw > max_width {
                    lines.push(std::mem::take(&mut current));
                    cur_w = 0.0;
                }
                current.push_str(g);
                cur_w += gw;
            }
        } else {
            current.push_str(segment);
            cur_w += seg_w;
        }

        if mandatory {
            lines.push(std::mem::take(&mut current).trim_end().to_string());
            cur_w = 0.0;
        }
    }

    lines
}

fn code_line_count(text: &str, metrics: &TextMetrics, width: f32) -> usize {
    let code = text.strip_suffix('\n').unwrap_or(text);
    if code.is_empty() {
        return 1;
    }
    code.split('\n')
        .map(|line| {
            wrap_lines(line, width, |g| metrics.code_grapheme_width(g))
                .len()
                .max(1)
        })
        .sum()
}

/// Estimate the shape of a top-level node in a column of `width` px
pub fn measure_node(node: &ContentNode, metrics: &TextMetrics, width: f32) -> NodeMeasure {
    let spacing = node.kind.spacing_after() * metrics.line_px;

    match &node.kind {
        NodeKind::Heading { .. } => {
            let scale = node.kind.font_scale();
            let line_px = metrics.line_px * scale;
            let count = wrap_lines(&node.text, width, |g| metrics.grapheme_width(g) * scale)
                .len()
                .max(1);
            NodeMeasure::solid(count as f32 * line_px + spacing)
        }
        NodeKind::Paragraph | NodeKind::TextRun => {
            let lines = wrap_lines(&node.text, width, |g| metrics.grapheme_width(g));
            let count = lines.len().max(1);
            NodeMeasure {
                height: count as f32 * metrics.line_px + spacing,
                lines,
                item_heights: Vec::new(),
            }
        }
        NodeKind::CodeBlock { .. } => {
            let count = code_line_count(&node.text, metrics, width);
            NodeMeasure::solid(count as f32 * metrics.line_px + CODE_PADDING_PX + spacing)
        }
        NodeKind::Image => {
            // No intrinsic size available before rendering; assume a
            // landscape-ish figure scaled to the column
            NodeMeasure::solid(width * 0.66 + spacing)
        }
        NodeKind::Table => {
            let rows = node.text.lines().count().max(1);
            NodeMeasure::solid(rows as f32 * metrics.line_px + spacing)
        }
        NodeKind::Rule => NodeMeasure::solid(metrics.line_px * 0.5 + spacing),
        NodeKind::List { .. } => {
            let item_width = (width - metrics.indent_px()).max(metrics.avg_char_px);
            let item_heights: Vec<f32> = node
                .children
                .iter()
                .map(|item| {
                    let count = wrap_lines(&item.text, item_width, |g| metrics.grapheme_width(g))
                        .len()
                        .max(1);
                    count as f32 * metrics.line_px + 0.25 * metrics.line_px
                })
                .collect();
            let height = if item_heights.is_empty() {
                // Degenerate list without scanned items: fall back to text rows
                let count = wrap_lines(&node.text, item_width, |g| metrics.grapheme_width(g))
                    .len()
                    .max(1);
                count as f32 * metrics.line_px
            } else {
                item_heights.iter().sum::<f32>()
            };
            NodeMeasure {
                height: height + spacing,
                lines: Vec::new(),
                item_heights,
            }
        }
    }
}
