//! Greedy column-major flow with block atomicity

use crate::config::PageConfig;
use crate::content::{ContentNode, ContentTree, NodeKind};
use crate::layout::measure::{measure_node, NodeMeasure};
use crate::layout::metrics::TextMetrics;
use crate::layout::page::{Fragment, FragmentContent, LayoutResult, LayoutWarning, Page};

/// Slop for floating-point fit tests
const EPS: f32 = 0.01;

/// Flow cursor: tracks the open page, current column, and remaining
/// column height. Pages are opened lazily so zero-content pages are
/// never emitted.
struct Flow {
    config: PageConfig,
    column_height: f32,
    pages: Vec<Page>,
    current: Option<Page>,
    col: usize,
    remaining: f32,
    column_used: bool,
}

impl Flow {
    fn new(config: PageConfig, column_height: f32) -> Self {
        Self {
            config,
            column_height,
            pages: Vec::new(),
            current: None,
            col: 0,
            remaining: column_height,
            column_used: false,
        }
    }

    fn place(&mut self, fragment: Fragment) {
        if self.current.is_none() {
            let index = self.pages.len() as u32 + 1;
            self.current = Some(Page::new(index, self.config));
        }
        if let Some(page) = self.current.as_mut() {
            page.columns[self.col].push(fragment);
        }
        self.column_used = true;
    }

    /// Move to the next column, wrapping to a fresh page after the last
    fn advance(&mut self) {
        self.remaining = self.column_height;
        self.column_used = false;
        self.col += 1;
        if self.col >= self.config.column_count as usize {
            self.col = 0;
            if let Some(page) = self.current.take() {
                self.pages.push(page);
            }
        }
    }

    fn finish(mut self) -> Vec<Page> {
        if let Some(page) = self.current.take() {
            if !page.is_empty() {
                self.pages.push(page);
            }
        }
        self.pages
    }
}

/// Flows a content tree into fixed-size page surfaces.
///
/// Pure: identical `(tree, config)` input always produces an identical
/// result, and layout never suspends or fails.
pub struct LayoutEngine;

impl LayoutEngine {
    pub fn layout(tree: &ContentTree, config: &PageConfig) -> LayoutResult {
        let config = config.clamped();
        let metrics = TextMetrics::from_config(&config);
        let column_width = config.column_width_px();
        let column_height = config.content_height_px();

        let mut flow = Flow::new(config, column_height);
        let mut warnings = Vec::new();

        for (node_index, node) in tree.nodes.iter().enumerate() {
            let measure = measure_node(node, &metrics, column_width);

            if node.atomic() {
                place_solid(&mut flow, node_index, node, measure.height, true, &mut warnings);
                continue;
            }

            match &node.kind {
                NodeKind::List { ordered } if !node.children.is_empty() => {
                    place_items(&mut flow, node_index, node, *ordered, &measure, &metrics);
                }
                NodeKind::Paragraph | NodeKind::TextRun if !measure.lines.is_empty() => {
                    place_lines(&mut flow, node_index, node, measure.lines, &metrics);
                }
                // Rules and degenerate blocks are small indivisible units
                _ => place_solid(&mut flow, node_index, node, measure.height, false, &mut warnings),
            }
        }

        let pages = flow.finish();
        LayoutResult {
            total_pages: pages.len() as u32,
            pages,
            warnings,
        }
    }
}

/// Place an indivisible node, advancing columns until it fits. A node
/// taller than a full column is placed anyway and clips; atomic nodes
/// surface that as a warning.
fn place_solid(
    flow: &mut Flow,
    node_index: usize,
    node: &ContentNode,
    height: f32,
    atomic: bool,
    warnings: &mut Vec<LayoutWarning>,
) {
    let fragment = Fragment {
        node_index,
        kind: node.kind.clone(),
        content: FragmentContent::Whole {
            html: node.html.clone(),
            text: node.text.clone(),
        },
        height,
    };

    loop {
        if height <= flow.remaining + EPS {
            flow.place(fragment);
            flow.remaining -= height;
            return;
        }
        if flow.column_used {
            flow.advance();
            continue;
        }
        // Taller than a full empty column: cannot be split, so it clips
        if atomic {
            log::warn!(
                "atomic {:?} block exceeds column height ({:.1}px > {:.1}px), clipping",
                node.kind,
                height,
                flow.column_height
            );
            warnings.push(LayoutWarning::Oversize {
                node_index,
                kind: node.kind.clone(),
                height,
                column_height: flow.column_height,
            });
        }
        flow.place(fragment);
        flow.remaining = 0.0;
        return;
    }
}

/// Split a paragraph's wrapped lines across columns, filling remaining
/// space before continuing into the next column or page
fn place_lines(
    flow: &mut Flow,
    node_index: usize,
    node: &ContentNode,
    lines: Vec<String>,
    metrics: &TextMetrics,
) {
    let line_px = metrics.line_px;
    let spacing = node.kind.spacing_after() * metrics.line_px;
    let total = lines.len();
    let mut idx = 0usize;

    while idx < total {
        if flow.remaining < line_px - EPS && flow.column_used {
            flow.advance();
            continue;
        }

        let mut fit = ((flow.remaining + EPS) / line_px).floor() as usize;
        if fit == 0 {
            // Column shorter than a single line; place one and clip
            fit = 1;
        }
        let take = fit.min(total - idx);
        let last = idx + take == total;
        let height = take as f32 * line_px + if last { spacing } else { 0.0 };

        flow.place(Fragment {
            node_index,
            kind: node.kind.clone(),
            content: FragmentContent::Lines {
                lines: lines[idx..idx + take].to_vec(),
                first: idx == 0,
                last,
            },
            height,
        });
        flow.remaining -= height;
        idx += take;
    }
}

fn list_start(html: &str) -> u32 {
    html.find("start=\"")
        .and_then(|at| {
            let digits: String = html[at + 7..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        })
        .unwrap_or(1)
}

fn rebuild_list(ordered: bool, start: u32, items: &[ContentNode]) -> (String, String) {
    let mut html = String::new();
    if ordered && start > 1 {
        html.push_str(&format!("<ol start=\"{}\">", start));
    } else if ordered {
        html.push_str("<ol>");
    } else {
        html.push_str("<ul>");
    }
    for item in items {
        html.push_str(&item.html);
    }
    html.push_str(if ordered { "</ol>" } else { "</ul>" });

    let text = items
        .iter()
        .map(|i| i.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    (html, text)
}

/// Split a list at item boundaries, keeping each item whole and
/// continuing ordinal numbering across fragments
fn place_items(
    flow: &mut Flow,
    node_index: usize,
    node: &ContentNode,
    ordered: bool,
    measure: &NodeMeasure,
    metrics: &TextMetrics,
) {
    let heights = &measure.item_heights;
    let spacing = node.kind.spacing_after() * metrics.line_px;
    let base_start = list_start(&node.html);
    let total = node.children.len();
    let mut idx = 0usize;

    while idx < total {
        if flow.column_used && flow.remaining < heights[idx] - EPS {
            flow.advance();
            continue;
        }

        let mut take = 0usize;
        let mut used = 0.0f32;
        while idx + take < total {
            let h = heights[idx + take];
            if used + h > flow.remaining + EPS {
                break;
            }
            used += h;
            take += 1;
        }
        if take == 0 {
            // Fresh column, single item taller than the column: clips
            used = heights[idx];
            take = 1;
        }

        let last = idx + take == total;
        let (html, text) = rebuild_list(
            ordered,
            base_start + idx as u32,
            &node.children[idx..idx + take],
        );
        let height = used + if last { spacing } else { 0.0 };

        flow.place(Fragment {
            node_index,
            kind: node.kind.clone(),
            content: FragmentContent::Items {
                html,
                text,
                first: idx == 0,
                last,
            },
            height,
        });
        flow.remaining -= height;
        idx += take;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::DocumentTransformer;
    use rustc_hash::FxHashMap;

    fn tree_of(markdown: &str) -> ContentTree {
        DocumentTransformer::default().transform(markdown)
    }

    fn config(columns: u8, margin: f32, font: f32) -> PageConfig {
        PageConfig {
            column_count: columns,
            margin_mm: margin,
            font_px: font,
            ..PageConfig::default()
        }
    }

    /// Count how many (page, column) slots each node occupies
    fn slots_per_node(result: &LayoutResult) -> FxHashMap<usize, usize> {
        let mut slots = FxHashMap::default();
        for page in &result.pages {
            for (_, fragment) in page.fragments() {
                *slots.entry(fragment.node_index).or_insert(0) += 1;
            }
        }
        slots
    }

    #[test]
    fn test_short_document_fits_one_page() {
        let tree = tree_of("# Title\n\nShort paragraph.");
        let result = LayoutEngine::layout(&tree, &config(1, 25.0, 11.0));

        assert_eq!(result.total_pages, 1);
        assert!(result.warnings.is_empty());

        let page = &result.pages[0];
        assert_eq!(page.index, 1);
        assert_eq!(page.column_count(), 1);
        let kinds: Vec<_> = page.fragments().map(|(_, f)| f.kind.clone()).collect();
        assert_eq!(kinds[0], NodeKind::Heading { level: 1 });
        assert_eq!(kinds[1], NodeKind::Paragraph);
    }

    #[test]
    fn test_empty_tree_produces_no_pages() {
        let result = LayoutEngine::layout(&ContentTree::default(), &PageConfig::default());
        assert_eq!(result.total_pages, 0);
        assert!(result.pages.is_empty());
    }

    #[test]
    fn test_long_paragraph_splits_but_code_does_not() {
        let mut doc = String::from("```rust\nfn main() {}\n```\n\n");
        doc.push_str(&"lorem ipsum dolor sit amet ".repeat(600));
        let tree = tree_of(&doc);
        let result = LayoutEngine::layout(&tree, &config(4, 25.0, 16.0));

        assert!(result.total_pages >= 2);

        let slots = slots_per_node(&result);
        // Node 0 is the code block: exactly one slot
        assert_eq!(slots[&0], 1);
        // Node 1 is the paragraph: split across many slots
        assert!(slots[&1] > 1);
    }

    #[test]
    fn test_column_count_respected_on_every_page() {
        let doc = "para one two three ".repeat(400);
        for columns in 1..=4u8 {
            let tree = tree_of(&doc);
            let result = LayoutEngine::layout(&tree, &config(columns, 12.0, 11.0));
            assert!(result.total_pages >= 1);
            for page in &result.pages {
                assert_eq!(page.column_count(), columns as usize);
            }
        }
    }

    #[test]
    fn test_atomic_nodes_occupy_exactly_one_slot() {
        let doc = "# Heading One\n\n".to_string()
            + &"word ".repeat(800)
            + "\n\n```python\nprint(1)\nprint(2)\n```\n\n\
               | a | b |\n|---|---|\n| 1 | 2 |\n\n## Heading Two\n";
        let tree = tree_of(&doc);
        let result = LayoutEngine::layout(&tree, &config(3, 12.0, 12.0));

        let slots = slots_per_node(&result);
        for (node_index, node) in tree.nodes.iter().enumerate() {
            if node.atomic() {
                assert_eq!(
                    slots.get(&node_index),
                    Some(&1),
                    "atomic node {} split across slots",
                    node_index
                );
            }
        }
    }

    #[test]
    fn test_page_indices_are_contiguous() {
        let doc = "words and more words ".repeat(900);
        let tree = tree_of(&doc);
        let result = LayoutEngine::layout(&tree, &config(2, 12.0, 12.0));

        assert!(result.total_pages > 1);
        for (i, page) in result.pages.iter().enumerate() {
            assert_eq!(page.index, i as u32 + 1);
            assert!(!page.is_empty());
        }
    }

    #[test]
    fn test_oversize_atomic_block_warns_and_clips() {
        let mut doc = String::from("```text\n");
        for i in 0..300 {
            doc.push_str(&format!("line {}\n", i));
        }
        doc.push_str("```\n");
        let tree = tree_of(&doc);
        let result = LayoutEngine::layout(&tree, &config(4, 25.0, 14.0));

        assert!(!result.warnings.is_empty());
        assert!(matches!(
            result.warnings[0],
            LayoutWarning::Oversize { node_index: 0, .. }
        ));
        // Still placed exactly once, never fragmented
        assert_eq!(slots_per_node(&result)[&0], 1);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let doc = "# T\n\n".to_string() + &"abc def ghi ".repeat(500) + "\n\n- a\n- b\n- c\n";
        let tree = tree_of(&doc);
        let config = config(3, 10.0, 10.0);

        let first = LayoutEngine::layout(&tree, &config);
        let second = LayoutEngine::layout(&tree, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_max_pages_never_affects_total() {
        let doc = "flow content here ".repeat(1200);
        let tree = tree_of(&doc);

        let mut low = config(2, 12.0, 12.0);
        low.max_pages = 1;
        let mut high = config(2, 12.0, 12.0);
        high.max_pages = 24;

        let a = LayoutEngine::layout(&tree, &low);
        let b = LayoutEngine::layout(&tree, &high);
        assert!(a.total_pages > 1);
        assert_eq!(a.total_pages, b.total_pages);
    }

    #[test]
    fn test_list_splits_at_item_boundaries_with_ordinals() {
        let mut doc = String::new();
        for i in 1..=120 {
            doc.push_str(&format!("{}. item number {}\n", i, i));
        }
        let tree = tree_of(&doc);
        let result = LayoutEngine::layout(&tree, &config(4, 25.0, 16.0));

        let list_fragments: Vec<&Fragment> = result
            .pages
            .iter()
            .flat_map(|p| p.fragments().map(|(_, f)| f))
            .filter(|f| matches!(f.kind, NodeKind::List { .. }))
            .collect();
        assert!(list_fragments.len() > 1);

        // A continuation fragment keeps counting from where it left off
        let continuation = list_fragments
            .iter()
            .find(|f| !f.is_first())
            .expect("list should have continuations");
        match &continuation.content {
            FragmentContent::Items { html, .. } => assert!(html.contains("start=\"")),
            other => panic!("unexpected fragment content: {:?}", other),
        }
    }

    #[test]
    fn test_atomic_opens_fresh_column_when_it_does_not_fit() {
        // A paragraph nearly fills the column, then a table must not be
        // split: it moves wholly into the next column
        let mut doc = String::from("filler words here ");
        doc.push_str(&"pad ".repeat(700));
        doc.push_str("\n\n| h1 | h2 |\n|----|----|\n| a | b |\n| c | d |\n");
        let tree = tree_of(&doc);
        let result = LayoutEngine::layout(&tree, &config(2, 12.0, 12.0));

        let table_index = tree
            .nodes
            .iter()
            .position(|n| n.kind == NodeKind::Table)
            .expect("table node");
        assert_eq!(slots_per_node(&result)[&table_index], 1);
    }
}
