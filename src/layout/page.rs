//! Page surfaces, fragments, and the layout result

use crate::config::PageConfig;
use crate::content::NodeKind;
use crate::services::escape_html;
use smallvec::SmallVec;
use thiserror::Error;

/// What a fragment carries onto its page
#[derive(Debug, Clone, PartialEq)]
pub enum FragmentContent {
    /// An unbroken node: its full sanitized HTML
    Whole { html: String, text: String },
    /// A run of wrapped lines from a split paragraph or text run
    Lines {
        lines: Vec<String>,
        first: bool,
        last: bool,
    },
    /// A contiguous run of list items
    Items {
        html: String,
        text: String,
        first: bool,
        last: bool,
    },
}

/// One placed piece of content: a whole atomic node, or a slice of a
/// splittable one
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Index of the source node among the tree's top-level nodes
    pub node_index: usize,
    pub kind: NodeKind,
    pub content: FragmentContent,
    /// Estimated height this fragment occupies, spacing included
    pub height: f32,
}

impl Fragment {
    /// Render-ready HTML for this fragment
    pub fn to_html(&self) -> String {
        match &self.content {
            FragmentContent::Whole { html, .. } => html.clone(),
            FragmentContent::Items { html, .. } => html.clone(),
            FragmentContent::Lines { lines, first, .. } => {
                let class = if *first { "" } else { " class=\"cont\"" };
                format!("<p{}>{}</p>", class, escape_html(&lines.join(" ")))
            }
        }
    }

    /// Plain text carried by this fragment
    pub fn text(&self) -> String {
        match &self.content {
            FragmentContent::Whole { text, .. } => text.clone(),
            FragmentContent::Items { text, .. } => text.clone(),
            FragmentContent::Lines { lines, .. } => lines.join(" "),
        }
    }

    /// Whether this fragment is the start of its source node
    pub fn is_first(&self) -> bool {
        match &self.content {
            FragmentContent::Whole { .. } => true,
            FragmentContent::Lines { first, .. } => *first,
            FragmentContent::Items { first, .. } => *first,
        }
    }
}

/// A fixed-size page surface holding placed fragments per column.
///
/// Immutable once produced; an edit produces an entirely new sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based position in the sequence
    pub index: u32,
    /// One fragment list per configured column, in flow order
    pub columns: SmallVec<[Vec<Fragment>; 4]>,
    /// Snapshot of the configuration the page was produced under
    pub config: PageConfig,
}

impl Page {
    pub fn new(index: u32, config: PageConfig) -> Self {
        let columns = (0..config.column_count.max(1))
            .map(|_| Vec::new())
            .collect();
        Self {
            index,
            columns,
            config,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Iterate placed fragments as `(column, fragment)` in flow order
    pub fn fragments(&self) -> impl Iterator<Item = (usize, &Fragment)> {
        self.columns
            .iter()
            .enumerate()
            .flat_map(|(col, frags)| frags.iter().map(move |f| (col, f)))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|c| c.is_empty())
    }
}

/// Non-fatal layout degradation surfaced to the caller
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutWarning {
    #[error(
        "atomic {kind:?} block (node {node_index}) is {height:.1}px tall \
         but a column holds {column_height:.1}px; it will clip"
    )]
    Oversize {
        node_index: usize,
        kind: NodeKind,
        height: f32,
        column_height: f32,
    },
}

/// The outcome of flowing one content tree under one configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutResult {
    pub pages: Vec<Page>,
    /// Number of pages actually produced; independent of `max_pages`
    pub total_pages: u32,
    pub warnings: Vec<LayoutWarning>,
}

impl LayoutResult {
    /// Get a page by its 1-based index
    pub fn page(&self, index: u32) -> Option<&Page> {
        if index == 0 {
            return None;
        }
        self.pages.get(index as usize - 1)
    }
}
