//! Content tree nodes produced by the transformer

/// The kind of a content node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Heading with level (1-6)
    Heading { level: u8 },
    /// Regular paragraph
    Paragraph,
    /// Fenced or indented code block
    CodeBlock { language: Option<String> },
    /// Image
    Image,
    /// Table
    Table,
    /// Bullet or numbered list
    List { ordered: bool },
    /// Horizontal rule
    Rule,
    /// Bare text outside any block element
    TextRun,
}

impl NodeKind {
    /// Atomic kinds must render unbroken within one column of one page
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            NodeKind::Heading { .. }
                | NodeKind::CodeBlock { .. }
                | NodeKind::Image
                | NodeKind::Table
        )
    }

    /// Get the font scale for this block kind
    pub fn font_scale(&self) -> f32 {
        match self {
            NodeKind::Heading { level } => match level {
                1 => 1.5,
                2 => 1.4,
                3 => 1.3,
                _ => 1.2,
            },
            _ => 1.0,
        }
    }

    /// Get the spacing after this block (in line heights)
    pub fn spacing_after(&self) -> f32 {
        match self {
            NodeKind::Heading { .. } => 0.4,
            NodeKind::Paragraph | NodeKind::TextRun => 0.6,
            NodeKind::CodeBlock { .. } => 0.8,
            NodeKind::List { .. } => 0.6,
            NodeKind::Table => 0.6,
            NodeKind::Image => 0.5,
            NodeKind::Rule => 1.0,
        }
    }

    /// Check if this is a heading
    pub fn is_heading(&self) -> bool {
        matches!(self, NodeKind::Heading { .. })
    }

    /// Check if this is a code block
    pub fn is_code_block(&self) -> bool {
        matches!(self, NodeKind::CodeBlock { .. })
    }
}

/// A node in the sanitized content tree.
///
/// Nodes carry both a render form (`html`, already sanitized) and a
/// measurement form (`text`, plain content with one line per logical row).
/// The tree is rebuilt wholesale on every text change and never mutated in
/// place.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentNode {
    pub kind: NodeKind,
    /// Sanitized outer HTML for this node
    pub html: String,
    /// Plain text for height estimation; rows (table rows, list items,
    /// code lines) are newline-separated
    pub text: String,
    /// Child nodes (list items for lists; empty elsewhere)
    pub children: Vec<ContentNode>,
}

impl ContentNode {
    pub fn new(kind: NodeKind, html: String, text: String) -> Self {
        Self {
            kind,
            html,
            text,
            children: Vec::new(),
        }
    }

    /// Whether this node must not be split across columns or pages
    pub fn atomic(&self) -> bool {
        self.kind.is_atomic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_kinds() {
        assert!(NodeKind::Heading { level: 1 }.is_atomic());
        assert!(NodeKind::CodeBlock { language: None }.is_atomic());
        assert!(NodeKind::Image.is_atomic());
        assert!(NodeKind::Table.is_atomic());

        assert!(!NodeKind::Paragraph.is_atomic());
        assert!(!NodeKind::List { ordered: false }.is_atomic());
        assert!(!NodeKind::Rule.is_atomic());
        assert!(!NodeKind::TextRun.is_atomic());
    }

    #[test]
    fn test_heading_font_scale_decreases_with_level() {
        let h1 = NodeKind::Heading { level: 1 }.font_scale();
        let h3 = NodeKind::Heading { level: 3 }.font_scale();
        let h6 = NodeKind::Heading { level: 6 }.font_scale();
        assert!(h1 > h3);
        assert!(h3 > h6);
        assert_eq!(NodeKind::Paragraph.font_scale(), 1.0);
    }
}
