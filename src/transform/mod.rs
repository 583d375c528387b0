//! Markdown-to-content-tree transformation

mod scan;

pub use scan::scan_blocks;

use crate::content::{ContentNode, ContentTree, NodeKind};
use crate::services::{
    escape_html, AllowListSanitizer, CommonMarkParser, MarkdownParser, Sanitizer,
};

/// Turns raw markdown into a sanitized content tree.
///
/// Parsing and sanitization are delegated to the injected services; the
/// transformer itself only scans the sanitized HTML into block nodes.
/// Never fails: the worst input degrades to a literal-text node.
pub struct DocumentTransformer {
    parser: Box<dyn MarkdownParser>,
    sanitizer: Box<dyn Sanitizer>,
}

impl Default for DocumentTransformer {
    fn default() -> Self {
        Self {
            parser: Box::new(CommonMarkParser::new()),
            sanitizer: Box::new(AllowListSanitizer::new()),
        }
    }
}

impl DocumentTransformer {
    pub fn new(parser: Box<dyn MarkdownParser>, sanitizer: Box<dyn Sanitizer>) -> Self {
        Self { parser, sanitizer }
    }

    pub fn set_parser(&mut self, parser: Box<dyn MarkdownParser>) {
        self.parser = parser;
    }

    pub fn set_sanitizer(&mut self, sanitizer: Box<dyn Sanitizer>) {
        self.sanitizer = sanitizer;
    }

    /// Transform raw markdown into a content tree
    pub fn transform(&self, raw: &str) -> ContentTree {
        if raw.trim().is_empty() {
            return ContentTree::default();
        }

        let html = self.parser.parse(raw);
        let clean = self.sanitizer.sanitize(&html);

        match scan_blocks(&clean) {
            Ok(nodes) => ContentTree::new(nodes),
            Err(_) => {
                // Unscannable markup: degrade the whole document to text
                let node = ContentNode::new(
                    NodeKind::Paragraph,
                    format!("<p>{}</p>", escape_html(raw)),
                    raw.to_string(),
                );
                ContentTree::new(vec![node])
            }
        }
    }
}
