//! Content model: raw source text, configuration, and the sanitized tree

mod node;

pub use node::{ContentNode, NodeKind};

use crate::config::PageConfig;

/// The sanitized content tree for one document revision.
///
/// Only top-level nodes participate in column flow; nested structure
/// (list items) lives in `children`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentTree {
    pub nodes: Vec<ContentNode>,
}

impl ContentTree {
    pub fn new(nodes: Vec<ContentNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// How template text is loaded into the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateLoad {
    Replace,
    Append,
}

/// Holds the raw markdown text and the page configuration.
///
/// Every edit to either bumps a monotonic revision counter; the
/// controller uses the counter to stamp recompute cycles.
#[derive(Debug, Clone)]
pub struct ContentSource {
    text: String,
    config: PageConfig,
    revision: u64,
}

impl Default for ContentSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentSource {
    /// Create an empty source with the default configuration
    pub fn new() -> Self {
        Self {
            text: String::new(),
            config: PageConfig::default(),
            revision: 0,
        }
    }

    /// Create a source with initial text
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            config: PageConfig::default(),
            revision: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the text; returns true when the content actually changed
    pub fn set_text(&mut self, text: &str) -> bool {
        if self.text == text {
            return false;
        }
        self.text.clear();
        self.text.push_str(text);
        self.revision += 1;
        true
    }

    /// Replace the configuration; returns true when it actually changed
    pub fn set_config(&mut self, config: PageConfig) -> bool {
        if self.config == config {
            return false;
        }
        self.config = config;
        self.revision += 1;
        true
    }

    /// Update only the requested preview page
    pub fn set_selected_page(&mut self, requested: u32) -> bool {
        if self.config.selected_page == requested {
            return false;
        }
        self.config.selected_page = requested;
        self.revision += 1;
        true
    }

    /// Load template text, replacing or appending to the current document
    pub fn load_template(&mut self, body: &str, mode: TemplateLoad) -> bool {
        match mode {
            TemplateLoad::Replace => self.set_text(body),
            TemplateLoad::Append => {
                if body.is_empty() {
                    return false;
                }
                self.text.push_str(body);
                self.revision += 1;
                true
            }
        }
    }
}
