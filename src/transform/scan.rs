//! Streaming scan of sanitized HTML into top-level content nodes

use crate::content::{ContentNode, NodeKind};
use crate::services::escape_html;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

fn lower_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// Rebuild a start tag, re-escaping attribute values
fn start_tag(e: &BytesStart, name: &str, self_closing: bool) -> String {
    let mut out = String::with_capacity(name.len() + 8);
    out.push('<');
    out.push_str(name);
    for attr in e.attributes().flatten() {
        let key = lower_name(attr.key.as_ref());
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        out.push(' ');
        out.push_str(&key);
        out.push_str("=\"");
        out.push_str(&escape_html(&value));
        out.push('"');
    }
    if self_closing {
        out.push_str(" />");
    } else {
        out.push('>');
    }
    out
}

fn attr_value(e: &BytesStart, wanted: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if lower_name(attr.key.as_ref()) == wanted {
            return Some(match attr.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            });
        }
    }
    None
}

fn block_kind_for(name: &str) -> Option<NodeKind> {
    match name {
        "h1" => Some(NodeKind::Heading { level: 1 }),
        "h2" => Some(NodeKind::Heading { level: 2 }),
        "h3" => Some(NodeKind::Heading { level: 3 }),
        "h4" => Some(NodeKind::Heading { level: 4 }),
        "h5" => Some(NodeKind::Heading { level: 5 }),
        "h6" => Some(NodeKind::Heading { level: 6 }),
        "p" | "blockquote" => Some(NodeKind::Paragraph),
        "pre" => Some(NodeKind::CodeBlock { language: None }),
        "ul" => Some(NodeKind::List { ordered: false }),
        "ol" => Some(NodeKind::List { ordered: true }),
        "table" => Some(NodeKind::Table),
        _ => None,
    }
}

/// Builder for the block currently being scanned
struct BlockBuilder {
    kind: NodeKind,
    html: String,
    text: String,
    children: Vec<ContentNode>,
    /// Element depth within the block; the block's own tag counts as 1.
    /// Implicit text runs have no wrapping tag and sit at depth 0.
    depth: usize,
    implicit: bool,
    pre_depth: usize,
    li_depth: usize,
    img_count: usize,
    language: Option<String>,
    item: Option<(String, String)>,
}

impl BlockBuilder {
    fn open(kind: NodeKind, e: &BytesStart, name: &str) -> Self {
        let mut b = Self::implicit_run();
        b.kind = kind;
        b.implicit = false;
        b.depth = 1;
        b.html.push_str(&start_tag(e, name, false));
        b
    }

    fn implicit_run() -> Self {
        Self {
            kind: NodeKind::TextRun,
            html: String::new(),
            text: String::new(),
            children: Vec::new(),
            depth: 0,
            implicit: true,
            pre_depth: 0,
            li_depth: 0,
            img_count: 0,
            language: None,
            item: None,
        }
    }

    fn push_markup(&mut self, markup: &str) {
        self.html.push_str(markup);
        if let Some((item_html, _)) = self.item.as_mut() {
            item_html.push_str(markup);
        }
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
        if let Some((_, item_text)) = self.item.as_mut() {
            item_text.push_str(text);
        }
    }

    fn handle_start(&mut self, e: &BytesStart, name: &str) {
        self.depth += 1;
        if name == "pre" {
            self.pre_depth += 1;
        }
        if name == "code" && self.pre_depth > 0 && self.language.is_none() {
            if let Some(class) = attr_value(e, "class") {
                self.language = class
                    .split_whitespace()
                    .find_map(|c| c.strip_prefix("language-"))
                    .map(|l| l.to_string());
            }
        }
        if name == "li" {
            self.li_depth += 1;
            if matches!(self.kind, NodeKind::List { .. }) && self.li_depth == 1 {
                self.item = Some((String::new(), String::new()));
            }
        }
        self.push_markup(&start_tag(e, name, false));
    }

    fn handle_empty(&mut self, e: &BytesStart, name: &str) {
        if name == "img" {
            self.img_count += 1;
        }
        if name == "br" {
            self.push_text("\n");
        }
        self.push_markup(&start_tag(e, name, true));
    }

    /// An implicit run with no open elements absorbs nothing further
    fn at_implicit_boundary(&self) -> bool {
        self.implicit && self.depth == 0
    }

    /// Returns true when the block's own tag just closed
    fn handle_end(&mut self, name: &str) -> bool {
        if self.depth == 0 {
            // Stray close while an implicit run is open: finish the run
            return true;
        }
        self.push_markup(&format!("</{}>", name));
        if name == "pre" && self.pre_depth > 0 {
            self.pre_depth -= 1;
        }
        if name == "li" && self.li_depth > 0 {
            if self.li_depth == 1 {
                if let Some((item_html, item_text)) = self.item.take() {
                    self.children.push(ContentNode::new(
                        NodeKind::TextRun,
                        item_html,
                        item_text.trim().to_string(),
                    ));
                }
            }
            self.li_depth -= 1;
            self.push_text("\n");
        }
        if name == "tr" {
            self.push_text("\n");
        }
        // Nested paragraphs (blockquote bodies) break measurement rows
        if name == "p" && self.depth > 1 {
            self.push_text("\n");
        }
        self.depth -= 1;
        self.depth == 0 && !self.implicit
    }

    fn finish(mut self) -> Option<ContentNode> {
        let has_text = !self.text.trim().is_empty();

        // A paragraph holding only an image is the image, atomically
        if matches!(self.kind, NodeKind::Paragraph) && !has_text && self.img_count >= 1 {
            self.kind = NodeKind::Image;
        }

        if matches!(self.kind, NodeKind::Paragraph | NodeKind::TextRun)
            && !has_text
            && self.img_count == 0
        {
            return None;
        }
        if matches!(self.kind, NodeKind::CodeBlock { .. }) {
            self.kind = NodeKind::CodeBlock {
                language: self.language.take(),
            };
        }

        let mut node = ContentNode::new(self.kind, self.html, self.text);
        node.children = self.children;
        Some(node)
    }
}

/// Scan sanitized HTML into top-level content nodes.
///
/// Errors indicate markup the reader cannot recover from; the caller
/// degrades the whole input to a literal-text node.
pub fn scan_blocks(html: &str) -> Result<Vec<ContentNode>, quick_xml::Error> {
    let mut reader = Reader::from_str(html);
    reader.config_mut().check_end_names = false;

    let mut nodes: Vec<ContentNode> = Vec::new();
    let mut block: Option<BlockBuilder> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = lower_name(e.name().as_ref());
                // A settled implicit run ends where the next block begins
                if block.as_ref().map_or(false, |b| b.at_implicit_boundary())
                    && block_kind_for(&name).is_some()
                {
                    if let Some(node) = block.take().and_then(BlockBuilder::finish) {
                        nodes.push(node);
                    }
                }
                match block.as_mut() {
                    Some(b) => b.handle_start(&e, &name),
                    None => {
                        if let Some(kind) = block_kind_for(&name) {
                            block = Some(BlockBuilder::open(kind, &e, &name));
                        } else {
                            // Stray inline markup becomes a bare text run
                            let mut b = BlockBuilder::implicit_run();
                            b.handle_start(&e, &name);
                            block = Some(b);
                        }
                    }
                }
            }
            Event::Empty(e) => {
                let name = lower_name(e.name().as_ref());
                if block.as_ref().map_or(false, |b| b.at_implicit_boundary())
                    && (name == "hr" || name == "img")
                {
                    if let Some(node) = block.take().and_then(BlockBuilder::finish) {
                        nodes.push(node);
                    }
                }
                match block.as_mut() {
                    Some(b) => b.handle_empty(&e, &name),
                    None => match name.as_str() {
                        "hr" => {
                            nodes.push(ContentNode::new(
                                NodeKind::Rule,
                                start_tag(&e, "hr", true),
                                String::new(),
                            ));
                        }
                        "img" => {
                            nodes.push(ContentNode::new(
                                NodeKind::Image,
                                start_tag(&e, "img", true),
                                String::new(),
                            ));
                        }
                        _ => {}
                    },
                }
            }
            Event::End(e) => {
                let name = lower_name(e.name().as_ref());
                if let Some(b) = block.as_mut() {
                    if b.handle_end(&name) {
                        if let Some(node) = block.take().and_then(BlockBuilder::finish) {
                            nodes.push(node);
                        }
                    }
                }
            }
            Event::Text(e) => {
                let text = match e.decode() {
                    Ok(t) => t.into_owned(),
                    Err(_) => String::from_utf8_lossy(e.as_ref()).into_owned(),
                };
                match block.as_mut() {
                    Some(b) => {
                        b.push_markup(&escape_html(&text));
                        b.push_text(&text);
                    }
                    None => {
                        if !text.trim().is_empty() {
                            let mut b = BlockBuilder::implicit_run();
                            b.push_markup(&escape_html(&text));
                            b.push_text(&text);
                            block = Some(b);
                        }
                    }
                }
            }
            Event::GeneralRef(e) => {
                let name = String::from_utf8_lossy(e.as_ref()).into_owned();
                let entity = format!("&{};", name);
                let resolved = quick_xml::escape::unescape(&entity)
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| entity.clone());
                match block.as_mut() {
                    Some(b) => {
                        b.push_markup(&entity);
                        b.push_text(&resolved);
                    }
                    None => {
                        let mut b = BlockBuilder::implicit_run();
                        b.push_markup(&entity);
                        b.push_text(&resolved);
                        block = Some(b);
                    }
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                if let Some(b) = block.as_mut() {
                    b.push_markup(&escape_html(&text));
                    b.push_text(&text);
                }
            }
            Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    // Unterminated block at end of input still yields its content
    if let Some(node) = block.take().and_then(BlockBuilder::finish) {
        nodes.push(node);
    }

    Ok(nodes)
}
