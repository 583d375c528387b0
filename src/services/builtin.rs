//! Built-in service implementations
//!
//! `CommonMarkParser` and `AllowListSanitizer` are full default engines;
//! `PlainHighlighter` and `DelimiterTypesetter` are deliberate minimal
//! renderings so a host without real engines still gets readable output.

use crate::services::{
    CodeFragment, CodeHighlighter, MarkdownParser, MathFragment, MathTypesetter, Sanitizer,
    ServiceError,
};
use pulldown_cmark::{html, Options, Parser};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Escape text for inclusion in HTML content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// CommonMark renderer backed by pulldown-cmark.
///
/// Tables and strikethrough are enabled; math delimiters are left as
/// literal text so the typesetter service can find them later.
pub struct CommonMarkParser {
    options: Options,
}

impl Default for CommonMarkParser {
    fn default() -> Self {
        Self {
            options: Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
        }
    }
}

impl CommonMarkParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarkdownParser for CommonMarkParser {
    fn parse(&self, text: &str) -> String {
        let parser = Parser::new_ext(text, self.options);
        let mut out = String::with_capacity(text.len() + text.len() / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// Tags whose subtree is emitted (lowercase)
const ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "hr", "pre", "code", "em", "strong", "del",
    "blockquote", "ul", "ol", "li", "table", "thead", "tbody", "tr", "th", "td", "img", "a",
    "span", "sup", "sub",
];

/// Tags dropped together with their entire content
const DROPPED_SUBTREES: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "noscript",
];

/// Attributes kept on allowed tags
const ALLOWED_ATTRS: &[&str] = &[
    "href", "src", "alt", "title", "class", "style", "start", "align", "colspan", "rowspan",
];

/// Allow-list HTML sanitizer.
///
/// Unknown tags are unwrapped (children kept), dangerous subtrees are
/// removed wholesale, event-handler attributes and script-scheme URLs are
/// always stripped. Output is stable under re-sanitization.
#[derive(Debug, Default)]
pub struct AllowListSanitizer;

impl AllowListSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl Sanitizer for AllowListSanitizer {
    fn sanitize(&self, html: &str) -> String {
        // Malformed markup degrades to escaped literal text
        sanitize_markup(html).unwrap_or_else(|_| escape_html(html))
    }
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn unsafe_url(value: &str) -> bool {
    let v: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    v.starts_with("javascript:") || v.starts_with("vbscript:") || v.starts_with("data:text/html")
}

fn push_filtered_attrs(out: &mut String, e: &quick_xml::events::BytesStart) {
    for attr in e.attributes().flatten() {
        let key = tag_name(attr.key.as_ref());
        if key.starts_with("on") || !ALLOWED_ATTRS.contains(&key.as_str()) {
            continue;
        }
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        if (key == "href" || key == "src") && unsafe_url(&value) {
            continue;
        }
        out.push(' ');
        out.push_str(&key);
        out.push_str("=\"");
        out.push_str(&escape_html(&value));
        out.push('"');
    }
}

fn sanitize_markup(html: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(html);
    reader.config_mut().check_end_names = false;

    let mut out = String::with_capacity(html.len());
    // Depth inside a dropped subtree; 0 means content flows through
    let mut drop_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = tag_name(e.name().as_ref());
                if drop_depth > 0 {
                    drop_depth += 1;
                } else if DROPPED_SUBTREES.contains(&name.as_str()) {
                    drop_depth = 1;
                } else if ALLOWED_TAGS.contains(&name.as_str()) {
                    out.push('<');
                    out.push_str(&name);
                    push_filtered_attrs(&mut out, &e);
                    out.push('>');
                }
                // Unknown tags are unwrapped: children survive, tag does not
            }
            Event::Empty(e) => {
                let name = tag_name(e.name().as_ref());
                if drop_depth == 0 && ALLOWED_TAGS.contains(&name.as_str()) {
                    out.push('<');
                    out.push_str(&name);
                    push_filtered_attrs(&mut out, &e);
                    out.push_str(" />");
                }
            }
            Event::End(e) => {
                if drop_depth > 0 {
                    drop_depth -= 1;
                    continue;
                }
                let name = tag_name(e.name().as_ref());
                if ALLOWED_TAGS.contains(&name.as_str()) {
                    out.push_str("</");
                    out.push_str(&name);
                    out.push('>');
                }
            }
            Event::Text(e) => {
                if drop_depth > 0 {
                    continue;
                }
                let text = match e.decode() {
                    Ok(t) => t.into_owned(),
                    Err(_) => String::from_utf8_lossy(e.as_ref()).into_owned(),
                };
                out.push_str(&escape_html(&text));
            }
            Event::GeneralRef(e) => {
                if drop_depth > 0 {
                    continue;
                }
                let name = String::from_utf8_lossy(e.as_ref()).into_owned();
                if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '#') {
                    out.push('&');
                    out.push_str(&name);
                    out.push(';');
                } else {
                    out.push_str(&escape_html(&name));
                }
            }
            Event::CData(e) => {
                if drop_depth == 0 {
                    out.push_str(&escape_html(&String::from_utf8_lossy(e.as_ref())));
                }
            }
            Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    Ok(out)
}

/// Escape-only highlighter: code renders unhighlighted but intact.
/// Stands in whenever the host has no real engine loaded.
#[derive(Debug, Default)]
pub struct PlainHighlighter;

impl PlainHighlighter {
    pub fn new() -> Self {
        Self
    }
}

impl CodeHighlighter for PlainHighlighter {
    fn apply(&self, fragment: &CodeFragment) -> Result<String, ServiceError> {
        Ok(escape_html(fragment.code))
    }
}

/// Wraps recognized math spans in classed elements for a host stylesheet.
/// A real typesetter (MathJax via the WASM bridge) replaces this wholesale.
#[derive(Debug, Default)]
pub struct DelimiterTypesetter;

impl DelimiterTypesetter {
    pub fn new() -> Self {
        Self
    }
}

impl MathTypesetter for DelimiterTypesetter {
    fn typeset(&self, fragments: &[MathFragment]) -> Result<Vec<String>, ServiceError> {
        Ok(fragments
            .iter()
            .map(|f| {
                let class = if f.display {
                    "math math-display"
                } else {
                    "math math-inline"
                };
                format!("<span class=\"{}\">{}</span>", class, escape_html(&f.source))
            })
            .collect())
    }
}
