//! External collaborator interfaces and their built-in implementations
//!
//! The pipeline never reaches for ambient globals; every external engine
//! (markdown renderer, sanitizer, code highlighter, math typesetter, print
//! facility) stands behind one of these traits and is injected at
//! construction time. Hosts swap in their own engines; the built-ins keep
//! the pipeline usable without any.

mod builtin;
mod loader;

pub use builtin::{
    escape_html, AllowListSanitizer, CommonMarkParser, DelimiterTypesetter, PlainHighlighter,
};
pub use loader::{LoadTicket, ServiceLoader};

use thiserror::Error;

/// Failure of an external service call.
///
/// Never fatal: enrichment degrades the affected fragment and the pipeline
/// publishes the rest of the cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("service `{0}` is not available")]
    Unavailable(&'static str),
    #[error("service `{name}` failed: {message}")]
    Failed { name: &'static str, message: String },
}

/// One code block handed to a highlighter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFragment<'a> {
    /// Raw code text, unescaped
    pub code: &'a str,
    /// Fence language tag, if any
    pub language: Option<&'a str>,
}

/// One math span handed to a typesetter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathFragment {
    /// TeX source without delimiters
    pub source: String,
    /// Display (`$$...$$`) rather than inline (`$...$`)
    pub display: bool,
}

/// Markdown-to-HTML rendering. Best effort: malformed input renders as
/// literal text, never an error.
pub trait MarkdownParser {
    fn parse(&self, text: &str) -> String;
}

/// HTML sanitization against a fixed allow-list. Must be idempotent;
/// scripts, event-handler attributes, and inline frames are always
/// stripped regardless of parser output.
pub trait Sanitizer {
    fn sanitize(&self, html: &str) -> String;
}

/// Syntax highlighting for a single code fragment. Returns highlighted
/// inner HTML for the code element.
pub trait CodeHighlighter {
    fn apply(&self, fragment: &CodeFragment) -> Result<String, ServiceError>;
}

/// Math typesetting for a batch of fragments. Returns rendered HTML per
/// fragment, in order.
pub trait MathTypesetter {
    fn typeset(&self, fragments: &[MathFragment]) -> Result<Vec<String>, ServiceError>;
}

/// Opaque trigger for the host platform's print/export facility
pub trait PrintTrigger {
    fn invoke(&self);
}
