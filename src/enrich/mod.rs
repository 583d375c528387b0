//! Active-page enrichment: syntax highlighting and math typesetting
//!
//! Enrichment runs for exactly one page per cycle, so its cost is bound
//! by the content of that page, not the document.

use crate::content::NodeKind;
use crate::layout::{Fragment, Page};
use crate::services::{
    CodeFragment, CodeHighlighter, DelimiterTypesetter, MathFragment, MathTypesetter,
    PlainHighlighter, ServiceError,
};

/// A fragment with enrichment applied (or deliberately skipped)
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedFragment {
    pub kind: NodeKind,
    /// Render-ready HTML
    pub html: String,
    /// True when a service failed and the fragment renders plain
    pub degraded: bool,
}

/// The active page after enrichment
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPage {
    pub page_index: u32,
    pub columns: Vec<Vec<EnrichedFragment>>,
    /// Service failures that degraded fragments on this page
    pub degradations: Vec<ServiceError>,
}

impl EnrichedPage {
    /// Project the page as column-wrapped HTML for a render adapter
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for column in &self.columns {
            out.push_str("<div class=\"column\">");
            for fragment in column {
                out.push_str(&fragment.html);
            }
            out.push_str("</div>");
        }
        out
    }
}

/// One span of a fragment's HTML: literal text or recognized math
#[derive(Debug, Clone, PartialEq)]
enum MathSpan {
    Text(String),
    Math { source: String, display: bool },
}

/// Scan fragment HTML for `$...$` and `$$...$$` outside tags and code
/// elements. Delimiters that never close, or whose body would cross
/// markup, stay literal text.
fn scan_math(html: &str) -> Vec<MathSpan> {
    let mut spans = Vec::new();
    let mut text = String::new();
    let mut rest = html;
    let mut in_tag = false;
    let mut code_depth = 0usize;

    while let Some(c) = rest.chars().next() {
        if in_tag {
            text.push(c);
            if c == '>' {
                in_tag = false;
            }
            rest = &rest[c.len_utf8()..];
            continue;
        }
        if c == '<' {
            if rest.get(..5).map_or(false, |s| s.eq_ignore_ascii_case("<code")) {
                code_depth += 1;
            } else if rest
                .get(..6)
                .map_or(false, |s| s.eq_ignore_ascii_case("</code"))
            {
                code_depth = code_depth.saturating_sub(1);
            }
            in_tag = true;
            text.push(c);
            rest = &rest[1..];
            continue;
        }
        if c == '$' && code_depth == 0 {
            let display = rest.starts_with("$$");
            let (open_len, close) = if display { (2, "$$") } else { (1, "$") };
            let body_start = &rest[open_len..];
            let found = body_start.find(close).and_then(|end| {
                let body = &body_start[..end];
                if body.is_empty() || body.contains('<') || (!display && body.contains('\n')) {
                    None
                } else {
                    Some((body.to_string(), end))
                }
            });
            if let Some((source, end)) = found {
                if !text.is_empty() {
                    spans.push(MathSpan::Text(std::mem::take(&mut text)));
                }
                spans.push(MathSpan::Math { source, display });
                rest = &body_start[end + open_len..];
                continue;
            }
        }
        text.push(c);
        rest = &rest[c.len_utf8()..];
    }

    if !text.is_empty() {
        spans.push(MathSpan::Text(text));
    }
    spans
}

fn literal_math(source: &str, display: bool) -> String {
    if display {
        format!("$${}$$", source)
    } else {
        format!("${}$", source)
    }
}

enum PreparedContent {
    /// Already final
    Done { html: String, degraded: bool },
    /// Awaiting typeset results for its math spans
    Spans(Vec<MathSpan>),
}

struct PreparedFragment {
    column: usize,
    kind: NodeKind,
    content: PreparedContent,
}

/// Applies the highlighter and typesetter services to one page.
///
/// Service failure is never fatal: the affected fragment renders plain
/// and the failure is recorded on the result.
pub struct EnrichmentPipeline {
    highlighter: Box<dyn CodeHighlighter>,
    typesetter: Box<dyn MathTypesetter>,
}

impl Default for EnrichmentPipeline {
    fn default() -> Self {
        Self {
            highlighter: Box::new(PlainHighlighter::new()),
            typesetter: Box::new(DelimiterTypesetter::new()),
        }
    }
}

impl EnrichmentPipeline {
    pub fn new(highlighter: Box<dyn CodeHighlighter>, typesetter: Box<dyn MathTypesetter>) -> Self {
        Self {
            highlighter,
            typesetter,
        }
    }

    pub fn set_highlighter(&mut self, highlighter: Box<dyn CodeHighlighter>) {
        self.highlighter = highlighter;
    }

    pub fn set_typesetter(&mut self, typesetter: Box<dyn MathTypesetter>) {
        self.typesetter = typesetter;
    }

    fn highlight(&self, fragment: &Fragment, degradations: &mut Vec<ServiceError>) -> (String, bool) {
        let language = match &fragment.kind {
            NodeKind::CodeBlock { language } => language.as_deref(),
            _ => None,
        };
        let code = fragment.text();
        match self.highlighter.apply(&CodeFragment {
            code: &code,
            language,
        }) {
            Ok(inner) => {
                let class = language
                    .map(|l| format!(" class=\"language-{}\"", l))
                    .unwrap_or_default();
                (format!("<pre><code{}>{}</code></pre>", class, inner), false)
            }
            Err(err) => {
                degradations.push(err);
                (fragment.to_html(), true)
            }
        }
    }

    /// Enrich the fragments of the active page only
    pub fn enrich(&self, page: &Page) -> EnrichedPage {
        let mut degradations = Vec::new();
        let mut prepared = Vec::new();
        let mut math_batch: Vec<MathFragment> = Vec::new();

        for (column, fragment) in page.fragments() {
            let content = if fragment.kind.is_code_block() {
                let (html, degraded) = self.highlight(fragment, &mut degradations);
                PreparedContent::Done { html, degraded }
            } else {
                let spans = scan_math(&fragment.to_html());
                let has_math = spans
                    .iter()
                    .any(|s| matches!(s, MathSpan::Math { .. }));
                if has_math {
                    for span in &spans {
                        if let MathSpan::Math { source, display } = span {
                            math_batch.push(MathFragment {
                                source: source.clone(),
                                display: *display,
                            });
                        }
                    }
                    PreparedContent::Spans(spans)
                } else {
                    PreparedContent::Done {
                        html: fragment.to_html(),
                        degraded: false,
                    }
                }
            };
            prepared.push(PreparedFragment {
                column,
                kind: fragment.kind.clone(),
                content,
            });
        }

        // One batched typesetter call for the whole page
        let rendered = if math_batch.is_empty() {
            Some(Vec::new())
        } else {
            match self.typesetter.typeset(&math_batch) {
                Ok(list) if list.len() == math_batch.len() => Some(list),
                Ok(_) => {
                    degradations.push(ServiceError::Failed {
                        name: "typesetter",
                        message: "result count mismatch".to_string(),
                    });
                    None
                }
                Err(err) => {
                    degradations.push(err);
                    None
                }
            }
        };

        let mut columns: Vec<Vec<EnrichedFragment>> =
            (0..page.column_count()).map(|_| Vec::new()).collect();
        let mut next_math = 0usize;

        for item in prepared {
            let (html, degraded) = match item.content {
                PreparedContent::Done { html, degraded } => (html, degraded),
                PreparedContent::Spans(spans) => {
                    let mut html = String::new();
                    let mut degraded = false;
                    for span in spans {
                        match span {
                            MathSpan::Text(t) => html.push_str(&t),
                            MathSpan::Math { source, display } => {
                                match &rendered {
                                    Some(list) => {
                                        html.push_str(&list[next_math]);
                                        next_math += 1;
                                    }
                                    None => {
                                        // Typesetter failed: keep delimiters
                                        html.push_str(&literal_math(&source, display));
                                        degraded = true;
                                        next_math += 1;
                                    }
                                }
                            }
                        }
                    }
                    (html, degraded)
                }
            };
            columns[item.column].push(EnrichedFragment {
                kind: item.kind,
                html,
                degraded,
            });
        }

        EnrichedPage {
            page_index: page.index,
            columns,
            degradations,
        }
    }
}
