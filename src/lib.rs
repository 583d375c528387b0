//! md-galley: a markdown-to-A4 preview and pagination core
//!
//! This crate provides the layout pipeline behind a print-oriented
//! markdown writer:
//! - Greedy column-major pagination with block atomicity (headings,
//!   code blocks, images, and tables never split)
//! - Single active preview page, clamped against the laid-out page count
//! - Enrichment (syntax highlighting, math typesetting) scoped to the
//!   active page only
//! - Token-stamped recomputation with last-write-wins publishing

pub mod config;
pub mod content;
pub mod enrich;
pub mod export;
pub mod layout;
pub mod preview;
pub mod reactive;
pub mod services;
pub mod templates;
pub mod transform;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmWriter;

// Re-export primary types
pub use config::{Orientation, PageConfig, Preset, A4_HEIGHT_MM, A4_WIDTH_MM, PX_PER_MM};
pub use content::{ContentNode, ContentSource, ContentTree, NodeKind, TemplateLoad};
pub use enrich::{EnrichedFragment, EnrichedPage, EnrichmentPipeline};
pub use export::export_html;
pub use layout::{Fragment, FragmentContent, LayoutEngine, LayoutResult, LayoutWarning, Page};
pub use preview::{ActiveSelection, PreviewSelector};
pub use reactive::{ControllerState, CycleToken, PendingCycle, Published, ReactiveController};
pub use services::{
    CodeFragment, CodeHighlighter, MarkdownParser, MathFragment, MathTypesetter, PrintTrigger,
    Sanitizer, ServiceError, ServiceLoader,
};
pub use transform::DocumentTransformer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline_end_to_end() {
        let mut controller = ReactiveController::default();
        let cycle = controller.set_text(templates::DEFAULT_DOCUMENT);
        assert!(controller.complete(cycle));

        let published = controller.published().unwrap();
        assert!(published.layout.total_pages >= 1);
        let active = published.active.as_ref().unwrap();
        assert!(active.to_html().contains("A4 Markdown Writer"));
    }

    #[test]
    fn test_transform_layout_roundtrip_is_stable() {
        let transformer = DocumentTransformer::default();
        let config = PageConfig::default();
        let text = templates::template_body("Lecture Notes").unwrap();

        let a = LayoutEngine::layout(&transformer.transform(text), &config);
        let b = LayoutEngine::layout(&transformer.transform(text), &config);
        assert_eq!(a, b);
    }
}
