//! Recompute orchestration with last-write-wins publishing
//!
//! Transform and layout are synchronous and run inside `begin_*`; the
//! enrichment step may be deferred by the host (external engines are
//! asynchronous there), so every cycle carries a monotonically increasing
//! token and only the latest issued cycle is allowed to publish.

use crate::config::{PageConfig, Preset};
use crate::content::{ContentSource, TemplateLoad};
use crate::enrich::{EnrichedPage, EnrichmentPipeline};
use crate::layout::{LayoutEngine, LayoutResult, Page};
use crate::preview::{ActiveSelection, PreviewSelector};
use crate::services::{CodeHighlighter, MathTypesetter};
use crate::transform::DocumentTransformer;

/// Monotonic stamp for one recompute cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CycleToken(pub u64);

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Recomputing,
}

/// The atomically published output of a completed cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub layout: LayoutResult,
    pub selection: Option<ActiveSelection>,
    pub active: Option<EnrichedPage>,
}

/// A cycle whose synchronous phase (transform, layout, selection) is
/// done and whose enrichment is still outstanding.
///
/// Completing a cycle after a newer one was issued discards it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCycle {
    pub token: CycleToken,
    pub layout: LayoutResult,
    pub selection: Option<ActiveSelection>,
    /// Snapshot of the page to enrich, if any
    pub active_page: Option<Page>,
}

/// Orchestrates recomputation: on any source change, transform → layout →
/// clamp selection → enrich the active page, then publish the results as
/// one immutable value.
pub struct ReactiveController {
    source: ContentSource,
    transformer: DocumentTransformer,
    enricher: EnrichmentPipeline,
    state: ControllerState,
    issued: u64,
    published: Option<Published>,
}

impl Default for ReactiveController {
    fn default() -> Self {
        Self::new(DocumentTransformer::default(), EnrichmentPipeline::default())
    }
}

impl ReactiveController {
    pub fn new(transformer: DocumentTransformer, enricher: EnrichmentPipeline) -> Self {
        Self {
            source: ContentSource::new(),
            transformer,
            enricher,
            state: ControllerState::Idle,
            issued: 0,
            published: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn source(&self) -> &ContentSource {
        &self.source
    }

    pub fn published(&self) -> Option<&Published> {
        self.published.as_ref()
    }

    /// Swap the highlighter service (takes effect on the next cycle)
    pub fn set_highlighter(&mut self, highlighter: Box<dyn CodeHighlighter>) {
        self.enricher.set_highlighter(highlighter);
    }

    /// Swap the typesetter service (takes effect on the next cycle)
    pub fn set_typesetter(&mut self, typesetter: Box<dyn MathTypesetter>) {
        self.enricher.set_typesetter(typesetter);
    }

    /// Run the synchronous phase of a fresh cycle
    fn begin(&mut self) -> PendingCycle {
        self.issued += 1;
        let token = CycleToken(self.issued);
        self.state = ControllerState::Recomputing;

        let config = self.source.config().clamped();
        let tree = self.transformer.transform(self.source.text());
        let layout = LayoutEngine::layout(&tree, &config);
        let selection =
            PreviewSelector::select(config.selected_page, layout.total_pages, config.max_pages)
                .map(|page_index| ActiveSelection { page_index });
        let active_page = selection.and_then(|s| layout.page(s.page_index).cloned());

        log::debug!(
            "cycle {} laid out {} page(s), active {:?}",
            token.0,
            layout.total_pages,
            selection.map(|s| s.page_index)
        );

        PendingCycle {
            token,
            layout,
            selection,
            active_page,
        }
    }

    /// Replace the document text and start a cycle
    pub fn set_text(&mut self, text: &str) -> PendingCycle {
        self.source.set_text(text);
        self.begin()
    }

    /// Replace the configuration and start a cycle
    pub fn set_config(&mut self, config: PageConfig) -> PendingCycle {
        self.source.set_config(config);
        self.begin()
    }

    /// Load a named template body and start a cycle
    pub fn load_template(&mut self, body: &str, mode: TemplateLoad) -> PendingCycle {
        self.source.load_template(body, mode);
        self.begin()
    }

    /// Apply a page-setup preset and start a cycle
    pub fn apply_preset(&mut self, preset: Preset) -> PendingCycle {
        let config = preset.apply(*self.source.config());
        self.set_config(config)
    }

    /// Change only the requested preview page.
    ///
    /// When a layout is already published this skips transform and
    /// layout entirely: the cycle reuses the published pages and only
    /// enrichment runs for the newly selected page.
    pub fn select_page(&mut self, requested: u32) -> PendingCycle {
        self.source.set_selected_page(requested);

        let published_layout = self.published.as_ref().map(|p| p.layout.clone());
        match published_layout {
            Some(layout) => {
                self.issued += 1;
                let token = CycleToken(self.issued);
                self.state = ControllerState::Recomputing;

                let config = self.source.config().clamped();
                let selection = PreviewSelector::select(
                    config.selected_page,
                    layout.total_pages,
                    config.max_pages,
                )
                .map(|page_index| ActiveSelection { page_index });
                let active_page = selection.and_then(|s| layout.page(s.page_index).cloned());

                PendingCycle {
                    token,
                    layout,
                    selection,
                    active_page,
                }
            }
            None => self.begin(),
        }
    }

    /// Enrich and publish a cycle. Returns false when the cycle is stale
    /// (a newer one was issued); stale results are discarded unchanged.
    pub fn complete(&mut self, cycle: PendingCycle) -> bool {
        if cycle.token.0 != self.issued {
            log::debug!("discarding stale cycle {}", cycle.token.0);
            return false;
        }

        let active = cycle.active_page.as_ref().map(|p| self.enricher.enrich(p));
        self.published = Some(Published {
            layout: cycle.layout,
            selection: cycle.selection,
            active,
        });
        self.state = ControllerState::Idle;
        true
    }

    /// Begin and complete a cycle inline (synchronous services)
    pub fn recompute_now(&mut self) -> bool {
        let cycle = self.begin();
        self.complete(cycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        AllowListSanitizer, CodeFragment, CommonMarkParser, MarkdownParser, ServiceError,
    };
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingParser {
        inner: CommonMarkParser,
        calls: Rc<Cell<usize>>,
    }

    impl MarkdownParser for CountingParser {
        fn parse(&self, text: &str) -> String {
            self.calls.set(self.calls.get() + 1);
            self.inner.parse(text)
        }
    }

    struct FailingHighlighter;

    impl CodeHighlighter for FailingHighlighter {
        fn apply(&self, _fragment: &CodeFragment) -> Result<String, ServiceError> {
            Err(ServiceError::Unavailable("hljs"))
        }
    }

    fn long_document() -> String {
        let mut doc = String::from("# Doc\n\n");
        doc.push_str(&"paragraph text goes on and on ".repeat(900));
        doc
    }

    #[test]
    fn test_recompute_publishes_everything() {
        let mut controller = ReactiveController::default();
        let cycle = controller.set_text("# Title\n\nShort paragraph.");
        assert_eq!(controller.state(), ControllerState::Recomputing);
        assert!(controller.complete(cycle));
        assert_eq!(controller.state(), ControllerState::Idle);

        let published = controller.published().expect("published output");
        assert_eq!(published.layout.total_pages, 1);
        assert_eq!(published.selection, Some(ActiveSelection { page_index: 1 }));
        let active = published.active.as_ref().expect("active page");
        assert_eq!(active.page_index, 1);
    }

    #[test]
    fn test_empty_document_has_no_active_page() {
        let mut controller = ReactiveController::default();
        assert!(controller.recompute_now());

        let published = controller.published().unwrap();
        assert_eq!(published.layout.total_pages, 0);
        assert_eq!(published.selection, None);
        assert!(published.active.is_none());
    }

    #[test]
    fn test_stale_cycle_is_discarded() {
        let mut controller = ReactiveController::default();
        let first = controller.set_text("# One");
        let second = controller.set_text("# Two");

        // The older in-flight cycle loses unconditionally
        assert!(!controller.complete(first));
        assert!(controller.published().is_none());
        assert_eq!(controller.state(), ControllerState::Recomputing);

        assert!(controller.complete(second));
        let active = controller.published().unwrap().active.as_ref().unwrap();
        assert!(active.to_html().contains("Two"));
    }

    #[test]
    fn test_select_page_skips_transform_and_layout() {
        let calls = Rc::new(Cell::new(0));
        let transformer = DocumentTransformer::new(
            Box::new(CountingParser {
                inner: CommonMarkParser::new(),
                calls: Rc::clone(&calls),
            }),
            Box::new(AllowListSanitizer::new()),
        );
        let mut controller =
            ReactiveController::new(transformer, EnrichmentPipeline::default());

        let cycle = controller.set_text(&long_document());
        assert!(controller.complete(cycle));
        assert_eq!(calls.get(), 1);
        let total = controller.published().unwrap().layout.total_pages;
        assert!(total > 1);

        let cycle = controller.select_page(2);
        assert_eq!(cycle.layout.total_pages, total);
        assert!(controller.complete(cycle));

        // Pure index change: the parser never ran again
        assert_eq!(calls.get(), 1);
        let published = controller.published().unwrap();
        assert_eq!(published.selection, Some(ActiveSelection { page_index: 2 }));
        assert_eq!(published.active.as_ref().unwrap().page_index, 2);
    }

    #[test]
    fn test_selection_clamps_against_cap() {
        let mut controller = ReactiveController::default();
        let mut config = PageConfig::default();
        config.max_pages = 1;
        config.selected_page = 5;
        controller.set_config(config);
        let cycle = controller.set_text(&long_document());
        assert!(cycle.layout.total_pages >= 3);
        assert!(controller.complete(cycle));

        let published = controller.published().unwrap();
        assert_eq!(published.selection, Some(ActiveSelection { page_index: 1 }));
    }

    #[test]
    fn test_failed_highlighter_still_publishes_layout() {
        let mut controller = ReactiveController::default();
        let baseline = controller.set_text("```rust\nfn main() {}\n```");
        let total = baseline.layout.total_pages;
        assert!(controller.complete(baseline));

        controller.set_highlighter(Box::new(FailingHighlighter));
        assert!(controller.recompute_now());

        let published = controller.published().unwrap();
        assert_eq!(published.layout.total_pages, total);
        let active = published.active.as_ref().unwrap();
        assert!(!active.degradations.is_empty());
        assert!(active.to_html().contains("fn main()"));
    }

    #[test]
    fn test_out_of_range_config_is_clamped_not_rejected() {
        let mut controller = ReactiveController::default();
        let mut config = PageConfig::default();
        config.column_count = 40;
        config.margin_mm = 500.0;
        controller.set_config(config);
        let cycle = controller.set_text("# T\n\nbody");
        assert!(controller.complete(cycle));

        let page = &controller.published().unwrap().layout.pages[0];
        assert_eq!(page.column_count(), 4);
        assert_eq!(page.config.margin_mm, 25.0);
    }

    #[test]
    fn test_template_and_preset_cycles() {
        let mut controller = ReactiveController::default();
        let cycle = controller.load_template("# From template\n", TemplateLoad::Replace);
        assert!(controller.complete(cycle));
        assert!(controller
            .published()
            .unwrap()
            .active
            .as_ref()
            .unwrap()
            .to_html()
            .contains("From template"));

        let cycle = controller.apply_preset(Preset::FourUp);
        assert!(controller.complete(cycle));
        let page = &controller.published().unwrap().layout.pages[0];
        assert_eq!(page.column_count(), 4);
    }
}
