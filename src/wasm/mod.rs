//! WASM bindings for the preview pipeline
//!
//! The browser host injects its engines (highlight.js, MathJax, the
//! window print facility) as plain JS functions; they are adapted onto
//! the service traits here. All calls into the pipeline are synchronous;
//! the host defers `complete`-style work by ordering its own calls.

use crate::config::{PageConfig, Preset};
use crate::content::TemplateLoad;
use crate::export::export_html;
use crate::reactive::ReactiveController;
use crate::services::{
    CodeFragment, CodeHighlighter, LoadTicket, MathFragment, MathTypesetter, PrintTrigger,
    ServiceError, ServiceLoader,
};
use crate::templates;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Highlighter backed by a JS function `(code, language) -> html`
struct JsHighlighter {
    func: js_sys::Function,
}

impl CodeHighlighter for JsHighlighter {
    fn apply(&self, fragment: &CodeFragment) -> Result<String, ServiceError> {
        let code = JsValue::from_str(fragment.code);
        let language = fragment
            .language
            .map(JsValue::from_str)
            .unwrap_or(JsValue::NULL);
        let out = self
            .func
            .call2(&JsValue::NULL, &code, &language)
            .map_err(|e| ServiceError::Failed {
                name: "highlighter",
                message: format!("{:?}", e),
            })?;
        out.as_string().ok_or(ServiceError::Failed {
            name: "highlighter",
            message: "non-string result".to_string(),
        })
    }
}

/// Typesetter backed by a JS function `([{source, display}]) -> [html]`
struct JsTypesetter {
    func: js_sys::Function,
}

impl MathTypesetter for JsTypesetter {
    fn typeset(&self, fragments: &[MathFragment]) -> Result<Vec<String>, ServiceError> {
        let batch = js_sys::Array::new();
        for fragment in fragments {
            let entry = js_sys::Object::new();
            let _ = js_sys::Reflect::set(
                &entry,
                &JsValue::from_str("source"),
                &JsValue::from_str(&fragment.source),
            );
            let _ = js_sys::Reflect::set(
                &entry,
                &JsValue::from_str("display"),
                &JsValue::from_bool(fragment.display),
            );
            batch.push(&entry);
        }

        let out = self
            .func
            .call1(&JsValue::NULL, &batch)
            .map_err(|e| ServiceError::Failed {
                name: "typesetter",
                message: format!("{:?}", e),
            })?;
        let out: js_sys::Array = out.dyn_into().map_err(|_| ServiceError::Failed {
            name: "typesetter",
            message: "non-array result".to_string(),
        })?;

        let mut rendered = Vec::with_capacity(out.length() as usize);
        for value in out.iter() {
            rendered.push(value.as_string().ok_or(ServiceError::Failed {
                name: "typesetter",
                message: "non-string entry".to_string(),
            })?);
        }
        Ok(rendered)
    }
}

/// Print trigger backed by a no-argument JS function
struct JsPrintTrigger {
    func: js_sys::Function,
}

impl PrintTrigger for JsPrintTrigger {
    fn invoke(&self) {
        let _ = self.func.call0(&JsValue::NULL);
    }
}

/// Per-cycle state summary handed to the host as JSON
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LayoutSummary {
    total_pages: u32,
    active_page: u32,
    max_pages: u32,
    warnings: Vec<String>,
    degraded: bool,
}

/// WASM-exposed pipeline wrapper
#[wasm_bindgen]
pub struct WasmWriter {
    controller: ReactiveController,
    loader: ServiceLoader,
    print_trigger: Option<Box<dyn PrintTrigger>>,
}

#[wasm_bindgen]
impl WasmWriter {
    /// Create a writer seeded with the default document
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let mut controller = ReactiveController::default();
        let cycle = controller.set_text(templates::DEFAULT_DOCUMENT);
        controller.complete(cycle);
        Self {
            controller,
            loader: ServiceLoader::new(),
            print_trigger: None,
        }
    }

    /// Get full document text
    #[wasm_bindgen(js_name = getText)]
    pub fn get_text(&self) -> String {
        self.controller.source().text().to_string()
    }

    /// Replace the document text and recompute
    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&mut self, text: &str) {
        let cycle = self.controller.set_text(text);
        self.controller.complete(cycle);
    }

    /// Replace the configuration from JSON and recompute.
    /// Missing fields fall back to defaults; out-of-range values clamp.
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, json: &str) -> Result<(), JsValue> {
        let config: PageConfig =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let cycle = self.controller.set_config(config);
        self.controller.complete(cycle);
        Ok(())
    }

    /// Select the preview page; only enrichment re-runs
    #[wasm_bindgen(js_name = selectPage)]
    pub fn select_page(&mut self, index: u32) {
        let cycle = self.controller.select_page(index);
        self.controller.complete(cycle);
    }

    /// Number of pages the content actually requires
    #[wasm_bindgen(js_name = totalPages)]
    pub fn total_pages(&self) -> u32 {
        self.controller
            .published()
            .map(|p| p.layout.total_pages)
            .unwrap_or(0)
    }

    /// Active page index, 0 when the document is empty
    #[wasm_bindgen(js_name = activePage)]
    pub fn active_page(&self) -> u32 {
        self.controller
            .published()
            .and_then(|p| p.selection)
            .map(|s| s.page_index)
            .unwrap_or(0)
    }

    /// Enriched HTML of the active page's columns
    #[wasm_bindgen(js_name = activePageHtml)]
    pub fn active_page_html(&self) -> String {
        self.controller
            .published()
            .and_then(|p| p.active.as_ref())
            .map(|page| page.to_html())
            .unwrap_or_default()
    }

    /// JSON summary of the published state
    #[wasm_bindgen(js_name = layoutSummary)]
    pub fn layout_summary(&self) -> String {
        let summary = match self.controller.published() {
            Some(published) => LayoutSummary {
                total_pages: published.layout.total_pages,
                active_page: published.selection.map(|s| s.page_index).unwrap_or(0),
                max_pages: self.controller.source().config().clamped().max_pages,
                warnings: published
                    .layout
                    .warnings
                    .iter()
                    .map(|w| w.to_string())
                    .collect(),
                degraded: published
                    .active
                    .as_ref()
                    .map(|a| !a.degradations.is_empty())
                    .unwrap_or(false),
            },
            None => LayoutSummary {
                total_pages: 0,
                active_page: 0,
                max_pages: self.controller.source().config().clamped().max_pages,
                warnings: Vec::new(),
                degraded: false,
            },
        };
        serde_json::to_string(&summary).unwrap_or_else(|_| "{}".to_string())
    }

    /// Standalone printable HTML of the whole document
    #[wasm_bindgen(js_name = exportHtml)]
    pub fn export_html(&self) -> String {
        match self.controller.published() {
            Some(published) => export_html(
                &published.layout,
                self.controller.source().config(),
                "A4 Markdown Writer",
            ),
            None => String::new(),
        }
    }

    /// Apply a named preset ("2-up", "3-up", "4-up")
    #[wasm_bindgen(js_name = applyPreset)]
    pub fn apply_preset(&mut self, name: &str) -> bool {
        match Preset::by_name(name) {
            Some(preset) => {
                let cycle = self.controller.apply_preset(preset);
                self.controller.complete(cycle);
                true
            }
            None => false,
        }
    }

    /// Load a named template, replacing or appending
    #[wasm_bindgen(js_name = loadTemplate)]
    pub fn load_template(&mut self, name: &str, append: bool) -> bool {
        match templates::template_body(name) {
            Some(body) => {
                let mode = if append {
                    TemplateLoad::Append
                } else {
                    TemplateLoad::Replace
                };
                let cycle = self.controller.load_template(body, mode);
                self.controller.complete(cycle);
                true
            }
            None => false,
        }
    }

    /// Names of the built-in templates as a JSON array
    #[wasm_bindgen(js_name = templateNames)]
    pub fn template_names(&self) -> String {
        serde_json::to_string(templates::TEMPLATE_NAMES).unwrap_or_else(|_| "[]".to_string())
    }

    /// Ask for an engine resource; returns "started", "attached", or
    /// "ready". "started" means the host must load it and then call
    /// `engineReady`.
    #[wasm_bindgen(js_name = loadEngine)]
    pub fn load_engine(&mut self, name: &str) -> String {
        let waiter = self.controller.source().revision();
        match self.loader.request(name, waiter) {
            LoadTicket::Started => "started",
            LoadTicket::Attached => "attached",
            LoadTicket::Ready => "ready",
        }
        .to_string()
    }

    /// Report an engine load result
    #[wasm_bindgen(js_name = engineReady)]
    pub fn engine_ready(&mut self, name: &str, ok: bool) {
        let _ = self.loader.complete(name, ok);
    }

    /// Install a JS highlighter `(code, language) -> html` and recompute
    #[wasm_bindgen(js_name = setHighlighter)]
    pub fn set_highlighter(&mut self, func: js_sys::Function) {
        self.controller.set_highlighter(Box::new(JsHighlighter { func }));
        self.controller.recompute_now();
    }

    /// Install a JS typesetter `([{source, display}]) -> [html]` and
    /// recompute
    #[wasm_bindgen(js_name = setTypesetter)]
    pub fn set_typesetter(&mut self, func: js_sys::Function) {
        self.controller.set_typesetter(Box::new(JsTypesetter { func }));
        self.controller.recompute_now();
    }

    /// Install the host print function
    #[wasm_bindgen(js_name = setPrintTrigger)]
    pub fn set_print_trigger(&mut self, func: js_sys::Function) {
        self.print_trigger = Some(Box::new(JsPrintTrigger { func }));
    }

    /// Invoke the host print/export facility, if installed
    pub fn print(&self) {
        if let Some(trigger) = &self.print_trigger {
            trigger.invoke();
        }
    }
}

impl Default for WasmWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_starts_with_default_document() {
        let writer = WasmWriter::new();
        assert!(writer.get_text().contains("A4 Markdown Writer"));
        assert!(writer.total_pages() >= 1);
        assert_eq!(writer.active_page(), 1);
        assert!(!writer.active_page_html().is_empty());
    }

    #[test]
    fn test_set_config_json_recomputes() {
        let mut writer = WasmWriter::new();
        writer
            .set_config(r#"{"columnCount": 4, "selectedPage": 1}"#)
            .unwrap();
        let summary = writer.layout_summary();
        assert!(summary.contains("\"totalPages\""));
        assert!(writer.export_html().contains("--cols: 4;"));

        assert!(writer.set_config("not json").is_err());
    }

    #[test]
    fn test_select_page_clamps() {
        let mut writer = WasmWriter::new();
        writer.select_page(99);
        let total = writer.total_pages();
        assert_eq!(writer.active_page(), total.min(8));
    }

    #[test]
    fn test_template_and_preset_names() {
        let mut writer = WasmWriter::new();
        assert!(writer.load_template("Code Snippets", false));
        assert!(writer.get_text().contains("Handy Snippets"));
        assert!(!writer.load_template("Unknown", false));

        assert!(writer.apply_preset("3-up"));
        assert!(!writer.apply_preset("9-up"));
        assert!(writer.template_names().contains("Formula Sheet"));
    }

    #[test]
    fn test_engine_loading_is_idempotent() {
        let mut writer = WasmWriter::new();
        assert_eq!(writer.load_engine("hljs"), "started");
        assert_eq!(writer.load_engine("hljs"), "attached");
        writer.engine_ready("hljs", true);
        assert_eq!(writer.load_engine("hljs"), "ready");
    }
}
