//! Standalone printable HTML export
//!
//! Renders every laid-out page into a self-contained document styled for
//! A4 printing. Fragments are emitted sanitized but unenriched; a host
//! that wants highlighted or typeset output includes its own engine
//! scripts in the exported document.

use crate::config::{Orientation, PageConfig};
use crate::layout::LayoutResult;
use crate::services::escape_html;

fn orientation_name(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::Portrait => "portrait",
        Orientation::Landscape => "landscape",
    }
}

fn page_css(config: &PageConfig) -> String {
    let (page_w, page_h) = config.page_size_mm();
    let rule_css = if config.show_guides {
        "border-left: 1px solid #ddd; padding-left: calc(var(--gap-mm) / 2);"
    } else {
        "border-left: none;"
    };

    format!(
        r#"    :root {{
      --page-w-mm: {page_w}mm;
      --page-h-mm: {page_h}mm;
      --margin-mm: {margin}mm;
      --gap-mm: {gap}mm;
      --font-px: {font}px;
      --cols: {cols};
    }}
    @page {{ size: A4 {orientation}; margin: var(--margin-mm); }}
    html, body {{ height: 100%; }}
    body {{ background: #f4f5f7; margin: 0; }}
    .page-shell {{ width: var(--page-w-mm); height: var(--page-h-mm); margin: 24px auto; background: #fff; box-shadow: 0 10px 25px rgba(0,0,0,.08); overflow: hidden; }}
    .page-content {{ box-sizing: border-box; height: 100%; padding: var(--margin-mm); font-size: var(--font-px); line-height: 1.45; display: grid; grid-template-columns: repeat(var(--cols), 1fr); column-gap: var(--gap-mm); font-family: system-ui, -apple-system, Segoe UI, Roboto, Helvetica, Arial; }}
    .column {{ min-width: 0; overflow: hidden; }}
    .column + .column {{ {rule} }}
    .page-content h1, .page-content h2, .page-content h3 {{ break-inside: avoid; }}
    .page-content pre, .page-content code, .page-content img, .page-content table {{ break-inside: avoid; max-width: 100%; }}
    .page-content pre {{ background: #f6f8fa; padding: 10px; border-radius: 6px; overflow: auto; }}
    .page-content code {{ font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; }}
    @media print {{ body {{ -webkit-print-color-adjust: exact; print-color-adjust: exact; background: #fff; }} .page-shell {{ box-shadow: none; margin: 0 auto; page-break-after: always; }} }}
"#,
        page_w = page_w,
        page_h = page_h,
        margin = config.margin_mm,
        gap = config.gap_mm,
        font = config.font_px,
        cols = config.column_count,
        orientation = orientation_name(config.orientation),
        rule = rule_css,
    )
}

/// Render the full laid-out document as a standalone printable page
pub fn export_html(layout: &LayoutResult, config: &PageConfig, title: &str) -> String {
    let config = config.clamped();
    let mut out = String::with_capacity(4096);

    out.push_str("<!doctype html>\n<html>\n<head>\n");
    out.push_str("  <meta charset=\"utf-8\" />\n");
    out.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
    out.push_str(&format!("  <title>{}</title>\n", escape_html(title)));
    out.push_str("  <style>\n");
    out.push_str(&page_css(&config));
    out.push_str("  </style>\n</head>\n<body>\n");

    for page in &layout.pages {
        out.push_str("  <div class=\"page-shell\"><div class=\"page-content\">");
        for column in &page.columns {
            out.push_str("<div class=\"column\">");
            for fragment in column {
                out.push_str(&fragment.to_html());
            }
            out.push_str("</div>");
        }
        out.push_str("</div></div>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Orientation;
    use crate::layout::LayoutEngine;
    use crate::transform::DocumentTransformer;

    fn layout_of(markdown: &str, config: &PageConfig) -> LayoutResult {
        let tree = DocumentTransformer::default().transform(markdown);
        LayoutEngine::layout(&tree, config)
    }

    #[test]
    fn test_export_contains_every_page() {
        let config = PageConfig::default();
        let doc = "words in the body ".repeat(1500);
        let layout = layout_of(&doc, &config);
        assert!(layout.total_pages > 1);

        let html = export_html(&layout, &config, "Test Doc");
        assert_eq!(
            html.matches("page-shell").count() as u32,
            // One occurrence in CSS plus one per page
            layout.total_pages + 2
        );
        assert!(html.contains("<title>Test Doc</title>"));
    }

    #[test]
    fn test_export_reflects_config() {
        let config = PageConfig {
            orientation: Orientation::Landscape,
            column_count: 3,
            gap_mm: 6.0,
            ..PageConfig::default()
        };
        let layout = layout_of("# T\n\nbody", &config);
        let html = export_html(&layout, &config, "x");

        assert!(html.contains("size: A4 landscape"));
        assert!(html.contains("--cols: 3;"));
        assert!(html.contains("--gap-mm: 6mm;"));
    }

    #[test]
    fn test_export_guides_toggle() {
        let mut config = PageConfig::default();
        config.show_guides = true;
        let layout = layout_of("body", &config);
        assert!(export_html(&layout, &config, "x").contains("1px solid #ddd"));

        config.show_guides = false;
        assert!(export_html(&layout, &config, "x").contains("border-left: none;"));
    }

    #[test]
    fn test_export_escapes_title() {
        let config = PageConfig::default();
        let layout = layout_of("body", &config);
        let html = export_html(&layout, &config, "<script>");
        assert!(html.contains("<title>&lt;script&gt;</title>"));
    }
}
