//! Active-page selection

/// The single page currently selected for enriched preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSelection {
    /// 1-based page index, within `[1, min(total_pages, max_pages)]`
    pub page_index: u32,
}

/// Clamps the requested preview page against what layout produced and
/// what navigation permits
pub struct PreviewSelector;

impl PreviewSelector {
    /// Pure clamp. `None` when the document laid out to zero pages;
    /// otherwise the result is in `[1, min(total_pages, max_pages)]`.
    /// Idempotent: feeding the output back with the same bounds returns
    /// the same value.
    pub fn select(requested: u32, total_pages: u32, max_pages: u32) -> Option<u32> {
        if total_pages == 0 {
            return None;
        }
        let upper = total_pages.min(max_pages).max(1);
        Some(requested.max(1).min(upper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_no_selection() {
        assert_eq!(PreviewSelector::select(1, 0, 8), None);
        assert_eq!(PreviewSelector::select(5, 0, 1), None);
    }

    #[test]
    fn test_clamps_to_total_and_cap() {
        // Requested past the end of the document
        assert_eq!(PreviewSelector::select(9, 3, 8), Some(3));
        // Requested past the navigation cap
        assert_eq!(PreviewSelector::select(5, 3, 1), Some(1));
        // Zero requests saturate to the first page
        assert_eq!(PreviewSelector::select(0, 3, 8), Some(1));
        // In-range requests pass through
        assert_eq!(PreviewSelector::select(2, 3, 8), Some(2));
    }

    #[test]
    fn test_select_is_idempotent() {
        for requested in 0..30u32 {
            for total in 1..6u32 {
                for cap in 1..6u32 {
                    let once = PreviewSelector::select(requested, total, cap).unwrap();
                    let twice = PreviewSelector::select(once, total, cap).unwrap();
                    assert_eq!(once, twice);
                    assert!(once >= 1 && once <= total.min(cap));
                }
            }
        }
    }
}
