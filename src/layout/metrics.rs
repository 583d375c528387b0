//! Text metrics derived from the page configuration

use crate::config::PageConfig;
use crate::content::NodeKind;

/// Line height factor applied to the base font size
pub const LINE_HEIGHT_FACTOR: f32 = 1.45;

/// Vertical padding of a code block in px (top plus bottom)
pub const CODE_PADDING_PX: f32 = 20.0;

/// Estimated character metrics for a proportional body font.
///
/// No real font is consulted; estimates are derived from the configured
/// base size the same way a browser preview column would behave on
/// average. That keeps layout synchronous and deterministic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Base font size in px
    pub font_px: f32,
    /// Body line height in px
    pub line_px: f32,
    /// Average advance of a body character
    pub avg_char_px: f32,
    /// Average advance of a monospace character
    pub code_char_px: f32,
}

impl TextMetrics {
    /// Derive metrics from a (clamped) page configuration
    pub fn from_config(config: &PageConfig) -> Self {
        let font_px = config.font_px;
        Self {
            font_px,
            line_px: font_px * LINE_HEIGHT_FACTOR,
            avg_char_px: font_px * 0.5,
            code_char_px: font_px * 0.6,
        }
    }

    /// Estimated advance of one grapheme cluster in body text
    pub fn grapheme_width(&self, grapheme: &str) -> f32 {
        match grapheme.chars().next() {
            None => 0.0,
            Some('\t') => self.avg_char_px * 4.0,
            Some(c) if c.is_control() => 0.0,
            Some(c) if c.is_ascii() => self.avg_char_px,
            // Non-ASCII skews wide (fullwidth forms, CJK)
            Some(_) => self.avg_char_px * 1.6,
        }
    }

    /// Estimated advance of one grapheme cluster in code text
    pub fn code_grapheme_width(&self, grapheme: &str) -> f32 {
        match grapheme.chars().next() {
            None => 0.0,
            Some('\t') => self.code_char_px * 4.0,
            Some(c) if c.is_control() => 0.0,
            _ => self.code_char_px,
        }
    }

    /// Line height for a given block kind
    pub fn line_px_for(&self, kind: &NodeKind) -> f32 {
        self.line_px * kind.font_scale()
    }

    /// Indent applied to list content
    pub fn indent_px(&self) -> f32 {
        self.font_px * 2.0
    }
}
