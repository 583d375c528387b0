//! Page configuration: orientation, columns, margins, and preview caps

use serde::{Deserialize, Serialize};

/// A4 sheet width in millimetres (portrait)
pub const A4_WIDTH_MM: f32 = 210.0;

/// A4 sheet height in millimetres (portrait)
pub const A4_HEIGHT_MM: f32 = 297.0;

/// CSS reference pixels per millimetre (96 dpi)
pub const PX_PER_MM: f32 = 96.0 / 25.4;

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Portrait
    }
}

/// Page setup consumed by the layout engine and preview selector.
///
/// All numeric fields have recognized ranges; values outside them are
/// clamped by [`PageConfig::clamped`], never rejected. `selected_page` is
/// the requested preview index before clamping against the laid-out page
/// count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageConfig {
    pub orientation: Orientation,
    /// Column count, 1..=4
    pub column_count: u8,
    /// Page margin in mm, 5..=25
    pub margin_mm: f32,
    /// Column gap in mm, 2..=20
    pub gap_mm: f32,
    /// Base font size in px, 9..=16
    pub font_px: f32,
    /// Navigable page cap, 1..=24; never a layout constraint
    pub max_pages: u32,
    /// Requested preview page, 1..=24, pre-clamp
    pub selected_page: u32,
    /// Draw column rule guides; render-adapter hint with no layout effect
    pub show_guides: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            column_count: 2,
            margin_mm: 12.0,
            gap_mm: 8.0,
            font_px: 11.0,
            max_pages: 8,
            selected_page: 1,
            show_guides: true,
        }
    }
}

impl PageConfig {
    /// Return a copy with every field saturated into its recognized range
    pub fn clamped(&self) -> Self {
        Self {
            orientation: self.orientation,
            column_count: self.column_count.max(1).min(4),
            margin_mm: self.margin_mm.max(5.0).min(25.0),
            gap_mm: self.gap_mm.max(2.0).min(20.0),
            font_px: self.font_px.max(9.0).min(16.0),
            max_pages: self.max_pages.max(1).min(24),
            selected_page: self.selected_page.max(1).min(24),
            show_guides: self.show_guides,
        }
    }

    /// Physical page size in mm, swapped by orientation
    pub fn page_size_mm(&self) -> (f32, f32) {
        match self.orientation {
            Orientation::Portrait => (A4_WIDTH_MM, A4_HEIGHT_MM),
            Orientation::Landscape => (A4_HEIGHT_MM, A4_WIDTH_MM),
        }
    }

    /// Usable content width in px (page width minus both margins)
    pub fn content_width_px(&self) -> f32 {
        let (w, _) = self.page_size_mm();
        (w - 2.0 * self.margin_mm) * PX_PER_MM
    }

    /// Usable content height in px (page height minus both margins)
    pub fn content_height_px(&self) -> f32 {
        let (_, h) = self.page_size_mm();
        (h - 2.0 * self.margin_mm) * PX_PER_MM
    }

    /// Width of a single column in px
    pub fn column_width_px(&self) -> f32 {
        let cols = self.column_count.max(1) as f32;
        let gaps = (cols - 1.0) * self.gap_mm * PX_PER_MM;
        (self.content_width_px() - gaps) / cols
    }
}

/// Quick page-setup presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    TwoUp,
    ThreeUp,
    FourUp,
}

impl Preset {
    /// Look up a preset by its display name
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "2-up" => Some(Preset::TwoUp),
            "3-up" => Some(Preset::ThreeUp),
            "4-up" => Some(Preset::FourUp),
            _ => None,
        }
    }

    /// Apply the preset on top of an existing config, keeping orientation
    /// and navigation fields
    pub fn apply(&self, base: PageConfig) -> PageConfig {
        let (column_count, margin_mm, gap_mm, font_px) = match self {
            Preset::TwoUp => (2, 12.0, 10.0, 11.0),
            Preset::ThreeUp => (3, 12.0, 8.0, 10.0),
            Preset::FourUp => (4, 10.0, 6.0, 10.0),
        };
        PageConfig {
            column_count,
            margin_mm,
            gap_mm,
            font_px,
            show_guides: true,
            ..base
        }
    }
}
