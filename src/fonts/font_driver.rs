//! Display-server font primitives.
//!
//! This module defines the `FontDriver` trait, a thin wrapper around the
//! font calls of a display server: listing core font names, opening core
//! fonts and font sets, and matching outline fonts. Matching, caching and
//! the font catalog are built on top of it and never talk to the server
//! directly.

use super::outline::{OutlineFace, OutlineQuery};
use anyhow::Result;
use serde::Serialize;

/// Metrics shared by every kind of loaded font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FontMetrics {
    pub ascent: i32,
    pub descent: i32,
    pub min_left_bearing: i32,
    pub min_right_bearing: i32,
    pub max_width: i32,
    /// Number of glyph slots the font spans, as used for cost estimates.
    pub glyph_span: u32,
}

impl FontMetrics {
    /// Glyph span of a core font from its byte ranges.
    ///
    /// For single-byte fonts `min_byte1 == max_byte1 == 0` and the span is
    /// `max_char - min_char`.
    pub fn glyph_span(min_byte1: u32, max_byte1: u32, min_char: u32, max_char: u32) -> u32 {
        let row = max_char.saturating_sub(min_char);
        max_byte1
            .saturating_sub(min_byte1)
            .saturating_mul(row + 1)
            .saturating_add(row)
    }

    /// Rough number of bytes the server spends on the font's glyphs.
    pub fn approximate_cost(&self) -> usize {
        let height = (self.ascent + self.descent).max(0) as usize;
        let width = self.max_width.max(0) as usize;
        height
            .saturating_mul(width)
            .saturating_mul(self.glyph_span as usize)
            / 8
    }
}

/// A loaded font of any kind.
pub trait FontFace {
    fn metrics(&self) -> FontMetrics;

    fn approximate_cost(&self) -> usize {
        self.metrics().approximate_cost()
    }
}

/// Result of an outline match: the opened font, its family and the
/// canonical description of the pattern that was matched.
#[derive(Debug)]
pub struct OutlineMatch<F> {
    pub font: F,
    pub family: String,
    pub pattern: String,
}

/// Display-server font driver.
///
/// Implementors own whatever connection they need and release every font
/// they hand out when the returned value is dropped.
pub trait FontDriver {
    /// Core (XLFD) font.
    type Bitmap: FontFace;
    /// Font set covering a multi-byte locale.
    type FontSet: FontFace;
    /// Outline font opened through the outline matcher.
    type Outline: FontFace;

    /// List font names matching an XLFD pattern (`*` and `?` wildcards).
    ///
    /// # Arguments
    /// * `pattern` - XLFD pattern or font alias
    /// * `max_names` - Maximum number of names returned
    fn list_fonts(&self, pattern: &str, max_names: usize) -> Result<Vec<String>>;

    /// Open a core font by (possibly wildcarded) name.
    fn load_bitmap_font(&self, name: &str) -> Result<Self::Bitmap>;

    /// Open a font set from a comma-separated list of patterns.
    fn load_font_set(&self, patterns: &str) -> Result<Self::FontSet>;

    /// Ask the outline matcher for the best font for `query`.
    fn match_outline(&self, query: &OutlineQuery) -> Result<OutlineMatch<Self::Outline>>;

    /// Every outline face the server offers.
    fn list_outline_faces(&self) -> Result<Vec<OutlineFace>>;
}

/// Which backend call produced a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FontKind {
    Bitmap,
    FontSet,
    Outline,
}

/// A font handle owned by the cache.
pub enum FontHandle<D: FontDriver> {
    Bitmap(D::Bitmap),
    FontSet(D::FontSet),
    Outline(D::Outline),
}

impl<D: FontDriver> FontHandle<D> {
    pub fn kind(&self) -> FontKind {
        match self {
            FontHandle::Bitmap(_) => FontKind::Bitmap,
            FontHandle::FontSet(_) => FontKind::FontSet,
            FontHandle::Outline(_) => FontKind::Outline,
        }
    }

    pub fn metrics(&self) -> FontMetrics {
        match self {
            FontHandle::Bitmap(f) => f.metrics(),
            FontHandle::FontSet(f) => f.metrics(),
            FontHandle::Outline(f) => f.metrics(),
        }
    }

    pub fn approximate_cost(&self) -> usize {
        match self {
            FontHandle::Bitmap(f) => f.approximate_cost(),
            FontHandle::FontSet(f) => f.approximate_cost(),
            FontHandle::Outline(f) => f.approximate_cost(),
        }
    }

    pub fn as_bitmap(&self) -> Option<&D::Bitmap> {
        match self {
            FontHandle::Bitmap(f) => Some(f),
            _ => None,
        }
    }
}

impl<D: FontDriver> std::fmt::Debug for FontHandle<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FontHandle").field(&self.kind()).finish()
    }
}
