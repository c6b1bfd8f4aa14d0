//! Outline (Xft/fontconfig) font descriptions.
//!
//! Outline fonts are described by numeric weight, slant and spacing values
//! on the fontconfig scale rather than by XLFD strings. These helpers
//! translate between that scale and the 0..=99 weights of a `FontRequest`.

use super::request::{
    FontRequest, StyleHint, WEIGHT_BLACK, WEIGHT_BOLD, WEIGHT_DEMI_BOLD, WEIGHT_LIGHT, WEIGHT_NORMAL,
};
use serde::Serialize;

pub const OUTLINE_WEIGHT_LIGHT: i32 = 0;
pub const OUTLINE_WEIGHT_MEDIUM: i32 = 100;
pub const OUTLINE_WEIGHT_DEMIBOLD: i32 = 180;
pub const OUTLINE_WEIGHT_BOLD: i32 = 200;
pub const OUTLINE_WEIGHT_BLACK: i32 = 210;

pub const OUTLINE_SLANT_ROMAN: i32 = 0;
pub const OUTLINE_SLANT_ITALIC: i32 = 100;
pub const OUTLINE_SLANT_OBLIQUE: i32 = 110;

pub const OUTLINE_PROPORTIONAL: i32 = 0;
pub const OUTLINE_MONO: i32 = 100;
pub const OUTLINE_CHARCELL: i32 = 110;

/// Largest pixel size requested from the matcher; bigger sizes are scaled.
pub const MAX_OUTLINE_PIXEL_SIZE: f64 = 128.0;

/// Request weight → outline weight.
pub fn outline_weight(weight: u32) -> i32 {
    if weight == 0 {
        OUTLINE_WEIGHT_MEDIUM
    } else if weight < (WEIGHT_LIGHT + WEIGHT_NORMAL) / 2 {
        OUTLINE_WEIGHT_LIGHT
    } else if weight < (WEIGHT_NORMAL + WEIGHT_DEMI_BOLD) / 2 {
        OUTLINE_WEIGHT_MEDIUM
    } else if weight < (WEIGHT_DEMI_BOLD + WEIGHT_BOLD) / 2 {
        OUTLINE_WEIGHT_DEMIBOLD
    } else if weight < (WEIGHT_BOLD + WEIGHT_BLACK) / 2 {
        OUTLINE_WEIGHT_BOLD
    } else {
        OUTLINE_WEIGHT_BLACK
    }
}

/// Outline weight → request weight.
pub fn weight_from_outline(value: i32) -> u32 {
    if value <= (OUTLINE_WEIGHT_LIGHT + OUTLINE_WEIGHT_MEDIUM) / 2 {
        WEIGHT_LIGHT
    } else if value <= (OUTLINE_WEIGHT_MEDIUM + OUTLINE_WEIGHT_DEMIBOLD) / 2 {
        WEIGHT_NORMAL
    } else if value <= (OUTLINE_WEIGHT_DEMIBOLD + OUTLINE_WEIGHT_BOLD) / 2 {
        WEIGHT_DEMI_BOLD
    } else if value <= (OUTLINE_WEIGHT_BOLD + OUTLINE_WEIGHT_BLACK) / 2 {
        WEIGHT_BOLD
    } else {
        WEIGHT_BLACK
    }
}

/// XLFD-style pitch letter for an outline spacing value.
pub fn pitch_for_spacing(spacing: i32) -> char {
    if spacing >= OUTLINE_CHARCELL {
        'c'
    } else if spacing >= OUTLINE_MONO {
        'm'
    } else {
        'p'
    }
}

/// One face reported by the outline font lister.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineFace {
    pub family: String,
    pub weight: i32,
    pub slant: i32,
    pub spacing: i32,
}

impl OutlineFace {
    pub fn new(family: impl Into<String>, weight: i32, slant: i32, spacing: i32) -> Self {
        OutlineFace {
            family: family.into(),
            weight,
            slant,
            spacing,
        }
    }
}

/// Query handed to the outline matcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineQuery {
    pub family: String,
    /// Generic family appended after `family`: `sans`, `serif` or `mono`.
    pub generic_family: &'static str,
    pub weight: i32,
    pub slant: i32,
    pub spacing: i32,
    /// Size in points, after capping the pixel size.
    pub size_points: f64,
    /// Extra scale to apply when the pixel size was capped.
    pub scale: f64,
    pub antialias: Option<bool>,
}

impl OutlineQuery {
    /// Builds the query for `request`, asking for `family` (the request's own
    /// family or a default chosen by the caller).
    pub fn for_request(request: &FontRequest, family: &str, dpi: u32, antialias: Option<bool>) -> Self {
        let generic_family = match request.style_hint {
            StyleHint::Serif => "serif",
            StyleHint::TypeWriter => "mono",
            _ => "sans",
        };
        let dpi = f64::from(dpi.max(1));
        let mut size_points = f64::from(request.deci_point_size) / 10.0;
        let pixels = size_points * dpi / 72.0;
        let mut scale = 1.0;
        if pixels > MAX_OUTLINE_PIXEL_SIZE {
            scale = pixels / MAX_OUTLINE_PIXEL_SIZE;
            size_points = MAX_OUTLINE_PIXEL_SIZE * 72.0 / dpi;
        }
        OutlineQuery {
            family: family.to_string(),
            generic_family,
            weight: outline_weight(request.weight),
            slant: if request.italic {
                OUTLINE_SLANT_ITALIC
            } else {
                OUTLINE_SLANT_ROMAN
            },
            spacing: if request.fixed_pitch {
                OUTLINE_MONO
            } else {
                OUTLINE_PROPORTIONAL
            },
            size_points,
            scale,
            antialias,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_mapping() {
        assert_eq!(outline_weight(0), OUTLINE_WEIGHT_MEDIUM);
        assert_eq!(outline_weight(WEIGHT_LIGHT), OUTLINE_WEIGHT_LIGHT);
        assert_eq!(outline_weight(WEIGHT_NORMAL), OUTLINE_WEIGHT_MEDIUM);
        assert_eq!(outline_weight(WEIGHT_DEMI_BOLD), OUTLINE_WEIGHT_DEMIBOLD);
        assert_eq!(outline_weight(WEIGHT_BOLD), OUTLINE_WEIGHT_BOLD);
        assert_eq!(outline_weight(WEIGHT_BLACK), OUTLINE_WEIGHT_BLACK);

        for weight in [WEIGHT_LIGHT, WEIGHT_NORMAL, WEIGHT_DEMI_BOLD, WEIGHT_BOLD, WEIGHT_BLACK] {
            assert_eq!(weight_from_outline(outline_weight(weight)), weight);
        }
        assert_eq!(weight_from_outline(80), WEIGHT_NORMAL);
    }

    #[test]
    fn test_pitch_letters() {
        assert_eq!(pitch_for_spacing(OUTLINE_PROPORTIONAL), 'p');
        assert_eq!(pitch_for_spacing(OUTLINE_MONO), 'm');
        assert_eq!(pitch_for_spacing(OUTLINE_CHARCELL), 'c');
    }

    #[test]
    fn test_query_for_request() {
        let request = FontRequest::new("", 12)
            .with_style_hint(StyleHint::TypeWriter)
            .with_fixed_pitch(true)
            .with_italic(true);
        let query = OutlineQuery::for_request(&request, "courier", 75, Some(false));
        assert_eq!(query.family, "courier");
        assert_eq!(query.generic_family, "mono");
        assert_eq!(query.spacing, OUTLINE_MONO);
        assert_eq!(query.slant, OUTLINE_SLANT_ITALIC);
        assert!((query.size_points - 12.0).abs() < 1e-9);
        assert_eq!(query.scale, 1.0);
        assert_eq!(query.antialias, Some(false));
    }

    #[test]
    fn test_large_sizes_are_capped() {
        // 144pt at 72 dpi is 144 pixels.
        let query = OutlineQuery::for_request(&FontRequest::new("times", 144), "times", 72, None);
        assert!((query.size_points - 128.0).abs() < 1e-9);
        assert!((query.scale - 144.0 / 128.0).abs() < 1e-9);
    }
}
