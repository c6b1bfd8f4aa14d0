//! Describes the font that was actually loaded, as opposed to the one that
//! was asked for.

use super::matcher::parse_weight;
use super::request::{CharSet, FontRequest, StyleHint, WEIGHT_NORMAL};
use super::xlfd::{atoi, XlfdName};
use serde::Serialize;

const BASE_RESOLUTION: u32 = 75;

/// Attributes of a loaded font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontInfo {
    pub family: String,
    pub deci_point_size: u32,
    pub weight: u32,
    pub italic: bool,
    pub charset: CharSet,
    pub fixed_pitch: bool,
    pub style_hint: StyleHint,
    /// The family is a literal font name rather than a family.
    pub raw_mode: bool,
    pub exact_match: bool,
}

impl FontInfo {
    /// Reconstructs what `resolved_name` provides for `request`.
    ///
    /// An exact match is the request itself. A name that is not an XLFD can
    /// only be described by the name; everything else is read from the XLFD
    /// fields.
    pub fn describe(resolved_name: &str, request: &FontRequest, exact_match: bool) -> Self {
        if exact_match {
            return FontInfo {
                family: request.family.clone(),
                deci_point_size: request.deci_point_size,
                weight: request.weight,
                italic: request.italic,
                charset: request.charset,
                fixed_pitch: request.fixed_pitch,
                style_hint: request.style_hint,
                raw_mode: request.raw_mode,
                exact_match: true,
            };
        }

        let Some(xlfd) = XlfdName::parse(resolved_name) else {
            return FontInfo {
                family: resolved_name.to_string(),
                deci_point_size: 0,
                weight: WEIGHT_NORMAL,
                italic: false,
                charset: CharSet::Iso8859_1,
                fixed_pitch: false,
                style_hint: StyleHint::AnyStyle,
                raw_mode: true,
                exact_match: false,
            };
        };

        let mut deci_point_size = atoi(xlfd.point_size());
        let res_y = atoi(xlfd.resolution_y());
        if xlfd.resolution_y() != "75" && res_y != 0 {
            deci_point_size = to_u32(rescale(deci_point_size, res_y, 1));
        }
        let slant = xlfd.slant().chars().next().map(|c| c.to_ascii_lowercase());

        FontInfo {
            family: xlfd.family().to_string(),
            deci_point_size,
            weight: parse_weight(xlfd.weight()).value,
            italic: matches!(slant, Some('o') | Some('i')),
            charset: CharSet::from_registry(xlfd.charset_registry(), xlfd.charset_encoding())
                .unwrap_or(CharSet::Any),
            fixed_pitch: xlfd.is_fixed_pitch(),
            style_hint: StyleHint::AnyStyle,
            raw_mode: false,
            exact_match: false,
        }
    }

    /// Point size rounded to whole points.
    pub fn point_size(&self) -> u32 {
        (self.deci_point_size + 5) / 10
    }
}

/// Underline/strike-out width and horizontal resolution of a font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineMetrics {
    pub line_width: u32,
    pub x_resolution: u32,
}

impl LineMetrics {
    pub fn for_font_name(name: &str) -> Self {
        let Some(xlfd) = XlfdName::parse(name) else {
            return LineMetrics {
                line_width: 1,
                x_resolution: BASE_RESOLUTION,
            };
        };
        let weight = parse_weight(xlfd.weight()).value;
        let mut points = u64::from(atoi(xlfd.point_size()) / 10);
        if xlfd.resolution_x() != "75" || xlfd.resolution_y() != "75" {
            points = rescale(to_u32(points), atoi(xlfd.resolution_y()), BASE_RESOLUTION);
        }
        let x_resolution = match xlfd.resolution_x().parse::<u32>() {
            Ok(0) | Err(_) => BASE_RESOLUTION,
            Ok(res) => res,
        };

        // Heavier and larger fonts get thicker lines; small fonts still get a
        // two pixel line once they are reasonably bold.
        let score = points * u64::from(weight);
        let mut line_width = to_u32(score / 700);
        if line_width < 2 && score >= 1050 {
            line_width = 2;
        }
        LineMetrics {
            line_width: line_width.max(1),
            x_resolution,
        }
    }
}

// `value` measured at `resolution` dpi, converted to 75 dpi and rounded.
fn rescale(value: u32, resolution: u32, rounding: u32) -> u64 {
    (2 * u64::from(value) * u64::from(resolution) + u64::from(rounding)) / u64::from(BASE_RESOLUTION * 2)
}

fn to_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
