//! Abstract font requests, as the rest of the toolkit describes fonts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Weights ---
//
// Weights use a 0..=99 scale.

pub const WEIGHT_LIGHT: u32 = 25;
pub const WEIGHT_NORMAL: u32 = 50;
pub const WEIGHT_DEMI_BOLD: u32 = 63;
pub const WEIGHT_BOLD: u32 = 75;
pub const WEIGHT_BLACK: u32 = 87;

/// Interprets a weight given either as a number or as a weight name.
pub fn parse_weight_arg(s: &str) -> anyhow::Result<u32> {
    if let Ok(n) = s.parse::<u32>() {
        anyhow::ensure!(n <= 99, "weight {} is outside 0..=99", n);
        return Ok(n);
    }
    Ok(match s.to_ascii_lowercase().as_str() {
        "light" => WEIGHT_LIGHT,
        "normal" | "medium" | "regular" => WEIGHT_NORMAL,
        "demibold" | "demi-bold" => WEIGHT_DEMI_BOLD,
        "bold" => WEIGHT_BOLD,
        "black" => WEIGHT_BLACK,
        other => anyhow::bail!("unknown weight '{}'", other),
    })
}

// --- Character sets ---

/// Character set a request wants its font encoded in.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CharSet {
    #[default]
    Iso8859_1,
    Iso8859_2,
    Iso8859_3,
    Iso8859_4,
    Iso8859_5,
    Iso8859_6,
    Iso8859_7,
    Iso8859_8,
    Iso8859_9,
    Koi8R,
    Unicode,
    /// Accept whatever the font offers.
    Any,
    // Multi-byte locale sets, served by font sets instead of single fonts.
    SetJa,
    SetKo,
    SetThTh,
    SetZh,
    SetZhTw,
}

impl CharSet {
    /// Locale sets that are resolved to a comma separated pattern list.
    pub fn is_multi_byte(self) -> bool {
        matches!(
            self,
            CharSet::SetJa | CharSet::SetKo | CharSet::SetThTh | CharSet::SetZh | CharSet::SetZhTw
        )
    }

    /// ISO-8859 part number, for the Latin sets.
    pub fn iso8859_part(self) -> Option<u32> {
        Some(match self {
            CharSet::Iso8859_1 => 1,
            CharSet::Iso8859_2 => 2,
            CharSet::Iso8859_3 => 3,
            CharSet::Iso8859_4 => 4,
            CharSet::Iso8859_5 => 5,
            CharSet::Iso8859_6 => 6,
            CharSet::Iso8859_7 => 7,
            CharSet::Iso8859_8 => 8,
            CharSet::Iso8859_9 => 9,
            _ => return None,
        })
    }

    /// Whether a candidate's charset registry/encoding serves this set.
    ///
    /// Unicode-indexed candidates are handled by the scorer, not here.
    pub fn accepts(self, registry: &str, encoding: &str) -> bool {
        if self == CharSet::Any {
            return true;
        }
        if registry == "koi8" {
            return self == CharSet::Koi8R && (encoding == "r" || encoding == "1");
        }
        if registry == "iso8859" {
            return self
                .iso8859_part()
                .is_some_and(|part| encoding.parse::<u32>().ok() == Some(part));
        }
        false
    }

    /// Registry name used when describing a font that was actually loaded.
    pub fn from_registry(registry: &str, encoding: &str) -> Option<Self> {
        match registry {
            "iso10646" => Some(CharSet::Unicode),
            "koi8" if encoding == "r" || encoding == "1" => Some(CharSet::Koi8R),
            "iso8859" => match encoding.parse::<u32>().ok()? {
                1 => Some(CharSet::Iso8859_1),
                2 => Some(CharSet::Iso8859_2),
                3 => Some(CharSet::Iso8859_3),
                4 => Some(CharSet::Iso8859_4),
                5 => Some(CharSet::Iso8859_5),
                6 => Some(CharSet::Iso8859_6),
                7 => Some(CharSet::Iso8859_7),
                8 => Some(CharSet::Iso8859_8),
                9 => Some(CharSet::Iso8859_9),
                _ => None,
            },
            _ => None,
        }
    }
}

impl FromStr for CharSet {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if let Some(part) = lower.strip_prefix("iso8859-") {
            let charset = CharSet::from_registry("iso8859", part);
            return charset.ok_or_else(|| anyhow::anyhow!("unsupported charset '{}'", s));
        }
        Ok(match lower.as_str() {
            "koi8-r" => CharSet::Koi8R,
            "unicode" | "iso10646-1" => CharSet::Unicode,
            "any" => CharSet::Any,
            "ja" => CharSet::SetJa,
            "ko" => CharSet::SetKo,
            "th" => CharSet::SetThTh,
            "zh" => CharSet::SetZh,
            "zh_tw" | "zh-tw" => CharSet::SetZhTw,
            _ => anyhow::bail!("unsupported charset '{}'", s),
        })
    }
}

// --- Style hints ---

/// Generic family class used when the named family is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StyleHint {
    #[default]
    AnyStyle,
    SansSerif,
    Serif,
    TypeWriter,
    Decorative,
    System,
}

impl FromStr for StyleHint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "any" | "default" => StyleHint::AnyStyle,
            "sans" | "sansserif" | "sans-serif" | "helvetica" => StyleHint::SansSerif,
            "serif" | "times" => StyleHint::Serif,
            "typewriter" | "mono" | "courier" => StyleHint::TypeWriter,
            "decorative" | "oldenglish" => StyleHint::Decorative,
            "system" => StyleHint::System,
            other => anyhow::bail!("unknown style hint '{}'", other),
        })
    }
}

// --- Requests ---

/// What the caller asked for. Used as the key of the resolved-name memo, so
/// every field takes part in equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FontRequest {
    /// Family name; empty means "use the style hint's default family".
    /// In raw mode this is a complete X font name.
    pub family: String,
    /// Size in tenths of a point.
    pub deci_point_size: u32,
    pub weight: u32,
    pub italic: bool,
    pub charset: CharSet,
    pub fixed_pitch: bool,
    pub style_hint: StyleHint,
    /// Treat `family` as a literal X font name and skip matching.
    pub raw_mode: bool,
}

impl Default for FontRequest {
    fn default() -> Self {
        FontRequest {
            family: String::new(),
            deci_point_size: 120,
            weight: WEIGHT_NORMAL,
            italic: false,
            charset: CharSet::default(),
            fixed_pitch: false,
            style_hint: StyleHint::default(),
            raw_mode: false,
        }
    }
}

impl FontRequest {
    pub fn new(family: impl Into<String>, point_size: u32) -> Self {
        FontRequest {
            family: family.into(),
            deci_point_size: point_size.saturating_mul(10),
            ..Default::default()
        }
    }

    /// A request for a literal X font name (or alias such as `fixed`).
    pub fn raw(name: impl Into<String>) -> Self {
        FontRequest {
            family: name.into(),
            raw_mode: true,
            ..Default::default()
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    pub fn with_charset(mut self, charset: CharSet) -> Self {
        self.charset = charset;
        self
    }

    pub fn with_fixed_pitch(mut self, fixed_pitch: bool) -> Self {
        self.fixed_pitch = fixed_pitch;
        self
    }

    pub fn with_style_hint(mut self, style_hint: StyleHint) -> Self {
        self.style_hint = style_hint;
        self
    }

    /// Size in whole points, rounded.
    pub fn point_size(&self) -> u32 {
        (self.deci_point_size + 5) / 10
    }
}

impl fmt::Display for FontRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw_mode {
            return write!(f, "raw '{}'", self.family);
        }
        write!(
            f,
            "'{}' {}.{}pt weight {}{}{} {:?}",
            self.family,
            self.deci_point_size / 10,
            self.deci_point_size % 10,
            self.weight,
            if self.italic { " italic" } else { "" },
            if self.fixed_pitch { " fixed" } else { "" },
            self.charset,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_accepts() {
        assert!(CharSet::Iso8859_1.accepts("iso8859", "1"));
        assert!(!CharSet::Iso8859_1.accepts("iso8859", "2"));
        assert!(CharSet::Iso8859_9.accepts("iso8859", "9"));
        assert!(CharSet::Koi8R.accepts("koi8", "r"));
        assert!(CharSet::Koi8R.accepts("koi8", "1"));
        assert!(!CharSet::Koi8R.accepts("koi8", "u"));
        assert!(!CharSet::Iso8859_5.accepts("koi8", "r"));
        assert!(!CharSet::Unicode.accepts("iso8859", "1"));
        assert!(CharSet::Any.accepts("jisx0208.1983", "0"));
    }

    #[test]
    fn test_charset_parsing() {
        assert_eq!("ISO8859-2".parse::<CharSet>().unwrap(), CharSet::Iso8859_2);
        assert_eq!("koi8-r".parse::<CharSet>().unwrap(), CharSet::Koi8R);
        assert_eq!("ja".parse::<CharSet>().unwrap(), CharSet::SetJa);
        assert!("iso8859-15".parse::<CharSet>().is_err());
        assert!(CharSet::SetZhTw.is_multi_byte());
        assert!(!CharSet::Unicode.is_multi_byte());
    }

    #[test]
    fn test_from_registry() {
        assert_eq!(CharSet::from_registry("iso10646", "1"), Some(CharSet::Unicode));
        assert_eq!(CharSet::from_registry("iso8859", "7"), Some(CharSet::Iso8859_7));
        assert_eq!(CharSet::from_registry("jisx0208.1983", "0"), None);
    }

    #[test]
    fn test_request_builders() {
        let req = FontRequest::new("Times", 11)
            .with_weight(WEIGHT_BOLD)
            .with_italic(true);
        assert_eq!(req.deci_point_size, 110);
        assert_eq!(req.point_size(), 11);
        assert_eq!(req.weight, 75);
        assert!(!req.raw_mode);
        assert!(FontRequest::raw("fixed").raw_mode);
    }

    #[test]
    fn test_weight_args() {
        assert_eq!(parse_weight_arg("bold").unwrap(), WEIGHT_BOLD);
        assert_eq!(parse_weight_arg("63").unwrap(), WEIGHT_DEMI_BOLD);
        assert!(parse_weight_arg("120").is_err());
        assert!(parse_weight_arg("heavy").is_err());
    }
}
