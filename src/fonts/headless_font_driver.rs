//! In-memory font server.
//!
//! `HeadlessFontDriver` answers font listings from a fixed list of XLFD names
//! using the X server's wildcard rules, "opens" fonts by synthesising metrics
//! from their names, and can optionally offer outline faces. It backs the
//! test suite and the `--names-file` mode of the command-line tool.

use super::encoding::{lookup_encoding, Script};
use super::font_driver::{FontDriver, FontFace, FontMetrics, OutlineMatch};
use super::outline::{OutlineFace, OutlineQuery};
use super::xlfd::{atoi, Field, XlfdName};
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, trace};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A font "opened" by the headless driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessFont {
    /// Name of the listed font that satisfied the request.
    pub name: String,
    pub metrics: FontMetrics,
}

impl FontFace for HeadlessFont {
    fn metrics(&self) -> FontMetrics {
        self.metrics
    }
}

/// A font set: the member fonts in pattern order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessFontSet {
    pub members: Vec<HeadlessFont>,
}

impl FontFace for HeadlessFontSet {
    fn metrics(&self) -> FontMetrics {
        self.members.iter().fold(FontMetrics::default(), |acc, f| FontMetrics {
            ascent: acc.ascent.max(f.metrics.ascent),
            descent: acc.descent.max(f.metrics.descent),
            min_left_bearing: acc.min_left_bearing.min(f.metrics.min_left_bearing),
            min_right_bearing: acc.min_right_bearing.min(f.metrics.min_right_bearing),
            max_width: acc.max_width.max(f.metrics.max_width),
            glyph_span: acc.glyph_span.max(f.metrics.glyph_span),
        })
    }
}

#[derive(Default)]
pub struct HeadlessFontDriver {
    names: Vec<String>,
    outline_faces: Vec<OutlineFace>,
    failing: RefCell<HashSet<String>>,
    list_calls: Cell<usize>,
    load_calls: Cell<usize>,
}

impl HeadlessFontDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        HeadlessFontDriver {
            names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Reads one font name per line; blank lines and `#` comments are skipped.
    pub fn from_names_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read font name list '{}'", path.display()))?;
        let driver = Self::with_names(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        );
        debug!(
            "HeadlessFontDriver: {} font names from '{}'",
            driver.names.len(),
            path.display()
        );
        Ok(driver)
    }

    pub fn with_outline_faces(mut self, faces: Vec<OutlineFace>) -> Self {
        self.outline_faces = faces;
        self
    }

    pub fn add_name(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    /// Makes every later attempt to open `name` fail.
    pub fn fail_loading(&self, name: &str) {
        self.failing.borrow_mut().insert(name.to_ascii_lowercase());
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.get()
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.get()
    }

    fn matching<'a>(&'a self, pattern: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.names.iter().filter(move |name| glob_match(pattern, name))
    }

    // A scalable listing that can be rendered at the size `name` asks for.
    fn scalable_source(&self, name: &str) -> Option<&String> {
        let wanted = XlfdName::parse(name)?;
        let identity = [
            Field::Foundry,
            Field::Family,
            Field::Weight,
            Field::Slant,
            Field::Width,
            Field::AddStyle,
            Field::Spacing,
            Field::CharsetRegistry,
            Field::CharsetEncoding,
        ];
        self.names.iter().find(|candidate| {
            XlfdName::parse(candidate).is_some_and(|listed| {
                listed.is_scalable()
                    && identity
                        .iter()
                        .all(|&f| glob_match(wanted.field(f), listed.field(f)))
            })
        })
    }

    fn open(&self, name: &str) -> Result<HeadlessFont> {
        self.load_calls.set(self.load_calls.get() + 1);
        if self.failing.borrow().contains(&name.to_ascii_lowercase()) {
            bail!("server refused to open '{}'", name);
        }
        if let Some(listed) = self.matching(name).next() {
            trace!("HeadlessFontDriver: '{}' opened as '{}'", name, listed);
            return Ok(HeadlessFont {
                name: listed.clone(),
                metrics: synthesize_metrics(listed),
            });
        }
        if let Some(listed) = self.scalable_source(name) {
            trace!("HeadlessFontDriver: '{}' scaled from '{}'", name, listed);
            return Ok(HeadlessFont {
                name: listed.clone(),
                metrics: synthesize_metrics(name),
            });
        }
        Err(anyhow!("no font matches '{}'", name))
    }
}

impl FontDriver for HeadlessFontDriver {
    type Bitmap = HeadlessFont;
    type FontSet = HeadlessFontSet;
    type Outline = HeadlessFont;

    fn list_fonts(&self, pattern: &str, max_names: usize) -> Result<Vec<String>> {
        self.list_calls.set(self.list_calls.get() + 1);
        Ok(self.matching(pattern).take(max_names).cloned().collect())
    }

    fn load_bitmap_font(&self, name: &str) -> Result<Self::Bitmap> {
        self.open(name)
    }

    fn load_font_set(&self, patterns: &str) -> Result<Self::FontSet> {
        let members: Vec<HeadlessFont> = patterns
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .filter_map(|p| self.open(p).ok())
            .collect();
        if members.is_empty() {
            bail!("no font matches any pattern of '{}'", patterns);
        }
        Ok(HeadlessFontSet { members })
    }

    fn match_outline(&self, query: &OutlineQuery) -> Result<OutlineMatch<Self::Outline>> {
        self.load_calls.set(self.load_calls.get() + 1);
        let rank = |face: &OutlineFace| {
            let family = if face.family.eq_ignore_ascii_case(&query.family) { 4 } else { 0 };
            let slant = if face.slant == query.slant { 2 } else { 0 };
            let spacing = if face.spacing == query.spacing { 1 } else { 0 };
            (family + slant + spacing, -(face.weight - query.weight).abs())
        };
        let face = self
            .outline_faces
            .iter()
            .max_by_key(|face| rank(face))
            .ok_or_else(|| anyhow!("no outline fonts available"))?;

        let pixels = (query.size_points * query.scale).round().max(1.0) as i32;
        let ascent = pixels * 4 / 5;
        let mut pattern = format!(
            "{}-{}:weight={}:slant={}:spacing={}",
            face.family, query.size_points, face.weight, face.slant, face.spacing
        );
        if let Some(aa) = query.antialias {
            pattern.push_str(&format!(":antialias={}", aa));
        }
        Ok(OutlineMatch {
            font: HeadlessFont {
                name: face.family.clone(),
                metrics: FontMetrics {
                    ascent,
                    descent: pixels - ascent,
                    min_left_bearing: 0,
                    min_right_bearing: 0,
                    max_width: (pixels * 3 / 5).max(1),
                    glyph_span: 0xdf,
                },
            },
            family: face.family.clone(),
            pattern,
        })
    }

    fn list_outline_faces(&self) -> Result<Vec<OutlineFace>> {
        Ok(self.outline_faces.clone())
    }
}

// Larger names are reported at this size.
const MAX_PIXEL_SIZE: u32 = 4096;

// Metrics a server would plausibly report for `name`.
fn synthesize_metrics(name: &str) -> FontMetrics {
    let (pixels, width, span) = match XlfdName::parse(name) {
        Some(xlfd) => {
            let mut pixels = xlfd.numeric(Field::PixelSize);
            if pixels == 0 {
                let res_y = match xlfd.numeric(Field::ResolutionY) {
                    0 => 75,
                    r => r,
                };
                pixels = xlfd.numeric(Field::PointSize).saturating_mul(res_y) / 720;
            }
            let pixels = if pixels == 0 { 12 } else { pixels.min(MAX_PIXEL_SIZE) };
            let wide = lookup_encoding(&xlfd.encoding_name())
                .is_some_and(|id| id.scripts().has(Script::Han) || id.is_unicode());
            let span = if wide {
                FontMetrics::glyph_span(0x21, 0x7e, 0x21, 0x7e)
            } else {
                FontMetrics::glyph_span(0, 0, 0x20, 0xff)
            };
            (pixels, (pixels * 3 / 5).max(1), span)
        }
        // Aliases such as `6x13`; anything else looks like `fixed`.
        None => {
            let (w, h) = name.split_once('x').map_or((6, 13), |(w, h)| (atoi(w), atoi(h)));
            let (w, h) = if w == 0 || h == 0 { (6, 13) } else { (w, h) };
            (h.min(MAX_PIXEL_SIZE), w.min(MAX_PIXEL_SIZE), FontMetrics::glyph_span(0, 0, 0, 0xff))
        }
    };
    let ascent = (pixels * 4 / 5) as i32;
    FontMetrics {
        ascent,
        descent: pixels as i32 - ascent,
        min_left_bearing: 0,
        min_right_bearing: 0,
        max_width: width as i32,
        glyph_span: span,
    }
}

/// Case-insensitive X font name matching: `*` matches any run of
/// characters, `?` matches one.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let p: Vec<u8> = pattern.bytes().map(|b| b.to_ascii_lowercase()).collect();
    let n: Vec<u8> = name.bytes().map(|b| b.to_ascii_lowercase()).collect();
    let (mut pi, mut ni) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while ni < n.len() {
        if pi < p.len() && (p[pi] == b'?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == b'*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((sp, sn)) = star {
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&b| b == b'*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::outline::{OUTLINE_MONO, OUTLINE_PROPORTIONAL, OUTLINE_SLANT_ROMAN, OUTLINE_WEIGHT_MEDIUM};
    use crate::fonts::request::FontRequest;

    fn driver() -> HeadlessFontDriver {
        HeadlessFontDriver::with_names([
            "fixed",
            "6x13",
            "-misc-fixed-medium-r-semicondensed--13-120-75-75-c-60-iso8859-1",
            "-adobe-helvetica-medium-r-normal--12-120-75-75-p-67-iso8859-1",
            "-adobe-helvetica-medium-r-normal--0-0-0-0-p-0-iso8859-1",
            "-jis-fixed-medium-r-normal--16-150-75-75-c-160-jisx0208.1983-0",
        ])
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("*", "anything"));
        assert!(glob_match("-*-helvetica-*", "-adobe-helvetica-medium-r"));
        assert!(glob_match("-*-HELVETICA-*", "-adobe-helvetica-medium-r"));
        assert!(glob_match("6x1?", "6x13"));
        assert!(!glob_match("6x1?", "6x130"));
        assert!(!glob_match("-*-times-*", "-adobe-helvetica-medium-r"));
        assert!(glob_match("a*b*c", "aXbYbZc"));
        assert!(glob_match("", ""));
        assert!(!glob_match("", "x"));
    }

    #[test]
    fn test_list_fonts_respects_max() {
        let d = driver();
        let all = d.list_fonts("*", 100).unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(d.list_fonts("*", 2).unwrap().len(), 2);
        assert_eq!(
            d.list_fonts("-*-helvetica-*-*-*-*-*-*-*-*-*-*-*-*", 100).unwrap().len(),
            2
        );
        assert_eq!(d.list_calls(), 3);
    }

    #[test]
    fn test_open_listed_and_scaled_fonts() {
        let d = driver();
        let font = d
            .load_bitmap_font("-adobe-helvetica-medium-r-normal--12-120-75-75-p-67-iso8859-1")
            .unwrap();
        assert_eq!(font.metrics.ascent + font.metrics.descent, 12);

        let scaled = d
            .load_bitmap_font("-adobe-helvetica-medium-r-normal--*-240-75-75-p-*-iso8859-1")
            .unwrap();
        assert_eq!(scaled.name, "-adobe-helvetica-medium-r-normal--0-0-0-0-p-0-iso8859-1");
        assert_eq!(scaled.metrics.ascent + scaled.metrics.descent, 25);

        let alias = d.load_bitmap_font("6x13").unwrap();
        assert_eq!(alias.metrics.max_width, 6);
        assert_eq!(alias.metrics.ascent + alias.metrics.descent, 13);

        assert!(d.load_bitmap_font("-*-times-*-*-*-*-*-*-*-*-*-*-*-*").is_err());
        assert_eq!(d.load_calls(), 4);
    }

    #[test]
    fn test_huge_sizes_are_clamped() {
        let d = HeadlessFontDriver::with_names([
            "-adobe-huge-medium-r-normal--0-99999999-100-100-p-0-iso8859-1",
            "99999999999x99999999999",
        ]);
        let huge = d
            .load_bitmap_font("-adobe-huge-medium-r-normal--0-99999999-100-100-p-0-iso8859-1")
            .unwrap();
        assert_eq!(huge.metrics.ascent + huge.metrics.descent, MAX_PIXEL_SIZE as i32);

        let alias = d.load_bitmap_font("99999999999x99999999999").unwrap();
        assert_eq!(alias.metrics.max_width, MAX_PIXEL_SIZE as i32);
        assert!(alias.approximate_cost() > 0);
    }

    #[test]
    fn test_injected_failure() {
        let d = driver();
        d.fail_loading("FIXED");
        assert!(d.load_bitmap_font("fixed").is_err());
        assert!(d.load_bitmap_font("6x13").is_ok());
    }

    #[test]
    fn test_font_set() {
        let d = driver();
        let set = d
            .load_font_set("-*-nosuch-*-*-*-*-*-150-*-*-*-*-*-*,-*-*-*-*-*-*-*-150-*-*-*-*-*-*")
            .unwrap();
        assert_eq!(set.members.len(), 1);
        assert!(set.metrics().glyph_span > 0xff);
        assert!(d.load_font_set("-*-nosuch-*-*-*-*-*-*-*-*-*-*-*-*").is_err());
    }

    #[test]
    fn test_outline_matching() {
        let d = HeadlessFontDriver::new().with_outline_faces(vec![
            OutlineFace::new("DejaVu Sans", OUTLINE_WEIGHT_MEDIUM, OUTLINE_SLANT_ROMAN, OUTLINE_PROPORTIONAL),
            OutlineFace::new("DejaVu Sans Mono", OUTLINE_WEIGHT_MEDIUM, OUTLINE_SLANT_ROMAN, OUTLINE_MONO),
        ]);
        let request = FontRequest::new("dejavu sans mono", 10).with_fixed_pitch(true);
        let query = OutlineQuery::for_request(&request, &request.family, 75, None);
        let found = d.match_outline(&query).unwrap();
        assert_eq!(found.font.name, "DejaVu Sans Mono");
        assert!(found.pattern.starts_with("DejaVu Sans Mono-10"));

        assert!(HeadlessFontDriver::new().match_outline(&query).is_err());
    }
}
