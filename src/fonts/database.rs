//! Catalog of the fonts the server offers.
//!
//! The catalog is a tree: family → foundry → style → pixel size → encoding.
//! It is filled lazily from bulk font listings, per family or per script,
//! and remembers what it already loaded so repeated population is cheap.
//! Outline faces are merged in under an empty foundry.

use super::encoding::{encodings_for_script, lookup_encoding, EncodingId, Script, ScriptSet};
use super::font_driver::FontDriver;
use super::matcher::parse_weight;
use super::outline::{pitch_for_spacing, weight_from_outline, OUTLINE_MONO, OUTLINE_SLANT_ITALIC, OUTLINE_SLANT_OBLIQUE};
use super::request::{WEIGHT_BOLD, WEIGHT_DEMI_BOLD, WEIGHT_LIGHT, WEIGHT_NORMAL};
use super::xlfd::{atoi, XlfdName};
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Pixel-size key of the single size entry of a smoothly scalable style.
pub const SMOOTH_SCALABLE: u32 = 0;

/// Identity of a style within a foundry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StyleKey {
    pub italic: bool,
    pub oblique: bool,
    pub weight: u32,
    /// Percentage of normal width.
    pub stretch: u32,
}

impl Default for StyleKey {
    fn default() -> Self {
        StyleKey {
            italic: false,
            oblique: false,
            weight: WEIGHT_NORMAL,
            stretch: 100,
        }
    }
}

impl StyleKey {
    /// Style of a core font name.
    pub fn from_xlfd(xlfd: &XlfdName<'_>) -> Self {
        let mut key = StyleKey {
            weight: parse_weight(xlfd.weight()).value,
            ..Default::default()
        };
        let mut slant = xlfd.slant().chars().map(|c| c.to_ascii_lowercase());
        match slant.next() {
            // Reverse slants count as their forward counterpart.
            Some('r') => match slant.next() {
                Some('o') => key.oblique = true,
                Some('i') => key.italic = true,
                _ => {}
            },
            Some('o') => key.oblique = true,
            Some('i') => key.italic = true,
            _ => {}
        }
        key.stretch = match xlfd.width() {
            "semi condensed" | "semicondensed" => 90,
            "condensed" => 80,
            "narrow" => 60,
            _ => 100,
        };
        key
    }

    fn weight_name(&self) -> &'static str {
        match self.weight {
            w if w <= WEIGHT_LIGHT => "Light",
            w if w <= WEIGHT_NORMAL => "Normal",
            w if w <= WEIGHT_DEMI_BOLD => "DemiBold",
            w if w <= WEIGHT_BOLD => "Bold",
            _ => "Black",
        }
    }
}

/// Display name of a style: `Normal`, `Bold`, `Italic`, `Bold Oblique`, ...
impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slant = if self.italic {
            Some("Italic")
        } else if self.oblique {
            Some("Oblique")
        } else {
            None
        };
        match (self.weight_name(), slant) {
            ("Normal", Some(slant)) => write!(f, "{}", slant),
            (weight, Some(slant)) => write!(f, "{} {}", weight, slant),
            (weight, None) => write!(f, "{}", weight),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncodingEntry {
    pub encoding: EncodingId,
    /// Spacing letter (`p`, `m`, `c`), `*` when the name left it empty.
    pub pitch: char,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FontSizeEntry {
    pub encodings: Vec<EncodingEntry>,
}

impl FontSizeEntry {
    fn set_encoding(&mut self, encoding: EncodingId, pitch: char) {
        match self.encodings.iter_mut().find(|e| e.encoding == encoding) {
            Some(entry) => entry.pitch = pitch,
            None => self.encodings.push(EncodingEntry { encoding, pitch }),
        }
    }

    pub fn encoding(&self, encoding: EncodingId) -> Option<&EncodingEntry> {
        self.encodings.iter().find(|e| e.encoding == encoding)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FontStyle {
    pub key: StyleKey,
    pub weight_name: String,
    pub setwidth_name: String,
    pub smooth_scalable: bool,
    /// Scalable only by scaling bitmaps; never set on smooth styles.
    pub bitmap_scalable: bool,
    /// Oblique rendering synthesised from the upright outline face.
    pub fake_oblique: bool,
    /// Keyed by pixel size; `SMOOTH_SCALABLE` for the scalable entry.
    pub sizes: BTreeMap<u32, FontSizeEntry>,
}

impl FontStyle {
    fn new(key: StyleKey) -> Self {
        FontStyle {
            key,
            ..Default::default()
        }
    }

    /// Discrete pixel sizes, ascending.
    pub fn pixel_sizes(&self) -> impl Iterator<Item = u32> + '_ {
        self.sizes.keys().copied().filter(|&px| px != SMOOTH_SCALABLE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FontFoundry {
    pub name: String,
    pub styles: BTreeMap<StyleKey, FontStyle>,
}

impl FontFoundry {
    fn style_mut(&mut self, key: StyleKey) -> &mut FontStyle {
        self.styles.entry(key).or_insert_with(|| FontStyle::new(key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontFamily {
    /// Display name, capitalised for core fonts.
    pub name: String,
    /// Keyed by lower-case foundry name.
    pub foundries: BTreeMap<String, FontFoundry>,
    pub fixed_pitch: bool,
    pub has_outline: bool,
    /// Every core font of the family has been listed.
    pub xlfd_loaded: bool,
    /// A family-scoped population ran; further ones are skipped.
    pub fully_loaded: bool,
    pub supported: ScriptSet,
    /// Scripts some core encoding of the family does not cover.
    pub unsupported_xlfd: ScriptSet,
}

impl FontFamily {
    fn new(name: &str) -> Self {
        FontFamily {
            name: name.to_string(),
            foundries: BTreeMap::new(),
            fixed_pitch: true,
            has_outline: false,
            xlfd_loaded: false,
            fully_loaded: false,
            supported: ScriptSet::empty(),
            unsupported_xlfd: ScriptSet::empty(),
        }
    }

    fn foundry_mut(&mut self, name: &str) -> &mut FontFoundry {
        self.foundries
            .entry(name.to_lowercase())
            .or_insert_with(|| FontFoundry {
                name: name.to_string(),
                styles: BTreeMap::new(),
            })
    }

    fn note_encoding(&mut self, scripts: ScriptSet) {
        self.supported |= scripts;
        self.unsupported_xlfd |= ScriptSet::every() - scripts;
    }

    pub fn is_empty(&self) -> bool {
        self.foundries.values().all(|f| f.styles.is_empty())
    }

    fn styles(&self) -> impl Iterator<Item = &FontStyle> {
        self.foundries.values().flat_map(|f| f.styles.values())
    }
}

/// Point sizes available for a style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PointSizes {
    /// Any size can be rendered.
    Scalable,
    Sizes(Vec<u32>),
}

/// Uppercases the first letter of every space-separated word.
pub fn capitalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut word_start = true;
    for c in name.chars() {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        word_start = c == ' ';
    }
    out
}

/// Bulk listing pattern for a family (or all) and an encoding (or all).
pub fn bulk_pattern(family: Option<&str>, encoding: Option<EncodingId>) -> String {
    format!(
        "-*-{}-*-*-*-*-*-*-*-*-*-*-{}",
        family.unwrap_or("*"),
        encoding.map_or("*-*", EncodingId::name)
    )
}

pub struct FontDatabase {
    /// Keyed by lower-case family name.
    families: BTreeMap<String, FontFamily>,
    /// Resolution used to turn pixel sizes into point sizes.
    resolution: u32,
    list_capacity: usize,
    xlfds_fully_loaded: bool,
    encodings_loaded: HashSet<EncodingId>,
    outline_loaded: bool,
}

impl FontDatabase {
    pub fn new(resolution: u32, list_capacity: usize) -> Self {
        FontDatabase {
            families: BTreeMap::new(),
            resolution: resolution.max(1),
            list_capacity: list_capacity.max(1),
            xlfds_fully_loaded: false,
            encodings_loaded: HashSet::new(),
            outline_loaded: false,
        }
    }

    fn family_mut(&mut self, name: &str) -> &mut FontFamily {
        self.families
            .entry(name.to_lowercase())
            .or_insert_with(|| FontFamily::new(name))
    }

    pub fn family(&self, name: &str) -> Option<&FontFamily> {
        self.families.get(&name.to_lowercase()).filter(|f| !f.is_empty())
    }

    /// Loads what is needed to answer questions about `family` (or every
    /// family) and `script` (or every script).
    ///
    /// For a family the bulk listing runs at most once. Without a family,
    /// each encoding is listed at most once.
    pub fn populate<D: FontDriver>(&mut self, driver: &D, family: Option<&str>, script: Option<Script>) {
        let Some(name) = family else {
            match script {
                None => self.load_xlfds(driver, None, None),
                Some(script) => {
                    for encoding in encodings_for_script(script) {
                        self.load_xlfds(driver, None, Some(encoding));
                    }
                }
            }
            return;
        };

        let needed = match self.families.get(&name.to_lowercase()) {
            Some(entry) if entry.fully_loaded => {
                trace!("Family '{}' already loaded", name);
                return;
            }
            Some(entry) => match script {
                None => !entry.xlfd_loaded,
                Some(script) => {
                    !entry.has_outline
                        && !entry.supported.has(script)
                        && !entry.unsupported_xlfd.has(script)
                }
            },
            None => true,
        };
        if needed {
            self.load_xlfds(driver, Some(name), None);
            self.family_mut(name).fully_loaded = true;
        }
    }

    fn load_xlfds<D: FontDriver>(&mut self, driver: &D, family: Option<&str>, encoding: Option<EncodingId>) {
        let already = match encoding {
            None => self.xlfds_fully_loaded,
            Some(id) => self.encodings_loaded.contains(&id),
        };
        if already {
            return;
        }
        if let Some(name) = family {
            if self.families.get(&name.to_lowercase()).is_some_and(|f| f.xlfd_loaded) {
                return;
            }
        }

        let pattern = bulk_pattern(family, encoding);
        let names = match driver.list_fonts(&pattern, self.list_capacity) {
            Ok(names) => names,
            Err(e) => {
                warn!("Listing '{}' failed: {:#}", pattern, e);
                return;
            }
        };
        debug!("'{}' listed {} fonts", pattern, names.len());

        let mut touched = BTreeSet::new();
        for name in &names {
            let Some(xlfd) = XlfdName::parse(name) else {
                continue;
            };
            let Some(id) = lookup_encoding(&xlfd.encoding_name()) else {
                trace!("Unknown encoding in '{}'", name);
                continue;
            };
            let family_name = capitalize(xlfd.family());
            touched.insert(family_name.to_lowercase());
            self.add_xlfd(&family_name, &xlfd, id);
        }

        if encoding.is_none() {
            if let Some(name) = family {
                touched.insert(name.to_lowercase());
                self.family_mut(name);
            }
            for key in &touched {
                if let Some(f) = self.families.get_mut(key) {
                    f.xlfd_loaded = true;
                }
            }
        }
        if family.is_none() {
            match encoding {
                None => self.xlfds_fully_loaded = true,
                Some(id) => {
                    self.encodings_loaded.insert(id);
                }
            }
        }
    }

    fn add_xlfd(&mut self, family_name: &str, xlfd: &XlfdName<'_>, encoding: EncodingId) {
        let key = StyleKey::from_xlfd(xlfd);
        let smooth = xlfd.is_smoothly_scalable();
        let bitmap_scalable = xlfd.is_scalable() && !smooth;
        let fixed_pitch = xlfd.is_fixed_pitch();
        let pitch = xlfd.spacing_char().unwrap_or('*');

        let family = self.family_mut(family_name);
        if !fixed_pitch {
            family.fixed_pitch = false;
        }
        family.note_encoding(encoding.scripts());

        let style = family.foundry_mut(&capitalize(xlfd.foundry())).style_mut(key);
        style.weight_name = xlfd.weight().to_string();
        style.setwidth_name = xlfd.width().to_string();
        let pixel_size = if smooth {
            style.smooth_scalable = true;
            style.bitmap_scalable = false;
            SMOOTH_SCALABLE
        } else {
            if bitmap_scalable && !style.smooth_scalable {
                style.bitmap_scalable = true;
            }
            atoi(xlfd.pixel_size())
        };
        style
            .sizes
            .entry(pixel_size)
            .or_default()
            .set_encoding(encoding, pitch);
    }

    /// Merges the server's outline faces into the catalog. Runs once.
    pub fn load_outline_faces<D: FontDriver>(&mut self, driver: &D) {
        if self.outline_loaded {
            return;
        }
        let faces = match driver.list_outline_faces() {
            Ok(faces) => faces,
            Err(e) => {
                warn!("Listing outline fonts failed: {:#}", e);
                return;
            }
        };
        self.outline_loaded = true;

        let mut families = BTreeSet::new();
        for face in &faces {
            let key = StyleKey {
                italic: face.slant == OUTLINE_SLANT_ITALIC,
                oblique: face.slant == OUTLINE_SLANT_OBLIQUE,
                weight: weight_from_outline(face.weight),
                stretch: 100,
            };
            let family = self.family_mut(&face.family);
            family.has_outline = true;
            if face.spacing < OUTLINE_MONO {
                family.fixed_pitch = false;
            }
            let style = family.foundry_mut("").style_mut(key);
            style.smooth_scalable = true;
            style
                .sizes
                .entry(SMOOTH_SCALABLE)
                .or_default()
                .set_encoding(EncodingId::ANY, pitch_for_spacing(face.spacing));
            families.insert(face.family.to_lowercase());
        }

        for key in &families {
            if let Some(family) = self.families.get_mut(key) {
                if let Some(foundry) = family.foundries.get_mut("") {
                    add_fake_obliques(foundry);
                }
            }
        }
        info!("Loaded {} outline faces in {} families", faces.len(), families.len());
    }

    /// Family display names, sorted case-insensitively.
    pub fn families(&self) -> Vec<String> {
        self.families
            .values()
            .filter(|f| !f.is_empty())
            .map(|f| f.name.clone())
            .collect()
    }

    /// Style names offered by `family` across all foundries.
    pub fn styles(&self, family: &str) -> Vec<String> {
        let Some(family) = self.family(family) else {
            return Vec::new();
        };
        let keys: BTreeSet<StyleKey> = family.styles().map(|s| s.key).collect();
        let mut names = Vec::new();
        for key in keys {
            let name = key.to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn matching_styles<'a>(&'a self, family: &str, style: &'a str) -> Vec<&'a FontStyle> {
        self.family(family)
            .map(|f| {
                f.styles()
                    .filter(|s| s.key.to_string().eq_ignore_ascii_case(style))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Pixel sizes of the bitmap fonts of `family` in `style`, ascending.
    pub fn pixel_sizes(&self, family: &str, style: &str) -> Vec<u32> {
        let sizes: BTreeSet<u32> = self
            .matching_styles(family, style)
            .into_iter()
            .flat_map(|s| s.pixel_sizes())
            .collect();
        sizes.into_iter().collect()
    }

    /// Point sizes of `family` in `style` at the database resolution.
    pub fn point_sizes(&self, family: &str, style: &str) -> PointSizes {
        let styles = self.matching_styles(family, style);
        if styles.iter().any(|s| s.smooth_scalable) {
            return PointSizes::Scalable;
        }
        let res = self.resolution;
        let points: BTreeSet<u32> = styles
            .into_iter()
            .flat_map(|s| s.pixel_sizes())
            .map(|px| (px * 72 + res / 2) / res)
            .collect();
        PointSizes::Sizes(points.into_iter().collect())
    }

    pub fn is_fixed_pitch(&self, family: &str) -> bool {
        self.family(family).is_some_and(|f| f.fixed_pitch)
    }

    pub fn supports_script(&self, family: &str, script: Script) -> bool {
        self.family(family).is_some_and(|f| f.supported.has(script))
    }

    pub fn is_fully_loaded(&self, family: &str) -> bool {
        self.families.get(&family.to_lowercase()).is_some_and(|f| f.fully_loaded)
    }
}

// An upright outline style with neither an italic nor an oblique sibling
// gets an oblique one rendered by shearing.
fn add_fake_obliques(foundry: &mut FontFoundry) {
    let upright: Vec<(StyleKey, char)> = foundry
        .styles
        .values()
        .filter(|s| !s.key.italic && !s.key.oblique)
        .filter_map(|s| {
            let pitch = s.sizes.get(&SMOOTH_SCALABLE)?.encoding(EncodingId::ANY)?.pitch;
            Some((s.key, pitch))
        })
        .collect();

    for (key, pitch) in upright {
        let italic = StyleKey { italic: true, ..key };
        let oblique = StyleKey { oblique: true, ..key };
        if foundry.styles.contains_key(&italic) || foundry.styles.contains_key(&oblique) {
            continue;
        }
        trace!("Synthesising oblique for {}", key);
        let style = foundry.style_mut(oblique);
        style.fake_oblique = true;
        style.smooth_scalable = true;
        style
            .sizes
            .entry(SMOOTH_SCALABLE)
            .or_default()
            .set_encoding(EncodingId::ANY, pitch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::headless_font_driver::HeadlessFontDriver;
    use crate::fonts::outline::{OutlineFace, OUTLINE_PROPORTIONAL, OUTLINE_SLANT_ROMAN, OUTLINE_WEIGHT_BOLD, OUTLINE_WEIGHT_MEDIUM};

    fn driver() -> HeadlessFontDriver {
        HeadlessFontDriver::with_names([
            "-adobe-helvetica-medium-r-normal--10-100-75-75-p-56-iso8859-1",
            "-adobe-helvetica-medium-r-normal--12-120-75-75-p-67-iso8859-1",
            "-adobe-helvetica-medium-r-normal--12-120-75-75-p-67-iso8859-2",
            "-adobe-helvetica-bold-o-normal--12-120-75-75-p-69-iso8859-1",
            "-adobe-helvetica-medium-r-normal--0-0-0-0-p-0-iso8859-1",
            "-b&h-lucidatypewriter-medium-r-normal-sans-12-120-75-75-m-70-iso8859-1",
            "-misc-fixed-medium-r-semicondensed--13-120-75-75-c-60-iso10646-1",
            "-misc-fixed-medium-r-normal--14-130-75-75-c-140-jisx0208.1983-0",
            "-misc-fixed-medium-r-normal--13-120-75-75-c-60-x-unknown",
            "-urw-new century schoolbook-medium-ri-normal--0-0-75-75-p-0-iso8859-1",
            "fixed",
        ])
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("new century schoolbook"), "New Century Schoolbook");
        assert_eq!(capitalize("b&h"), "B&h");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_bulk_pattern() {
        assert_eq!(bulk_pattern(None, None), "-*-*-*-*-*-*-*-*-*-*-*-*-*-*");
        assert_eq!(
            bulk_pattern(Some("helvetica"), Some(EncodingId::ISO8859_1)),
            "-*-helvetica-*-*-*-*-*-*-*-*-*-*-iso8859-1"
        );
    }

    #[test]
    fn test_style_keys() {
        let key = |name| StyleKey::from_xlfd(&XlfdName::parse(name).unwrap());
        let ri = key("-urw-schoolbook-medium-ri-normal--0-0-75-75-p-0-iso8859-1");
        assert!(ri.italic && !ri.oblique);
        let bo = key("-adobe-helvetica-bold-o-condensed--12-120-75-75-p-69-iso8859-1");
        assert!(bo.oblique);
        assert_eq!(bo.weight, WEIGHT_BOLD);
        assert_eq!(bo.stretch, 80);
        assert_eq!(bo.to_string(), "Bold Oblique");
        assert_eq!(ri.to_string(), "Italic");
        assert_eq!(StyleKey::default().to_string(), "Normal");
        // Guessed weights are stored unadjusted.
        assert_eq!(key("-x-y-extrabold-r-narrow--1-10-75-75-p-1-iso8859-1").weight, WEIGHT_BOLD);
        assert_eq!(key("-x-y-medium-r-narrow--1-10-75-75-p-1-iso8859-1").stretch, 60);
    }

    #[test_log::test]
    fn test_full_population() {
        let driver = driver();
        let mut db = FontDatabase::new(75, 0xffff);
        db.populate(&driver, None, None);
        assert_eq!(
            db.families(),
            vec!["Fixed", "Helvetica", "Lucidatypewriter", "New Century Schoolbook"]
        );

        let helvetica = db.family("HELVETICA").unwrap();
        assert_eq!(helvetica.foundries["adobe"].name, "Adobe");
        assert!(!helvetica.fixed_pitch);
        assert!(helvetica.xlfd_loaded);

        assert!(db.is_fixed_pitch("fixed"));
        assert!(db.is_fixed_pitch("lucidatypewriter"));
        assert!(!db.is_fixed_pitch("helvetica"));
        assert!(db.supports_script("fixed", Script::HanJapanese));
        assert!(db.supports_script("fixed", Script::Unicode));
        assert!(!db.supports_script("helvetica", Script::Cyrillic));

        // Repeating is free.
        let calls = driver.list_calls();
        db.populate(&driver, None, None);
        assert_eq!(driver.list_calls(), calls);
    }

    #[test_log::test]
    fn test_styles_and_sizes() {
        let driver = driver();
        let mut db = FontDatabase::new(75, 0xffff);
        db.populate(&driver, Some("helvetica"), None);
        assert_eq!(db.styles("helvetica"), vec!["Normal", "Bold Oblique"]);
        assert_eq!(db.point_sizes("helvetica", "normal"), PointSizes::Scalable);
        assert_eq!(db.pixel_sizes("helvetica", "Normal"), vec![10, 12]);
        assert_eq!(db.point_sizes("helvetica", "Bold Oblique"), PointSizes::Sizes(vec![12]));
        assert_eq!(db.point_sizes("helvetica", "Black"), PointSizes::Sizes(vec![]));

        let normal = &db.family("helvetica").unwrap().foundries["adobe"].styles[&StyleKey::default()];
        assert!(normal.smooth_scalable);
        assert!(!normal.bitmap_scalable);
        assert_eq!(normal.weight_name, "medium");
        assert_eq!(normal.sizes[&12].encodings.len(), 2);
        assert_eq!(normal.sizes[&12].encodings[0].pitch, 'p');
    }

    #[test]
    fn test_point_sizes_use_resolution() {
        let driver = HeadlessFontDriver::with_names([
            "-adobe-times-medium-r-normal--14-100-100-100-p-74-iso8859-1",
            "-adobe-times-medium-r-normal--25-180-100-100-p-128-iso8859-1",
        ]);
        let mut db = FontDatabase::new(100, 0xffff);
        db.populate(&driver, Some("times"), None);
        // 14px at 100 dpi is 10pt, 25px is 18pt.
        assert_eq!(db.point_sizes("times", "Normal"), PointSizes::Sizes(vec![10, 18]));
    }

    #[test]
    fn test_bitmap_scalable_style() {
        let driver = driver();
        let mut db = FontDatabase::new(75, 0xffff);
        db.populate(&driver, Some("new century schoolbook"), None);
        let family = db.family("New Century Schoolbook").unwrap();
        let style = family.styles().next().unwrap();
        assert!(style.bitmap_scalable);
        assert!(!style.smooth_scalable);
        assert_eq!(db.point_sizes("new century schoolbook", "Italic"), PointSizes::Sizes(vec![]));
    }

    #[test_log::test]
    fn test_family_population_is_idempotent() {
        let driver = driver();
        let mut db = FontDatabase::new(75, 0xffff);
        db.populate(&driver, Some("helvetica"), None);
        assert!(db.is_fully_loaded("helvetica"));
        let calls = driver.list_calls();
        db.populate(&driver, Some("helvetica"), None);
        db.populate(&driver, Some("Helvetica"), Some(Script::Greek));
        assert_eq!(driver.list_calls(), calls);
        // Only the requested family was listed.
        assert_eq!(db.families(), vec!["Helvetica"]);
    }

    #[test_log::test]
    fn test_script_population_lists_each_encoding_once() {
        let driver = driver();
        let mut db = FontDatabase::new(75, 0xffff);
        db.populate(&driver, None, Some(Script::HanJapanese));
        let calls = driver.list_calls();
        assert_eq!(calls, encodings_for_script(Script::HanJapanese).count());
        assert_eq!(db.families(), vec!["Fixed"]);
        assert!(!db.family("fixed").unwrap().xlfd_loaded);

        db.populate(&driver, None, Some(Script::HanJapanese));
        assert_eq!(driver.list_calls(), calls);
    }

    #[test_log::test]
    fn test_outline_faces() {
        let driver = HeadlessFontDriver::new().with_outline_faces(vec![
            OutlineFace::new("DejaVu Sans", OUTLINE_WEIGHT_MEDIUM, OUTLINE_SLANT_ROMAN, OUTLINE_PROPORTIONAL),
            OutlineFace::new("DejaVu Sans", OUTLINE_WEIGHT_MEDIUM, OUTLINE_SLANT_OBLIQUE, OUTLINE_PROPORTIONAL),
            OutlineFace::new("DejaVu Sans", OUTLINE_WEIGHT_BOLD, OUTLINE_SLANT_ROMAN, OUTLINE_PROPORTIONAL),
            OutlineFace::new("DejaVu Sans Mono", OUTLINE_WEIGHT_MEDIUM, OUTLINE_SLANT_ROMAN, OUTLINE_MONO),
        ]);
        let mut db = FontDatabase::new(75, 0xffff);
        db.load_outline_faces(&driver);

        let sans = db.family("dejavu sans").unwrap();
        assert!(sans.has_outline);
        assert!(!sans.fixed_pitch);
        assert_eq!(db.styles("DejaVu Sans"), vec!["Normal", "Bold", "Oblique", "Bold Oblique"]);
        let foundry = &sans.foundries[""];
        let bold_oblique = StyleKey {
            oblique: true,
            weight: WEIGHT_BOLD,
            ..Default::default()
        };
        assert!(foundry.styles[&bold_oblique].fake_oblique);
        // A real oblique exists for the normal weight.
        assert!(!foundry.styles[&StyleKey { oblique: true, ..Default::default() }].fake_oblique);

        let mono = db.family("DejaVu Sans Mono").unwrap();
        assert!(mono.fixed_pitch);
        let fake = &mono.foundries[""].styles[&StyleKey { oblique: true, ..Default::default() }];
        assert_eq!(fake.sizes[&SMOOTH_SCALABLE].encodings[0].pitch, 'm');
        assert_eq!(db.point_sizes("dejavu sans mono", "Oblique"), PointSizes::Scalable);

        // Outline families are not re-listed for scripts.
        let calls = driver.list_calls();
        db.populate(&driver, Some("DejaVu Sans"), Some(Script::Latin));
        assert_eq!(driver.list_calls(), calls);
    }
}
