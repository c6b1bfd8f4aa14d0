//! Registry-encoding table for core X fonts.
//!
//! Maps the `registry-encoding` pair of an XLFD name (`iso8859-1`,
//! `jisx0208.1983-0`, ...) to a small integer id, the MIB number of the
//! matching text codec, and the set of writing scripts the encoding covers.
//! Some table entries carry `*` wildcards; those are matched after the
//! literal entries, in table order.

use bitflags::bitflags;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Writing scripts a font encoding can cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Script {
    Latin = 0,
    Greek,
    Cyrillic,
    Armenian,
    Georgian,
    Runic,
    Ogham,
    SpacingModifiers,
    CombiningMarks,
    Hebrew,
    Arabic,
    Syriac,
    Thaana,
    Devanagari,
    Bengali,
    Gurmukhi,
    Gujarati,
    Oriya,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Sinhala,
    Thai,
    Lao,
    Tibetan,
    Myanmar,
    Khmer,
    Han,
    Hiragana,
    Katakana,
    Hangul,
    Bopomofo,
    Yi,
    Ethiopic,
    Cherokee,
    CanadianAboriginal,
    Mongolian,
    CurrencySymbols,
    LetterlikeSymbols,
    NumberForms,
    MathematicalOperators,
    TechnicalSymbols,
    GeometricSymbols,
    MiscellaneousSymbols,
    EnclosedAndSquare,
    Braille,
    Unicode,
    Tagalog,
    Hanunoo,
    Buhid,
    Tagbanwa,
    KatakanaHalfWidth,
    Unknown,
    NoScript,
    HanJapanese,
    HanSimplifiedChinese,
    HanTraditionalChinese,
}

impl Script {
    pub const COUNT: usize = 58;

    pub const ALL: [Script; Script::COUNT] = [
        Script::Latin,
        Script::Greek,
        Script::Cyrillic,
        Script::Armenian,
        Script::Georgian,
        Script::Runic,
        Script::Ogham,
        Script::SpacingModifiers,
        Script::CombiningMarks,
        Script::Hebrew,
        Script::Arabic,
        Script::Syriac,
        Script::Thaana,
        Script::Devanagari,
        Script::Bengali,
        Script::Gurmukhi,
        Script::Gujarati,
        Script::Oriya,
        Script::Tamil,
        Script::Telugu,
        Script::Kannada,
        Script::Malayalam,
        Script::Sinhala,
        Script::Thai,
        Script::Lao,
        Script::Tibetan,
        Script::Myanmar,
        Script::Khmer,
        Script::Han,
        Script::Hiragana,
        Script::Katakana,
        Script::Hangul,
        Script::Bopomofo,
        Script::Yi,
        Script::Ethiopic,
        Script::Cherokee,
        Script::CanadianAboriginal,
        Script::Mongolian,
        Script::CurrencySymbols,
        Script::LetterlikeSymbols,
        Script::NumberForms,
        Script::MathematicalOperators,
        Script::TechnicalSymbols,
        Script::GeometricSymbols,
        Script::MiscellaneousSymbols,
        Script::EnclosedAndSquare,
        Script::Braille,
        Script::Unicode,
        Script::Tagalog,
        Script::Hanunoo,
        Script::Buhid,
        Script::Tagbanwa,
        Script::KatakanaHalfWidth,
        Script::Unknown,
        Script::NoScript,
        Script::HanJapanese,
        Script::HanSimplifiedChinese,
        Script::HanTraditionalChinese,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for Script {
    type Err = anyhow::Error;

    /// Case-insensitive variant name, e.g. `latin`, `HanJapanese`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Script::ALL
            .iter()
            .copied()
            .find(|script| script.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("unknown script '{}'", s))
    }
}

bitflags! {
    /// A set of [`Script`]s, one bit per script index.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct ScriptSet: u64 {
        const _ = !0;
    }
}

impl ScriptSet {
    pub fn of(scripts: &[Script]) -> Self {
        scripts
            .iter()
            .fold(ScriptSet::empty(), |set, &script| set | ScriptSet::single(script))
    }

    #[inline]
    pub fn single(script: Script) -> Self {
        ScriptSet::from_bits_retain(1u64 << script.index())
    }

    /// Every script tag.
    pub fn every() -> Self {
        ScriptSet::from_bits_retain((1u64 << Script::COUNT) - 1)
    }

    #[inline]
    pub fn has(&self, script: Script) -> bool {
        self.contains(ScriptSet::single(script))
    }

    pub fn scripts(&self) -> impl Iterator<Item = Script> + '_ {
        Script::ALL.iter().copied().filter(move |&s| self.has(s))
    }
}

/// Index into the encoding table; `EncodingId::ANY` stands for "any encoding".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EncodingId(i16);

impl EncodingId {
    pub const ANY: EncodingId = EncodingId(-1);
    pub const ISO8859_1: EncodingId = EncodingId(0);
    pub const ISO10646_1: EncodingId = EncodingId(29);
    pub const UNICODE: EncodingId = EncodingId(30);

    /// `None` when `index` is outside the table.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < ENCODINGS.len()).then(|| EncodingId(index as i16))
    }

    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok().filter(|&i| i < ENCODINGS.len())
    }

    pub fn raw(self) -> i16 {
        self.0
    }

    /// All table entries, in table order.
    pub fn all() -> impl Iterator<Item = EncodingId> {
        (0..ENCODINGS.len()).map(|i| EncodingId(i as i16))
    }

    pub fn name(self) -> &'static str {
        encoding_name(self)
    }

    pub fn scripts(self) -> ScriptSet {
        scripts_for_encoding(self)
    }

    /// Unicode-indexed fonts can cover any script.
    pub fn is_unicode(self) -> bool {
        self == EncodingId::ISO10646_1 || self == EncodingId::UNICODE
    }
}

struct XlfdEncoding {
    name: &'static str,
    mib: i32,
    scripts: &'static [Script],
}

const fn enc(name: &'static str, mib: i32, scripts: &'static [Script]) -> XlfdEncoding {
    XlfdEncoding { name, mib, scripts }
}

use Script::*;

// Row index is the encoding id.
static ENCODINGS: [XlfdEncoding; 33] = [
    enc("iso8859-1", 0, &[Latin]),
    enc("iso8859-2", 5, &[Latin]),
    enc("iso8859-3", 6, &[Latin]),
    enc("iso8859-4", 7, &[Latin]),
    enc("iso8859-14", 110, &[Latin]),
    enc("iso8859-15", 111, &[Latin]),
    enc("iso8859-5", 8, &[Cyrillic]),
    enc("*-cp1251", 2251, &[Cyrillic]),
    enc("koi8-ru", 2084, &[Cyrillic]),
    enc("koi8-u", 2088, &[Cyrillic]),
    enc("koi8-r", 2084, &[Cyrillic]),
    enc("iso8859-7", 10, &[Greek]),
    enc("iso8859-6", 82, &[Arabic]),
    enc("iso8859-8", 85, &[Hebrew]),
    enc("gb18030-0", -114, &[Han, Bopomofo, HanSimplifiedChinese]),
    enc("gb18030.2000-0", -113, &[Han, HanSimplifiedChinese]),
    enc("gbk-0", -113, &[Han, HanSimplifiedChinese]),
    enc("gb2312.*-0", 57, &[Han, HanSimplifiedChinese]),
    enc("jisx0201*-0", 15, &[Katakana, KatakanaHalfWidth]),
    enc("jisx0208*-0", 63, &[Han, Hiragana, Katakana, HanJapanese]),
    enc("ksc5601.1987-0", 36, &[Han, Hangul]),
    enc("big5hkscs-0", -2101, &[Han]),
    enc("hkscs-1", -2101, &[Han, HanTraditionalChinese]),
    enc("big5*-*", -2026, &[Han, HanTraditionalChinese]),
    enc("tscii-*", 2028, &[Tamil]),
    enc("tis620*-*", 2259, &[Thai]),
    enc("iso8859-11", 2259, &[Thai]),
    enc("mulelao-1", -4242, &[Lao]),
    enc("ethiopic-unicode", 0, &[Ethiopic]),
    enc("iso10646-1", 0, &[Unicode]),
    enc("unicode-*", 0, &[Unicode]),
    enc("*-symbol", 0, &[Unknown]),
    enc("*-fontspecific", 0, &[Unknown]),
];

static LITERAL_ENCODINGS: Lazy<HashMap<&'static str, EncodingId>> = Lazy::new(|| {
    ENCODINGS
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.name.contains('*'))
        .map(|(i, e)| (e.name, EncodingId(i as i16)))
        .collect()
});

/// Looks up the id of a `registry-encoding` name.
pub fn lookup_encoding(name: &str) -> Option<EncodingId> {
    if let Some(&id) = LITERAL_ENCODINGS.get(name) {
        return Some(id);
    }
    ENCODINGS
        .iter()
        .position(|e| e.name.contains('*') && wildcard_match(e.name, name))
        .map(|i| EncodingId(i as i16))
}

/// Table name for `id`; `"*-*"` for `ANY` or an out-of-range id.
pub fn encoding_name(id: EncodingId) -> &'static str {
    id.index().map_or("*-*", |i| ENCODINGS[i].name)
}

/// MIB number of the text codec for an encoding name, 0 when unknown.
pub fn mib_for_encoding(name: &str) -> i32 {
    lookup_encoding(name)
        .and_then(EncodingId::index)
        .map_or(0, |i| ENCODINGS[i].mib)
}

pub fn scripts_for_encoding(id: EncodingId) -> ScriptSet {
    id.index()
        .map_or(ScriptSet::empty(), |i| ScriptSet::of(ENCODINGS[i].scripts))
}

/// Encodings whose script set contains `script`.
pub fn encodings_for_script(script: Script) -> impl Iterator<Item = EncodingId> {
    EncodingId::all().filter(move |id| id.scripts().has(script))
}

// A `*` in the pattern swallows input up to the next literal pattern
// character. There is no backtracking.
fn wildcard_match(pattern: &str, input: &str) -> bool {
    let pattern = pattern.as_bytes();
    let input = input.as_bytes();
    let (mut p, mut i) = (0, 0);
    loop {
        let Some(&want) = pattern.get(p) else {
            return i == input.len();
        };
        if input.get(i) == Some(&want) {
            p += 1;
            i += 1;
            continue;
        }
        if want != b'*' {
            return false;
        }
        p += 1;
        let next = pattern.get(p).copied();
        while i < input.len() && Some(input[i]) != next {
            i += 1;
        }
    }
}
