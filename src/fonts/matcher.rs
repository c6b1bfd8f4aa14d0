//! Scores one candidate font name against a font request.
//!
//! Every satisfied criterion sets one bit of [`MatchFlags`]. The bit values
//! encode the priority of the criteria: a charset match outweighs everything
//! below it, and so on down to the width. A candidate that satisfies every
//! criterion at exactly the requested size gets [`Score::Exact`], which
//! outranks any bitmask.

use super::encoding::lookup_encoding;
use super::request::{FontRequest, WEIGHT_BLACK, WEIGHT_BOLD, WEIGHT_DEMI_BOLD, WEIGHT_LIGHT, WEIGHT_NORMAL};
use super::xlfd::{atoi, Field, XlfdName};
use bitflags::bitflags;
use log::trace;
use serde::Serialize;
use std::cmp::Ordering;

/// Numeric value reported for an exact match.
pub const EXACT_SCORE: u32 = 0xffff;

/// Relative point-size difference, in percent, still counted as "right size".
pub const SIZE_TOLERANCE_PERCENT: f32 = 20.0;

/// Deltas that any real candidate beats.
const WORST_POINT_DELTA: f32 = 99.0;
const WORST_WEIGHT_DELTA: u32 = 99;

bitflags! {
    /// Criteria a candidate satisfied.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct MatchFlags: u32 {
        const WIDTH = 0x01;
        const SLANT = 0x02;
        const WEIGHT = 0x04;
        const SIZE = 0x08;
        const RESOLUTION = 0x10;
        const PITCH = 0x20;
        const CHARSET = 0x40;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Score {
    Exact,
    Partial(MatchFlags),
}

impl Score {
    pub const NONE: Score = Score::Partial(MatchFlags::empty());

    pub fn value(self) -> u32 {
        match self {
            Score::Exact => EXACT_SCORE,
            Score::Partial(flags) => flags.bits(),
        }
    }

    pub fn is_exact(self) -> bool {
        self == Score::Exact
    }

    pub fn is_zero(self) -> bool {
        self == Score::NONE
    }
}

impl Default for Score {
    fn default() -> Self {
        Score::NONE
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value())
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Score of a single candidate plus its tie-break deltas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchScore {
    pub score: Score,
    /// Size difference in percent of the requested size.
    pub point_size_delta: f32,
    pub weight_delta: u32,
    pub scalable: bool,
    pub polymorphic: bool,
}

impl Default for MatchScore {
    fn default() -> Self {
        MatchScore {
            score: Score::NONE,
            point_size_delta: WORST_POINT_DELTA,
            weight_delta: WORST_WEIGHT_DELTA,
            scalable: false,
            polymorphic: false,
        }
    }
}

impl MatchScore {
    /// Higher score wins; ties go to the smaller size delta, then to the
    /// smaller weight delta.
    pub fn is_better_than(&self, other: &MatchScore) -> bool {
        match self.score.cmp(&other.score) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => {
                self.point_size_delta < other.point_size_delta
                    || (self.point_size_delta == other.point_size_delta
                        && self.weight_delta < other.weight_delta)
            }
        }
    }
}

/// Resolution of the first candidate in a pass that carries one. Later
/// candidates only earn the resolution bit if they agree with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveredResolution {
    x: u32,
    y: u32,
}

impl DiscoveredResolution {
    pub fn get(&self) -> Option<(u32, u32)> {
        (self.x != 0 && self.y != 0).then_some((self.x, self.y))
    }
}

// --- Weight tokens ---

/// Weight read from an XLFD weight token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedWeight {
    /// Canonical weight on the 0..=99 scale.
    pub value: u32,
    /// The token was one of the well-known names rather than a guess.
    pub exact: bool,
}

impl ParsedWeight {
    /// Weight used for scoring: guesses are nudged just below the canonical
    /// value (Normal by two) so they never tie with a real match.
    pub fn adjusted(self) -> u32 {
        match (self.exact, self.value) {
            (true, v) => v,
            (false, WEIGHT_NORMAL) => WEIGHT_NORMAL - 2,
            (false, v) => v - 1,
        }
    }
}

pub fn parse_weight(token: &str) -> ParsedWeight {
    let exact = |value| ParsedWeight { value, exact: true };
    let guess = |value| ParsedWeight { value, exact: false };
    match token {
        "medium" => return exact(WEIGHT_NORMAL),
        "bold" => return exact(WEIGHT_BOLD),
        "demibold" => return exact(WEIGHT_DEMI_BOLD),
        "black" => return exact(WEIGHT_BLACK),
        "light" => return exact(WEIGHT_LIGHT),
        _ => {}
    }
    let lower = token.to_ascii_lowercase();
    if lower.contains("bold") {
        guess(WEIGHT_BOLD)
    } else if lower.contains("light") {
        guess(WEIGHT_LIGHT)
    } else if lower.contains("black") {
        guess(WEIGHT_BLACK)
    } else {
        guess(WEIGHT_NORMAL)
    }
}

// --- Scoring ---

/// Scores `candidate` against `request`.
///
/// `resolution` is shared by all candidates of one enumeration pass.
pub fn score_candidate(
    candidate: &XlfdName<'_>,
    request: &FontRequest,
    resolution: &mut DiscoveredResolution,
) -> MatchScore {
    let mut flags = MatchFlags::empty();
    let polymorphic = candidate.is_polymorphic();
    let scalable = candidate.is_scalable();

    let unicode = lookup_encoding(&candidate.encoding_name()).is_some_and(|id| id.is_unicode());
    if unicode
        || request
            .charset
            .accepts(candidate.charset_registry(), candidate.charset_encoding())
    {
        flags |= MatchFlags::CHARSET;
    }

    let pitch = candidate.spacing_char();
    let pitch_ok = if request.fixed_pitch {
        matches!(pitch, Some('m') | Some('c'))
    } else {
        pitch == Some('p')
    };
    if pitch_ok {
        flags |= MatchFlags::PITCH;
    }

    if candidate.is_zero(Field::ResolutionX) && candidate.is_zero(Field::ResolutionY) {
        flags |= MatchFlags::RESOLUTION;
    } else {
        let x = candidate.numeric(Field::ResolutionX);
        let y = candidate.numeric(Field::ResolutionY);
        if resolution.get().is_none() {
            *resolution = DiscoveredResolution { x, y };
        }
        if (x, y) == (resolution.x, resolution.y) {
            flags |= MatchFlags::RESOLUTION;
        }
    }

    let wanted = request.deci_point_size;
    let size = if scalable {
        wanted
    } else {
        atoi(candidate.point_size())
    };
    let point_size_delta = if wanted != 0 {
        size.abs_diff(wanted) as f32 / wanted as f32 * 100.0
    } else {
        size as f32
    };
    if point_size_delta < SIZE_TOLERANCE_PERCENT {
        flags |= MatchFlags::SIZE;
    }

    let weight = parse_weight(candidate.weight()).adjusted();
    if weight == request.weight {
        flags |= MatchFlags::WEIGHT;
    }
    let weight_delta = weight.abs_diff(request.weight);

    let slant = candidate.slant().chars().next().map(|c| c.to_ascii_lowercase());
    let slant_ok = if request.italic {
        matches!(slant, Some('i') | Some('o'))
    } else {
        slant == Some('r')
    };
    if slant_ok {
        flags |= MatchFlags::SLANT;
    }

    if candidate.width().eq_ignore_ascii_case("normal") {
        flags |= MatchFlags::WIDTH;
    }

    let score = if flags == MatchFlags::all() && size == wanted {
        Score::Exact
    } else {
        Score::Partial(flags)
    };
    trace!("score {:#06x} for {}", score.value(), candidate);

    MatchScore {
        score,
        point_size_delta,
        weight_delta,
        scalable,
        polymorphic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::request::CharSet;

    fn score(name: &str, request: &FontRequest) -> MatchScore {
        let xlfd = XlfdName::parse(name).unwrap();
        score_candidate(&xlfd, request, &mut DiscoveredResolution::default())
    }

    fn helvetica_12() -> FontRequest {
        FontRequest::new("helvetica", 12)
    }

    #[test]
    fn test_exact_match() {
        let s = score(
            "-adobe-helvetica-medium-r-normal--12-120-75-75-p-67-iso8859-1",
            &helvetica_12(),
        );
        assert_eq!(s.score, Score::Exact);
        assert_eq!(s.score.value(), EXACT_SCORE);
        assert_eq!(s.point_size_delta, 0.0);
        assert_eq!(s.weight_delta, 0);
        assert!(!s.scalable);
    }

    #[test]
    fn test_size_within_tolerance_is_not_exact() {
        let s = score(
            "-adobe-helvetica-medium-r-normal--14-140-75-75-p-77-iso8859-1",
            &helvetica_12(),
        );
        assert_eq!(s.score, Score::Partial(MatchFlags::all()));
        assert!((s.point_size_delta - 16.666_666).abs() < 0.01);
    }

    #[test]
    fn test_size_outside_tolerance() {
        let s = score(
            "-adobe-helvetica-medium-r-normal--18-180-75-75-p-98-iso8859-1",
            &helvetica_12(),
        );
        assert_eq!(s.score, Score::Partial(MatchFlags::all() - MatchFlags::SIZE));
        assert_eq!(s.point_size_delta, 50.0);
    }

    #[test]
    fn test_size_tolerance_boundary() {
        let ten = FontRequest::new("helvetica", 10);
        for name in [
            "-adobe-helvetica-medium-r-normal--16-120-75-75-p-88-iso8859-1",
            "-adobe-helvetica-medium-r-normal--11-80-75-75-p-50-iso8859-1",
        ] {
            let s = score(name, &ten);
            assert_eq!(s.point_size_delta, 20.0);
            assert_eq!(s.score, Score::Partial(MatchFlags::all() - MatchFlags::SIZE));
        }

        let inside = score("-adobe-helvetica-medium-r-normal--16-119-75-75-p-88-iso8859-1", &ten);
        assert!((inside.point_size_delta - 19.0).abs() < 1e-4);
        assert_eq!(inside.score, Score::Partial(MatchFlags::all()));
    }

    #[test]
    fn test_zero_requested_size_uses_candidate_size_as_delta() {
        let mut req = helvetica_12();
        req.deci_point_size = 0;
        let s = score("-adobe-helvetica-medium-r-normal--12-120-75-75-p-67-iso8859-1", &req);
        assert_eq!(s.point_size_delta, 120.0);
        assert!(!s.score.is_exact());
    }

    #[test]
    fn test_scalable_candidate_takes_requested_size() {
        let req = FontRequest::new("charter", 11);
        let s = score("-bitstream-charter-medium-r-normal--0-0-0-0-p-0-iso8859-1", &req);
        assert!(s.scalable);
        assert_eq!(s.point_size_delta, 0.0);
        assert_eq!(s.score, Score::Exact);
    }

    #[test]
    fn test_charset_mismatch_and_unicode() {
        let s = score(
            "-adobe-helvetica-medium-r-normal--12-120-75-75-p-67-iso8859-2",
            &helvetica_12(),
        );
        assert_eq!(s.score, Score::Partial(MatchFlags::all() - MatchFlags::CHARSET));

        let s = score(
            "-misc-fixed-medium-r-normal--12-120-75-75-p-60-iso10646-1",
            &helvetica_12(),
        );
        assert_eq!(s.score, Score::Exact);

        let req = helvetica_12().with_charset(CharSet::Any);
        let s = score("-misc-fixed-medium-r-normal--12-120-75-75-p-60-jisx0208.1983-0", &req);
        assert!(matches!(s.score, Score::Exact));
    }

    #[test]
    fn test_koi8_encodings() {
        let req = helvetica_12().with_charset(CharSet::Koi8R);
        for enc in ["koi8-r", "koi8-1"] {
            let name = format!("-cronyx-helvetica-medium-r-normal--12-120-75-75-p-70-{}", enc);
            assert!(score(&name, &req).score.is_exact(), "{}", enc);
        }
        let s = score("-cronyx-helvetica-medium-r-normal--12-120-75-75-p-70-koi8-u", &req);
        assert!(!s.score.is_exact());
    }

    #[test]
    fn test_pitch() {
        let fixed = helvetica_12().with_fixed_pitch(true);
        let s = score("-misc-fixed-medium-r-normal--12-120-75-75-C-60-iso8859-1", &fixed);
        assert!(s.score.is_exact());
        let s = score("-adobe-helvetica-medium-r-normal--12-120-75-75-p-67-iso8859-1", &fixed);
        assert_eq!(s.score, Score::Partial(MatchFlags::all() - MatchFlags::PITCH));
        let s = score("-misc-fixed-medium-r-normal--12-120-75-75-m-60-iso8859-1", &helvetica_12());
        assert_eq!(s.score, Score::Partial(MatchFlags::all() - MatchFlags::PITCH));
    }

    #[test]
    fn test_resolution_is_fixed_by_first_candidate() {
        let req = helvetica_12();
        let mut res = DiscoveredResolution::default();
        let a = XlfdName::parse("-adobe-helvetica-medium-r-normal--17-120-100-100-p-88-iso8859-1").unwrap();
        let b = XlfdName::parse("-adobe-helvetica-medium-r-normal--12-120-75-75-p-67-iso8859-1").unwrap();
        let c = XlfdName::parse("-adobe-helvetica-medium-r-normal--0-0-0-0-p-0-iso8859-1").unwrap();

        assert!(score_candidate(&c, &req, &mut res).score.is_exact());
        assert_eq!(res.get(), None);
        assert!(score_candidate(&a, &req, &mut res).score.is_exact());
        assert_eq!(res.get(), Some((100, 100)));
        let s = score_candidate(&b, &req, &mut res);
        assert_eq!(s.score, Score::Partial(MatchFlags::all() - MatchFlags::RESOLUTION));
    }

    #[test]
    fn test_weight_slant_width() {
        let bold_italic = helvetica_12().with_weight(WEIGHT_BOLD).with_italic(true);
        let s = score("-adobe-helvetica-bold-o-normal--12-120-75-75-p-69-iso8859-1", &bold_italic);
        assert!(s.score.is_exact());

        let s = score("-adobe-helvetica-bold-r-normal--12-120-75-75-p-69-iso8859-1", &helvetica_12());
        assert_eq!(s.score, Score::Partial(MatchFlags::all() - MatchFlags::WEIGHT));
        assert_eq!(s.weight_delta, 25);

        let s = score(
            "-adobe-helvetica-medium-r-Narrow--12-120-75-75-p-67-iso8859-1",
            &helvetica_12(),
        );
        assert_eq!(s.score, Score::Partial(MatchFlags::all() - MatchFlags::WIDTH));
        let s = score(
            "-adobe-helvetica-medium-r-NORMAL--12-120-75-75-p-67-iso8859-1",
            &helvetica_12(),
        );
        assert!(s.score.is_exact());
    }

    #[test]
    fn test_weight_tokens() {
        assert_eq!(parse_weight("medium"), ParsedWeight { value: 50, exact: true });
        assert_eq!(parse_weight("demibold").adjusted(), 63);
        assert_eq!(parse_weight("Bold"), ParsedWeight { value: 75, exact: false });
        assert_eq!(parse_weight("extrabold").adjusted(), 74);
        assert_eq!(parse_weight("ultralight").adjusted(), 24);
        assert_eq!(parse_weight("extrablack").adjusted(), 86);
        assert_eq!(parse_weight("regular").adjusted(), 48);
        assert_eq!(parse_weight("regular").value, 50);
    }

    #[test]
    fn test_polymorphic_flag() {
        let s = score("-adobe-utopia-0-0-0--0-0-0-0-p-0-iso8859-1", &helvetica_12());
        assert!(s.polymorphic);
        assert!(s.scalable);
    }

    #[test]
    fn test_more_criteria_never_scores_lower() {
        let req = helvetica_12();
        let worse = score("-adobe-helvetica-bold-i-narrow--12-120-75-75-m-67-iso8859-2", &req);
        let better = score("-adobe-helvetica-medium-i-narrow--12-120-75-75-m-67-iso8859-2", &req);
        assert!(better.score > worse.score);
        assert!(better.is_better_than(&worse));
    }

    #[test]
    fn test_tie_breaks() {
        let base = MatchScore {
            score: Score::Partial(MatchFlags::CHARSET),
            point_size_delta: 10.0,
            weight_delta: 5,
            scalable: false,
            polymorphic: false,
        };
        let closer = MatchScore { point_size_delta: 5.0, ..base };
        let lighter = MatchScore { weight_delta: 1, ..base };
        assert!(closer.is_better_than(&base));
        assert!(lighter.is_better_than(&base));
        assert!(!base.is_better_than(&base));
        assert!(base.is_better_than(&MatchScore::default()));
    }
}
