//! Picks the best font for a request out of everything an enumeration pattern
//! matches.

use super::font_driver::FontDriver;
use super::matcher::{score_candidate, DiscoveredResolution, MatchScore, Score};
use super::request::{CharSet, FontRequest};
use super::xlfd::XlfdName;
use crate::config::ListingConfig;
use log::{debug, trace, warn};
use serde::Serialize;

/// Resolution assumed when no candidate in a pass specified one.
pub const DEFAULT_RESOLUTION: u32 = 75;

/// Winner of a selection pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestMatch {
    /// Loadable font name. For a scalable winner this is a synthesised name
    /// carrying the requested size.
    pub name: String,
    pub score: Score,
}

/// Lists font names matching `pattern`, growing the result buffer until
/// the server returns fewer names than asked for or the cap is reached.
pub fn list_font_names<D: FontDriver>(driver: &D, pattern: &str, limits: &ListingConfig) -> Vec<String> {
    let cap = limits.max_capacity.max(1);
    let mut max = limits.initial_capacity.clamp(1, cap);
    loop {
        let names = match driver.list_fonts(pattern, max) {
            Ok(names) => names,
            Err(e) => {
                warn!("Listing fonts for '{}' failed: {:#}", pattern, e);
                return Vec::new();
            }
        };
        if names.len() < max || max >= cap {
            trace!("'{}' matched {} font names (buffer {})", pattern, names.len(), max);
            return names;
        }
        max = max.saturating_mul(2).min(cap);
    }
}

/// Bitmap candidates and scalable candidates compete separately.
struct Running {
    score: MatchScore,
    name: Option<String>,
}

impl Running {
    fn new() -> Self {
        Running {
            score: MatchScore::default(),
            name: None,
        }
    }

    fn offer(&mut self, score: MatchScore, name: &str) {
        let replace = match &self.name {
            None => true,
            // Full ties go to the lexically smaller name so the outcome is
            // independent of enumeration order.
            Some(current) => {
                score.is_better_than(&self.score)
                    || (!self.score.is_better_than(&score) && name < current.as_str())
            }
        };
        if replace {
            self.score = score;
            self.name = Some(name.to_string());
        }
    }
}

/// Scores every font matching `pattern` and returns the best one, or `None`
/// when nothing scored above zero.
///
/// A smoothly scalable candidate beats the best bitmap font when it scores
/// higher, or scores the same while the bitmap is off-size or further from
/// the requested weight. It is returned re-synthesised at the requested size.
pub fn select_best<D: FontDriver>(
    driver: &D,
    pattern: &str,
    request: &FontRequest,
    limits: &ListingConfig,
) -> Option<BestMatch> {
    let names = list_font_names(driver, pattern, limits);
    if request.charset == CharSet::Any {
        warn!("Font request {} uses CharSet::Any; every encoding will match", request);
    }

    let mut resolution = DiscoveredResolution::default();
    let mut best = Running::new();
    let mut best_scalable = Running::new();

    for name in &names {
        let Some(xlfd) = XlfdName::parse(name) else {
            trace!("Skipping non-XLFD name '{}'", name);
            continue;
        };
        let score = score_candidate(&xlfd, request, &mut resolution);
        if score.scalable {
            best_scalable.offer(score, name);
        } else {
            best.offer(score, name);
        }
    }

    let mut winner = best.name.as_ref().map(|name| BestMatch {
        name: name.clone(),
        score: best.score.score,
    });

    if !best.score.score.is_exact() {
        if let Some(scalable_name) = &best_scalable.name {
            let (b, s) = (&best.score, &best_scalable.score);
            let prefer_scalable = best.name.is_none()
                || s.score > b.score
                || (s.score == b.score
                    && (b.point_size_delta != 0.0 || b.weight_delta > s.weight_delta));
            if prefer_scalable {
                match synthesize_scalable(scalable_name, request, resolution) {
                    Some(name) => {
                        winner = Some(BestMatch {
                            name,
                            score: s.score,
                        })
                    }
                    // Only bitmap-scalable fonts: open the listed name as is.
                    None if winner.is_none() => {
                        debug!("'{}' has only bitmap-scalable fonts; using '{}'", pattern, scalable_name);
                        winner = Some(BestMatch {
                            name: scalable_name.clone(),
                            score: s.score,
                        });
                    }
                    None => {}
                }
            }
        }
    }

    match winner {
        Some(found) if !found.score.is_zero() => {
            debug!(
                "Best match for '{}': {} (score {:#06x})",
                pattern,
                found.name,
                found.score.value()
            );
            Some(found)
        }
        _ => {
            debug!("No usable match for '{}' among {} names", pattern, names.len());
            None
        }
    }
}

// `None` if the candidate has a fixed resolution, i.e. it is only
// bitmap-scalable.
fn synthesize_scalable(
    name: &str,
    request: &FontRequest,
    resolution: DiscoveredResolution,
) -> Option<String> {
    let xlfd = XlfdName::parse(name)?;
    if !xlfd.is_smoothly_scalable() {
        trace!("'{}' is scalable but not smoothly scalable", name);
        return None;
    }
    let (res_x, res_y) = resolution
        .get()
        .unwrap_or((DEFAULT_RESOLUTION, DEFAULT_RESOLUTION));
    Some(xlfd.with_size(request.deci_point_size, res_x, res_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::headless_font_driver::HeadlessFontDriver;
    use crate::fonts::matcher::MatchFlags;
    use crate::fonts::request::WEIGHT_BOLD;
    use crate::fonts::xlfd::family_pattern;

    fn limits() -> ListingConfig {
        ListingConfig::default()
    }

    #[test]
    fn test_exact_bitmap_wins() {
        let driver = HeadlessFontDriver::with_names([
            "-adobe-helvetica-medium-r-normal--10-100-75-75-p-56-iso8859-1",
            "-adobe-helvetica-medium-r-normal--12-120-75-75-p-67-iso8859-1",
            "-adobe-helvetica-bold-r-normal--12-120-75-75-p-70-iso8859-1",
            "-adobe-helvetica-medium-r-normal--0-0-0-0-p-0-iso8859-1",
        ]);
        let best = select_best(
            &driver,
            &family_pattern("helvetica"),
            &FontRequest::new("helvetica", 12),
            &limits(),
        )
        .unwrap();
        assert_eq!(best.name, "-adobe-helvetica-medium-r-normal--12-120-75-75-p-67-iso8859-1");
        assert_eq!(best.score, Score::Exact);
    }

    #[test]
    fn test_scalable_is_synthesised_at_requested_size() {
        let driver = HeadlessFontDriver::with_names([
            "-adobe-helvetica-medium-r-normal--10-100-100-100-p-56-iso8859-1",
            "-adobe-helvetica-medium-r-normal--0-0-0-0-p-0-iso8859-1",
        ]);
        let best = select_best(
            &driver,
            &family_pattern("helvetica"),
            &FontRequest::new("helvetica", 14),
            &limits(),
        )
        .unwrap();
        // The bitmap fixed the resolution for the pass.
        assert_eq!(best.name, "-adobe-helvetica-medium-r-normal--*-140-100-100-p-*-iso8859-1");
        assert!(best.score.is_exact());
    }

    #[test]
    fn test_bitmap_scalable_is_not_synthesised() {
        let driver = HeadlessFontDriver::with_names([
            "-adobe-helvetica-medium-r-normal--10-100-75-75-p-56-iso8859-1",
            "-adobe-helvetica-medium-r-normal--0-0-75-75-p-0-iso8859-1",
        ]);
        let best = select_best(
            &driver,
            &family_pattern("helvetica"),
            &FontRequest::new("helvetica", 14),
            &limits(),
        )
        .unwrap();
        assert_eq!(best.name, "-adobe-helvetica-medium-r-normal--10-100-75-75-p-56-iso8859-1");
        assert_eq!(best.score, Score::Partial(MatchFlags::all() - MatchFlags::SIZE));
    }

    #[test]
    fn test_bitmap_scalable_only_family_is_kept() {
        let driver = HeadlessFontDriver::with_names(["-adobe-helvetica-medium-r-normal--0-0-75-75-p-0-iso8859-1"]);
        let best = select_best(
            &driver,
            &family_pattern("helvetica"),
            &FontRequest::new("helvetica", 14),
            &limits(),
        )
        .unwrap();
        assert_eq!(best.name, "-adobe-helvetica-medium-r-normal--0-0-75-75-p-0-iso8859-1");
        assert!(best.score.is_exact());
    }

    #[test]
    fn test_closer_size_wins_among_equal_scores() {
        let driver = HeadlessFontDriver::with_names([
            "-adobe-helvetica-bold-r-normal--13-130-75-75-p-70-iso8859-1",
            "-adobe-helvetica-bold-r-normal--14-140-75-75-p-77-iso8859-1",
            "-adobe-helvetica-bold-r-normal--11-110-75-75-p-60-iso8859-1",
        ]);
        let req = FontRequest::new("helvetica", 12).with_weight(WEIGHT_BOLD);
        let best = select_best(&driver, &family_pattern("helvetica"), &req, &limits()).unwrap();
        // 110 and 130 are both 8.3% away; the name decides.
        assert_eq!(best.name, "-adobe-helvetica-bold-r-normal--11-110-75-75-p-60-iso8859-1");
    }

    #[test]
    fn test_result_does_not_depend_on_order() {
        let mut names = vec![
            "-adobe-helvetica-medium-r-normal--12-120-75-75-p-67-iso8859-1",
            "-adobe-helvetica-medium-o-normal--12-120-75-75-p-67-iso8859-1",
            "-adobe-helvetica-bold-r-normal--12-120-75-75-p-70-iso8859-1",
            "-adobe-helvetica-medium-r-normal--8-80-75-75-p-46-iso8859-1",
        ];
        let req = FontRequest::new("helvetica", 12);
        let forward = select_best(
            &HeadlessFontDriver::with_names(names.clone()),
            &family_pattern("helvetica"),
            &req,
            &limits(),
        );
        names.reverse();
        let backward = select_best(
            &HeadlessFontDriver::with_names(names),
            &family_pattern("helvetica"),
            &req,
            &limits(),
        );
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_no_candidates() {
        let driver = HeadlessFontDriver::with_names(["fixed", "6x13"]);
        let best = select_best(&driver, &family_pattern("nosuch"), &FontRequest::new("nosuch", 12), &limits());
        assert!(best.is_none());
    }

    #[test]
    fn test_listing_grows_buffer() {
        let names: Vec<String> = (1..=40)
            .map(|px| format!("-misc-fixed-medium-r-normal--{}-{}-75-75-c-60-iso8859-1", px, px * 10))
            .collect();
        let driver = HeadlessFontDriver::with_names(names);
        let limits = ListingConfig {
            initial_capacity: 4,
            max_capacity: 64,
            ..ListingConfig::default()
        };
        let listed = list_font_names(&driver, &family_pattern("fixed"), &limits);
        assert_eq!(listed.len(), 40);
        // 4, 8, 16, 32, 64
        assert_eq!(driver.list_calls(), 5);

        let capped = ListingConfig {
            initial_capacity: 4,
            max_capacity: 16,
            ..ListingConfig::default()
        };
        assert_eq!(list_font_names(&driver, &family_pattern("fixed"), &capped).len(), 16);
    }
}
