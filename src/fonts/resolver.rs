//! Turns a `FontRequest` into a loadable font name.
//!
//! Single-byte requests go through a chain of ever more generic families
//! until one of them yields a match; multi-byte requests are answered with
//! a list of font-set patterns that the server resolves itself.

use super::font_driver::{FontDriver, FontKind};
use super::request::{FontRequest, StyleHint};
use super::selector::{select_best, BestMatch};
use super::substitution::Substitutions;
use super::xlfd::family_pattern;
use crate::config::{FamilyConfig, ListingConfig};
use log::{debug, error, info, trace};
use once_cell::unsync::OnceCell;
use serde::Serialize;

/// Font-set families longer than this are taken to be complete patterns.
pub const MAX_FONT_SET_FAMILY_LEN: usize = 32;

/// Name a request resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub name: String,
    /// False when any fallback was needed or the best candidate was not an
    /// exact match.
    pub exact_match: bool,
    pub kind: FontKind,
}

impl Resolution {
    fn bitmap(name: String, exact_match: bool) -> Self {
        Resolution {
            name,
            exact_match,
            kind: FontKind::Bitmap,
        }
    }
}

pub struct FamilyResolver<'a, D: FontDriver> {
    driver: &'a D,
    families: &'a FamilyConfig,
    listing: &'a ListingConfig,
    substitutions: &'a Substitutions,
    /// Memo of the first existing last-resort font.
    last_resort: &'a OnceCell<String>,
}

impl<'a, D: FontDriver> FamilyResolver<'a, D> {
    pub fn new(
        driver: &'a D,
        families: &'a FamilyConfig,
        listing: &'a ListingConfig,
        substitutions: &'a Substitutions,
        last_resort: &'a OnceCell<String>,
    ) -> Self {
        FamilyResolver {
            driver,
            families,
            listing,
            substitutions,
            last_resort,
        }
    }

    pub fn resolve(&self, request: &FontRequest) -> Resolution {
        if request.raw_mode {
            return self.resolve_raw(request);
        }
        if request.charset.is_multi_byte() {
            return Resolution {
                name: self.font_set_patterns(request),
                exact_match: true,
                kind: FontKind::FontSet,
            };
        }
        self.find_font(request)
    }

    /// Family used when the request names none or its family has no fonts.
    pub fn default_family(&self, hint: StyleHint) -> &'a str {
        match hint {
            StyleHint::Serif => &self.families.serif,
            StyleHint::TypeWriter => &self.families.typewriter,
            StyleHint::Decorative => &self.families.decorative,
            StyleHint::SansSerif | StyleHint::System | StyleHint::AnyStyle => {
                &self.families.sans_serif
            }
        }
    }

    pub fn font_exists(&self, name: &str) -> bool {
        match self.driver.list_fonts(name, 1) {
            Ok(names) => !names.is_empty(),
            Err(e) => {
                debug!("Checking '{}' failed: {:#}", name, e);
                false
            }
        }
    }

    /// First configured last-resort font the server knows. The answer is
    /// remembered once found.
    ///
    /// # Panics
    ///
    /// In debug builds, when none of the last-resort fonts exist.
    pub fn last_resort_font(&self) -> String {
        if let Some(name) = self.last_resort.get() {
            return name.clone();
        }
        if let Some(found) = self
            .families
            .last_resort_fonts
            .iter()
            .find(|name| self.font_exists(name))
        {
            info!("Last-resort font is '{}'", found);
            let _ = self.last_resort.set(found.clone());
            return found.clone();
        }

        error!(
            "Cannot find any reasonable font: none of {} last-resort fonts exist",
            self.families.last_resort_fonts.len()
        );
        if cfg!(debug_assertions) {
            panic!("no last-resort font is available");
        }
        self.families
            .last_resort_fonts
            .first()
            .cloned()
            .unwrap_or_else(|| "fixed".to_string())
    }

    /// A literal font name, substituted if it has a substitute. Falls back to
    /// the last-resort font when the name does not exist.
    pub fn resolve_raw(&self, request: &FontRequest) -> Resolution {
        let name = self.substitutions.substitute(&request.family);
        if self.font_exists(&name) {
            Resolution::bitmap(name, true)
        } else {
            debug!("Raw font '{}' does not exist", name);
            Resolution::bitmap(self.last_resort_font(), false)
        }
    }

    fn best_family_member(&self, family: &str, request: &FontRequest) -> Option<BestMatch> {
        trace!("Trying family '{}'", family);
        select_best(self.driver, &family_pattern(family), request, self.listing)
    }

    fn find_font(&self, request: &FontRequest) -> Resolution {
        let mut family = request.family.trim().to_string();
        let mut exact = !family.is_empty();
        let mut best = None;

        if !family.is_empty() {
            best = self.best_family_member(&family, request);
            exact = best.as_ref().is_some_and(|m| m.score.is_exact());
            if best.is_none() {
                let substitute = self.substitutions.substitute(&family);
                if !substitute.eq_ignore_ascii_case(&family) {
                    family = substitute;
                    best = self.best_family_member(&family, request);
                }
            }
        }

        let fallbacks = [
            self.default_family(request.style_hint),
            self.families.last_resort_family.as_str(),
        ];
        for fallback in fallbacks {
            if best.is_some() {
                break;
            }
            if !fallback.eq_ignore_ascii_case(&family) {
                family = fallback.to_string();
                best = self.best_family_member(&family, request);
            }
        }

        match best {
            Some(found) => {
                debug!("{} resolved to '{}' (exact: {})", request, found.name, exact);
                Resolution::bitmap(found.name, exact)
            }
            None => Resolution::bitmap(self.last_resort_font(), false),
        }
    }

    /// Comma-separated font-set patterns for a multi-byte request, from the
    /// most to the least specific.
    pub fn font_set_patterns(&self, request: &FontRequest) -> String {
        let family = match request.family.trim() {
            "" => self.default_family(request.style_hint),
            family => family,
        };
        if family.len() > MAX_FONT_SET_FAMILY_LEN {
            return family.to_string();
        }
        let weight = match request.weight {
            w if w < 37 => "light",
            w if w < 57 => "medium",
            w if w < 69 => "demibold",
            w if w < 81 => "bold",
            _ => "black",
        };
        let slant = if request.italic { "i" } else { "r" };
        let size = request.deci_point_size;
        [
            format!("-*-{family}-{weight}-{slant}-normal-*-*-{size}-*-*-*-*-*-*"),
            format!("-*-{family}-*-{slant}-*-*-*-{size}-*-*-*-*-*-*"),
            format!("-*-{}-{weight}-{slant}-*-*-*-{size}-*-*-*-*-*-*", self.families.sans_serif),
            format!("-*-*-*-{slant}-*-*-*-{size}-*-*-*-*-*-*"),
            format!("-*-*-*-*-*-*-*-{size}-*-*-*-*-*-*"),
        ]
        .join(",")
    }
}
