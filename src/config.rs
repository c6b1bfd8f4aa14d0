// src/config.rs

//! Configuration for font matching and caching.
//!
//! Every section deserializes with `#[serde(default)]`, so a configuration
//! file only needs to name the values it changes. The defaults are the
//! classic X11 values: a 4 MiB font cache, 75 dpi, and the usual
//! helvetica/times/courier fallbacks.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// --- Top-Level Configuration Structure ---

/// Root of the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Font cache budget.
    pub cache: CacheConfig,
    /// Limits for font name enumeration.
    pub listing: ListingConfig,
    /// Fallback families and the family substitution table.
    pub families: FamilyConfig,
    /// Outline (Xft) font matching.
    pub outline: OutlineConfig,
    /// Resolution assumed for fonts that do not carry one, in dpi.
    pub default_resolution: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            cache: CacheConfig::default(),
            listing: ListingConfig::default(),
            families: FamilyConfig::default(),
            outline: OutlineConfig::default(),
            default_resolution: 75,
        }
    }
}

impl MatchConfig {
    /// Reads a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config: MatchConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        info!("Loaded configuration from '{}'", path.display());
        debug!("Configuration: {:?}", config);
        Ok(config)
    }

    /// Reads `path` if given, falling back to defaults (with a warning) when
    /// the file cannot be used.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::from_json_file(path).unwrap_or_else(|e| {
                warn!("{:#}. Using default configuration.", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

// --- Cache Configuration ---

/// Cost budget of the loaded-font cache. Costs approximate the memory the X
/// server keeps per font, in bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Total cost the cache holds before evicting.
    pub budget_bytes: usize,
    /// Head room added when a single font does not fit the budget.
    pub reserve_bytes: usize,
    /// The budget is never raised beyond this.
    pub hard_limit_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            budget_bytes: 4 * 1024 * 1024,
            reserve_bytes: 100 * 1024,
            hard_limit_bytes: 64 * 1024 * 1024,
        }
    }
}

// --- Listing Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// First buffer size used when listing font names for matching.
    pub initial_capacity: usize,
    /// The buffer doubles while it comes back full, up to this size.
    pub max_capacity: usize,
    /// Buffer size for the bulk listings that populate the font database.
    pub database_capacity: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        ListingConfig {
            initial_capacity: 256,
            max_capacity: 32768,
            database_capacity: 0xffff,
        }
    }
}

// --- Family Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyConfig {
    /// Default family for serif requests.
    pub serif: String,
    /// Default family for sans-serif, system and unspecified requests.
    pub sans_serif: String,
    /// Default family for typewriter requests.
    pub typewriter: String,
    /// Default family for decorative requests.
    pub decorative: String,
    /// Family tried after the style default.
    pub last_resort_family: String,
    /// Font names (or aliases) tried in order when nothing else matched.
    pub last_resort_fonts: Vec<String>,
    /// Family substitutions, keyed by lower-case family name.
    pub substitutions: BTreeMap<String, Vec<String>>,
}

impl Default for FamilyConfig {
    fn default() -> Self {
        let mut last_resort_fonts: Vec<String> = ["6x13", "7x13", "8x13", "9x15", "fixed"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let families = ["helvetica", "courier", "times", "lucida"];
        for family in families {
            last_resort_fonts.push(format!("-*-{}-medium-r-*-*-*-120-*-*-*-*-*-*", family));
        }
        for family in families {
            last_resort_fonts.push(format!("-*-{}-*-*-*-*-*-120-*-*-*-*-*-*", family));
        }
        for family in families {
            last_resort_fonts.push(format!("-*-{}-*-*-*-*-*-*-*-*-*-*-*-*", family));
        }

        let substitutions = [("arial", "helvetica"), ("helv", "helvetica"), ("tms rmn", "times")]
            .iter()
            .map(|(from, to)| (from.to_string(), vec![to.to_string()]))
            .collect();

        FamilyConfig {
            serif: "times".to_string(),
            sans_serif: "helvetica".to_string(),
            typewriter: "courier".to_string(),
            decorative: "old english".to_string(),
            last_resort_family: "helvetica".to_string(),
            last_resort_fonts,
            substitutions,
        }
    }
}

// --- Outline Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutlineConfig {
    /// Try outline fonts before the core font matcher.
    pub enabled: bool,
    /// Antialiasing preference passed with outline queries; `None` leaves it
    /// to the font configuration.
    pub antialias: Option<bool>,
}
