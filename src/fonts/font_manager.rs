//! Owns everything font loading needs between `init` and `teardown`: the
//! driver, the resolved-name memo, the loaded-font cache and the catalog.

use super::cache::{CacheStats, FontCache};
use super::database::FontDatabase;
use super::encoding::Script;
use super::font_driver::{FontDriver, FontHandle, FontKind, FontMetrics};
use super::font_info::{FontInfo, LineMetrics};
use super::outline::OutlineQuery;
use super::request::FontRequest;
use super::resolver::{FamilyResolver, Resolution};
use super::substitution::Substitutions;
use crate::config::MatchConfig;
use anyhow::{bail, Context, Result};
use log::{debug, info, trace, warn};
use once_cell::unsync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A font held by the cache. Metrics are read from the handle on first use.
pub struct CacheEntry<D: FontDriver> {
    /// Name of the font that was actually opened. Differs from the cache key
    /// when the resolved font could not be opened.
    pub name: String,
    pub handle: FontHandle<D>,
    pub cost: usize,
    metrics: OnceCell<FontMetrics>,
    line_metrics: OnceCell<LineMetrics>,
}

impl<D: FontDriver> CacheEntry<D> {
    fn new(name: &str, handle: FontHandle<D>) -> Self {
        let cost = handle.approximate_cost();
        CacheEntry {
            name: name.to_string(),
            handle,
            cost,
            metrics: OnceCell::new(),
            line_metrics: OnceCell::new(),
        }
    }

    pub fn metrics(&self) -> FontMetrics {
        *self.metrics.get_or_init(|| self.handle.metrics())
    }

    pub fn line_metrics(&self) -> LineMetrics {
        *self
            .line_metrics
            .get_or_init(|| LineMetrics::for_font_name(&self.name))
    }

    pub fn kind(&self) -> FontKind {
        self.handle.kind()
    }
}

impl<D: FontDriver> fmt::Debug for CacheEntry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("cost", &self.cost)
            .finish()
    }
}

/// Result of `FontManager::load`.
pub struct LoadedFont<D: FontDriver> {
    pub entry: Rc<CacheEntry<D>>,
    /// What the request resolved to; `name` is the cache key.
    pub resolution: Resolution,
    pub info: FontInfo,
}

impl<D: FontDriver> LoadedFont<D> {
    pub fn exact_match(&self) -> bool {
        self.resolution.exact_match
    }

    pub fn handle(&self) -> &FontHandle<D> {
        &self.entry.handle
    }
}

impl<D: FontDriver> fmt::Debug for LoadedFont<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedFont")
            .field("entry", &self.entry)
            .field("resolution", &self.resolution)
            .finish()
    }
}

pub struct FontManager<D: FontDriver> {
    driver: D,
    config: MatchConfig,
    substitutions: Substitutions,
    last_resort: OnceCell<String>,
    resolved: HashMap<FontRequest, Resolution>,
    /// `None` outside `init`..`teardown`.
    cache: Option<FontCache<CacheEntry<D>>>,
    database: FontDatabase,
}

impl<D: FontDriver> FontManager<D> {
    pub fn new(driver: D, config: MatchConfig) -> Self {
        let substitutions = Substitutions::new(&config.families.substitutions);
        let database = FontDatabase::new(config.default_resolution, config.listing.database_capacity);
        FontManager {
            driver,
            config,
            substitutions,
            last_resort: OnceCell::new(),
            resolved: HashMap::new(),
            cache: None,
            database,
        }
    }

    /// Creates the font cache. Calling it again is harmless.
    pub fn init(&mut self) {
        if self.cache.is_none() {
            info!(
                "Font cache initialised with a budget of {} bytes",
                self.config.cache.budget_bytes
            );
            self.cache = Some(FontCache::new(&self.config.cache));
        }
    }

    /// Releases every cached font and forgets all resolutions.
    pub fn teardown(&mut self) {
        if let Some(mut cache) = self.cache.take() {
            cache.reset();
        }
        self.resolved.clear();
        self.database = FontDatabase::new(
            self.config.default_resolution,
            self.config.listing.database_capacity,
        );
        info!("Font system torn down");
    }

    pub fn is_initialized(&self) -> bool {
        self.cache.is_some()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    fn resolver(&self) -> FamilyResolver<'_, D> {
        FamilyResolver::new(
            &self.driver,
            &self.config.families,
            &self.config.listing,
            &self.substitutions,
            &self.last_resort,
        )
    }

    /// Memoised resolution of `request`, if it was loaded before.
    pub fn resolution(&self, request: &FontRequest) -> Option<&Resolution> {
        self.resolved.get(request)
    }

    /// Loads the font for `request`.
    ///
    /// Fails only when the font manager is not initialised, or when neither
    /// the resolved font nor the last-resort font can be opened.
    pub fn load(&mut self, request: &FontRequest) -> Result<LoadedFont<D>> {
        if self.cache.is_none() {
            bail!("font manager is not initialised");
        }

        if let Some(resolution) = self.resolved.get(request).cloned() {
            trace!("{} memoised as '{}'", request, resolution.name);
            return self.load_resolved(request, resolution);
        }

        if self.outline_eligible(request) {
            let query = self.outline_query(request);
            match self.driver.match_outline(&query) {
                Ok(found) => {
                    let resolution = Resolution {
                        exact_match: !request.family.is_empty()
                            && found.family.eq_ignore_ascii_case(&request.family),
                        name: found.pattern,
                        kind: FontKind::Outline,
                    };
                    debug!("{} matched outline font '{}'", request, resolution.name);
                    self.resolved.insert(request.clone(), resolution.clone());
                    if let Some(entry) = self.cached(&resolution.name) {
                        return Ok(self.loaded(entry, resolution, request));
                    }
                    let name = resolution.name.clone();
                    return Ok(self.store(request, resolution, &name, FontHandle::Outline(found.font)));
                }
                Err(e) => debug!("No outline font for {}: {:#}", request, e),
            }
        }

        let resolution = self.resolver().resolve(request);
        self.resolved.insert(request.clone(), resolution.clone());
        self.load_resolved(request, resolution)
    }

    fn outline_eligible(&self, request: &FontRequest) -> bool {
        self.config.outline.enabled && !request.raw_mode && !request.charset.is_multi_byte()
    }

    fn outline_query(&self, request: &FontRequest) -> OutlineQuery {
        let family = match request.family.trim() {
            "" => self.resolver().default_family(request.style_hint),
            family => family,
        };
        OutlineQuery::for_request(
            request,
            family,
            self.config.default_resolution,
            self.config.outline.antialias,
        )
    }

    fn cached(&mut self, name: &str) -> Option<Rc<CacheEntry<D>>> {
        self.cache.as_mut().and_then(|cache| cache.find(name))
    }

    fn load_resolved(&mut self, request: &FontRequest, resolution: Resolution) -> Result<LoadedFont<D>> {
        if let Some(entry) = self.cached(&resolution.name) {
            return Ok(self.loaded(entry, resolution, request));
        }

        let opened = match resolution.kind {
            FontKind::Bitmap => self
                .driver
                .load_bitmap_font(&resolution.name)
                .map(FontHandle::Bitmap),
            FontKind::FontSet => self
                .driver
                .load_font_set(&resolution.name)
                .map(FontHandle::FontSet),
            FontKind::Outline => {
                let query = self.outline_query(request);
                self.driver
                    .match_outline(&query)
                    .map(|found| FontHandle::Outline(found.font))
            }
        };

        match opened {
            Ok(handle) => {
                let name = resolution.name.clone();
                Ok(self.store(request, resolution, &name, handle))
            }
            Err(e) => {
                warn!("Cannot open '{}': {:#}", resolution.name, e);
                let fallback = self.resolver().last_resort_font();
                let handle = self
                    .driver
                    .load_bitmap_font(&fallback)
                    .with_context(|| format!("Cannot open last-resort font '{}'", fallback))?;
                let resolution = Resolution {
                    exact_match: false,
                    kind: FontKind::Bitmap,
                    ..resolution
                };
                if let Some(memo) = self.resolved.get_mut(request) {
                    memo.exact_match = false;
                }
                Ok(self.store(request, resolution, &fallback, FontHandle::Bitmap(handle)))
            }
        }
    }

    // Caches `handle` under the resolved name. When the cache refuses it the
    // handle is still returned, just not kept.
    fn store(
        &mut self,
        request: &FontRequest,
        resolution: Resolution,
        opened_name: &str,
        handle: FontHandle<D>,
    ) -> LoadedFont<D> {
        let entry = Rc::new(CacheEntry::new(opened_name, handle));
        if let Some(cache) = self.cache.as_mut() {
            if let Err(e) = cache.insert(&resolution.name, Rc::clone(&entry), entry.cost) {
                warn!("{:#}; using it uncached", e);
            }
        }
        self.loaded(entry, resolution, request)
    }

    // The entry decides the kind: a fallback font is always a bitmap.
    fn loaded(&self, entry: Rc<CacheEntry<D>>, resolution: Resolution, request: &FontRequest) -> LoadedFont<D> {
        let resolution = Resolution {
            kind: entry.kind(),
            ..resolution
        };
        let info = FontInfo::describe(&entry.name, request, resolution.exact_match);
        LoadedFont {
            entry,
            resolution,
            info,
        }
    }

    // --- Substitutions ---

    pub fn substitute(&self, family: &str) -> String {
        self.substitutions.substitute(family)
    }

    pub fn substitutes(&self, family: &str) -> &[String] {
        self.substitutions.substitutes(family)
    }

    /// Adds a substitute. Memoised resolutions are dropped since they may
    /// now resolve differently.
    pub fn insert_substitution(&mut self, family: &str, substitute: &str) {
        self.substitutions.insert(family, substitute);
        self.resolved.clear();
    }

    pub fn remove_substitution(&mut self, family: &str) -> bool {
        let removed = self.substitutions.remove(family);
        if removed {
            self.resolved.clear();
        }
        removed
    }

    // --- Catalog ---

    /// Populates the catalog for `family` and `script` and returns it.
    pub fn database(&mut self, family: Option<&str>, script: Option<Script>) -> &FontDatabase {
        if self.config.outline.enabled {
            self.database.load_outline_faces(&self.driver);
        }
        self.database.populate(&self.driver, family, script);
        &self.database
    }

    // --- Statistics ---

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(FontCache::stats)
    }

    pub fn log_cache_statistics(&self) {
        let Some(cache) = &self.cache else {
            info!("Font cache not initialised");
            return;
        };
        let stats = cache.stats();
        info!(
            "Font cache: {} fonts, cost {}/{} bytes, {} hits, {} misses, {} evictions",
            stats.entries, stats.total_cost, stats.budget, stats.hits, stats.misses, stats.evictions
        );
        for name in cache.names() {
            debug!("  cached: {}", name);
        }
    }
}
