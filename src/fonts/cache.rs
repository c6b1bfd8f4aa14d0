//! Cost-bounded cache of loaded fonts.
//!
//! Entries are keyed by the resolved font name and carry a cost that
//! approximates the memory the server spends on the font. When the total
//! cost would exceed the budget, the least recently used entries are
//! released first.

use crate::config::CacheConfig;
use anyhow::{bail, Result};
use log::{debug, trace};
use serde::Serialize;
use std::collections::HashMap;
use std::rc::Rc;

/// Snapshot of cache bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_cost: usize,
    pub budget: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Slot<T> {
    value: Rc<T>,
    cost: usize,
    last_used: u64,
}

pub struct FontCache<T> {
    entries: HashMap<String, Slot<T>>,
    total_cost: usize,
    budget: usize,
    reserve: usize,
    hard_limit: usize,
    // Monotonic use counter; the smallest `last_used` is the LRU entry.
    tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<T> FontCache<T> {
    pub fn new(config: &CacheConfig) -> Self {
        FontCache {
            entries: HashMap::new(),
            total_cost: 0,
            budget: config.budget_bytes,
            reserve: config.reserve_bytes,
            hard_limit: config.hard_limit_bytes.max(config.budget_bytes),
            tick: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Looks up `name`, marking it most recently used.
    pub fn find(&mut self, name: &str) -> Option<Rc<T>> {
        let tick = self.next_tick();
        match self.entries.get_mut(name) {
            Some(slot) => {
                slot.last_used = tick;
                self.hits += 1;
                Some(Rc::clone(&slot.value))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Stores `value` under `name`, evicting least recently used entries
    /// until it fits.
    ///
    /// A value costing more than the whole budget raises the budget to its
    /// cost plus the reserve. Fails, leaving the cache untouched, when that
    /// would exceed the hard limit.
    pub fn insert(&mut self, name: &str, value: Rc<T>, cost: usize) -> Result<()> {
        if cost > self.budget {
            let raised = cost.saturating_add(self.reserve);
            if raised > self.hard_limit {
                bail!(
                    "font '{}' costs {} bytes, above the cache limit of {} bytes",
                    name,
                    cost,
                    self.hard_limit
                );
            }
            debug!("Raising font cache budget from {} to {} bytes", self.budget, raised);
            self.budget = raised;
        }

        if let Some(old) = self.entries.remove(name) {
            trace!("Replacing cached font '{}'", name);
            self.total_cost -= old.cost;
        }

        while self.total_cost + cost > self.budget {
            if !self.evict_one() {
                break;
            }
        }

        let tick = self.next_tick();
        self.entries.insert(
            name.to_string(),
            Slot {
                value,
                cost,
                last_used: tick,
            },
        );
        self.total_cost += cost;
        trace!(
            "Cached font '{}' (cost {}, total {}/{})",
            name,
            cost,
            self.total_cost,
            self.budget
        );
        Ok(())
    }

    fn evict_one(&mut self) -> bool {
        let Some(victim) = self
            .entries
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(name, _)| name.clone())
        else {
            return false;
        };
        if let Some(slot) = self.entries.remove(&victim) {
            self.total_cost -= slot.cost;
            self.evictions += 1;
            debug!("Evicted font '{}' (cost {})", victim, slot.cost);
        }
        true
    }

    /// Drops `name` from the cache. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.entries.remove(name) {
            Some(slot) => {
                self.total_cost -= slot.cost;
                true
            }
            None => false,
        }
    }

    /// Releases every entry. Handles still shared elsewhere stay alive until
    /// their last `Rc` is dropped. The budget keeps any raise.
    pub fn reset(&mut self) {
        debug!("Releasing {} cached fonts", self.entries.len());
        self.entries.clear();
        self.total_cost = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached names, most recently used first.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<(&str, u64)> = self
            .entries
            .iter()
            .map(|(name, slot)| (name.as_str(), slot.last_used))
            .collect();
        names.sort_by(|a, b| b.1.cmp(&a.1));
        names.into_iter().map(|(name, _)| name).collect()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            total_cost: self.total_cost,
            budget: self.budget,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cache() -> FontCache<&'static str> {
        FontCache::new(&CacheConfig {
            budget_bytes: 100,
            reserve_bytes: 10,
            hard_limit_bytes: 1000,
        })
    }

    #[test]
    fn test_find_and_stats() {
        let mut cache = small_cache();
        cache.insert("a", Rc::new("font a"), 10).unwrap();
        assert_eq!(cache.find("a").as_deref(), Some(&"font a"));
        assert!(cache.find("b").is_none());
        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.total_cost, 10);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut cache = small_cache();
        cache.insert("a", Rc::new("a"), 40).unwrap();
        cache.insert("b", Rc::new("b"), 40).unwrap();
        // Touch "a" so "b" becomes the oldest.
        cache.find("a");
        cache.insert("c", Rc::new("c"), 40).unwrap();
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.stats().evictions, 1);
        assert!(cache.stats().total_cost <= 100);
        assert_eq!(cache.names(), vec!["c", "a"]);
    }

    #[test]
    fn test_oversized_entry_raises_budget() {
        let mut cache = small_cache();
        cache.insert("a", Rc::new("a"), 50).unwrap();
        cache.insert("huge", Rc::new("huge"), 150).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.budget, 160);
        // "a" no longer fits next to the big font.
        assert!(!cache.contains("a"));
        assert!(cache.contains("huge"));

        // The raised budget is kept.
        cache.insert("b", Rc::new("b"), 5).unwrap();
        assert_eq!(cache.stats().budget, 160);
        assert!(cache.contains("huge"));
    }

    #[test]
    fn test_hard_limit_rejects_insert() {
        let mut cache = small_cache();
        cache.insert("a", Rc::new("a"), 20).unwrap();
        assert!(cache.insert("giant", Rc::new("giant"), 995).is_err());
        assert!(!cache.contains("giant"));
        assert!(cache.contains("a"));
        assert_eq!(cache.stats().budget, 100);
    }

    #[test]
    fn test_replace_same_name() {
        let mut cache = small_cache();
        let first = Rc::new("first");
        cache.insert("a", Rc::clone(&first), 30).unwrap();
        cache.insert("a", Rc::new("second"), 20).unwrap();
        assert_eq!(Rc::strong_count(&first), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().total_cost, 20);
        assert_eq!(cache.find("a").as_deref(), Some(&"second"));
    }

    #[test]
    fn test_remove_and_reset() {
        let mut cache = small_cache();
        cache.insert("a", Rc::new("a"), 10).unwrap();
        cache.insert("b", Rc::new("b"), 10).unwrap();
        let held = cache.find("b").unwrap();
        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        cache.reset();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().total_cost, 0);
        // Outstanding handles survive a reset.
        assert_eq!(*held, "b");
    }
}
