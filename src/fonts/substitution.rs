//! Family substitution table.
//!
//! Maps a family name (case-insensitively) to replacement families tried
//! when the family itself has no usable fonts.

use log::debug;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    table: BTreeMap<String, Vec<String>>,
}

impl Substitutions {
    pub fn new(table: &BTreeMap<String, Vec<String>>) -> Self {
        Substitutions {
            table: table
                .iter()
                .map(|(family, subs)| (family.to_lowercase(), subs.clone()))
                .collect(),
        }
    }

    /// First substitute for `family`, or `family` itself when it has none.
    pub fn substitute(&self, family: &str) -> String {
        self.table
            .get(&family.to_lowercase())
            .and_then(|subs| subs.first())
            .cloned()
            .unwrap_or_else(|| family.to_string())
    }

    /// Every substitute for `family`, in order.
    pub fn substitutes(&self, family: &str) -> &[String] {
        self.table
            .get(&family.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Appends `substitute` to the list for `family` unless already present.
    pub fn insert(&mut self, family: &str, substitute: &str) {
        let subs = self.table.entry(family.to_lowercase()).or_default();
        if !subs.iter().any(|s| s.eq_ignore_ascii_case(substitute)) {
            debug!("Substitution added: {} -> {}", family, substitute);
            subs.push(substitute.to_string());
        }
    }

    /// Forgets every substitute for `family`.
    pub fn remove(&mut self, family: &str) -> bool {
        self.table.remove(&family.to_lowercase()).is_some()
    }

    /// Families that have substitutes.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FamilyConfig;

    #[test]
    fn test_default_table() {
        let subs = Substitutions::new(&FamilyConfig::default().substitutions);
        assert_eq!(subs.substitute("Arial"), "helvetica");
        assert_eq!(subs.substitute("TMS RMN"), "times");
        assert_eq!(subs.substitute("charter"), "charter");
        assert!(subs.substitutes("charter").is_empty());
    }

    #[test]
    fn test_insert_and_remove() {
        let mut subs = Substitutions::default();
        subs.insert("Lucidatypewriter", "courier");
        subs.insert("lucidatypewriter", "fixed");
        subs.insert("LUCIDATYPEWRITER", "Courier");
        assert_eq!(subs.substitutes("lucidatypewriter"), ["courier", "fixed"]);
        assert_eq!(subs.substitute("LucidaTypewriter"), "courier");
        assert_eq!(subs.families().collect::<Vec<_>>(), vec!["lucidatypewriter"]);
        assert!(subs.remove("lucidatypewriter"));
        assert!(!subs.remove("lucidatypewriter"));
        assert_eq!(subs.substitute("lucidatypewriter"), "lucidatypewriter");
    }
}
