//! Insertion-ordered tallies and stable ranking.
//!
//! Ranked lists in the report must come out identically for identical input,
//! so counts are kept in first-seen order and sorted with a stable sort.

use std::collections::HashMap;

/// A count per key that remembers the order keys were first seen in.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<(String, u64)>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str, amount: u64) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += amount,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), amount));
            }
        }
    }

    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    pub fn get(&self, key: &str) -> u64 {
        self.index.get(key).map(|&i| self.entries[i].1).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries by descending count; ties keep first-seen order.
    pub fn ranked(&self) -> Vec<(String, u64)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        ranked
    }
}

/// Stable descending sort by a float key. NaN keys sort last.
pub fn sort_desc_by<T>(items: &mut [T], key: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| {
        let (ka, kb) = (key(a), key(b));
        match (ka.is_nan(), kb.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => kb.total_cmp(&ka),
        }
    });
}
