use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cell::Matrix;
use crate::request::RowWindow;

#[derive(Debug, Clone)]
struct CacheEntry {
    matrix: Arc<Matrix>,
    last_used_tick: u64,
}

/// Per-widget cache of acquired windows, keyed by row window.
///
/// Notes on determinism:
/// - Entries live in a `BTreeMap` for stable traversal order.
/// - Eviction is LRU by `last_used_tick`, with a tie-break by window ordering.
#[derive(Debug)]
pub struct WindowCache {
    max_entries: usize,
    tick: u64,
    entries: BTreeMap<RowWindow, CacheEntry>,
}

impl WindowCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            tick: 0,
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, window: &RowWindow) -> Option<Arc<Matrix>> {
        self.tick += 1;
        let entry = self.entries.get_mut(window)?;
        entry.last_used_tick = self.tick;
        Some(entry.matrix.clone())
    }

    /// Stores a window, returning the windows evicted to stay in budget.
    pub fn insert(&mut self, window: RowWindow, matrix: Arc<Matrix>) -> Vec<RowWindow> {
        self.tick += 1;
        self.entries.insert(
            window,
            CacheEntry {
                matrix,
                last_used_tick: self.tick,
            },
        );

        let mut evicted = Vec::new();
        while self.entries.len() > self.max_entries {
            let oldest = self
                .entries
                .iter()
                .filter(|(k, _)| **k != window)
                .min_by(|(ka, ea), (kb, eb)| {
                    ea.last_used_tick
                        .cmp(&eb.last_used_tick)
                        .then_with(|| ka.cmp(kb))
                })
                .map(|(k, _)| *k);
            let Some(key) = oldest else {
                break;
            };
            self.entries.remove(&key);
            evicted.push(key);
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for WindowCache {
    fn default() -> Self {
        Self::new(4)
    }
}
