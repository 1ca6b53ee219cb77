//! Per-engine LRU of shaped runs.
//!
//! An engine is bound to one font and size, so the display text alone is
//! the key. Certificate batches often repeat names; a hit skips shaping.

use lru::LruCache;
use std::num::NonZeroUsize;

use crate::engine::GlyphRun;

/// Hit/miss counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct ShapeCache {
    /// `None` when caching is disabled (capacity 0).
    runs: Option<LruCache<String, GlyphRun>>,
    stats: CacheStats,
}

impl ShapeCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            runs: NonZeroUsize::new(capacity).map(LruCache::new),
            stats: CacheStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.runs.is_some()
    }

    pub fn len(&self) -> usize {
        self.runs.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn get(&mut self, text: &str) -> Option<&GlyphRun> {
        let runs = self.runs.as_mut()?;
        match runs.get(text) {
            Some(run) => {
                self.stats.hits += 1;
                Some(run)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, text: &str, run: GlyphRun) {
        if let Some(runs) = self.runs.as_mut() {
            runs.put(text.to_string(), run);
        }
    }

    pub fn clear(&mut self) {
        if let Some(runs) = self.runs.as_mut() {
            runs.clear();
        }
        self.stats = CacheStats::default();
    }
}
