//! Per-worker text engines.
//!
//! `TextEngine` owns a `FontSystem` and glyph cache that must not be
//! shared between threads. Each worker gets its own engine, built on
//! first use and kept for the rest of the batch.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use certgen_text::{FontHandle, ShapingMode, TextEngine};

/// Everything needed to build an identical engine on any thread.
#[derive(Clone, Debug)]
pub struct EngineFactory {
    pub font: FontHandle,
    pub font_size: f32,
    pub mode: ShapingMode,
    pub cache_capacity: usize,
}

impl EngineFactory {
    pub fn build(&self) -> TextEngine {
        TextEngine::with_cache_capacity(&self.font, self.font_size, self.mode, self.cache_capacity)
    }
}

/// One lazily built engine per rayon worker.
///
/// Slot `i` belongs to the worker with thread index `i`, so a batch never
/// builds more engines than the thread pool has threads. Calls from
/// outside a rayon pool share slot 0.
pub struct EnginePool {
    factory: EngineFactory,
    slots: Vec<OnceLock<Mutex<TextEngine>>>,
    created: AtomicUsize,
}

/// An engine locked for the calling worker.
pub type PooledEngine<'a> = MutexGuard<'a, TextEngine>;

impl EnginePool {
    /// `workers` is the size of the thread pool the engines serve.
    pub fn new(factory: EngineFactory, workers: usize) -> Self {
        Self {
            factory,
            slots: (0..workers.max(1)).map(|_| OnceLock::new()).collect(),
            created: AtomicUsize::new(0),
        }
    }

    pub fn factory(&self) -> &EngineFactory {
        &self.factory
    }

    pub fn slots(&self) -> usize {
        self.slots.len()
    }

    /// Lock the calling worker's engine, building it on first use.
    pub fn checkout(&self) -> PooledEngine<'_> {
        let index = rayon::current_thread_index().unwrap_or(0) % self.slots.len();
        let slot = self.slots[index].get_or_init(|| {
            let n = self.created.fetch_add(1, Ordering::Relaxed) + 1;
            log::debug!(
                "Building text engine #{} for worker {} ({} @ {}px)",
                n,
                index,
                self.factory.mode,
                self.factory.font_size
            );
            Mutex::new(self.factory.build())
        });
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Engines built so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

/// Cooperative cancellation flag shared between the caller and workers.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let worker = token.clone();
        assert!(!worker.is_cancelled());
        token.cancel();
        assert!(worker.is_cancelled());
    }

    fn factory() -> Option<EngineFactory> {
        Some(EngineFactory {
            font: crate::test_font()?,
            font_size: 24.0,
            mode: ShapingMode::Fallback,
            cache_capacity: 8,
        })
    }

    #[test]
    fn test_engine_built_once_per_worker() {
        let Some(factory) = factory() else { return };
        let pool = EnginePool::new(factory, 4);
        assert_eq!(pool.created(), 0);
        {
            let mut engine = pool.checkout();
            assert!(engine.shape("Ab").is_ok());
            assert_eq!(engine.mode(), ShapingMode::Fallback);
            assert_eq!(engine.font_size(), 24.0);
        }
        // Same (non-rayon) thread, same slot, same engine.
        let engine = pool.checkout();
        assert_eq!(engine.cache_stats().misses, 1);
        assert_eq!(pool.created(), 1);
    }

    #[test]
    fn test_engines_bounded_by_threads() {
        let Some(factory) = factory() else { return };
        let threads = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let pool = EnginePool::new(factory, threads.current_num_threads());
        threads.install(|| {
            use rayon::prelude::*;
            // Many small split jobs; each one checks out again.
            (0..200).into_par_iter().with_max_len(1).for_each(|i| {
                let mut engine = pool.checkout();
                assert!(engine.shape(if i % 2 == 0 { "Ab" } else { "Cd" }).is_ok());
            });
        });
        assert!((1..=3).contains(&pool.created()), "built {}", pool.created());
    }
}
