//! Batch orchestration: validate once, then normalize, shape, lay out
//! and draw every name on a worker pool.
//!
//! ```text
//! Idle ──► Validating ──► Rendering(i) ──► Complete
//!              │
//!              └──► Failed (ConfigError, nothing rendered)
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use certgen_core::{ConfigError, NameEntry, RenderConfig, Rgb};
use certgen_layout::{LayoutEngine, LayoutError};
use certgen_text::{
    normalize, FontError, FontHandle, ShapingMode, TextEngine, DEFAULT_CACHE_CAPACITY,
};
use rayon::prelude::*;
use uuid::Uuid;

use crate::batch::{
    BatchResult, BatchState, BatchWarning, EntryError, EntryOutcome, RenderedCertificate, Template,
};
use crate::pool::{CancelToken, EngineFactory, EnginePool};
use crate::raster;

/// Knobs that don't change what gets drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RendererOptions {
    /// Worker threads. `None` uses one per CPU core.
    pub workers: Option<usize>,
    /// Shaped runs cached per engine; 0 disables the cache.
    pub cache_capacity: usize,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            workers: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Everything resolved during validation, ready to render.
#[derive(Debug)]
pub struct ValidatedBatch {
    pub template: Template,
    pub font: FontHandle,
    pub mode: ShapingMode,
    pub color: Rgb,
    pub layout: LayoutEngine,
    pub warnings: Vec<BatchWarning>,
    font_size: f32,
}

impl ValidatedBatch {
    pub fn font_size(&self) -> f32 {
        self.font_size
    }
}

/// Renders batches of certificates from one template.
pub struct CertificateRenderer {
    pool: rayon::ThreadPool,
    options: RendererOptions,
}

impl CertificateRenderer {
    pub fn new(options: RendererOptions) -> Result<Self, ConfigError> {
        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("certgen-worker-{i}"));
        if let Some(workers) = options.workers {
            builder = builder.num_threads(workers);
        }
        let pool = builder
            .build()
            .map_err(|e| ConfigError::WorkerPool(e.to_string()))?;
        log::info!("Renderer ready with {} workers", pool.current_num_threads());
        Ok(Self { pool, options })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn options(&self) -> RendererOptions {
        self.options
    }

    /// Check the template and config, load the font and pick the
    /// shaping mode. Nothing is rendered if this fails.
    pub fn validate(
        &self,
        template: &Template,
        config: &RenderConfig,
    ) -> Result<ValidatedBatch, ConfigError> {
        log::debug!("Batch state: {}", BatchState::Validating);
        config.validate(template.width(), template.height())?;

        let font = FontHandle::load(&config.font_path).map_err(|e| match e {
            FontError::Io { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
                ConfigError::FontNotFound(path)
            }
            other => ConfigError::FontUnloadable {
                path: other.path().to_path_buf(),
                reason: other.to_string(),
            },
        })?;

        let layout = LayoutEngine::new(template.width(), template.height(), config.y_position)
            .map_err(|e| match e {
                LayoutError::EmptyCanvas => ConfigError::EmptyCanvas {
                    width: template.width(),
                    height: template.height(),
                },
                LayoutError::BaselineOutOfRange { y, height } => {
                    ConfigError::PositionOutOfRange { y, height }
                }
            })?;

        let resolution = font.resolve_mode(config.use_advanced_shaping);
        let warnings = resolution
            .degraded
            .map(|reason| BatchWarning::ShapingDegraded { reason })
            .into_iter()
            .collect();

        log::info!(
            "Validated batch: {}x{} template, font {} ({}), {}px, {} shaping",
            template.width(),
            template.height(),
            font.face().family,
            font.path().display(),
            config.font_size,
            resolution.mode,
        );

        Ok(ValidatedBatch {
            template: template.clone(),
            font,
            mode: resolution.mode,
            color: config.color,
            layout,
            warnings,
            font_size: config.font_size as f32,
        })
    }

    /// Render one certificate per non-empty line of `names`.
    pub fn render_batch<S: AsRef<str>>(
        &self,
        template: &Template,
        config: &RenderConfig,
        names: &[S],
    ) -> Result<BatchResult, ConfigError> {
        self.render_batch_with_cancel(template, config, names, &CancelToken::new())
    }

    pub fn render_batch_with_cancel<S: AsRef<str>>(
        &self,
        template: &Template,
        config: &RenderConfig,
        names: &[S],
        cancel: &CancelToken,
    ) -> Result<BatchResult, ConfigError> {
        let entries: Vec<NameEntry> = names
            .iter()
            .map(|raw| raw.as_ref().trim())
            .filter(|raw| !raw.is_empty())
            .enumerate()
            .map(|(index, raw)| NameEntry::new(index, raw, normalize(raw)))
            .collect();
        self.render_entries(template, config, entries, cancel)
    }

    /// Render already-normalized entries.
    pub fn render_entries(
        &self,
        template: &Template,
        config: &RenderConfig,
        entries: Vec<NameEntry>,
        cancel: &CancelToken,
    ) -> Result<BatchResult, ConfigError> {
        let batch = self.validate(template, config).inspect_err(|e| {
            log::error!("Batch state: {} ({}: {})", BatchState::Failed, e.field(), e);
        })?;
        Ok(self.render_validated(&batch, entries, cancel))
    }

    /// Render entries against a batch that already passed validation.
    pub fn render_validated(
        &self,
        batch: &ValidatedBatch,
        entries: Vec<NameEntry>,
        cancel: &CancelToken,
    ) -> BatchResult {
        let start = Instant::now();
        let id = Uuid::new_v4();
        let total = entries.len();
        let done = AtomicUsize::new(0);
        log::info!("Batch {}: {}", id, BatchState::Rendering { done: 0, total });

        let engines = EnginePool::new(
            EngineFactory {
                font: batch.font.clone(),
                font_size: batch.font_size,
                mode: batch.mode,
                cache_capacity: self.options.cache_capacity,
            },
            self.pool.current_num_threads(),
        );

        let outcomes: Vec<EntryOutcome> = self.pool.install(|| {
            entries
                .into_par_iter()
                .map(|entry| {
                    let outcome = render_entry(batch, &mut engines.checkout(), entry, cancel);
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    log::trace!("Batch {}: {}", id, BatchState::Rendering { done: n, total });
                    outcome
                })
                .collect()
        });

        let mut warnings = batch.warnings.clone();
        for outcome in &outcomes {
            match outcome {
                EntryOutcome::Rendered(cert) => {
                    if cert.origin.overflows(cert.run_width, batch.layout.canvas_width()) {
                        warnings.push(BatchWarning::Overflow {
                            index: cert.entry.index,
                            run_width: cert.run_width,
                            canvas_width: batch.layout.canvas_width(),
                        });
                    }
                }
                EntryOutcome::Failed { entry, error } => {
                    log::warn!("Name #{} ({:?}) failed: {}", entry.index + 1, entry.raw, error);
                }
            }
        }

        let result = BatchResult {
            id,
            outcomes,
            warnings,
            mode: batch.mode,
            state: BatchState::Complete,
            elapsed: start.elapsed(),
        };
        log::info!(
            "Batch {}: {} ({} rendered, {} failed, {} engines, {:.1?})",
            id,
            result.state,
            result.success_count(),
            result.failure_count(),
            engines.created(),
            result.elapsed,
        );
        result
    }
}

fn render_entry(
    batch: &ValidatedBatch,
    engine: &mut TextEngine,
    entry: NameEntry,
    cancel: &CancelToken,
) -> EntryOutcome {
    if cancel.is_cancelled() {
        return EntryOutcome::Failed {
            entry,
            error: EntryError::Cancelled,
        };
    }
    let started = Instant::now();

    let run = match engine.shape(&entry.display) {
        Ok(run) => run,
        Err(e) => {
            return EntryOutcome::Failed {
                entry,
                error: e.into(),
            }
        }
    };
    let run_width = run.width_px();
    let origin = batch.layout.place(run_width);
    let image = raster::draw(
        batch.template.image(),
        &run,
        origin,
        batch.color,
        engine,
    );

    log::debug!(
        "Rendered #{} {:?}: {} glyphs, {}px at ({}, {}) in {:.1?}",
        entry.index + 1,
        entry.display,
        run.len(),
        run_width,
        origin.x,
        origin.y,
        started.elapsed(),
    );

    EntryOutcome::Rendered(RenderedCertificate {
        entry,
        image,
        origin,
        run_width,
        glyph_count: run.len(),
    })
}
