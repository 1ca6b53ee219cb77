//! # certgen-render
//!
//! CPU certificate renderer: draws one shaped name per certificate onto
//! copies of a template image, in parallel.
//!
//! ## Architecture
//!
//! ```text
//!  Template + RenderConfig
//!       │
//!       ▼
//!  CertificateRenderer::validate()   ◀─── font load, mode resolution (fail-fast)
//!       │
//!       ▼
//!  rayon workers, at most one TextEngine each (EnginePool)
//!       │   normalize ─► shape ─► LayoutEngine::place ─► raster::draw
//!       ▼
//!  BatchResult { outcomes in input order, warnings }
//! ```
//!
//! ## Crate modules
//!
//! - [`batch`]: template, batch state, outcomes and warnings
//! - [`pool`]: per-worker text engines and cancellation
//! - [`raster`]: glyph compositing onto the canvas
//! - [`renderer`]: validation and batch orchestration

pub mod batch;
pub mod pool;
pub mod raster;
pub mod renderer;

// Re-exports for convenience
pub use batch::{
    BatchResult, BatchState, BatchWarning, EntryError, EntryOutcome, RenderedCertificate, Template,
};
pub use certgen_layout::Placement;
pub use pool::{CancelToken, EngineFactory, EnginePool, PooledEngine};
pub use raster::{draw, draw_into, DrawStats, GlyphRasterizer};
pub use renderer::{CertificateRenderer, RendererOptions, ValidatedBatch};

#[cfg(test)]
pub(crate) fn test_font() -> Option<certgen_text::FontHandle> {
    const PREFERRED: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
    PREFERRED
        .iter()
        .map(std::path::Path::new)
        .filter(|p| p.is_file())
        .find_map(|p| certgen_text::FontHandle::load(p).ok())
}
