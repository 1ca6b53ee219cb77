//! # certgen-text
//!
//! Text side of the certificate pipeline: name normalization, font
//! loading and discovery, shaping, and glyph rasterization via
//! `cosmic-text`.
//!
//! ## Architecture
//!
//! ```text
//! raw line ──► normalize() ──► display string
//!                                   │
//! FontHandle::load(path) ──► TextEngine (FontSystem + SwashCache + LRU)
//!                                   │
//!                                   ▼
//!                     shape(str) ──► GlyphRun { Vec<PositionedGlyph> }
//!                                   │
//!                                   ▼
//!                     rasterize(glyph) ──► GlyphImage (coverage bitmap)
//! ```
//!
//! - **`normalize`**: proper-casing for Latin, pass-through otherwise.
//! - **`handle`**: font loading and shaping-mode resolution.
//! - **`engine`**: shaping and rasterization.
//! - **`cache`**: LRU of shaped runs.
//! - **`fonts`**: system font registry (`font-kit`).

pub mod cache;
pub mod engine;
pub mod fonts;
pub mod handle;
pub mod normalize;

#[cfg(test)]
mod testutil;

// Re-exports for ergonomic use.
pub use cache::{CacheStats, ShapeCache};
pub use engine::{
    GlyphContent, GlyphImage, GlyphRun, PositionedGlyph, ShapeError, TextEngine,
    DEFAULT_CACHE_CAPACITY,
};
pub use fonts::{FontRegistry, GenericFamily, GUJARATI_KEYWORDS, GUJARATI_PROBE};
pub use handle::{FaceMeta, FontError, FontHandle, ModeResolution, ShapingMode};
pub use normalize::{normalize, parse_names, ScriptCase};
