//! Text engine: shapes names and rasterizes glyphs using `cosmic-text`.
//!
//! Each engine owns a `FontSystem` holding only the batch font and a
//! `SwashCache` for glyph bitmaps. Neither is shared between threads;
//! the renderer keeps one engine per worker.
//!
//! Shaping runs in one of two modes:
//!
//! - [`ShapingMode::Advanced`]: `Shaping::Advanced`, full OpenType
//!   substitution and positioning (conjuncts, matras, kerning).
//! - [`ShapingMode::Fallback`]: `Shaping::Basic`, one glyph per
//!   codepoint with plain advances.

use cosmic_text::{
    Attrs, Buffer, CacheKey, Family, FontSystem, Metrics, Shaping, SwashCache, SwashContent,
};
use thiserror::Error;

use crate::cache::{CacheStats, ShapeCache};
use crate::handle::{FaceMeta, FontHandle, ShapingMode};

/// Shaped runs kept per engine unless configured otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("font {family} has no glyph for {ch:?} (U+{code:04X})")]
    MissingGlyph { ch: char, code: u32, family: String },
}

/// One shaped glyph.
///
/// `x`/`y` are whole-pixel positions relative to the pen start and the
/// baseline; the sub-pixel remainder lives in `cache_key`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionedGlyph {
    pub glyph_id: u16,
    pub x_advance: f32,
    pub x_offset: f32,
    pub y_offset: f32,
    pub x: i32,
    pub y: i32,
    pub cache_key: CacheKey,
}

/// Shaped output for one string.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphRun {
    pub glyphs: Vec<PositionedGlyph>,
    /// Sum of advances, in pixels.
    pub total_width: f32,
    pub mode: ShapingMode,
}

impl GlyphRun {
    /// Width rounded to whole pixels, as used for centering.
    pub fn width_px(&self) -> i32 {
        self.total_width.round() as i32
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn glyph_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.glyphs.iter().map(|g| g.glyph_id)
    }
}

/// Pixel layout of a rasterized glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphContent {
    /// One coverage byte per pixel.
    Mask,
    /// RGB coverage plus an unused byte per pixel.
    SubpixelMask,
    /// Straight RGBA per pixel (color emoji).
    Color,
}

/// Borrowed glyph bitmap, positioned relative to the glyph origin.
#[derive(Clone, Copy, Debug)]
pub struct GlyphImage<'a> {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    pub content: GlyphContent,
    pub data: &'a [u8],
}

/// Shaping engine bound to one font, size and mode.
pub struct TextEngine {
    font_system: FontSystem,
    swash_cache: SwashCache,
    face: FaceMeta,
    metrics: Metrics,
    mode: ShapingMode,
    cache: ShapeCache,
}

impl TextEngine {
    pub fn new(font: &FontHandle, font_size: f32, mode: ShapingMode) -> Self {
        Self::with_cache_capacity(font, font_size, mode, DEFAULT_CACHE_CAPACITY)
    }

    /// Build an engine; `cache_capacity` of 0 disables the run cache.
    pub fn with_cache_capacity(
        font: &FontHandle,
        font_size: f32,
        mode: ShapingMode,
        cache_capacity: usize,
    ) -> Self {
        let font_system =
            FontSystem::new_with_locale_and_db(String::from("en-US"), font.database().clone());
        Self {
            font_system,
            swash_cache: SwashCache::new(),
            face: font.face().clone(),
            metrics: Metrics::new(font_size, (font_size * 1.2).ceil()),
            mode,
            cache: ShapeCache::new(cache_capacity),
        }
    }

    pub fn mode(&self) -> ShapingMode {
        self.mode
    }

    pub fn font_size(&self) -> f32 {
        self.metrics.font_size
    }

    pub fn family(&self) -> &str {
        &self.face.family
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Shape `text` into a positioned glyph run.
    ///
    /// Fails when a visible character maps to the font's `.notdef` glyph.
    pub fn shape(&mut self, text: &str) -> Result<GlyphRun, ShapeError> {
        if let Some(run) = self.cache.get(text) {
            return Ok(run.clone());
        }
        let run = self.shape_uncached(text)?;
        self.cache.insert(text, run.clone());
        Ok(run)
    }

    fn shape_uncached(&mut self, text: &str) -> Result<GlyphRun, ShapeError> {
        let shaping = match self.mode {
            ShapingMode::Advanced => Shaping::Advanced,
            ShapingMode::Fallback => Shaping::Basic,
        };
        let attrs = Attrs::new()
            .family(Family::Name(&self.face.family))
            .weight(self.face.weight)
            .style(self.face.style)
            .stretch(self.face.stretch);

        let mut buffer = Buffer::new(&mut self.font_system, self.metrics);
        buffer.set_size(&mut self.font_system, None, None);
        buffer.set_text(&mut self.font_system, text, attrs, shaping);
        buffer.shape_until_scroll(&mut self.font_system, false);

        let font_size = self.metrics.font_size;
        let mut glyphs = Vec::new();
        let mut total_width = 0.0f32;

        for run in buffer.layout_runs() {
            for glyph in run.glyphs.iter() {
                if glyph.glyph_id == 0 {
                    let cluster = run.text.get(glyph.start..glyph.end).unwrap_or_default();
                    if let Some(ch) = cluster.chars().find(|c| !c.is_whitespace()) {
                        return Err(ShapeError::MissingGlyph {
                            ch,
                            code: ch as u32,
                            family: self.face.family.clone(),
                        });
                    }
                }

                let physical = glyph.physical((0.0, 0.0), 1.0);
                total_width += glyph.w;
                glyphs.push(PositionedGlyph {
                    glyph_id: glyph.glyph_id,
                    x_advance: glyph.w,
                    x_offset: glyph.x_offset * font_size,
                    y_offset: glyph.y_offset * font_size,
                    x: physical.x,
                    y: physical.y,
                    cache_key: physical.cache_key,
                });
            }
        }

        Ok(GlyphRun {
            glyphs,
            total_width,
            mode: self.mode,
        })
    }

    /// Rasterize one glyph of a run produced by this engine.
    ///
    /// Returns `None` for glyphs without ink (spaces).
    pub fn rasterize(&mut self, glyph: &PositionedGlyph) -> Option<GlyphImage<'_>> {
        let image = self
            .swash_cache
            .get_image(&mut self.font_system, glyph.cache_key)
            .as_ref()?;
        if image.placement.width == 0 || image.placement.height == 0 {
            return None;
        }
        let content = match image.content {
            SwashContent::Mask => GlyphContent::Mask,
            SwashContent::SubpixelMask => GlyphContent::SubpixelMask,
            SwashContent::Color => GlyphContent::Color,
        };
        Some(GlyphImage {
            left: image.placement.left,
            top: image.placement.top,
            width: image.placement.width,
            height: image.placement.height,
            content,
            data: &image.data,
        })
    }
}

// ===================================================================
// Tests
// ===================================================================
