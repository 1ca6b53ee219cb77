//! CPU rasterizer: composites a shaped run onto a copy of the template.
//!
//! Glyph bitmaps come from a [`GlyphRasterizer`] (the text engine in
//! production). Each glyph is placed at `origin + glyph position`,
//! tinted and alpha-blended source-over. Anything outside the canvas is
//! clipped.

use certgen_core::Rgb;
use certgen_layout::Placement;
use certgen_text::{GlyphContent, GlyphImage, GlyphRun, PositionedGlyph, TextEngine};
use image::{Rgba, RgbaImage};

/// Source of glyph bitmaps for a run.
pub trait GlyphRasterizer {
    fn glyph_image(&mut self, glyph: &PositionedGlyph) -> Option<GlyphImage<'_>>;
}

impl GlyphRasterizer for TextEngine {
    fn glyph_image(&mut self, glyph: &PositionedGlyph) -> Option<GlyphImage<'_>> {
        self.rasterize(glyph)
    }
}

/// What a draw call touched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Glyphs that had a bitmap.
    pub glyphs_drawn: usize,
    /// Pixels with non-zero coverage written to the canvas.
    pub pixels_written: u64,
    /// Pixels with coverage that fell outside the canvas.
    pub pixels_clipped: u64,
}

/// Draw `run` onto a fresh copy of `template`.
pub fn draw<R: GlyphRasterizer + ?Sized>(
    template: &RgbaImage,
    run: &GlyphRun,
    origin: Placement,
    color: Rgb,
    rasterizer: &mut R,
) -> RgbaImage {
    let mut canvas = template.clone();
    draw_into(&mut canvas, run, origin, color, rasterizer);
    canvas
}

/// Draw `run` onto `canvas` in place.
pub fn draw_into<R: GlyphRasterizer + ?Sized>(
    canvas: &mut RgbaImage,
    run: &GlyphRun,
    origin: Placement,
    color: Rgb,
    rasterizer: &mut R,
) -> DrawStats {
    let mut stats = DrawStats::default();
    for glyph in &run.glyphs {
        let Some(image) = rasterizer.glyph_image(glyph) else {
            continue;
        };
        let x = origin.x as i64 + glyph.x as i64 + image.left as i64;
        let y = origin.y as i64 + glyph.y as i64 - image.top as i64;
        blit(canvas, &image, x, y, color, &mut stats);
        stats.glyphs_drawn += 1;
    }
    stats
}

fn blit(
    canvas: &mut RgbaImage,
    image: &GlyphImage<'_>,
    x0: i64,
    y0: i64,
    color: Rgb,
    stats: &mut DrawStats,
) {
    let (canvas_w, canvas_h) = canvas.dimensions();
    let tint = color.to_array();

    for row in 0..image.height {
        let y = y0 + row as i64;
        for col in 0..image.width {
            let x = x0 + col as i64;
            let i = (row * image.width + col) as usize;
            let Some((src, alpha)) = sample(image, i, tint) else {
                continue;
            };
            if alpha == 0 {
                continue;
            }
            if x < 0 || y < 0 || x >= canvas_w as i64 || y >= canvas_h as i64 {
                stats.pixels_clipped += 1;
                continue;
            }
            blend(canvas.get_pixel_mut(x as u32, y as u32), src, alpha);
            stats.pixels_written += 1;
        }
    }
}

/// Color and coverage of pixel `i` of a glyph bitmap.
fn sample(image: &GlyphImage<'_>, i: usize, tint: [u8; 3]) -> Option<([u8; 3], u8)> {
    match image.content {
        GlyphContent::Mask => image.data.get(i).map(|&a| (tint, a)),
        GlyphContent::SubpixelMask => {
            let px = image.data.get(i * 4..i * 4 + 4)?;
            Some((tint, px[0].max(px[1]).max(px[2])))
        }
        GlyphContent::Color => {
            let px = image.data.get(i * 4..i * 4 + 4)?;
            Some(([px[0], px[1], px[2]], px[3]))
        }
    }
}

/// Source-over with straight alpha.
fn blend(dst: &mut Rgba<u8>, src: [u8; 3], alpha: u8) {
    let a = alpha as u32;
    let inv = 255 - a;
    for c in 0..3 {
        dst.0[c] = ((src[c] as u32 * a + dst.0[c] as u32 * inv + 127) / 255) as u8;
    }
    dst.0[3] = (a + (dst.0[3] as u32 * inv + 127) / 255) as u8;
}
