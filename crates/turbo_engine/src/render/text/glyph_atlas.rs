//! Glyph rasterization and atlas packing
//!
//! Glyphs for character codes 32 to 255 are rasterized at one pixel size and
//! packed shelf by shelf into a square RGBA atlas. Coverage bytes are written
//! to all four channels so a shader can tint text by multiplying.

use std::collections::HashMap;

use crate::foundation::math::Vec2;

use super::{FontError, FontResult};

/// Width and height of every atlas in pixels
pub const ATLAS_DIM: usize = 512;

/// Gap between glyphs and from the left edge
pub const ATLAS_PADDING: usize = 2;

/// First rasterized character code (space)
pub const FIRST_CHAR: u8 = 32;

/// Last rasterized character code
pub const LAST_CHAR: u8 = 255;

/// Placement and metrics of one glyph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// Bearing: `x` from the pen to the bitmap's left edge, `y` from the
    /// baseline up to the bitmap's top edge
    pub offset: Vec2,
    /// Bitmap size in pixels
    pub size: Vec2,
    /// Top-left corner of the bitmap inside the atlas
    pub tex_coords: Vec2,
    /// Pen movement after this glyph
    pub advance: Vec2,
}

/// Coverage bitmap and metrics from a rasterizer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RasterizedGlyph {
    /// Bitmap width
    pub width: usize,
    /// Bitmap height
    pub height: usize,
    /// Distance from the pen to the left edge
    pub left: f32,
    /// Distance from the baseline up to the top edge
    pub top: f32,
    /// Horizontal advance in whole pixels
    pub advance: f32,
    /// Row-major coverage, `width * height` bytes
    pub bitmap: Vec<u8>,
}

/// Source of glyph bitmaps
pub trait GlyphRasterizer {
    /// Rasterize one character at `pixel_size`, or `None` if it cannot be
    /// rendered
    fn rasterize(&self, ch: char, pixel_size: f32) -> Option<RasterizedGlyph>;

    /// Ascent minus descent at `pixel_size`
    fn line_height(&self, pixel_size: f32) -> f32;
}

/// [`GlyphRasterizer`] over a TrueType/OpenType font parsed by `fontdue`
pub struct FontdueRasterizer {
    font: fontdue::Font,
}

impl FontdueRasterizer {
    /// Parse font file bytes
    pub fn from_bytes(bytes: &[u8], pixel_size: f32) -> FontResult<Self> {
        let settings = fontdue::FontSettings {
            scale: pixel_size,
            ..fontdue::FontSettings::default()
        };
        let font = fontdue::Font::from_bytes(bytes, settings)
            .map_err(|e| FontError::LoadError(format!("fontdue error: {e}")))?;
        Ok(Self { font })
    }
}

impl GlyphRasterizer for FontdueRasterizer {
    fn rasterize(&self, ch: char, pixel_size: f32) -> Option<RasterizedGlyph> {
        let (metrics, bitmap) = self.font.rasterize(ch, pixel_size);
        Some(RasterizedGlyph {
            width: metrics.width,
            height: metrics.height,
            left: metrics.xmin as f32,
            top: (metrics.ymin + metrics.height as i32) as f32,
            advance: metrics.advance_width.round(),
            bitmap,
        })
    }

    fn line_height(&self, pixel_size: f32) -> f32 {
        self.font
            .horizontal_line_metrics(pixel_size)
            .map_or(pixel_size, |m| (m.ascent - m.descent).round())
    }
}

/// RGBA atlas pixels and the glyphs packed into them
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    /// `ATLAS_DIM * ATLAS_DIM * 4` bytes
    pub pixels: Vec<u8>,
    /// Packed glyphs by character
    pub glyphs: HashMap<char, Glyph>,
    /// Largest ascent minus descent seen
    pub max_height: f32,
}

impl GlyphAtlas {
    /// Rasterize and pack every character from [`FIRST_CHAR`] to
    /// [`LAST_CHAR`].
    ///
    /// Packing walks a column cursor to the right; when the next glyph would
    /// reach the right edge the cursor returns to the left and drops one row
    /// of `pixel_size`. Glyphs that fail to rasterize or land outside the
    /// atlas are logged and left out.
    pub fn build(rasterizer: &dyn GlyphRasterizer, pixel_size: u32) -> Self {
        let mut pixels = vec![0u8; ATLAS_DIM * ATLAS_DIM * 4];
        let mut glyphs = HashMap::new();
        let mut max_height: f32 = 0.0;
        let mut row = 0usize;
        let mut col = ATLAS_PADDING;
        let size = pixel_size as f32;

        for code in FIRST_CHAR..=LAST_CHAR {
            let ch = char::from(code);
            let Some(glyph) = rasterizer.rasterize(ch, size) else {
                log::error!("Could not render glyph {ch:?}");
                continue;
            };

            if col + glyph.width + ATLAS_PADDING >= ATLAS_DIM {
                col = ATLAS_PADDING;
                row += pixel_size as usize;
            }
            max_height = max_height.max(rasterizer.line_height(size));

            if col + glyph.width > ATLAS_DIM || row + glyph.height > ATLAS_DIM {
                log::error!(
                    "Out of bounds on glyph {ch:?}, ({}, {})",
                    col + glyph.width,
                    row + glyph.height
                );
                continue;
            }

            for y in 0..glyph.height {
                for x in 0..glyph.width {
                    let value = glyph.bitmap.get(y * glyph.width + x).copied().unwrap_or(0);
                    let at = 4 * (ATLAS_DIM * (row + y) + col + x);
                    pixels[at..at + 4].fill(value);
                }
            }

            glyphs.insert(
                ch,
                Glyph {
                    offset: Vec2::new(glyph.left, glyph.top),
                    size: Vec2::new(glyph.width as f32, glyph.height as f32),
                    tex_coords: Vec2::new(col as f32, row as f32),
                    advance: Vec2::new(glyph.advance, 0.0),
                },
            );
            col += glyph.width + ATLAS_PADDING;
        }

        log::debug!("Packed {} glyphs at {pixel_size}px", glyphs.len());
        Self {
            pixels,
            glyphs,
            max_height,
        }
    }
}
