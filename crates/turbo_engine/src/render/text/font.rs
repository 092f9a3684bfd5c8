//! Fonts: a glyph atlas texture plus layout of strings into sprite quads

use std::collections::HashMap;
use std::path::Path;

use super::glyph_atlas::{FontdueRasterizer, Glyph, GlyphAtlas, GlyphRasterizer, ATLAS_DIM};
use super::{FontError, FontResult};
use crate::foundation::math::{Rect, Vec2, Vec4};
use crate::render::{Device, DrawParams, SpriteBatch, Texture, TextureFilter};

/// Line spacing as a multiple of the pixel size when wrapping
const LINE_SPACING: f32 = 1.5;

/// Rasterized font at one pixel size. Immutable after construction.
pub struct Font {
    texture: Texture,
    pixel_size: u32,
    max_height: f32,
    glyphs: HashMap<char, Glyph>,
}

impl Font {
    /// Load a TrueType/OpenType file and build its atlas
    pub fn from_file<P: AsRef<Path>>(device: &Device, path: P, pixel_size: u32) -> FontResult<Self> {
        let path = path.as_ref();
        log::info!("Loading font {} {pixel_size}", path.display());
        let bytes = std::fs::read(path).map_err(|e| {
            log::error!("Could not open font {}: {e}", path.display());
            FontError::LoadError(format!("{}: {e}", path.display()))
        })?;
        let rasterizer = FontdueRasterizer::from_bytes(&bytes, pixel_size as f32)?;
        Self::from_rasterizer(device, &rasterizer, pixel_size)
    }

    /// Build the atlas from any glyph source and upload it
    pub fn from_rasterizer(device: &Device, rasterizer: &dyn GlyphRasterizer, pixel_size: u32) -> FontResult<Self> {
        let atlas = GlyphAtlas::build(rasterizer, pixel_size);
        let dim = ATLAS_DIM as u32;
        let texture = Texture::from_rgba(device, dim, dim, &atlas.pixels, TextureFilter::Linear)
            .map_err(|e| FontError::AtlasCreationError(e.to_string()))?;
        Ok(Self {
            texture,
            pixel_size,
            max_height: atlas.max_height,
            glyphs: atlas.glyphs,
        })
    }

    /// Queue `text` as glyph quads.
    ///
    /// `position` is the top-left of the first line. With `wrap_width`, a new
    /// line starts after the glyph that pushes the line width past it.
    /// Returns the box the text used: the wrap width (or the measured width
    /// without wrapping) and the covered height, each padded by the pixel
    /// size. Empty text returns zero.
    pub fn render_text(
        &self,
        batch: &mut SpriteBatch,
        text: &str,
        mut position: Vec2,
        scale: Vec2,
        color: Vec4,
        wrap_width: Option<f32>,
    ) -> Vec2 {
        let size = self.pixel_size as f32;
        let start = position;
        // Anchor is the top-left, glyph offsets are from the baseline
        position.y += size;
        let mut line_width = 0.0;

        for ch in text.chars() {
            let Some(glyph) = self.glyphs.get(&ch) else {
                log::error!("Could not find glyph {ch:?}");
                continue;
            };

            let at = Vec2::new(
                position.x + glyph.offset.x * scale.x,
                position.y - glyph.offset.y * scale.y,
            );
            let source = Rect::new(glyph.tex_coords.x, glyph.tex_coords.y, glyph.size.x, glyph.size.y);
            batch.draw(
                &self.texture,
                &DrawParams::new(at).with_scale(scale).with_color(color).with_source(source),
            );

            position.x += glyph.advance.x * scale.x;
            line_width += glyph.advance.x * scale.x;

            if let Some(wrap) = wrap_width.filter(|w| *w >= 0.0) {
                if line_width > wrap {
                    position.y += size * LINE_SPACING;
                    position.x = start.x;
                    line_width = 0.0;
                }
            }
        }

        if text.is_empty() {
            return Vec2::zeros();
        }
        let width = match wrap_width {
            Some(wrap) if wrap > 0.0 => wrap,
            _ => line_width,
        };
        // Whole pixels
        Vec2::new(width.trunc() + size, position.y - start.y + size)
    }

    /// Unscaled single-line size: summed advances by the tallest glyph
    pub fn text_dimensions(&self, text: &str) -> Vec2 {
        text.chars().fold(Vec2::zeros(), |dims, ch| match self.glyphs.get(&ch) {
            Some(glyph) => Vec2::new(dims.x + glyph.advance.x, dims.y.max(glyph.size.y)),
            None => {
                log::error!("Could not find glyph {ch:?}");
                dims
            }
        })
    }

    /// Packed glyph for a character
    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    /// Pixel size glyphs were rasterized at
    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    /// Largest ascent minus descent
    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    /// Atlas texture
    pub fn texture(&self) -> &Texture {
        &self.texture
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("pixel_size", &self.pixel_size)
            .field("max_height", &self.max_height)
            .field("glyphs", &self.glyphs.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::headless::HeadlessDevice;
    use crate::render::text::glyph_atlas::tests::BlockRasterizer;
    use crate::render::ShaderProgram;
    use std::rc::Rc;

    fn setup() -> (Rc<HeadlessDevice>, Font, SpriteBatch) {
        let headless = Rc::new(HeadlessDevice::new());
        let device: Device = headless.clone();
        let rasterizer = BlockRasterizer {
            width: 8,
            height: 10,
            advance: 10.0,
        };
        let font = Font::from_rasterizer(&device, &rasterizer, 16).unwrap();
        let program = ShaderProgram::from_sources(&device, "vs", "fs").unwrap();
        let batch = SpriteBatch::with_program(&device, program, Vec2::new(800.0, 600.0)).unwrap();
        (headless, font, batch)
    }

    fn white() -> Vec4 {
        Vec4::new(1.0, 1.0, 1.0, 1.0)
    }

    #[test]
    fn test_wrap_breaks_after_width_exceeded() {
        let (_headless, font, mut batch) = setup();
        let dims = font.render_text(&mut batch, "AAAAAAAAAA", Vec2::zeros(), Vec2::new(1.0, 1.0), white(), Some(50.0));

        let tops: Vec<[f32; 2]> = batch.vertices().chunks(4).map(|quad| quad[0].position).collect();
        assert_eq!(tops.len(), 10);
        // Glyph top is 9 above the baseline at y = 16
        assert_eq!(tops[5], [51.0, 7.0]);
        // Sixth advance takes the line to 60 > 50, so the seventh glyph wraps
        assert_eq!(tops[6], [1.0, 31.0]);
        assert_eq!(tops[9], [31.0, 31.0]);

        assert_eq!(dims, Vec2::new(66.0, 56.0));
        assert!(dims.y >= 2.0 * 16.0);
    }

    #[test]
    fn test_unwrapped_dimensions_use_measured_width() {
        let (_headless, font, mut batch) = setup();
        let dims = font.render_text(&mut batch, "AAA", Vec2::new(5.0, 5.0), Vec2::new(2.0, 2.0), white(), None);
        assert_eq!(dims, Vec2::new(60.0 + 16.0, 32.0));
        assert_eq!(batch.vertices()[0].position, [7.0, 3.0]);
    }

    #[test]
    fn test_empty_text_is_zero_sized() {
        let (_headless, font, mut batch) = setup();
        let dims = font.render_text(&mut batch, "", Vec2::zeros(), Vec2::new(1.0, 1.0), white(), Some(50.0));
        assert_eq!(dims, Vec2::zeros());
        assert_eq!(batch.vertex_count(), 0);
    }

    #[test]
    fn test_missing_glyph_is_skipped() {
        let (_headless, font, mut batch) = setup();
        font.render_text(&mut batch, "A\u{263a}A", Vec2::zeros(), Vec2::new(1.0, 1.0), white(), None);
        assert_eq!(batch.vertex_count(), 8);
        assert_eq!(font.text_dimensions("A\u{263a}A"), Vec2::new(20.0, 10.0));
    }

    #[test]
    fn test_glyph_quads_sample_the_atlas() {
        let (headless, font, mut batch) = setup();
        font.render_text(&mut batch, "AB", Vec2::zeros(), Vec2::new(1.0, 1.0), white(), None);
        batch.flush();
        assert_eq!(headless.draw_count(), 1);
        assert_eq!(headless.texture_size(font.texture().id()), Some((512, 512)));

        let a = font.glyph('A').unwrap();
        let b = font.glyph('B').unwrap();
        assert_eq!(b.tex_coords.x, a.tex_coords.x + 10.0);
        assert_eq!(batch.vertex_count(), 0);
    }

    #[test]
    fn test_text_dimensions_ignore_wrapping() {
        let (_headless, font, _batch) = setup();
        assert_eq!(font.text_dimensions("AAAAAAAAAA"), Vec2::new(100.0, 10.0));
        assert_eq!(font.max_height(), 20.0);
        assert_eq!(font.pixel_size(), 16);
    }
}
