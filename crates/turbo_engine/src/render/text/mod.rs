//! Text rendering
//!
//! A [`Font`] rasterizes Latin-1 glyphs once into a packed atlas texture and
//! lays strings out as textured quads through the
//! [`SpriteBatch`](crate::render::SpriteBatch).
//!
//! # Example
//!
//! ```no_run
//! use turbo_engine::foundation::math::{Vec2, Vec4};
//! use turbo_engine::render::{Device, Font, SpriteBatch};
//!
//! fn hud(device: &Device, batch: &mut SpriteBatch) -> Result<(), Box<dyn std::error::Error>> {
//!     let font = Font::from_file(device, "assets/fonts/cyberdyne.ttf", 32)?;
//!     let white = Vec4::new(1.0, 1.0, 1.0, 1.0);
//!     font.render_text(batch, "Score: 0", Vec2::zeros(), Vec2::new(1.0, 1.0), white, None);
//!     batch.flush();
//!     Ok(())
//! }
//! ```

mod font;
pub mod glyph_atlas;

pub use font::Font;
pub use glyph_atlas::{FontdueRasterizer, Glyph, GlyphAtlas, GlyphRasterizer, RasterizedGlyph};

/// Result type for font operations
pub type FontResult<T> = Result<T, FontError>;

/// Errors that can occur during font operations
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// Failed to load font from file or data
    #[error("Failed to load font: {0}")]
    LoadError(String),

    /// Failed to create or upload the atlas texture
    #[error("Failed to create atlas texture: {0}")]
    AtlasCreationError(String),
}
