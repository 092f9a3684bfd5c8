//! GPU textures

use std::path::Path;

use super::{Device, RenderError, RenderResult, TextureFilter, TextureId};
use crate::foundation::math::{Rect, Vec2};

/// RGBA8 texture owned by a device; released on drop
pub struct Texture {
    device: Device,
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    /// Upload raw RGBA8 pixels
    pub fn from_rgba(
        device: &Device,
        width: u32,
        height: u32,
        pixels: &[u8],
        filter: TextureFilter,
    ) -> RenderResult<Self> {
        let id = device.create_texture(width, height, pixels, filter)?;
        Ok(Self {
            device: device.clone(),
            id,
            width,
            height,
        })
    }

    /// Decode an image file and upload it with linear filtering
    pub fn from_file<P: AsRef<Path>>(device: &Device, path: P) -> RenderResult<Self> {
        let path = path.as_ref();
        log::info!("Loading texture: {}", path.display());
        let image = image::open(path)
            .map_err(|e| {
                log::error!("Failed to load texture {}: {e}", path.display());
                RenderError::ResourceCreationFailed(format!("{}: {e}", path.display()))
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Self::from_rgba(device, width, height, image.as_raw(), TextureFilter::Linear)
    }

    /// A single opaque white texel
    pub fn white_pixel(device: &Device) -> RenderResult<Self> {
        Self::from_rgba(device, 1, 1, &[255, 255, 255, 255], TextureFilter::Nearest)
    }

    /// Change sampling filter
    pub fn set_filter(&self, filter: TextureFilter) {
        self.device.set_texture_filter(self.id, filter);
    }

    /// Device handle
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size in pixels
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Full-texture rectangle `(0, 0, w, h)`
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.device.delete_texture(self.id);
    }
}
