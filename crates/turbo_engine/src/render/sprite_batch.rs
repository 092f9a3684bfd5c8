//! # Sprite Batch
//!
//! Collects 2D quads into one CPU-side vertex/index list and submits them
//! with a single indexed draw. Every quad in a pending batch samples the same
//! texture: drawing with a different texture, or switching between textured
//! sprites and solid rectangles, flushes the pending batch first.
//!
//! Coordinates are pixels with the origin at the top-left of the window.

use super::{Device, GeometryId, RenderResult, ShaderProgram, SpriteVertex, Texture, TextureFilter, TextureId};
use crate::config::ShaderConfig;
use crate::foundation::math::{ortho, Mat4, Rect, Vec2, Vec3, Vec4};

/// Per-sprite drawing options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    /// Top-left corner before rotation
    pub position: Vec2,
    /// Size multiplier; a negative axis flips the sprite
    pub scale: Vec2,
    /// Rotation in radians about the quad's center
    pub rotation: f32,
    /// Tint multiplied with the texture
    pub color: Vec4,
    /// Source rectangle in texture pixels; zero means the whole texture
    pub source: Rect,
    /// Offset added to a flipped axis; zero means the texture size
    pub flip_padding: Vec2,
}

impl DrawParams {
    /// Untinted, unscaled, unrotated sprite at `position`
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            source: Rect::default(),
            flip_padding: Vec2::zeros(),
        }
    }

    /// Set the scale
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Set the rotation in radians
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the tint
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    /// Set the source rectangle
    pub fn with_source(mut self, source: Rect) -> Self {
        self.source = source;
        self
    }

    /// Set the flip padding
    pub fn with_flip_padding(mut self, flip_padding: Vec2) -> Self {
        self.flip_padding = flip_padding;
        self
    }
}

/// Texture the pending batch samples
#[derive(Debug, Clone, Copy, PartialEq)]
struct BoundTexture {
    id: TextureId,
    size: Vec2,
}

/// Batched 2D quad renderer
///
/// The batch remembers the texture of the pending quads by handle only; a
/// texture passed to [`SpriteBatch::draw`] must stay alive until the next
/// [`SpriteBatch::flush`].
pub struct SpriteBatch {
    device: Device,
    program: Option<ShaderProgram>,
    geometry: GeometryId,
    vertices: Vec<SpriteVertex>,
    indices: Vec<u32>,
    texture: Option<BoundTexture>,
    projection: Mat4,
    view: Mat4,
    window_size: Vec2,
    camera_position: Vec2,
}

impl SpriteBatch {
    /// Build the sprite program from shader files and size the projection
    /// to the window.
    ///
    /// A shader that fails to load or link is logged and leaves the batch
    /// without a program: quads are still accepted but every flush discards
    /// them. Only a failure to allocate the batch geometry is returned.
    pub fn new(device: &Device, shaders: &ShaderConfig, window_size: Vec2) -> RenderResult<Self> {
        let program = match ShaderProgram::from_config(device, shaders) {
            Ok(program) => Some(program),
            Err(e) => {
                log::error!("Sprite batch has no shader program, nothing will be drawn: {e}");
                None
            }
        };
        Self::build(device, program, window_size)
    }

    /// Use an already linked program
    pub fn with_program(device: &Device, program: ShaderProgram, window_size: Vec2) -> RenderResult<Self> {
        Self::build(device, Some(program), window_size)
    }

    fn build(device: &Device, program: Option<ShaderProgram>, window_size: Vec2) -> RenderResult<Self> {
        let geometry = device.create_geometry()?;
        Ok(Self {
            device: device.clone(),
            program,
            geometry,
            vertices: Vec::new(),
            indices: Vec::new(),
            texture: None,
            projection: screen_projection(window_size),
            view: Mat4::identity(),
            window_size,
            camera_position: Vec2::zeros(),
        })
    }

    /// Queue a textured quad
    pub fn draw(&mut self, texture: &Texture, params: &DrawParams) {
        let bound = BoundTexture {
            id: texture.id(),
            size: texture.size(),
        };
        if self.texture != Some(bound) {
            self.flush();
            self.texture = Some(bound);
        }

        let source = if params.source.is_zero() {
            Rect::new(0.0, 0.0, bound.size.x, bound.size.y)
        } else {
            params.source
        };
        let flip_padding = if params.flip_padding == Vec2::zeros() {
            bound.size
        } else {
            params.flip_padding
        };
        let corners = quad_corners(params.position, params.scale, params.rotation, source, flip_padding);

        let (w, h) = (bound.size.x, bound.size.y);
        let uvs = [
            [source.x / w, source.y / h],
            [(source.x + source.w) / w, source.y / h],
            [source.x / w, (source.y + source.h) / h],
            [(source.x + source.w) / w, (source.y + source.h) / h],
        ];
        self.push_quad(corners, uvs, params.color);
    }

    /// Queue a solid rectangle. Flushes first if textured sprites are pending.
    pub fn draw_rect(&mut self, rect: Rect, color: Vec4) {
        if self.texture.is_some() {
            self.flush();
            self.texture = None;
        }
        let corners = [
            Vec2::new(rect.x, rect.y),
            Vec2::new(rect.x + rect.w, rect.y),
            Vec2::new(rect.x, rect.y + rect.h),
            Vec2::new(rect.x + rect.w, rect.y + rect.h),
        ];
        let uvs = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        self.push_quad(corners, uvs, color);
    }

    fn push_quad(&mut self, corners: [Vec2; 4], uvs: [[f32; 2]; 4], color: Vec4) {
        let offset = self.vertices.len() as u32;
        let color: [f32; 4] = color.into();
        for (corner, uv) in corners.iter().zip(uvs) {
            self.vertices.push(SpriteVertex {
                position: [corner.x, corner.y],
                tex_coords: uv,
                color,
            });
        }
        self.indices
            .extend_from_slice(&[offset, offset + 1, offset + 2, offset + 2, offset + 1, offset + 3]);
    }

    /// Submit pending quads in one draw call and clear the batch.
    /// Does nothing when the batch is empty.
    pub fn flush(&mut self) {
        if self.vertices.is_empty() {
            return;
        }
        let Some(program) = &self.program else {
            self.vertices.clear();
            self.indices.clear();
            return;
        };

        self.device.set_depth_test(false);
        program.bind();

        // Solid rectangles sample a white texel that only lives for this draw
        let white = match self.texture {
            Some(bound) => {
                self.device.set_texture_filter(bound.id, TextureFilter::Nearest);
                self.device.bind_texture(0, bound.id);
                None
            }
            None => match Texture::white_pixel(&self.device) {
                Ok(texture) => {
                    self.device.bind_texture(0, texture.id());
                    Some(texture)
                }
                Err(e) => {
                    log::error!("Failed to create white texture for sprite batch: {e}");
                    None
                }
            },
        };
        program.set_int("albedoTexture", 0);

        self.device.upload_geometry(
            self.geometry,
            bytemuck::cast_slice(&self.vertices),
            &self.indices,
            &SpriteVertex::LAYOUT,
        );
        program.set_mat4("projection", &self.projection);
        program.set_mat4("view", &self.view);
        self.device.draw_indexed(self.geometry, self.indices.len());

        self.vertices.clear();
        self.indices.clear();
        drop(white);
    }

    /// Center the view on `focal_point`, clamped so the window stays inside
    /// `bounds`. The focal point is truncated to whole pixels.
    pub fn update_camera(&mut self, focal_point: Vec2, bounds: Rect) {
        let half = self.window_size / 2.0;
        let clamp_axis = |value: f32, start: f32, extent: f32, half: f32| {
            let low = (start + half) as i32;
            let high = (start + extent - half) as i32;
            // Not i32::clamp: bounds smaller than the window give low > high
            (value as i32).max(low).min(high) as f32
        };
        let focal = Vec2::new(
            clamp_axis(focal_point.x, bounds.x, bounds.w, half.x),
            clamp_axis(focal_point.y, bounds.y, bounds.h, half.y),
        );
        self.camera_position = focal;
        self.view = Mat4::new_translation(&Vec3::new(-focal.x + half.x, -focal.y + half.y, 0.0));
    }

    /// Resize the screen-space projection: `(0,0)` top-left to `size`
    /// bottom-right
    pub fn set_projection(&mut self, window_size: Vec2) {
        self.window_size = window_size;
        self.projection = screen_projection(window_size);
    }

    /// Whether a shader program is available to draw with
    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    /// Clamped focal point from the last [`SpriteBatch::update_camera`]
    pub fn camera_position(&self) -> Vec2 {
        self.camera_position
    }

    /// Current view matrix
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Current projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Pending vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Pending indices
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Pending vertex data
    pub fn vertices(&self) -> &[SpriteVertex] {
        &self.vertices
    }
}

impl Drop for SpriteBatch {
    fn drop(&mut self) {
        self.device.delete_geometry(self.geometry);
    }
}

fn screen_projection(window_size: Vec2) -> Mat4 {
    ortho(0.0, window_size.x, window_size.y, 0.0)
}

/// Corners in top-left, top-right, bottom-left, bottom-right order.
///
/// The quad is built around its center `position + extent * scale / 2`,
/// rotated there, and then shifted by `flip_padding` along each axis whose
/// scale is negative.
fn quad_corners(position: Vec2, scale: Vec2, rotation: f32, source: Rect, flip_padding: Vec2) -> [Vec2; 4] {
    let half = Vec2::new(source.w * scale.x, source.h * scale.y) * 0.5;
    let center = position + half;
    let (sin, cos) = rotation.sin_cos();
    let rotate = |v: Vec2| Vec2::new(cos * v.x + sin * v.y, -sin * v.x + cos * v.y);

    let mut corners = [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(-half.x, half.y),
        Vec2::new(half.x, half.y),
    ]
    .map(|corner| rotate(corner) + center);

    if scale.y < 0.0 {
        for corner in &mut corners {
            corner.y += flip_padding.y;
        }
    }
    if scale.x < 0.0 {
        for corner in &mut corners {
            corner.x += flip_padding.x;
        }
    }
    corners
}
