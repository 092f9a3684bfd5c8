//! Graphics device abstraction
//!
//! Every GPU call made by textures, shaders, the sprite batch and the mesh
//! renderer goes through [`GraphicsDevice`]. Resources are addressed by
//! `slotmap` keys so owners can release them on drop without holding raw
//! API handles.
//!
//! Two implementations exist: [`gl::GlDevice`] for OpenGL 3.3 core through
//! `glow`, and [`headless::HeadlessDevice`], which records every call and is
//! what the unit tests render into.

pub mod gl;
pub mod headless;

use std::rc::Rc;

use slotmap::new_key_type;

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::RenderResult;

new_key_type! {
    /// Handle to a texture owned by a device
    pub struct TextureId;
    /// Handle to a compiled shader stage
    pub struct ShaderId;
    /// Handle to a linked shader program
    pub struct ProgramId;
    /// Handle to a vertex/index buffer pair with its attribute bindings
    pub struct GeometryId;
}

/// Shared handle to the active device
pub type Device = Rc<dyn GraphicsDevice>;

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment shader
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Linear,
}

/// Value for a named uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `int` or sampler unit
    Int(i32),
    /// `float`
    Float(f32),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `mat4`, column major
    Mat4(Mat4),
}

/// One float vertex attribute inside an interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader `layout(location = N)`
    pub location: u32,
    /// Number of floats
    pub components: i32,
    /// Byte offset inside the vertex
    pub offset: i32,
}

/// Interleaved vertex layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Size of one vertex in bytes
    pub stride: i32,
    /// Attributes bound at upload time
    pub attributes: &'static [VertexAttribute],
}

/// Synchronous immediate-mode GPU interface
///
/// All methods take `&self`; implementations use interior mutability so that
/// one device can be shared by every renderer through [`Device`].
pub trait GraphicsDevice {
    /// Upload an RGBA8 image; `pixels.len()` must be `width * height * 4`
    fn create_texture(
        &self,
        width: u32,
        height: u32,
        pixels: &[u8],
        filter: TextureFilter,
    ) -> RenderResult<TextureId>;

    /// Change min/mag filtering of a texture
    fn set_texture_filter(&self, texture: TextureId, filter: TextureFilter);

    /// Bind a texture to a sampler unit
    fn bind_texture(&self, unit: u32, texture: TextureId);

    /// Release a texture
    fn delete_texture(&self, texture: TextureId);

    /// Compile one shader stage
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> RenderResult<ShaderId>;

    /// Release a shader stage
    fn delete_shader(&self, shader: ShaderId);

    /// Link compiled stages into a program
    fn link_program(&self, shaders: &[ShaderId]) -> RenderResult<ProgramId>;

    /// Release a program
    fn delete_program(&self, program: ProgramId);

    /// Make a program current
    fn use_program(&self, program: ProgramId);

    /// Set a uniform on a program; unknown names are ignored
    fn set_uniform(&self, program: ProgramId, name: &str, value: UniformValue);

    /// Allocate an empty vertex/index buffer pair
    fn create_geometry(&self) -> RenderResult<GeometryId>;

    /// Replace the contents of a geometry's buffers and rebind its attributes
    fn upload_geometry(&self, geometry: GeometryId, vertices: &[u8], indices: &[u32], layout: &VertexLayout);

    /// Draw `index_count` indices of a geometry as triangles
    fn draw_indexed(&self, geometry: GeometryId, index_count: usize);

    /// Release a geometry
    fn delete_geometry(&self, geometry: GeometryId);

    /// Enable or disable depth testing
    fn set_depth_test(&self, enabled: bool);

    /// Set the color used by [`GraphicsDevice::clear`]
    fn set_clear_color(&self, color: [f32; 4]);

    /// Clear color and depth
    fn clear(&self);

    /// Set the viewport in pixels
    fn set_viewport(&self, width: u32, height: u32);
}
