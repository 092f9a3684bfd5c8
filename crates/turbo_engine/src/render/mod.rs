//! Rendering
//!
//! GPU resources ([`Texture`], [`ShaderProgram`], [`Mesh`]) wrap handles from a
//! shared [`Device`] and release them on drop. On top of those sit the
//! [`SpriteBatch`] for 2D quads and text, the [`MeshRenderer`] for 3D meshes,
//! and [`Model`] loading for glTF and OBJ files.

pub mod device;
pub mod material;
pub mod mesh;
pub mod mesh_renderer;
pub mod model;
pub mod renderer;
pub mod shader;
pub mod sprite_batch;
pub mod sprite_sheet;
pub mod text;
pub mod texture;
pub mod vertex;

pub use device::{
    Device, GeometryId, GraphicsDevice, ProgramId, ShaderId, ShaderStage, TextureFilter, TextureId,
    UniformValue, VertexAttribute, VertexLayout,
};
pub use material::{Material, SharedMaterial};
pub use mesh::Mesh;
pub use mesh_renderer::MeshRenderer;
pub use model::{Model, ModelError, ModelFormat};
pub use renderer::Renderer;
pub use shader::{Shader, ShaderProgram};
pub use sprite_batch::{DrawParams, SpriteBatch};
pub use sprite_sheet::{Animation, Animator, SpriteAtlas, SpriteSheet, SpriteSheetError};
pub use text::{Font, FontError, FontdueRasterizer, Glyph, GlyphRasterizer};
pub use texture::Texture;
pub use vertex::{SpriteVertex, Vertex3D};

/// Errors from GPU resource creation and rendering
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during execution
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Resource creation or management failed
    ///
    /// Covers textures, buffers and programs the device refused to create,
    /// and source files that could not be read or decoded.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A shader stage did not compile; `log` is the compiler diagnostic
    #[error("Failed to compile {stage} shader: {log}")]
    ShaderCompilation {
        /// Stage that failed
        stage: ShaderStage,
        /// Compiler output
        log: String,
    },

    /// A program did not link; carries the linker diagnostic
    #[error("Failed to link shader program: {0}")]
    ShaderLink(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
