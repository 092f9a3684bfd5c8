//! # Mesh Renderer
//!
//! Draws [`Mesh`]es with one shared shader program. The camera matrices are
//! program uniforms: `projection` is set on resize, `view` whenever the camera
//! moves, and `model` plus the `material.*` block on every draw.

use super::{Device, Mesh, ShaderProgram, Vertex3D, VertexLayout};
use crate::config::ShaderConfig;
use crate::foundation::math::{look_at, perspective, utils::deg_to_rad, Mat4, Vec3};

/// Default camera eye
pub const DEFAULT_EYE: [f32; 3] = [0.0, 2.85, 15.63];

/// Default vertical field of view in degrees
pub const DEFAULT_FOV_DEGREES: f32 = 50.0;

/// Near and far clip planes of the default projection
const CLIP_PLANES: (f32, f32) = (0.1, 100.0);

/// Default perspective for a viewport of `width` by `height` pixels.
/// Zero extents are treated as one pixel.
pub fn default_projection(width: u32, height: u32) -> Mat4 {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    perspective(deg_to_rad(DEFAULT_FOV_DEGREES), aspect, CLIP_PLANES.0, CLIP_PLANES.1)
}

/// Renders meshes with per-draw model and material uniforms
pub struct MeshRenderer {
    device: Device,
    program: Option<ShaderProgram>,
    layout: VertexLayout,
}

impl MeshRenderer {
    /// Build the mesh program from shader files.
    ///
    /// Without `vertex_colors` the color attribute is left unbound and the
    /// shader is told to ignore it. A shader that fails to load or link is
    /// logged and the renderer draws nothing.
    pub fn new(device: &Device, shaders: &ShaderConfig, vertex_colors: bool) -> Self {
        let program = match ShaderProgram::from_config(device, shaders) {
            Ok(program) => Some(program),
            Err(e) => {
                log::error!("Mesh renderer has no shader program, nothing will be drawn: {e}");
                None
            }
        };
        Self::build(device, program, vertex_colors)
    }

    /// Use an already linked program. Sets the default camera looking at the
    /// origin with a 4:3 perspective; call [`MeshRenderer::resize`] to match
    /// the real viewport.
    pub fn with_program(device: &Device, program: ShaderProgram, vertex_colors: bool) -> Self {
        Self::build(device, Some(program), vertex_colors)
    }

    fn build(device: &Device, program: Option<ShaderProgram>, vertex_colors: bool) -> Self {
        let renderer = Self {
            device: device.clone(),
            program,
            layout: if vertex_colors {
                Vertex3D::LAYOUT
            } else {
                Vertex3D::LAYOUT_NO_COLOR
            },
        };
        if let Some(program) = &renderer.program {
            program.bind();
            program.set_int("useVertexColor", i32::from(vertex_colors));
        }
        renderer.set_view_matrix(&look_at(Vec3::from(DEFAULT_EYE), Vec3::zeros(), Vec3::y()));
        renderer.resize(800, 600);
        renderer
    }

    /// Draw one mesh with the given model matrix.
    ///
    /// The mesh's vertices and indices are uploaded again on every call.
    pub fn draw_mesh(&self, mesh: &Mesh, model: &Mat4) {
        let Some(program) = &self.program else {
            return;
        };
        self.device.set_depth_test(true);
        program.bind();
        program.set_mat4("model", model);

        if let Some(material) = &mesh.material {
            material.borrow().apply(program);
        }

        self.device.upload_geometry(
            mesh.geometry(),
            bytemuck::cast_slice(&mesh.vertices),
            &mesh.indices,
            &self.layout,
        );
        self.device.draw_indexed(mesh.geometry(), mesh.indices.len());
    }

    /// Replace the shared view matrix
    pub fn set_view_matrix(&self, view: &Mat4) {
        if let Some(program) = &self.program {
            program.bind();
            program.set_mat4("view", view);
        }
    }

    /// Replace the shared projection matrix
    pub fn set_projection_matrix(&self, projection: &Mat4) {
        if let Some(program) = &self.program {
            program.bind();
            program.set_mat4("projection", projection);
        }
    }

    /// Reset the projection to [`default_projection`] for a new viewport size
    pub fn resize(&self, width: u32, height: u32) {
        self.set_projection_matrix(&default_projection(width, height));
    }

    /// Whether a shader program is available to draw with
    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }
}
