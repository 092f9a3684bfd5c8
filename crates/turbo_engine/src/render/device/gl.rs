//! OpenGL 3.3 core device over `glow`
//!
//! # Safety
//!
//! [`GlDevice`] must be created on the thread that owns a current OpenGL
//! context, and that context must outlive the device.
#![allow(unsafe_code)]

use std::cell::RefCell;

use glow::HasContext;
use slotmap::SlotMap;

use super::{
    GeometryId, GraphicsDevice, ProgramId, ShaderId, ShaderStage, TextureFilter, TextureId,
    UniformValue, VertexLayout,
};
use crate::render::{RenderError, RenderResult};

struct GlGeometry {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: glow::Buffer,
}

#[derive(Default)]
struct GlResources {
    textures: SlotMap<TextureId, glow::Texture>,
    shaders: SlotMap<ShaderId, glow::Shader>,
    programs: SlotMap<ProgramId, glow::Program>,
    geometries: SlotMap<GeometryId, GlGeometry>,
}

/// OpenGL implementation of [`GraphicsDevice`]
pub struct GlDevice {
    gl: glow::Context,
    resources: RefCell<GlResources>,
}

fn gl_filter(filter: TextureFilter) -> i32 {
    match filter {
        TextureFilter::Nearest => glow::NEAREST as i32,
        TextureFilter::Linear => glow::LINEAR as i32,
    }
}

fn debug_severity_name(severity: u32) -> &'static str {
    match severity {
        glow::DEBUG_SEVERITY_HIGH => "high",
        glow::DEBUG_SEVERITY_MEDIUM => "medium",
        glow::DEBUG_SEVERITY_LOW => "low",
        _ => "notification",
    }
}

impl GlDevice {
    /// Take ownership of a loaded context and apply the default state:
    /// alpha blending, a grey clear color, and the driver debug callback
    /// when `KHR_debug` is available.
    ///
    /// High-severity driver messages abort the process.
    pub fn new(mut gl: glow::Context) -> Self {
        unsafe {
            log::info!(
                "OpenGL {}, GLSL {}",
                gl.get_parameter_string(glow::VERSION),
                gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION)
            );
            log::info!("Vendor: {}", gl.get_parameter_string(glow::VENDOR));
            log::info!("Renderer: {}", gl.get_parameter_string(glow::RENDERER));

            let version = gl.version();
            let has_debug = (version.major, version.minor) >= (4, 3)
                || gl.supported_extensions().contains("GL_KHR_debug");
            if has_debug {
                gl.enable(glow::DEBUG_OUTPUT);
                gl.enable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
                gl.debug_message_callback(|_source, _kind, _id, severity, message| {
                    if severity == glow::DEBUG_SEVERITY_HIGH {
                        log::error!("GL [{}] {message}", debug_severity_name(severity));
                        log::error!("Aborting...");
                        std::process::abort();
                    }
                    log::warn!("GL [{}] {message}", debug_severity_name(severity));
                });
                gl.debug_message_control(glow::DONT_CARE, glow::DONT_CARE, glow::DONT_CARE, &[], false);
                gl.debug_message_control(glow::DEBUG_SOURCE_API, glow::DEBUG_TYPE_ERROR, glow::DONT_CARE, &[], true);
            } else {
                log::warn!("GL debug output unavailable on this context");
            }

            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            gl.clear_color(0.25, 0.25, 0.25, 1.0);
        }
        log::info!("OpenGL state initialized");

        Self {
            gl,
            resources: RefCell::new(GlResources::default()),
        }
    }
}

impl GraphicsDevice for GlDevice {
    fn create_texture(
        &self,
        width: u32,
        height: u32,
        pixels: &[u8],
        filter: TextureFilter,
    ) -> RenderResult<TextureId> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RenderError::ResourceCreationFailed(format!(
                "texture {width}x{height} needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        let gl = &self.gl;
        let texture = unsafe {
            let texture = gl.create_texture().map_err(RenderError::ResourceCreationFailed)?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, gl_filter(filter));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, gl_filter(filter));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );
            gl.bind_texture(glow::TEXTURE_2D, None);
            texture
        };
        Ok(self.resources.borrow_mut().textures.insert(texture))
    }

    fn set_texture_filter(&self, texture: TextureId, filter: TextureFilter) {
        let resources = self.resources.borrow();
        let Some(&handle) = resources.textures.get(texture) else {
            return;
        };
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(handle));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, gl_filter(filter));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, gl_filter(filter));
        }
    }

    fn bind_texture(&self, unit: u32, texture: TextureId) {
        let resources = self.resources.borrow();
        let handle = resources.textures.get(texture).copied();
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, handle);
        }
    }

    fn delete_texture(&self, texture: TextureId) {
        if let Some(handle) = self.resources.borrow_mut().textures.remove(texture) {
            unsafe { self.gl.delete_texture(handle) };
        }
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> RenderResult<ShaderId> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        let gl = &self.gl;
        let shader = unsafe {
            let shader = gl.create_shader(kind).map_err(RenderError::ResourceCreationFailed)?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(RenderError::ShaderCompilation { stage, log });
            }
            shader
        };
        Ok(self.resources.borrow_mut().shaders.insert(shader))
    }

    fn delete_shader(&self, shader: ShaderId) {
        if let Some(handle) = self.resources.borrow_mut().shaders.remove(shader) {
            unsafe { self.gl.delete_shader(handle) };
        }
    }

    fn link_program(&self, shaders: &[ShaderId]) -> RenderResult<ProgramId> {
        let mut resources = self.resources.borrow_mut();
        let gl = &self.gl;
        let handles: Vec<glow::Shader> = shaders
            .iter()
            .filter_map(|id| resources.shaders.get(*id).copied())
            .collect();
        let program = unsafe {
            let program = gl.create_program().map_err(RenderError::ResourceCreationFailed)?;
            for &shader in &handles {
                gl.attach_shader(program, shader);
            }
            gl.link_program(program);
            for &shader in &handles {
                gl.detach_shader(program, shader);
            }
            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(RenderError::ShaderLink(log));
            }
            program
        };
        Ok(resources.programs.insert(program))
    }

    fn delete_program(&self, program: ProgramId) {
        if let Some(handle) = self.resources.borrow_mut().programs.remove(program) {
            unsafe { self.gl.delete_program(handle) };
        }
    }

    fn use_program(&self, program: ProgramId) {
        let resources = self.resources.borrow();
        let handle = resources.programs.get(program).copied();
        unsafe { self.gl.use_program(handle) };
    }

    fn set_uniform(&self, program: ProgramId, name: &str, value: UniformValue) {
        let resources = self.resources.borrow();
        let Some(&handle) = resources.programs.get(program) else {
            return;
        };
        let gl = &self.gl;
        unsafe {
            let location = gl.get_uniform_location(handle, name);
            let location = location.as_ref();
            match value {
                UniformValue::Int(v) => gl.uniform_1_i32(location, v),
                UniformValue::Float(v) => gl.uniform_1_f32(location, v),
                UniformValue::Vec3(v) => gl.uniform_3_f32(location, v.x, v.y, v.z),
                UniformValue::Vec4(v) => gl.uniform_4_f32(location, v.x, v.y, v.z, v.w),
                UniformValue::Mat4(m) => gl.uniform_matrix_4_f32_slice(location, false, m.as_slice()),
            }
        }
    }

    fn create_geometry(&self) -> RenderResult<GeometryId> {
        let gl = &self.gl;
        let geometry = unsafe {
            GlGeometry {
                vao: gl.create_vertex_array().map_err(RenderError::ResourceCreationFailed)?,
                vbo: gl.create_buffer().map_err(RenderError::ResourceCreationFailed)?,
                ebo: gl.create_buffer().map_err(RenderError::ResourceCreationFailed)?,
            }
        };
        Ok(self.resources.borrow_mut().geometries.insert(geometry))
    }

    fn upload_geometry(&self, geometry: GeometryId, vertices: &[u8], indices: &[u32], layout: &VertexLayout) {
        let resources = self.resources.borrow();
        let Some(buffers) = resources.geometries.get(geometry) else {
            log::error!("upload to unknown geometry {geometry:?}");
            return;
        };
        let gl = &self.gl;
        unsafe {
            gl.bind_vertex_array(Some(buffers.vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffers.vbo));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, vertices, glow::DYNAMIC_DRAW);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffers.ebo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(indices),
                glow::DYNAMIC_DRAW,
            );
            for attribute in layout.attributes {
                gl.enable_vertex_attrib_array(attribute.location);
                gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.components,
                    glow::FLOAT,
                    false,
                    layout.stride,
                    attribute.offset,
                );
            }
            gl.bind_vertex_array(None);
        }
    }

    fn draw_indexed(&self, geometry: GeometryId, index_count: usize) {
        let resources = self.resources.borrow();
        let Some(buffers) = resources.geometries.get(geometry) else {
            return;
        };
        unsafe {
            self.gl.bind_vertex_array(Some(buffers.vao));
            self.gl.draw_elements(glow::TRIANGLES, index_count as i32, glow::UNSIGNED_INT, 0);
            self.gl.bind_vertex_array(None);
        }
    }

    fn delete_geometry(&self, geometry: GeometryId) {
        if let Some(buffers) = self.resources.borrow_mut().geometries.remove(geometry) {
            unsafe {
                self.gl.delete_vertex_array(buffers.vao);
                self.gl.delete_buffer(buffers.vbo);
                self.gl.delete_buffer(buffers.ebo);
            }
        }
    }

    fn set_depth_test(&self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }

    fn set_clear_color(&self, color: [f32; 4]) {
        let [r, g, b, a] = color;
        unsafe { self.gl.clear_color(r, g, b, a) };
    }

    fn clear(&self) {
        unsafe { self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT) };
    }

    fn set_viewport(&self, width: u32, height: u32) {
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32) };
    }
}

impl Drop for GlDevice {
    fn drop(&mut self) {
        let resources = self.resources.get_mut();
        let gl = &self.gl;
        unsafe {
            for (_, texture) in resources.textures.drain() {
                gl.delete_texture(texture);
            }
            for (_, program) in resources.programs.drain() {
                gl.delete_program(program);
            }
            for (_, shader) in resources.shaders.drain() {
                gl.delete_shader(shader);
            }
            for (_, geometry) in resources.geometries.drain() {
                gl.delete_vertex_array(geometry.vao);
                gl.delete_buffer(geometry.vbo);
                gl.delete_buffer(geometry.ebo);
            }
        }
        log::info!("OpenGL device destroyed");
    }
}
