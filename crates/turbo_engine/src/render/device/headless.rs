//! Recording device without a GPU
//!
//! Keeps real resource bookkeeping (so leaks and double frees show up as
//! counts) and appends every state change to a command log that tests
//! inspect.

use std::cell::RefCell;

use slotmap::SlotMap;

use super::{
    GeometryId, GraphicsDevice, ProgramId, ShaderId, ShaderStage, TextureFilter, TextureId,
    UniformValue, VertexLayout,
};
use crate::render::{RenderError, RenderResult};

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// A texture was created
    CreateTexture {
        /// New handle
        texture: TextureId,
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
    /// A texture filter changed
    SetTextureFilter {
        /// Target texture
        texture: TextureId,
        /// New filter
        filter: TextureFilter,
    },
    /// A texture was bound to a unit
    BindTexture {
        /// Sampler unit
        unit: u32,
        /// Bound texture
        texture: TextureId,
    },
    /// A texture was released
    DeleteTexture(TextureId),
    /// A program was made current
    UseProgram(ProgramId),
    /// A uniform was written
    SetUniform {
        /// Target program
        program: ProgramId,
        /// Uniform name
        name: String,
        /// Value written
        value: UniformValue,
    },
    /// Geometry buffers were replaced
    UploadGeometry {
        /// Target geometry
        geometry: GeometryId,
        /// Raw vertex bytes
        vertices: Vec<u8>,
        /// Index list
        indices: Vec<u32>,
        /// Vertex stride in bytes
        stride: i32,
        /// Bound attribute locations
        locations: Vec<u32>,
    },
    /// An indexed draw was issued
    DrawIndexed {
        /// Drawn geometry
        geometry: GeometryId,
        /// Number of indices
        index_count: usize,
    },
    /// Depth testing toggled
    SetDepthTest(bool),
    /// Clear color changed
    SetClearColor([f32; 4]),
    /// Framebuffer cleared
    Clear,
    /// Viewport changed
    SetViewport(u32, u32),
}

#[derive(Default)]
struct HeadlessState {
    textures: SlotMap<TextureId, (u32, u32)>,
    shaders: SlotMap<ShaderId, ShaderStage>,
    programs: SlotMap<ProgramId, ()>,
    geometries: SlotMap<GeometryId, ()>,
    commands: Vec<DeviceCommand>,
    fail_stage: Option<ShaderStage>,
    fail_link: bool,
}

/// [`GraphicsDevice`] that records instead of rendering
#[derive(Default)]
pub struct HeadlessDevice {
    state: RefCell<HeadlessState>,
}

impl HeadlessDevice {
    /// Create an empty device
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every compile of `stage` fail with a diagnostic
    pub fn fail_shader_stage(&self, stage: ShaderStage) {
        self.state.borrow_mut().fail_stage = Some(stage);
    }

    /// Make every link fail with a diagnostic
    pub fn fail_link(&self) {
        self.state.borrow_mut().fail_link = true;
    }

    /// Snapshot of the command log
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.state.borrow().commands.clone()
    }

    /// Forget recorded commands, keeping live resources
    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }

    /// Number of indexed draws recorded
    pub fn draw_count(&self) -> usize {
        self.count(|c| matches!(c, DeviceCommand::DrawIndexed { .. }))
    }

    /// Number of geometry uploads recorded
    pub fn upload_count(&self) -> usize {
        self.count(|c| matches!(c, DeviceCommand::UploadGeometry { .. }))
    }

    /// Textures currently alive
    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    /// Programs currently alive
    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    /// Shader stages currently alive
    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    /// Geometries currently alive
    pub fn live_geometries(&self) -> usize {
        self.state.borrow().geometries.len()
    }

    /// Size of a live texture
    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.state.borrow().textures.get(texture).copied()
    }

    /// Most recent value written to the named uniform
    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.state.borrow().commands.iter().rev().find_map(|c| match c {
            DeviceCommand::SetUniform { name: n, value, .. } if n == name => Some(*value),
            _ => None,
        })
    }

    /// Vertex bytes and indices of every upload, oldest first
    pub fn uploads(&self) -> Vec<(Vec<u8>, Vec<u32>)> {
        self.state
            .borrow()
            .commands
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::UploadGeometry { vertices, indices, .. } => {
                    Some((vertices.clone(), indices.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&DeviceCommand) -> bool) -> usize {
        self.state.borrow().commands.iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, command: DeviceCommand) {
        self.state.borrow_mut().commands.push(command);
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_texture(
        &self,
        width: u32,
        height: u32,
        pixels: &[u8],
        _filter: TextureFilter,
    ) -> RenderResult<TextureId> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RenderError::ResourceCreationFailed(format!(
                "texture {width}x{height} needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        let texture = self.state.borrow_mut().textures.insert((width, height));
        self.record(DeviceCommand::CreateTexture { texture, width, height });
        Ok(texture)
    }

    fn set_texture_filter(&self, texture: TextureId, filter: TextureFilter) {
        self.record(DeviceCommand::SetTextureFilter { texture, filter });
    }

    fn bind_texture(&self, unit: u32, texture: TextureId) {
        self.record(DeviceCommand::BindTexture { unit, texture });
    }

    fn delete_texture(&self, texture: TextureId) {
        if self.state.borrow_mut().textures.remove(texture).is_some() {
            self.record(DeviceCommand::DeleteTexture(texture));
        }
    }

    fn compile_shader(&self, stage: ShaderStage, _source: &str) -> RenderResult<ShaderId> {
        let mut state = self.state.borrow_mut();
        if state.fail_stage == Some(stage) {
            return Err(RenderError::ShaderCompilation {
                stage,
                log: "0:1(1): error: forced failure".to_string(),
            });
        }
        Ok(state.shaders.insert(stage))
    }

    fn delete_shader(&self, shader: ShaderId) {
        self.state.borrow_mut().shaders.remove(shader);
    }

    fn link_program(&self, shaders: &[ShaderId]) -> RenderResult<ProgramId> {
        let mut state = self.state.borrow_mut();
        if state.fail_link {
            return Err(RenderError::ShaderLink("error: forced link failure".to_string()));
        }
        if shaders.iter().any(|id| !state.shaders.contains_key(*id)) {
            return Err(RenderError::ShaderLink("unknown shader stage".to_string()));
        }
        Ok(state.programs.insert(()))
    }

    fn delete_program(&self, program: ProgramId) {
        self.state.borrow_mut().programs.remove(program);
    }

    fn use_program(&self, program: ProgramId) {
        self.record(DeviceCommand::UseProgram(program));
    }

    fn set_uniform(&self, program: ProgramId, name: &str, value: UniformValue) {
        self.record(DeviceCommand::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
    }

    fn create_geometry(&self) -> RenderResult<GeometryId> {
        Ok(self.state.borrow_mut().geometries.insert(()))
    }

    fn upload_geometry(&self, geometry: GeometryId, vertices: &[u8], indices: &[u32], layout: &VertexLayout) {
        self.record(DeviceCommand::UploadGeometry {
            geometry,
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
            stride: layout.stride,
            locations: layout.attributes.iter().map(|a| a.location).collect(),
        });
    }

    fn draw_indexed(&self, geometry: GeometryId, index_count: usize) {
        self.record(DeviceCommand::DrawIndexed { geometry, index_count });
    }

    fn delete_geometry(&self, geometry: GeometryId) {
        self.state.borrow_mut().geometries.remove(geometry);
    }

    fn set_depth_test(&self, enabled: bool) {
        self.record(DeviceCommand::SetDepthTest(enabled));
    }

    fn set_clear_color(&self, color: [f32; 4]) {
        self.record(DeviceCommand::SetClearColor(color));
    }

    fn clear(&self) {
        self.record(DeviceCommand::Clear);
    }

    fn set_viewport(&self, width: u32, height: u32) {
        self.record(DeviceCommand::SetViewport(width, height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_bookkeeping() {
        let device = HeadlessDevice::new();
        let texture = device.create_texture(2, 2, &[255; 16], TextureFilter::Linear).unwrap();
        assert_eq!(device.live_textures(), 1);
        assert_eq!(device.texture_size(texture), Some((2, 2)));
        device.delete_texture(texture);
        device.delete_texture(texture);
        assert_eq!(device.live_textures(), 0);
        let deletes = device
            .commands()
            .iter()
            .filter(|c| matches!(c, DeviceCommand::DeleteTexture(_)))
            .count();
        assert_eq!(deletes, 1);
    }

    #[test]
    fn test_texture_size_mismatch_is_rejected() {
        let device = HeadlessDevice::new();
        let result = device.create_texture(2, 2, &[0; 3], TextureFilter::Nearest);
        assert!(matches!(result, Err(RenderError::ResourceCreationFailed(_))));
    }

    #[test]
    fn test_forced_shader_failure() {
        let device = HeadlessDevice::new();
        device.fail_shader_stage(ShaderStage::Fragment);
        assert!(device.compile_shader(ShaderStage::Vertex, "").is_ok());
        let err = device.compile_shader(ShaderStage::Fragment, "").unwrap_err();
        assert!(err.to_string().contains("fragment"));
    }

    #[test]
    fn test_last_uniform() {
        let device = HeadlessDevice::new();
        let vs = device.compile_shader(ShaderStage::Vertex, "").unwrap();
        let program = device.link_program(&[vs]).unwrap();
        device.set_uniform(program, "albedoTexture", UniformValue::Int(0));
        device.set_uniform(program, "albedoTexture", UniformValue::Int(1));
        assert_eq!(device.last_uniform("albedoTexture"), Some(UniformValue::Int(1)));
        assert_eq!(device.last_uniform("view"), None);
    }
}
