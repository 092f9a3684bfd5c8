//! Shader stages and linked programs

use std::path::Path;

use super::{Device, ProgramId, RenderError, RenderResult, ShaderId, ShaderStage, UniformValue};
use crate::config::ShaderConfig;
use crate::foundation::math::{Mat4, Vec3, Vec4};

/// One compiled shader stage
pub struct Shader {
    device: Device,
    id: ShaderId,
    stage: ShaderStage,
}

impl Shader {
    /// Compile a stage from source text. Failures are logged with the
    /// compiler diagnostic.
    pub fn compile(device: &Device, stage: ShaderStage, source: &str) -> RenderResult<Self> {
        match device.compile_shader(stage, source) {
            Ok(id) => Ok(Self {
                device: device.clone(),
                id,
                stage,
            }),
            Err(e) => {
                log::error!("{e}");
                Err(e)
            }
        }
    }

    /// Read and compile a stage from a file
    pub fn from_file<P: AsRef<Path>>(device: &Device, stage: ShaderStage, path: P) -> RenderResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            log::error!("Failed to open shader file {}: {e}", path.display());
            RenderError::ResourceCreationFailed(format!("{}: {e}", path.display()))
        })?;
        Self::compile(device, stage, &source)
    }

    /// Device handle
    pub fn id(&self) -> ShaderId {
        self.id
    }

    /// Pipeline stage
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.device.delete_shader(self.id);
    }
}

/// Linked program with typed uniform setters
pub struct ShaderProgram {
    device: Device,
    id: ProgramId,
}

impl ShaderProgram {
    /// Link compiled stages. The stages may be dropped afterwards.
    pub fn link(device: &Device, shaders: &[Shader]) -> RenderResult<Self> {
        let ids: Vec<ShaderId> = shaders.iter().map(Shader::id).collect();
        match device.link_program(&ids) {
            Ok(id) => Ok(Self {
                device: device.clone(),
                id,
            }),
            Err(e) => {
                log::error!("{e}");
                Err(e)
            }
        }
    }

    /// Compile and link a vertex/fragment pair from source text
    pub fn from_sources(device: &Device, vertex: &str, fragment: &str) -> RenderResult<Self> {
        let shaders = [
            Shader::compile(device, ShaderStage::Vertex, vertex)?,
            Shader::compile(device, ShaderStage::Fragment, fragment)?,
        ];
        Self::link(device, &shaders)
    }

    /// Compile and link a vertex/fragment pair from files
    pub fn from_files<P: AsRef<Path>>(device: &Device, vertex: P, fragment: P) -> RenderResult<Self> {
        let shaders = [
            Shader::from_file(device, ShaderStage::Vertex, vertex)?,
            Shader::from_file(device, ShaderStage::Fragment, fragment)?,
        ];
        Self::link(device, &shaders)
    }

    /// Build from a configured source pair
    pub fn from_config(device: &Device, config: &ShaderConfig) -> RenderResult<Self> {
        Self::from_files(device, &config.vertex_shader_path, &config.fragment_shader_path)
    }

    /// Device handle
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Make this program current
    pub fn bind(&self) {
        self.device.use_program(self.id);
    }

    /// Set an `int` or sampler uniform
    pub fn set_int(&self, name: &str, value: i32) {
        self.device.set_uniform(self.id, name, UniformValue::Int(value));
    }

    /// Set a `float` uniform
    pub fn set_float(&self, name: &str, value: f32) {
        self.device.set_uniform(self.id, name, UniformValue::Float(value));
    }

    /// Set a `vec3` uniform
    pub fn set_vec3(&self, name: &str, value: Vec3) {
        self.device.set_uniform(self.id, name, UniformValue::Vec3(value));
    }

    /// Set a `vec4` uniform
    pub fn set_vec4(&self, name: &str, value: Vec4) {
        self.device.set_uniform(self.id, name, UniformValue::Vec4(value));
    }

    /// Set a `mat4` uniform
    pub fn set_mat4(&self, name: &str, value: &Mat4) {
        self.device.set_uniform(self.id, name, UniformValue::Mat4(*value));
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.device.delete_program(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::headless::HeadlessDevice;
    use std::rc::Rc;

    #[test]
    fn test_program_links_and_releases_stages() {
        let headless = Rc::new(HeadlessDevice::new());
        let device: Device = headless.clone();
        let program = ShaderProgram::from_sources(&device, "void main(){}", "void main(){}").unwrap();
        assert_eq!(headless.live_programs(), 1);
        assert_eq!(headless.live_shaders(), 0);
        drop(program);
        assert_eq!(headless.live_programs(), 0);
    }

    #[test]
    fn test_compile_failure_reports_stage() {
        let headless = Rc::new(HeadlessDevice::new());
        headless.fail_shader_stage(ShaderStage::Vertex);
        let device: Device = headless.clone();
        let err = ShaderProgram::from_sources(&device, "bad", "void main(){}").err().unwrap();
        assert!(matches!(err, RenderError::ShaderCompilation { stage: ShaderStage::Vertex, .. }));
        assert_eq!(headless.live_programs(), 0);
    }

    #[test]
    fn test_link_failure_cleans_up() {
        let headless = Rc::new(HeadlessDevice::new());
        headless.fail_link();
        let device: Device = headless.clone();
        let result = ShaderProgram::from_sources(&device, "void main(){}", "void main(){}");
        assert!(matches!(result, Err(RenderError::ShaderLink(_))));
        assert_eq!(headless.live_shaders(), 0);
    }

    #[test]
    fn test_missing_shader_file() {
        let device: Device = Rc::new(HeadlessDevice::new());
        let config = ShaderConfig::new("missing.vert", "missing.frag");
        assert!(ShaderProgram::from_config(&device, &config).is_err());
    }

    #[test]
    fn test_uniform_setters_reach_device() {
        let headless = Rc::new(HeadlessDevice::new());
        let device: Device = headless.clone();
        let program = ShaderProgram::from_sources(&device, "", "").unwrap();
        program.set_float("material.metallicFactor", 0.5);
        program.set_mat4("model", &Mat4::identity());
        assert_eq!(headless.last_uniform("material.metallicFactor"), Some(UniformValue::Float(0.5)));
        assert_eq!(headless.last_uniform("model"), Some(UniformValue::Mat4(Mat4::identity())));
    }
}
