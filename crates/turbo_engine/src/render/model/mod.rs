//! Model loading
//!
//! A [`Model`] is the list of meshes produced from one file. The format is
//! picked from the file extension: `.gltf`/`.glb` go through the glTF loader,
//! `.obj` through the OBJ loader with its `.mtl` libraries.

pub mod gltf_loader;
pub mod mtl_parser;
pub mod obj_loader;

use std::path::Path;

use thiserror::Error;

pub use obj_loader::ObjError;

use super::{Device, Mesh, RenderError, SharedMaterial, Vertex3D};
use crate::foundation::math::Mat4;

/// Errors from loading a model file
#[derive(Error, Debug)]
pub enum ModelError {
    /// The file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The glTF importer rejected the file
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    /// The OBJ parser rejected the file
    #[error("OBJ error: {0}")]
    Obj(#[from] ObjError),

    /// Extension not recognized
    #[error("Unsupported model format: {0}")]
    Unsupported(String),

    /// The file parsed but its contents are inconsistent
    #[error("Invalid model data: {0}")]
    InvalidData(String),

    /// GPU buffers could not be created
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// File formats [`Model::load`] understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// glTF 2.0, text or binary
    Gltf,
    /// Wavefront OBJ
    Obj,
}

impl ModelFormat {
    /// Pick a format from the path's extension, case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "gltf" | "glb" => Some(Self::Gltf),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }
}

/// Mesh contents read from a file, before GPU buffers exist
#[derive(Debug, Clone)]
pub struct MeshData {
    /// Vertices
    pub vertices: Vec<Vertex3D>,
    /// Triangle indices
    pub indices: Vec<u32>,
    /// Resolved material
    pub material: Option<SharedMaterial>,
    /// Baked node transform
    pub transform: Mat4,
}

impl Default for MeshData {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            material: None,
            transform: Mat4::identity(),
        }
    }
}

/// Meshes loaded from one file
#[derive(Debug, Default)]
pub struct Model {
    meshes: Vec<Mesh>,
}

impl Model {
    /// Load a model, logging any failure and returning an empty model
    pub fn load<P: AsRef<Path>>(device: &Device, path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load(device, path) {
            Ok(model) => {
                log::info!("Loaded model {} ({} meshes)", path.display(), model.len());
                model
            }
            Err(e) => {
                log::error!("Failed to load model {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load a model, returning the first error encountered
    pub fn try_load<P: AsRef<Path>>(device: &Device, path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let data = match ModelFormat::from_path(path) {
            Some(ModelFormat::Gltf) => gltf_loader::load_gltf(path)?,
            Some(ModelFormat::Obj) => obj_loader::load_obj(path)?,
            None => return Err(ModelError::Unsupported(path.display().to_string())),
        };
        Self::from_mesh_data(device, data)
    }

    /// Create GPU meshes for already-loaded data
    pub fn from_mesh_data(device: &Device, data: Vec<MeshData>) -> Result<Self, ModelError> {
        let meshes = data
            .into_iter()
            .map(|d| {
                let mut mesh = Mesh::new(device, d.vertices, d.indices, d.material)?;
                mesh.transform = d.transform;
                Ok(mesh)
            })
            .collect::<Result<Vec<_>, RenderError>>()?;
        Ok(Self { meshes })
    }

    /// Meshes in file order
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Mutable meshes, for baking extra transforms after load
    pub fn meshes_mut(&mut self) -> &mut [Mesh] {
        &mut self.meshes
    }

    /// True when nothing was loaded
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Number of meshes
    pub fn len(&self) -> usize {
        self.meshes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::headless::HeadlessDevice;
    use std::path::PathBuf;
    use std::rc::Rc;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ModelFormat::from_path(Path::new("a/b.GLB")), Some(ModelFormat::Gltf));
        assert_eq!(ModelFormat::from_path(Path::new("scene.gltf")), Some(ModelFormat::Gltf));
        assert_eq!(ModelFormat::from_path(Path::new("ship.obj")), Some(ModelFormat::Obj));
        assert_eq!(ModelFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(ModelFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_unsupported_extension_gives_empty_model() {
        let device: Device = Rc::new(HeadlessDevice::new());
        assert!(matches!(
            Model::try_load(&device, "level.fbx"),
            Err(ModelError::Unsupported(_))
        ));
        assert!(Model::load(&device, "level.fbx").is_empty());
    }

    #[test]
    fn test_missing_file_gives_empty_model() {
        let device: Device = Rc::new(HeadlessDevice::new());
        assert!(Model::load(&device, "does/not/exist.obj").is_empty());
    }

    #[test]
    fn test_obj_file_loads_into_meshes() {
        let dir: PathBuf = std::env::temp_dir().join(format!("turbo_model_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tri.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\ng a\nf 1 2 3\ng b\nf 3 2 1\n").unwrap();

        let headless = Rc::new(HeadlessDevice::new());
        let device: Device = headless.clone();
        let model = Model::load(&device, &path);
        assert_eq!(model.len(), 2);
        assert_eq!(headless.live_geometries(), 2);
        assert!(model.meshes().iter().all(|m| m.material.is_some()));
        assert_eq!(model.meshes()[0].transform, Mat4::identity());
        drop(model);
        assert_eq!(headless.live_geometries(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_mesh_data_transform_is_kept() {
        let device: Device = Rc::new(HeadlessDevice::new());
        let data = MeshData {
            vertices: vec![Vertex3D::default(); 3],
            indices: vec![0, 1, 2],
            transform: Mat4::new_scaling(5.0),
            ..MeshData::default()
        };
        let model = Model::from_mesh_data(&device, vec![data]).unwrap();
        assert_eq!(model.meshes()[0].transform, Mat4::new_scaling(5.0));
    }
}
