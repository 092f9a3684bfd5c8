//! Meshes: CPU vertex/index data plus the GPU buffers they upload into

use super::{Device, GeometryId, RenderResult, SharedMaterial, Vertex3D};
use crate::foundation::math::Mat4;

/// Triangle mesh with one baked model transform and an optional material
pub struct Mesh {
    device: Device,
    geometry: GeometryId,
    /// Vertex list, uploaded on every draw
    pub vertices: Vec<Vertex3D>,
    /// Triangle list indices into `vertices`
    pub indices: Vec<u32>,
    /// Model-local transform, identity unless a scene node assigned one
    pub transform: Mat4,
    /// Material shared with other meshes of the same source material
    pub material: Option<SharedMaterial>,
}

impl Mesh {
    /// Allocate GPU buffers for the given data
    pub fn new(
        device: &Device,
        vertices: Vec<Vertex3D>,
        indices: Vec<u32>,
        material: Option<SharedMaterial>,
    ) -> RenderResult<Self> {
        let geometry = device.create_geometry()?;
        Ok(Self {
            device: device.clone(),
            geometry,
            vertices,
            indices,
            transform: Mat4::identity(),
            material,
        })
    }

    /// Device geometry handle
    pub fn geometry(&self) -> GeometryId {
        self.geometry
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("geometry", &self.geometry)
            .field("vertices", &self.vertices.len())
            .field("indices", &self.indices.len())
            .field("transform", &self.transform)
            .field("material", &self.material)
            .finish()
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        self.device.delete_geometry(self.geometry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::headless::HeadlessDevice;
    use crate::render::Material;
    use std::rc::Rc;

    #[test]
    fn test_mesh_owns_geometry() {
        let headless = Rc::new(HeadlessDevice::new());
        let device: Device = headless.clone();
        let material = Material::placeholder().shared();
        let a = Mesh::new(&device, vec![Vertex3D::default(); 3], vec![0, 1, 2], Some(material.clone())).unwrap();
        let b = Mesh::new(&device, vec![Vertex3D::default(); 3], vec![0, 1, 2], Some(material.clone())).unwrap();
        assert_eq!(headless.live_geometries(), 2);
        assert_eq!(Rc::strong_count(&material), 3);
        assert_eq!(a.triangle_count(), 1);
        assert_eq!(a.transform, Mat4::identity());
        drop(a);
        drop(b);
        assert_eq!(headless.live_geometries(), 0);
        assert_eq!(Rc::strong_count(&material), 1);
    }
}
