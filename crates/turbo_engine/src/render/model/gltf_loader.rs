//! glTF 2.0 loader (`.gltf` with external or embedded buffers, and `.glb`)
//!
//! Attribute and index data are read straight from the buffer bytes using
//! each accessor's view offset, accessor offset and stride. Index width is
//! taken from the accessor component type.

use gltf::accessor::{DataType, Dimensions};
use gltf::mesh::Semantic;

use super::{MeshData, ModelError};
use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::render::{Material, SharedMaterial, Vertex3D};

/// Load every primitive of every mesh, then bake node transforms
pub fn load_gltf(path: &std::path::Path) -> Result<Vec<MeshData>, ModelError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)?;
    let buffers: Vec<&[u8]> = buffers.iter().map(|data| data.0.as_slice()).collect();

    let materials = build_materials(&document);
    let placeholder = Material::placeholder().shared();

    // Output meshes produced by each glTF mesh index
    let mut produced: Vec<std::ops::Range<usize>> = Vec::new();
    let mut meshes = Vec::new();
    for mesh in document.meshes() {
        let start = meshes.len();
        for primitive in mesh.primitives() {
            let material = primitive
                .material()
                .index()
                .and_then(|i| materials.get(i).cloned())
                .unwrap_or_else(|| placeholder.clone());
            meshes.push(read_primitive(&primitive, &buffers, material)?);
        }
        produced.push(start..meshes.len());
    }

    for node in document.nodes() {
        let Some(mesh) = node.mesh() else {
            continue;
        };
        let matrix = node_matrix(&node);
        if let Some(range) = produced.get(mesh.index()) {
            // Later nodes referencing the same mesh overwrite earlier ones
            for data in &mut meshes[range.clone()] {
                data.transform = matrix;
            }
        }
    }

    Ok(meshes)
}

/// Local matrix of a node: `T * R * S`, or the node's explicit matrix
pub fn node_matrix(node: &gltf::Node) -> Mat4 {
    match node.transform() {
        gltf::scene::Transform::Matrix { matrix } => Mat4::from(matrix),
        gltf::scene::Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => Transform::from_trs(translation, rotation, scale).to_matrix(),
    }
}

fn build_materials(document: &gltf::Document) -> Vec<SharedMaterial> {
    document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            let [r, g, b, _] = pbr.base_color_factor();
            Material {
                base_color: Vec3::new(r, g, b),
                metallic: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
                emissive: Vec3::from(material.emissive_factor()),
                emissive_strength: material.emissive_strength().unwrap_or(1.0),
            }
            .shared()
        })
        .collect()
}

fn read_primitive(
    primitive: &gltf::Primitive,
    buffers: &[&[u8]],
    material: SharedMaterial,
) -> Result<MeshData, ModelError> {
    let positions = primitive
        .get(&Semantic::Positions)
        .ok_or_else(|| ModelError::InvalidData("primitive has no POSITION attribute".to_string()))?;
    let positions = read_floats::<3>(&positions, buffers)?;
    let count = positions.len();

    let normals = match primitive.get(&Semantic::Normals) {
        Some(accessor) => Some(read_floats::<3>(&accessor, buffers)?),
        None => {
            log::warn!("primitive has no NORMAL attribute, using +Y");
            None
        }
    };
    let tex_coords = match primitive.get(&Semantic::TexCoords(0)) {
        Some(accessor) => Some(read_floats::<2>(&accessor, buffers)?),
        None => None,
    };
    let colors = match primitive.get(&Semantic::Colors(0)) {
        Some(accessor) => Some(read_colors(&accessor, buffers)?),
        None => None,
    };

    let vertices = (0..count)
        .map(|i| Vertex3D {
            position: positions[i],
            tex_coords: tex_coords.as_ref().and_then(|t| t.get(i).copied()).unwrap_or([0.0, 0.0]),
            normal: normals.as_ref().and_then(|n| n.get(i).copied()).unwrap_or([0.0, 1.0, 0.0]),
            color: colors.as_ref().and_then(|c| c.get(i).copied()).unwrap_or([1.0; 4]),
        })
        .collect();

    let indices = match primitive.indices() {
        Some(accessor) => {
            let (bytes, stride) = accessor_bytes(&accessor, buffers)?;
            read_indices(bytes, accessor.data_type(), accessor.count(), stride)?
        }
        None => (0..count as u32).collect(),
    };
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= count) {
        return Err(ModelError::InvalidData(format!(
            "index {bad} out of range for {count} vertices"
        )));
    }

    Ok(MeshData {
        vertices,
        indices,
        material: Some(material),
        transform: Mat4::identity(),
    })
}

/// Bytes covered by an accessor, starting at its first element, plus the
/// distance between consecutive elements
fn accessor_bytes<'a>(accessor: &gltf::Accessor, buffers: &[&'a [u8]]) -> Result<(&'a [u8], usize), ModelError> {
    let view = accessor
        .view()
        .ok_or_else(|| ModelError::InvalidData(format!("accessor {} has no buffer view", accessor.index())))?;
    let buffer = buffers
        .get(view.buffer().index())
        .ok_or_else(|| ModelError::InvalidData(format!("missing buffer {}", view.buffer().index())))?;

    let element_size = accessor.size();
    let stride = view.stride().unwrap_or(element_size);
    let count = accessor.count();
    if count == 0 {
        return Ok((&[], stride));
    }
    let range = view
        .offset()
        .checked_add(accessor.offset())
        .and_then(|start| byte_range(start, stride, count, element_size))
        .ok_or_else(|| {
            ModelError::InvalidData(format!(
                "accessor {} with {count} elements of stride {stride} overflows",
                accessor.index()
            ))
        })?;
    let bytes = buffer.get(range.clone()).ok_or_else(|| {
        ModelError::InvalidData(format!(
            "accessor {} reads {}..{} past buffer end {}",
            accessor.index(),
            range.start,
            range.end,
            buffer.len()
        ))
    })?;
    Ok((bytes, stride))
}

/// Bytes spanned by `count` elements of `element_size` bytes, `stride`
/// apart, beginning at `start`. `None` if the end doesn't fit in `usize`.
fn byte_range(start: usize, stride: usize, count: usize, element_size: usize) -> Option<std::ops::Range<usize>> {
    if count == 0 {
        return Some(start..start);
    }
    let end = stride
        .checked_mul(count - 1)?
        .checked_add(element_size)?
        .checked_add(start)?;
    Some(start..end)
}

fn read_floats<const N: usize>(accessor: &gltf::Accessor, buffers: &[&[u8]]) -> Result<Vec<[f32; N]>, ModelError> {
    if accessor.data_type() != DataType::F32 || accessor.dimensions().multiplicity() != N {
        return Err(ModelError::InvalidData(format!(
            "accessor {} is {:?} {:?}, expected {N} floats",
            accessor.index(),
            accessor.dimensions(),
            accessor.data_type()
        )));
    }
    let (bytes, stride) = accessor_bytes(accessor, buffers)?;
    Ok((0..accessor.count())
        .map(|i| {
            let mut out = [0.0; N];
            for (c, value) in out.iter_mut().enumerate() {
                let offset = i * stride + c * 4;
                *value = bytemuck::pod_read_unaligned(&bytes[offset..offset + 4]);
            }
            out
        })
        .collect())
}

/// `COLOR_0` as RGBA floats; accepts float or normalized u8/u16, vec3 or vec4
fn read_colors(accessor: &gltf::Accessor, buffers: &[&[u8]]) -> Result<Vec<[f32; 4]>, ModelError> {
    let components = match accessor.dimensions() {
        Dimensions::Vec3 => 3,
        Dimensions::Vec4 => 4,
        other => {
            return Err(ModelError::InvalidData(format!("COLOR_0 must be vec3 or vec4, got {other:?}")));
        }
    };
    let data_type = accessor.data_type();
    let (bytes, stride) = accessor_bytes(accessor, buffers)?;
    let component = |offset: usize| -> Result<f32, ModelError> {
        match data_type {
            DataType::F32 => Ok(bytemuck::pod_read_unaligned(&bytes[offset..offset + 4])),
            DataType::U8 => Ok(f32::from(bytes[offset]) / 255.0),
            DataType::U16 => {
                let raw: u16 = bytemuck::pod_read_unaligned(&bytes[offset..offset + 2]);
                Ok(f32::from(raw) / 65535.0)
            }
            other => Err(ModelError::InvalidData(format!("unsupported COLOR_0 component type {other:?}"))),
        }
    };
    let size = data_type.size();
    (0..accessor.count())
        .map(|i| {
            let mut rgba = [1.0; 4];
            for (c, value) in rgba.iter_mut().take(components).enumerate() {
                *value = component(i * stride + c * size)?;
            }
            Ok(rgba)
        })
        .collect()
}

/// Decode `count` indices whose width is given by `data_type`.
///
/// `bytes` starts at the first index; consecutive indices are `stride` bytes
/// apart.
pub fn read_indices(bytes: &[u8], data_type: DataType, count: usize, stride: usize) -> Result<Vec<u32>, ModelError> {
    let width = match data_type {
        DataType::U8 => 1,
        DataType::U16 => 2,
        DataType::U32 => 4,
        other => {
            return Err(ModelError::InvalidData(format!("unsupported index component type {other:?}")));
        }
    };
    let fits = byte_range(0, stride, count, width).is_some_and(|range| range.end <= bytes.len());
    if !fits {
        return Err(ModelError::InvalidData(format!(
            "{count} indices of {width} bytes do not fit in {} bytes",
            bytes.len()
        )));
    }
    Ok((0..count)
        .map(|i| {
            let at = i * stride;
            match width {
                1 => u32::from(bytes[at]),
                2 => u32::from(bytemuck::pod_read_unaligned::<u16>(&bytes[at..at + 2])),
                _ => bytemuck::pod_read_unaligned::<u32>(&bytes[at..at + 4]),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::headless::HeadlessDevice;
    use crate::render::{Device, Model};
    use approx::assert_relative_eq;
    use std::path::PathBuf;
    use std::rc::Rc;

    fn headless_device() -> Device {
        Rc::new(HeadlessDevice::new())
    }

    const COMPONENT_U8: u32 = 5121;
    const COMPONENT_U16: u32 = 5123;
    const COMPONENT_U32: u32 = 5125;

    const QUAD: [[f32; 3]; 4] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
    const QUAD_INDICES: [u32; 6] = [0, 1, 2, 3, 0, 1];

    /// Positions followed by indices of the given width
    fn mesh_buffer(positions: &[[f32; 3]], indices: &[u32], component_type: u32) -> Vec<u8> {
        let mut bytes: Vec<u8> = bytemuck::cast_slice(positions).to_vec();
        for &index in indices {
            match component_type {
                COMPONENT_U8 => bytes.push(index as u8),
                COMPONENT_U16 => bytes.extend_from_slice(&(index as u16).to_le_bytes()),
                _ => bytes.extend_from_slice(&index.to_le_bytes()),
            }
        }
        bytes
    }

    fn write_gltf(name: &str, component_type: u32, nodes: Option<&str>) -> PathBuf {
        write_mesh_gltf(name, &QUAD, &QUAD_INDICES, component_type, None, nodes)
    }

    /// One primitive over `positions` and `indices`. `index_count` overrides
    /// the declared index accessor count.
    fn write_mesh_gltf(
        name: &str,
        positions: &[[f32; 3]],
        indices: &[u32],
        component_type: u32,
        index_count: Option<&str>,
        nodes: Option<&str>,
    ) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("turbo_gltf_{}_{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let buffer = mesh_buffer(positions, indices, component_type);
        std::fs::write(dir.join("mesh.bin"), &buffer).unwrap();
        let position_bytes = positions.len() * 12;
        let index_bytes = buffer.len() - position_bytes;
        let index_count = index_count.map_or_else(|| indices.len().to_string(), str::to_string);
        let axis = |f: fn(f32, f32) -> f32, init: f32| {
            let mut out = [init; 3];
            for p in positions {
                for (o, v) in out.iter_mut().zip(p) {
                    *o = f(*o, *v);
                }
            }
            format!("[{:?}, {:?}, {:?}]", out[0], out[1], out[2])
        };
        let (min, max) = (axis(f32::min, f32::MAX), axis(f32::max, f32::MIN));
        let nodes = nodes.map_or_else(String::new, |n| format!(",\n  \"nodes\": {n}"));
        let json = format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "buffers": [{{ "uri": "mesh.bin", "byteLength": {len} }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": {position_bytes} }},
    {{ "buffer": 0, "byteOffset": {position_bytes}, "byteLength": {index_bytes} }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": {vertex_count}, "type": "VEC3",
       "min": {min}, "max": {max} }},
    {{ "bufferView": 1, "componentType": {component_type}, "count": {index_count}, "type": "SCALAR" }}
  ],
  "materials": [{{
    "pbrMetallicRoughness": {{ "baseColorFactor": [0.0, 1.0, 0.0, 1.0], "metallicFactor": 0.25, "roughnessFactor": 0.75 }},
    "emissiveFactor": [1.0, 0.5, 0.0]
  }}],
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1, "material": 0 }}] }}]{nodes}
}}"#,
            len = buffer.len(),
            vertex_count = positions.len()
        );
        let path = dir.join("mesh.gltf");
        std::fs::write(&path, json).unwrap();
        path
    }

    fn cleanup(path: &std::path::Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_index_widths_decode_identically() {
        let expected = vec![0, 1, 2, 3, 0, 1];
        for (name, component_type) in [("u8", COMPONENT_U8), ("u16", COMPONENT_U16), ("u32", COMPONENT_U32)] {
            let path = write_gltf(name, component_type, None);
            let meshes = load_gltf(&path).unwrap();
            cleanup(&path);
            assert_eq!(meshes.len(), 1, "{name}");
            assert_eq!(meshes[0].indices, expected, "{name}");
            assert_eq!(meshes[0].vertices.len(), 4, "{name}");
        }
    }

    #[test]
    fn test_read_indices_sequence_for_each_width() {
        let expected: Vec<u32> = (0..6).collect();
        let u8s: Vec<u8> = (0..6).collect();
        let u16s: Vec<u8> = (0u16..6).flat_map(u16::to_le_bytes).collect();
        let u32s: Vec<u8> = (0u32..6).flat_map(u32::to_le_bytes).collect();
        assert_eq!(read_indices(&u8s, DataType::U8, 6, 1).unwrap(), expected);
        assert_eq!(read_indices(&u16s, DataType::U16, 6, 2).unwrap(), expected);
        assert_eq!(read_indices(&u32s, DataType::U32, 6, 4).unwrap(), expected);
    }

    #[test]
    fn test_sequential_indices_load_unchanged_for_each_width() {
        let strip: Vec<[f32; 3]> = (0..6).map(|i| [i as f32, (i % 2) as f32, 0.0]).collect();
        let expected: Vec<u32> = (0..6).collect();
        for (name, component_type) in [("seq_u8", COMPONENT_U8), ("seq_u16", COMPONENT_U16), ("seq_u32", COMPONENT_U32)] {
            let path = write_mesh_gltf(name, &strip, &expected, component_type, None, None);
            let model = Model::try_load(&headless_device(), &path);
            cleanup(&path);
            let model = model.unwrap();
            assert_eq!(model.meshes().len(), 1, "{name}");
            assert_eq!(model.meshes()[0].indices, expected, "{name}");
            assert_eq!(model.meshes()[0].vertices.len(), 6, "{name}");
        }
    }

    #[test]
    fn test_oversized_accessor_count_is_an_error() {
        let path = write_mesh_gltf(
            "huge_count",
            &QUAD,
            &QUAD_INDICES,
            COMPONENT_U32,
            Some("4611686018427387904"),
            None,
        );
        let result = load_gltf(&path);
        cleanup(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_byte_range_checks_overflow() {
        assert_eq!(byte_range(8, 4, 6, 4), Some(8..32));
        assert_eq!(byte_range(8, 4, 0, 4), Some(8..8));
        assert_eq!(byte_range(0, 12, usize::MAX, 12), None);
        assert_eq!(byte_range(usize::MAX, 1, 1, 1), None);
    }

    #[test]
    fn test_read_indices_rejects_float_and_short_data() {
        assert!(read_indices(&[0; 8], DataType::F32, 2, 4).is_err());
        assert!(read_indices(&[0; 3], DataType::U16, 2, 2).is_err());
        assert!(read_indices(&[0; 8], DataType::U32, usize::MAX, 4).is_err());
        assert_eq!(read_indices(&[], DataType::U16, 0, 2).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_node_translation_sets_mesh_transform() {
        let path = write_gltf("node", COMPONENT_U16, Some(r#"[{ "mesh": 0, "translation": [1.0, 0.0, 0.0] }]"#));
        let meshes = load_gltf(&path).unwrap();
        cleanup(&path);
        assert_relative_eq!(meshes[0].transform, Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_later_node_overwrites_earlier() {
        let nodes = r#"[
            { "mesh": 0, "translation": [1.0, 0.0, 0.0] },
            { "mesh": 0, "scale": [2.0, 2.0, 2.0] }
        ]"#;
        let path = write_gltf("overwrite", COMPONENT_U16, Some(nodes));
        let meshes = load_gltf(&path).unwrap();
        cleanup(&path);
        assert_relative_eq!(meshes[0].transform, Mat4::new_scaling(2.0));
    }

    #[test]
    fn test_material_factors_are_read() {
        let path = write_gltf("material", COMPONENT_U32, None);
        let meshes = load_gltf(&path).unwrap();
        cleanup(&path);
        let material = meshes[0].material.as_ref().unwrap().borrow().clone();
        assert_eq!(material.base_color, Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(material.metallic, 0.25);
        assert_relative_eq!(material.roughness, 0.75);
        assert_eq!(material.emissive, Vec3::new(1.0, 0.5, 0.0));
        assert_relative_eq!(material.emissive_strength, 1.0);
    }

    #[test]
    fn test_missing_normals_default_up() {
        let path = write_gltf("normals", COMPONENT_U8, None);
        let meshes = load_gltf(&path).unwrap();
        cleanup(&path);
        assert_eq!(meshes[0].vertices[2].position, [1.0, 1.0, 0.0]);
        assert_eq!(meshes[0].vertices[2].normal, [0.0, 1.0, 0.0]);
        assert_eq!(meshes[0].vertices[2].color, [1.0; 4]);
    }
}
