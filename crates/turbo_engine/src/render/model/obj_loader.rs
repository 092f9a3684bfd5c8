//! OBJ file loader for 3D models
//!
//! Faces are expanded per face-vertex (no sharing between faces) and
//! fan-triangulated. Each `o`/`g` group becomes its own mesh, and a
//! `usemtl` switch in the middle of a group starts a new one.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use super::mtl_parser::parse_mtl;
use super::MeshData;
use crate::render::{Material, SharedMaterial, Vertex3D};

/// Errors from reading an OBJ file
#[derive(Error, Debug)]
pub enum ObjError {
    /// The file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A statement could not be parsed
    #[error("Parse error on line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },
    /// The file parsed but holds nothing drawable
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// One group of faces sharing a material
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjShape {
    /// Group or object name
    pub name: String,
    /// Expanded vertices
    pub vertices: Vec<Vertex3D>,
    /// Sequential triangle indices
    pub indices: Vec<u32>,
    /// Name given by `usemtl`
    pub material: Option<String>,
}

/// Parsed OBJ contents before materials are resolved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjFile {
    /// Shapes in file order, empty groups dropped
    pub shapes: Vec<ObjShape>,
    /// `mtllib` references in file order
    pub material_libraries: Vec<String>,
}

struct ObjParser {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    file: ObjFile,
    current: ObjShape,
}

impl ObjParser {
    fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            tex_coords: Vec::new(),
            file: ObjFile::default(),
            current: ObjShape::default(),
        }
    }

    fn finish_shape(&mut self, next_name: String, material: Option<String>) {
        let next = ObjShape {
            name: next_name,
            material,
            ..ObjShape::default()
        };
        let done = std::mem::replace(&mut self.current, next);
        if !done.indices.is_empty() {
            self.file.shapes.push(done);
        }
    }

    fn statement(&mut self, keyword: &str, args: &[&str], line: usize) -> Result<(), ObjError> {
        match keyword {
            "v" => self.positions.push(floats::<3>(args, line)?),
            "vn" => self.normals.push(floats::<3>(args, line)?),
            "vt" => self.tex_coords.push(floats::<2>(args, line)?),
            "f" => self.face(args, line)?,
            "o" | "g" => {
                let name = args.join(" ");
                if self.current.indices.is_empty() {
                    self.current.name = name;
                } else {
                    let material = self.current.material.clone();
                    self.finish_shape(name, material);
                }
            }
            "usemtl" => {
                let material = args.first().map(|s| (*s).to_string());
                if self.current.indices.is_empty() {
                    self.current.material = material;
                } else {
                    let name = self.current.name.clone();
                    self.finish_shape(name, material);
                }
            }
            "mtllib" => self.file.material_libraries.push(args.join(" ")),
            _ => {}
        }
        Ok(())
    }

    fn face(&mut self, args: &[&str], line: usize) -> Result<(), ObjError> {
        if args.len() < 3 {
            return Err(parse_error(line, "face needs at least three vertices"));
        }
        let first = self.current.vertices.len() as u32;
        for corner in args {
            let vertex = self.face_vertex(corner, line)?;
            self.current.vertices.push(vertex);
        }
        for i in 1..(args.len() as u32 - 1) {
            self.current.indices.extend_from_slice(&[first, first + i, first + i + 1]);
        }
        Ok(())
    }

    fn face_vertex(&self, corner: &str, line: usize) -> Result<Vertex3D, ObjError> {
        let mut parts = corner.split('/');
        let position = parts
            .next()
            .and_then(|p| resolve(p, self.positions.len(), line).transpose())
            .ok_or_else(|| parse_error(line, "face vertex without a position"))??;
        let tex = parts
            .next()
            .and_then(|p| resolve(p, self.tex_coords.len(), line).transpose())
            .transpose()?;
        let normal = parts
            .next()
            .and_then(|p| resolve(p, self.normals.len(), line).transpose())
            .transpose()?;

        Ok(Vertex3D::new(
            self.positions[position],
            tex.map_or([0.0, 0.0], |i| self.tex_coords[i]),
            normal.map_or([0.0, 1.0, 0.0], |i| self.normals[i]),
        ))
    }
}

/// Resolve a 1-based or negative (relative) OBJ index; empty means absent
fn resolve(token: &str, len: usize, line: usize) -> Result<Option<usize>, ObjError> {
    if token.is_empty() {
        return Ok(None);
    }
    let raw: i64 = token
        .parse()
        .map_err(|_| parse_error(line, &format!("invalid index '{token}'")))?;
    let resolved = if raw > 0 { raw - 1 } else { len as i64 + raw };
    if raw == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(parse_error(line, &format!("index {raw} out of range (have {len})")));
    }
    Ok(Some(resolved as usize))
}

fn floats<const N: usize>(args: &[&str], line: usize) -> Result<[f32; N], ObjError> {
    let mut out = [0.0; N];
    if args.len() < N {
        return Err(parse_error(line, &format!("expected {N} values")));
    }
    for (slot, token) in out.iter_mut().zip(args) {
        *slot = token
            .parse()
            .map_err(|_| parse_error(line, &format!("'{token}' is not a number")))?;
    }
    Ok(out)
}

fn parse_error(line: usize, message: &str) -> ObjError {
    ObjError::ParseError {
        line,
        message: message.to_string(),
    }
}

/// Parse OBJ text without touching the filesystem
pub fn parse_obj(contents: &str) -> Result<ObjFile, ObjError> {
    let mut parser = ObjParser::new();
    for (index, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        let args: Vec<&str> = tokens.collect();
        parser.statement(keyword, &args, index + 1)?;
    }
    parser.finish_shape(String::new(), None);

    if parser.file.shapes.is_empty() {
        return Err(ObjError::InvalidFormat("no faces found in OBJ file".to_string()));
    }
    Ok(parser.file)
}

/// Load an OBJ file and resolve its materials from `mtllib` files in the
/// same directory. Unreadable material libraries are logged and skipped.
pub fn load_obj(path: &Path) -> Result<Vec<MeshData>, ObjError> {
    log::warn!("Loading OBJ {}: prefer glTF over OBJ", path.display());
    let contents = std::fs::read_to_string(path)?;
    let file = parse_obj(&contents)?;
    let search_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut materials: HashMap<String, SharedMaterial> = HashMap::new();
    for library in &file.material_libraries {
        let library_path = search_dir.join(library);
        let parsed = std::fs::read_to_string(&library_path)
            .map_err(|e| e.to_string())
            .and_then(|text| parse_mtl(&text));
        match parsed {
            Ok(entries) => {
                for (name, entry) in entries {
                    log::info!("Material {name}: diffuse {:?}", entry.diffuse);
                    materials.insert(name, entry.to_material().shared());
                }
            }
            Err(e) => log::warn!("Skipping material library {}: {e}", library_path.display()),
        }
    }

    let placeholder = Material::placeholder().shared();
    Ok(file
        .shapes
        .into_iter()
        .map(|shape| {
            let material = shape
                .material
                .as_ref()
                .and_then(|name| materials.get(name).cloned())
                .unwrap_or_else(|| placeholder.clone());
            MeshData {
                vertices: shape.vertices,
                indices: shape.indices,
                material: Some(material),
                ..MeshData::default()
            }
        })
        .collect())
}
