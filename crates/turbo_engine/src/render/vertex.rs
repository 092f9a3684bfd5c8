//! Vertex formats and their attribute layouts
//!
//! The sprite batch uses [`SpriteVertex`]; every mesh uses [`Vertex3D`]. Mesh
//! pipelines built without vertex colors bind [`Vertex3D::LAYOUT_NO_COLOR`] and
//! leave the color field at its default.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use super::{VertexAttribute, VertexLayout};

/// 2D vertex: position, texture coordinate, RGBA color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SpriteVertex {
    /// Position in pixels
    pub position: [f32; 2],
    /// Normalized texture coordinate
    pub tex_coords: [f32; 2],
    /// Tint
    pub color: [f32; 4],
}

impl SpriteVertex {
    /// Attribute bindings: 0 position, 1 uv, 2 color
    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: size_of::<Self>() as i32,
        attributes: &[
            VertexAttribute { location: 0, components: 2, offset: offset_of!(Self, position) as i32 },
            VertexAttribute { location: 1, components: 2, offset: offset_of!(Self, tex_coords) as i32 },
            VertexAttribute { location: 2, components: 4, offset: offset_of!(Self, color) as i32 },
        ],
    };
}

/// 3D vertex: position, texture coordinate, normal, RGBA color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex3D {
    /// Model-space position
    pub position: [f32; 3],
    /// Texture coordinate
    pub tex_coords: [f32; 2],
    /// Model-space normal
    pub normal: [f32; 3],
    /// Vertex color, white when the source has none
    pub color: [f32; 4],
}

impl Default for Vertex3D {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            tex_coords: [0.0; 2],
            normal: [0.0, 1.0, 0.0],
            color: [1.0; 4],
        }
    }
}

impl Vertex3D {
    /// Vertex without color
    pub fn new(position: [f32; 3], tex_coords: [f32; 2], normal: [f32; 3]) -> Self {
        Self {
            position,
            tex_coords,
            normal,
            color: [1.0; 4],
        }
    }

    /// Attribute bindings: 0 position, 1 uv, 2 normal, 3 color
    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: size_of::<Self>() as i32,
        attributes: &[
            VertexAttribute { location: 0, components: 3, offset: offset_of!(Self, position) as i32 },
            VertexAttribute { location: 1, components: 2, offset: offset_of!(Self, tex_coords) as i32 },
            VertexAttribute { location: 2, components: 3, offset: offset_of!(Self, normal) as i32 },
            VertexAttribute { location: 3, components: 4, offset: offset_of!(Self, color) as i32 },
        ],
    };

    /// Same as [`Vertex3D::LAYOUT`] without the color binding
    pub const LAYOUT_NO_COLOR: VertexLayout = VertexLayout {
        stride: size_of::<Self>() as i32,
        attributes: &[
            VertexAttribute { location: 0, components: 3, offset: offset_of!(Self, position) as i32 },
            VertexAttribute { location: 1, components: 2, offset: offset_of!(Self, tex_coords) as i32 },
            VertexAttribute { location: 2, components: 3, offset: offset_of!(Self, normal) as i32 },
        ],
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_layout_is_tightly_packed() {
        assert_eq!(SpriteVertex::LAYOUT.stride, 32);
        let offsets: Vec<i32> = SpriteVertex::LAYOUT.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16]);
    }

    #[test]
    fn test_mesh_layout_offsets() {
        assert_eq!(Vertex3D::LAYOUT.stride, 48);
        let offsets: Vec<i32> = Vertex3D::LAYOUT.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 20, 32]);
        assert_eq!(Vertex3D::LAYOUT_NO_COLOR.attributes.len(), 3);
    }
}
