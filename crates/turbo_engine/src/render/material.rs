//! Material system for rendering

use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::math::Vec3;

use super::ShaderProgram;

/// Material shared by every mesh that references the same source material
pub type SharedMaterial = Rc<RefCell<Material>>;

/// Surface parameters uploaded as `material.*` uniforms
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Base color (RGB)
    pub base_color: Vec3,

    /// Metallic factor (0.0 = dielectric, 1.0 = metallic)
    pub metallic: f32,

    /// Roughness factor (0.0 = mirror, 1.0 = completely rough)
    pub roughness: f32,

    /// Emissive color (RGB)
    pub emissive: Vec3,

    /// Multiplier on the emissive color
    pub emissive_strength: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}

impl Material {
    /// White, non-metallic, half rough, no emission
    pub fn new() -> Self {
        Self {
            base_color: Vec3::new(1.0, 1.0, 1.0),
            metallic: 0.0,
            roughness: 0.5,
            emissive: Vec3::zeros(),
            emissive_strength: 1.0,
        }
    }

    /// Magenta, fully metallic and rough; stands in for missing materials
    pub fn placeholder() -> Self {
        Self {
            base_color: Vec3::new(1.0, 0.0, 1.0),
            metallic: 1.0,
            roughness: 1.0,
            emissive: Vec3::zeros(),
            emissive_strength: 1.0,
        }
    }

    /// Set the base color
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.base_color = Vec3::new(r, g, b);
        self
    }

    /// Set the metallic factor
    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic.clamp(0.0, 1.0);
        self
    }

    /// Set the roughness factor
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    /// Set the emissive color and strength
    pub fn with_emissive(mut self, emissive: Vec3, strength: f32) -> Self {
        self.emissive = emissive;
        self.emissive_strength = strength;
        self
    }

    /// Wrap into a shared handle
    pub fn shared(self) -> SharedMaterial {
        Rc::new(RefCell::new(self))
    }

    /// Write the five `material.*` uniforms
    pub fn apply(&self, program: &ShaderProgram) {
        program.set_vec3("material.baseColorFactor", self.base_color);
        program.set_float("material.metallicFactor", self.metallic);
        program.set_float("material.roughnessFactor", self.roughness);
        program.set_vec3("material.emissiveFactor", self.emissive);
        program.set_float("material.emissiveStrength", self.emissive_strength);
    }
}
