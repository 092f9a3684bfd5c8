//! # Turbo Engine
//!
//! A small OpenGL game core.
//!
//! ## Features
//!
//! - **Sprite batching**: textured and colored quads merged into one draw per texture
//! - **Text**: Latin-1 glyph atlases rasterized with `fontdue`, laid out with wrapping
//! - **Meshes**: glTF and OBJ/MTL loading with per-mesh materials
//! - **Input**: edge-detected key states behind one lock
//! - **Audio**: looping music and one-shot effects with a global mute
//!
//! All GPU work goes through a [`render::Device`]. The desktop game passes a
//! `glow` context; tests use the recording headless device.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use turbo_engine::prelude::*;
//! use turbo_engine::render::device::headless::HeadlessDevice;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     turbo_engine::foundation::logging::init();
//!     let device: Device = Rc::new(HeadlessDevice::new());
//!     let config = EngineConfig::default();
//!     let mut batch = SpriteBatch::new(&device, &config.sprite_shader, Vec2::new(800.0, 600.0))?;
//!     batch.draw_rect(Rect::new(10.0, 10.0, 100.0, 20.0), Vec4::new(1.0, 0.0, 0.0, 1.0));
//!     batch.flush();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions, clippy::too_many_arguments)]

pub mod assets;
pub mod audio;
pub mod config;
pub mod foundation;
pub mod input;
pub mod render;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::Assets,
        audio::{Mixer, Music, SoundEffect},
        config::{Config, EngineConfig, ShaderConfig, WindowConfig},
        foundation::{
            math::{Mat4, Rect, Transform, Vec2, Vec3, Vec4},
            time::Timer,
        },
        input::{InputManager, KeyCode, KeyState},
        render::{
            Device, DrawParams, Font, Material, Mesh, MeshRenderer, Model, Renderer, SpriteBatch,
            Texture,
        },
    };
}
