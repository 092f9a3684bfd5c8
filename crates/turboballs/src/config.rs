//! Game configuration
//!
//! Loaded from `turboballs.toml` next to the executable's working directory
//! when present. Every field has a default so partial files work.

use serde::{Deserialize, Serialize};
use turbo_engine::config::{Config, EngineConfig};

/// Default config file name
pub const CONFIG_PATH: &str = "turboballs.toml";

/// Asset locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcePaths {
    /// HUD and title font
    pub font: String,
    /// Scenery model
    pub world_model: String,
    /// Model drawn for both paddles
    pub npc_model: String,
    /// Ball model
    pub ball_model: String,
    /// Background track
    pub music: String,
}

impl Default for ResourcePaths {
    fn default() -> Self {
        Self {
            font: "assets/fonts/cyberdyne.ttf".to_string(),
            world_model: "assets/models/vaporwave/vapor.glb".to_string(),
            npc_model: "assets/models/poly/poly.glb".to_string(),
            ball_model: "assets/models/sphere.glb".to_string(),
            music: "assets/music/track.ogg".to_string(),
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Window, shader and clear color settings
    pub engine: EngineConfig,
    /// Asset locations
    pub resources: ResourcePaths,
    /// HUD font size in pixels
    pub font_size: u32,
    /// Title font size in pixels
    pub title_font_size: u32,
    /// Uniform scale applied to the paddle model at load
    pub npc_scale: f32,
    /// Control level change per second while an arrow key is held
    pub control_speed: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        let mut engine = EngineConfig::default();
        engine.clear_color = [0.0, 0.0, 0.07, 1.0];
        Self {
            engine,
            resources: ResourcePaths::default(),
            font_size: 32,
            title_font_size: 60,
            npc_scale: 5.0,
            control_speed: 0.8,
        }
    }
}

impl Config for GameConfig {}
