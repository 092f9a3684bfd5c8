//! Sprite sheets: a texture plus a JSON atlas of source rects and named
//! frame animations
//!
//! ```json
//! {
//!   "texture": "player.png",
//!   "atlas": [0, 0, 16, 16, 16, 0, 16, 16],
//!   "animations": { "run": { "frames": [0, 1], "frameTime": 0.1, "loop": true } }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::{Device, RenderError, Texture};
use crate::foundation::math::{Rect, Vec2};

/// Name of the animation that always exists
pub const DEFAULT_ANIMATION: &str = "default";

/// Errors from loading a sprite sheet
#[derive(Error, Debug)]
pub enum SpriteSheetError {
    /// The atlas file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The atlas JSON is malformed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The sheet texture could not be loaded
    #[error("Texture error: {0}")]
    Texture(#[from] RenderError),
}

#[derive(Debug, Deserialize)]
struct AtlasFile {
    texture: String,
    atlas: Vec<i32>,
    #[serde(default)]
    animations: HashMap<String, AnimationFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnimationFile {
    frames: Vec<usize>,
    frame_time: f32,
    #[serde(rename = "loop")]
    looping: bool,
}

/// Named sequence of atlas indices
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    /// Atlas rect index per frame
    pub frames: Vec<usize>,
    /// Seconds per frame
    pub frame_time: f32,
    /// Size of the first frame's rect
    pub dimensions: Vec2,
    /// Restart after the last frame
    pub looping: bool,
}

/// Atlas rects and animations without a texture
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteAtlas {
    texture_path: String,
    rects: Vec<Rect>,
    animations: HashMap<String, Animation>,
}

impl SpriteAtlas {
    /// Parse atlas JSON. The flat `atlas` list is read four ints per rect;
    /// a trailing partial rect is ignored.
    pub fn from_json(json: &str) -> Result<Self, SpriteSheetError> {
        let file: AtlasFile = serde_json::from_str(json)?;
        let rects: Vec<Rect> = file
            .atlas
            .chunks_exact(4)
            .map(|r| Rect::new(r[0] as f32, r[1] as f32, r[2] as f32, r[3] as f32))
            .collect();

        let mut atlas = Self {
            texture_path: file.texture,
            rects,
            animations: HashMap::new(),
        };
        for (name, animation) in file.animations {
            let first = animation.frames.first().copied().unwrap_or(0);
            let dimensions = atlas.atlas_rect(first).extent();
            atlas.animations.insert(
                name,
                Animation {
                    frames: animation.frames,
                    frame_time: animation.frame_time,
                    dimensions,
                    looping: animation.looping,
                },
            );
        }
        let dimensions = atlas.atlas_rect(0).extent();
        atlas.animations.insert(
            DEFAULT_ANIMATION.to_string(),
            Animation {
                frames: vec![0],
                frame_time: 0.0,
                dimensions,
                looping: false,
            },
        );
        Ok(atlas)
    }

    /// Texture path as written in the JSON
    pub fn texture_path(&self) -> &str {
        &self.texture_path
    }

    /// Source rect at `index`; out of range logs and returns rect 0
    pub fn atlas_rect(&self, index: usize) -> Rect {
        if let Some(rect) = self.rects.get(index) {
            return *rect;
        }
        log::error!(
            "Sprite atlas index {index} out of range ({} rects), returning rect 0",
            self.rects.len()
        );
        self.rects.first().copied().unwrap_or_default()
    }

    /// Number of rects
    pub fn sprite_count(&self) -> usize {
        self.rects.len()
    }

    /// Animation by name; unknown names log and return the default
    /// animation
    pub fn animation(&self, name: &str) -> &Animation {
        if let Some(animation) = self.animations.get(name) {
            return animation;
        }
        log::error!("Sprite animation {name:?} not found, returning {DEFAULT_ANIMATION:?}");
        &self.animations[DEFAULT_ANIMATION]
    }

    /// Source rect of frame `frame` of an animation
    pub fn animation_rect(&self, animation: &Animation, frame: usize) -> Rect {
        match animation.frames.get(frame) {
            Some(index) => self.atlas_rect(*index),
            None => {
                log::error!("Animation frame {frame} out of range ({} frames)", animation.frames.len());
                self.atlas_rect(0)
            }
        }
    }
}

/// Texture plus its atlas
pub struct SpriteSheet {
    texture: Texture,
    atlas: SpriteAtlas,
}

impl SpriteSheet {
    /// Load atlas JSON and its texture, resolved relative to the JSON file
    pub fn from_file<P: AsRef<Path>>(device: &Device, path: P) -> Result<Self, SpriteSheetError> {
        let path = path.as_ref();
        let atlas = SpriteAtlas::from_json(&std::fs::read_to_string(path)?)?;
        let texture_path = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(atlas.texture_path());
        let texture = Texture::from_file(device, texture_path)?;
        log::info!("Loaded sprite sheet {} ({} rects)", path.display(), atlas.sprite_count());
        Ok(Self { texture, atlas })
    }

    /// Combine an already loaded texture and atlas
    pub fn new(texture: Texture, atlas: SpriteAtlas) -> Self {
        Self { texture, atlas }
    }

    /// Sheet texture
    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Rects and animations
    pub fn atlas(&self) -> &SpriteAtlas {
        &self.atlas
    }
}

/// Frame cursor over one [`Animation`]
#[derive(Debug, Clone, PartialEq)]
pub struct Animator {
    animation: Animation,
    frame: usize,
    elapsed: f32,
    finished: bool,
}

impl Animator {
    /// Start at the first frame
    pub fn new(animation: Animation) -> Self {
        Self {
            animation,
            frame: 0,
            elapsed: 0.0,
            finished: false,
        }
    }

    /// Switch animation and rewind
    pub fn play(&mut self, animation: Animation) {
        *self = Self::new(animation);
    }

    /// Advance by `dt` seconds. Looping animations wrap to frame 0,
    /// others stop on their last frame.
    pub fn update(&mut self, dt: f32) {
        if self.finished || self.animation.frame_time <= 0.0 {
            return;
        }
        self.elapsed += dt;
        while self.elapsed >= self.animation.frame_time {
            self.elapsed -= self.animation.frame_time;
            if self.frame + 1 < self.animation.frames.len() {
                self.frame += 1;
            } else if self.animation.looping {
                self.frame = 0;
            } else {
                self.finished = true;
                break;
            }
        }
    }

    /// Index into the animation's frame list
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// True once a non-looping animation reached its end
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Current source rect
    pub fn current_rect(&self, atlas: &SpriteAtlas) -> Rect {
        atlas.animation_rect(&self.animation, self.frame)
    }
}
