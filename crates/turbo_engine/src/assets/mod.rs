//! Shared, lazily loaded assets
//!
//! [`Assets`] is the context object handed to scenes: one [`AssetCache`] per
//! asset type, all keyed by path. Loads go through the same constructors
//! callers would use directly, so errors surface unchanged.

mod cache;

pub use cache::{font_key, AssetCache};

use std::convert::Infallible;
use std::rc::Rc;

use crate::audio::{Music, SoundEffect};
use crate::render::text::FontResult;
use crate::render::{Device, Font, Model, ModelError, RenderResult, SpriteSheet, SpriteSheetError, Texture};

/// Per-type asset caches sharing one device
pub struct Assets {
    device: Device,
    textures: AssetCache<Texture>,
    fonts: AssetCache<Font>,
    models: AssetCache<Model>,
    sprite_sheets: AssetCache<SpriteSheet>,
    music: AssetCache<Music>,
    sound_effects: AssetCache<SoundEffect>,
}

impl Assets {
    /// Empty caches for `device`
    pub fn new(device: &Device) -> Self {
        Self {
            device: device.clone(),
            textures: AssetCache::new(),
            fonts: AssetCache::new(),
            models: AssetCache::new(),
            sprite_sheets: AssetCache::new(),
            music: AssetCache::new(),
            sound_effects: AssetCache::new(),
        }
    }

    /// Texture decoded from an image file
    pub fn texture(&self, path: &str) -> RenderResult<Rc<Texture>> {
        self.textures
            .get_or_try_load(path, || Texture::from_file(&self.device, path))
    }

    /// Font atlas at `size` pixels; each size is cached separately
    pub fn font(&self, path: &str, size: u32) -> FontResult<Rc<Font>> {
        self.fonts
            .get_or_try_load(&font_key(path, size), || Font::from_file(&self.device, path, size))
    }

    /// glTF or OBJ model
    pub fn model(&self, path: &str) -> Result<Rc<Model>, ModelError> {
        self.models
            .get_or_try_load(path, || Model::try_load(&self.device, path))
    }

    /// Sprite sheet JSON and its texture
    pub fn sprite_sheet(&self, path: &str) -> Result<Rc<SpriteSheet>, SpriteSheetError> {
        self.sprite_sheets
            .get_or_try_load(path, || SpriteSheet::from_file(&self.device, path))
    }

    /// Music track; missing files are logged by [`Music::new`]
    pub fn music(&self, path: &str) -> Rc<Music> {
        match self
            .music
            .get_or_try_load(path, || Ok::<_, Infallible>(Music::new(path)))
        {
            Ok(music) => music,
            Err(never) => match never {},
        }
    }

    /// Sound effect; missing files are logged by [`SoundEffect::new`]
    pub fn sound_effect(&self, path: &str) -> Rc<SoundEffect> {
        match self
            .sound_effects
            .get_or_try_load(path, || Ok::<_, Infallible>(SoundEffect::new(path)))
        {
            Ok(effect) => effect,
            Err(never) => match never {},
        }
    }

    /// Pin every live asset, e.g. while swapping scenes
    pub fn lock_all(&self) {
        self.textures.lock_all();
        self.fonts.lock_all();
        self.models.lock_all();
        self.sprite_sheets.lock_all();
        self.music.lock_all();
        self.sound_effects.lock_all();
    }

    /// Release the pins from [`lock_all`](Self::lock_all)
    pub fn unlock_all(&self) {
        self.textures.unlock_all();
        self.fonts.unlock_all();
        self.models.unlock_all();
        self.sprite_sheets.unlock_all();
        self.music.unlock_all();
        self.sound_effects.unlock_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::headless::HeadlessDevice;

    fn assets() -> (Rc<HeadlessDevice>, Assets) {
        let headless = Rc::new(HeadlessDevice::new());
        let device: Device = headless.clone();
        (headless, Assets::new(&device))
    }

    #[test]
    fn test_missing_texture_is_an_error_and_not_cached() {
        let (headless, assets) = assets();
        assert!(assets.texture("missing.png").is_err());
        assert!(assets.textures.get("missing.png").is_none());
        assert_eq!(headless.live_textures(), 0);
    }

    #[test]
    fn test_music_shared_while_alive() {
        let (_headless, assets) = assets();
        let first = assets.music("assets/music/track.ogg");
        let second = assets.music("assets/music/track.ogg");
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_lock_all_keeps_unowned_assets() {
        let (_headless, assets) = assets();
        drop(assets.sound_effect("hit.wav"));
        assert!(assets.sound_effects.get("hit.wav").is_none());

        let effect = assets.sound_effect("hit.wav");
        assets.lock_all();
        drop(effect);
        assert!(assets.sound_effects.get("hit.wav").is_some());
        assets.unlock_all();
        assert!(assets.sound_effects.get("hit.wav").is_none());
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let (_headless, assets) = assets();
        assert!(assets.model("missing.glb").is_err());
    }
}
