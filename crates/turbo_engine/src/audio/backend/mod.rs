//! Audio backend implementations

#[cfg(feature = "audio")]
pub mod rodio_backend;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::audio::AudioError;

/// Sound handle for tracking active sounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle {
    /// Unique identifier for the sound
    pub id: u32,
}

impl SoundHandle {
    /// Create a new sound handle
    pub fn new(id: u32) -> Self {
        Self { id }
    }
}

/// Playback device seam.
///
/// Not `Send`: the mixer lives on the game loop thread.
pub trait AudioBackend {
    /// Decode a file and start playing it, forever when `looping`
    fn play_file(&mut self, path: &Path, looping: bool) -> Result<SoundHandle, AudioError>;

    /// Set the volume of a sound (0.0 = silent, 1.0 = full volume)
    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError>;

    /// Current volume of a sound
    fn volume(&self, handle: SoundHandle) -> Result<f32, AudioError>;

    /// Stop a sound. Unknown handles are ignored.
    fn stop(&mut self, handle: SoundHandle);

    /// Stop every sound
    fn stop_all(&mut self);

    /// Whether the sound still has samples queued
    fn is_playing(&self, handle: SoundHandle) -> bool;

    /// Forget sounds that finished playing
    fn update(&mut self);
}

/// Backend that plays nothing. Each request is logged and tracked so the
/// mixer behaves the same with or without an output device.
#[derive(Debug, Default)]
pub struct NullBackend {
    sounds: HashMap<SoundHandle, NullSound>,
    next_id: u32,
}

#[derive(Debug)]
struct NullSound {
    path: PathBuf,
    looping: bool,
    volume: f32,
}

impl NullBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked sounds
    pub fn active_count(&self) -> usize {
        self.sounds.len()
    }
}

impl AudioBackend for NullBackend {
    fn play_file(&mut self, path: &Path, looping: bool) -> Result<SoundHandle, AudioError> {
        let handle = SoundHandle::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        log::debug!("NullBackend: play {} (looping: {looping})", path.display());
        self.sounds.insert(
            handle,
            NullSound {
                path: path.to_path_buf(),
                looping,
                volume: 1.0,
            },
        );
        Ok(handle)
    }

    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError> {
        let sound = self.sounds.get_mut(&handle).ok_or(AudioError::InvalidHandle)?;
        sound.volume = volume;
        Ok(())
    }

    fn volume(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        self.sounds
            .get(&handle)
            .map(|sound| sound.volume)
            .ok_or(AudioError::InvalidHandle)
    }

    fn stop(&mut self, handle: SoundHandle) {
        if let Some(sound) = self.sounds.remove(&handle) {
            log::debug!("NullBackend: stop {}", sound.path.display());
        }
    }

    fn stop_all(&mut self) {
        self.sounds.clear();
    }

    fn is_playing(&self, handle: SoundHandle) -> bool {
        self.sounds.contains_key(&handle)
    }

    fn update(&mut self) {
        // One-shot sounds finish immediately.
        self.sounds.retain(|_, sound| sound.looping);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_backend_tracks_volume() {
        let mut backend = NullBackend::new();
        let handle = backend.play_file(Path::new("music/track.ogg"), true).unwrap();
        assert_eq!(backend.volume(handle).unwrap(), 1.0);
        backend.set_volume(handle, 0.0).unwrap();
        assert_eq!(backend.volume(handle).unwrap(), 0.0);
    }

    #[test]
    fn test_null_backend_invalid_handle() {
        let mut backend = NullBackend::new();
        let invalid = SoundHandle::new(999);
        assert!(matches!(backend.set_volume(invalid, 0.5), Err(AudioError::InvalidHandle)));
        assert!(matches!(backend.volume(invalid), Err(AudioError::InvalidHandle)));
        assert!(!backend.is_playing(invalid));
        backend.stop(invalid);
    }

    #[test]
    fn test_update_drops_one_shots() {
        let mut backend = NullBackend::new();
        let music = backend.play_file(Path::new("a.ogg"), true).unwrap();
        let effect = backend.play_file(Path::new("b.wav"), false).unwrap();
        assert_ne!(music, effect);
        backend.update();
        assert!(backend.is_playing(music));
        assert!(!backend.is_playing(effect));
        backend.stop_all();
        assert_eq!(backend.active_count(), 0);
    }
}
