//! Mixer with a global mute, plus looping music and one-shot effects

use std::path::{Path, PathBuf};

use super::backend::{AudioBackend, NullBackend, SoundHandle};

/// Volume restored when unmuting
pub const MAX_VOLUME: f32 = 1.0;

/// Owns the playback backend and every sound it started
pub struct Mixer {
    backend: Box<dyn AudioBackend>,
    handles: Vec<SoundHandle>,
    muted: bool,
}

impl Mixer {
    /// Open the default output device.
    ///
    /// Falls back to a [`NullBackend`] when the device can't be opened or
    /// the `audio` feature is off.
    pub fn new() -> Self {
        #[cfg(feature = "audio")]
        {
            match super::RodioBackend::new() {
                Ok(backend) => return Self::with_backend(Box::new(backend)),
                Err(e) => log::error!("Couldn't initialize audio output: {e}"),
            }
        }
        log::warn!("Audio disabled, using silent backend");
        Self::with_backend(Box::new(NullBackend::new()))
    }

    /// Use a specific backend
    pub fn with_backend(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            handles: Vec::new(),
            muted: false,
        }
    }

    /// Silence every sound, or restore them all to [`MAX_VOLUME`]
    pub fn toggle_mute(&mut self) {
        log::info!("Toggle mute");
        self.muted = !self.muted;
        let volume = self.current_volume();
        for handle in &self.handles {
            if let Err(e) = self.backend.set_volume(*handle, volume) {
                log::debug!("Skipping volume change for {handle:?}: {e}");
            }
        }
    }

    /// Whether the mixer is muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Drop handles of sounds that finished
    pub fn update(&mut self) {
        self.backend.update();
        let backend = &self.backend;
        self.handles.retain(|handle| backend.is_playing(*handle));
    }

    /// Volume of a tracked sound, `None` once it stopped
    pub fn volume(&self, handle: SoundHandle) -> Option<f32> {
        self.backend.volume(handle).ok()
    }

    /// Stop everything
    pub fn stop_all(&mut self) {
        self.backend.stop_all();
        self.handles.clear();
    }

    fn current_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            MAX_VOLUME
        }
    }

    fn play(&mut self, path: &Path, looping: bool) -> Option<SoundHandle> {
        let handle = match self.backend.play_file(path, looping) {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("Failed to play {}: {e}", path.display());
                return None;
            }
        };
        if let Err(e) = self.backend.set_volume(handle, self.current_volume()) {
            log::warn!("Failed to set volume for {}: {e}", path.display());
        }
        self.handles.push(handle);
        Some(handle)
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Mixer {
    fn drop(&mut self) {
        self.backend.stop_all();
        log::info!("Mixer closed");
    }
}

/// Streamed background track
#[derive(Debug, Clone)]
pub struct Music {
    path: PathBuf,
}

impl Music {
    /// Reference a music file. A missing file is logged here and again on
    /// every play attempt.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            log::error!("Failed to load music: {} not found", path.display());
        }
        Self { path }
    }

    /// Start the track, repeating forever
    pub fn play_on_loop(&self, mixer: &mut Mixer) -> Option<SoundHandle> {
        mixer.play(&self.path, true)
    }

    /// File path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Short sound played once per trigger
#[derive(Debug, Clone)]
pub struct SoundEffect {
    path: PathBuf,
}

impl SoundEffect {
    /// Reference a sound file
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            log::error!("Failed to load sound effect: {} not found", path.display());
        }
        Self { path }
    }

    /// Play once
    pub fn play(&self, mixer: &mut Mixer) -> Option<SoundHandle> {
        mixer.play(&self.path, false)
    }

    /// File path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioError;

    fn silent() -> Mixer {
        Mixer::with_backend(Box::new(NullBackend::new()))
    }

    struct BrokenBackend;

    impl AudioBackend for BrokenBackend {
        fn play_file(&mut self, _path: &Path, _looping: bool) -> Result<SoundHandle, AudioError> {
            Err(AudioError::BackendNotInitialized)
        }
        fn set_volume(&mut self, _handle: SoundHandle, _volume: f32) -> Result<(), AudioError> {
            Err(AudioError::InvalidHandle)
        }
        fn volume(&self, _handle: SoundHandle) -> Result<f32, AudioError> {
            Err(AudioError::InvalidHandle)
        }
        fn stop(&mut self, _handle: SoundHandle) {}
        fn stop_all(&mut self) {}
        fn is_playing(&self, _handle: SoundHandle) -> bool {
            false
        }
        fn update(&mut self) {}
    }

    #[test]
    fn test_toggle_mute_sets_all_volumes() {
        let mut mixer = silent();
        let music = Music::new("assets/music/track.ogg").play_on_loop(&mut mixer).unwrap();
        let effect = SoundEffect::new("hit.wav").play(&mut mixer).unwrap();

        mixer.toggle_mute();
        assert!(mixer.is_muted());
        assert_eq!(mixer.volume(music), Some(0.0));
        assert_eq!(mixer.volume(effect), Some(0.0));

        mixer.toggle_mute();
        assert!(!mixer.is_muted());
        assert_eq!(mixer.volume(music), Some(MAX_VOLUME));
    }

    #[test]
    fn test_sounds_started_while_muted_are_silent() {
        let mut mixer = silent();
        mixer.toggle_mute();
        let music = Music::new("track.ogg").play_on_loop(&mut mixer).unwrap();
        assert_eq!(mixer.volume(music), Some(0.0));
    }

    #[test]
    fn test_update_forgets_finished_effects() {
        let mut mixer = silent();
        let music = Music::new("track.ogg").play_on_loop(&mut mixer).unwrap();
        let effect = SoundEffect::new("hit.wav").play(&mut mixer).unwrap();
        mixer.update();
        assert_eq!(mixer.volume(music), Some(MAX_VOLUME));
        assert_eq!(mixer.volume(effect), None);
    }

    #[test]
    fn test_playback_failure_is_logged_not_propagated() {
        let mut mixer = Mixer::with_backend(Box::new(BrokenBackend));
        assert!(Music::new("track.ogg").play_on_loop(&mut mixer).is_none());
        mixer.toggle_mute();
        assert!(mixer.is_muted());
    }
}
