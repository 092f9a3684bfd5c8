//! Rodio audio backend implementation
//!
//! Uses the Rodio library for cross-platform audio playback.
//! Rodio is pure Rust; this crate enables its WAV and OGG Vorbis decoders.

use super::{AudioBackend, SoundHandle};
use crate::audio::AudioError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Rodio-based audio backend
pub struct RodioBackend {
    /// Audio output stream (must be kept alive)
    _output_stream: OutputStream,
    /// Output stream handle for creating sinks
    stream_handle: OutputStreamHandle,
    /// Active sound sinks
    active_sounds: HashMap<SoundHandle, Sink>,
    next_id: u32,
}

impl RodioBackend {
    /// Open the default output device
    ///
    /// # Errors
    /// - `BackendInitFailed` if no output device is available
    pub fn new() -> Result<Self, AudioError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| AudioError::BackendInitFailed(format!("Failed to create audio output: {e}")))?;
        log::info!("Rodio audio backend initialized");
        Ok(Self {
            _output_stream: stream,
            stream_handle,
            active_sounds: HashMap::new(),
            next_id: 0,
        })
    }

    fn next_handle(&mut self) -> SoundHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        SoundHandle::new(id)
    }
}

impl AudioBackend for RodioBackend {
    fn play_file(&mut self, path: &Path, looping: bool) -> Result<SoundHandle, AudioError> {
        let file = File::open(path)
            .map_err(|e| AudioError::PlaybackFailed(format!("Failed to open {}: {e}", path.display())))?;
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| AudioError::PlaybackFailed(format!("Failed to create sink: {e}")))?;

        let reader = BufReader::new(file);
        if looping {
            let source = Decoder::new_looped(reader)
                .map_err(|e| AudioError::PlaybackFailed(format!("Failed to decode audio: {e}")))?;
            sink.append(source);
        } else {
            let source = Decoder::new(reader)
                .map_err(|e| AudioError::PlaybackFailed(format!("Failed to decode audio: {e}")))?;
            sink.append(source);
        }

        let handle = self.next_handle();
        self.active_sounds.insert(handle, sink);
        Ok(handle)
    }

    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError> {
        let sink = self.active_sounds.get(&handle).ok_or(AudioError::InvalidHandle)?;
        sink.set_volume(volume);
        Ok(())
    }

    fn volume(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        let sink = self.active_sounds.get(&handle).ok_or(AudioError::InvalidHandle)?;
        Ok(sink.volume())
    }

    fn stop(&mut self, handle: SoundHandle) {
        if let Some(sink) = self.active_sounds.remove(&handle) {
            sink.stop();
        }
    }

    fn stop_all(&mut self) {
        for (_handle, sink) in self.active_sounds.drain() {
            sink.stop();
        }
    }

    fn is_playing(&self, handle: SoundHandle) -> bool {
        self.active_sounds
            .get(&handle)
            .map(|sink| !sink.is_paused() && !sink.empty())
            .unwrap_or(false)
    }

    fn update(&mut self) {
        self.active_sounds.retain(|_handle, sink| !sink.empty());
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.stop_all();
        log::info!("Rodio audio backend shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_fails_playback() {
        // May fail in CI/test environments without audio device
        if let Ok(mut backend) = RodioBackend::new() {
            let result = backend.play_file(Path::new("missing/track.ogg"), true);
            assert!(matches!(result, Err(AudioError::PlaybackFailed(_))));
        }
    }

    #[test]
    fn test_invalid_handle_operations() {
        if let Ok(mut backend) = RodioBackend::new() {
            let invalid = SoundHandle::new(999);
            assert!(matches!(backend.set_volume(invalid, 0.5), Err(AudioError::InvalidHandle)));
            assert!(matches!(backend.volume(invalid), Err(AudioError::InvalidHandle)));
            assert!(!backend.is_playing(invalid));
            backend.stop(invalid);
        }
    }

    #[test]
    fn test_handle_generation() {
        if let Ok(mut backend) = RodioBackend::new() {
            let first = backend.next_handle();
            let second = backend.next_handle();
            assert_ne!(first.id, second.id);
        }
    }
}
