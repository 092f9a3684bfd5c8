//! Audio playback
//!
//! A [`Mixer`] owns one [`AudioBackend`] and every handle it started, so
//! muting is a single call. [`Music`] loops, a [`SoundEffect`] plays once.
//! Without the `audio` feature the mixer runs on a [`NullBackend`] and all
//! playback is logged and ignored.

pub mod backend;
mod mixer;

pub use backend::{AudioBackend, NullBackend, SoundHandle};
#[cfg(feature = "audio")]
pub use backend::rodio_backend::RodioBackend;
pub use mixer::{Mixer, Music, SoundEffect, MAX_VOLUME};

/// Audio errors
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// The output device could not be opened
    #[error("Audio backend initialization failed: {0}")]
    BackendInitFailed(String),

    /// Playback requested before the output device was opened
    #[error("Audio backend not initialized")]
    BackendNotInitialized,

    /// Opening, decoding or queueing a sound failed
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// Handle does not refer to a tracked sound
    #[error("Invalid sound handle")]
    InvalidHandle,
}
