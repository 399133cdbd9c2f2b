//! Narration clip output for the Follow the Money presenter.
//!
//! Both backends implement [`AudioBackend`] and report natural clip ends
//! on a tokio channel that the presenter's event loop drains into
//! `Session::clip_ended`.
//!
//! # Modules
//!
//! - [`device`] -- [`DeviceAudio`], the `rodio` output-device backend.
//! - [`silent`] -- [`SilentAudio`], fixed-length silent clips.

pub mod device;
pub mod silent;

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use ftm_core::audio::{AudioBackend, AudioError, AudioHandle};
use ftm_core::config::{AudioBackendKind, AudioConfig};

pub use device::DeviceAudio;
pub use silent::SilentAudio;

/// The backend selected by `audio.backend`.
pub enum OutputBackend {
    /// Default output device.
    Device(DeviceAudio),
    /// No sound.
    Silent(SilentAudio),
}

impl OutputBackend {
    /// Build the configured backend. Clip ends are sent on `ended`.
    pub fn from_config(
        config: &AudioConfig,
        ended: UnboundedSender<AudioHandle>,
    ) -> Result<Self, AudioError> {
        Ok(match config.backend {
            AudioBackendKind::Device => Self::Device(DeviceAudio::spawn(config, ended)?),
            AudioBackendKind::Silent => Self::Silent(SilentAudio::new(
                Duration::from_millis(config.silent_clip_ms),
                ended,
            )),
        })
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Device(_) => "device",
            Self::Silent(_) => "silent",
        }
    }
}

impl AudioBackend for OutputBackend {
    fn open(&mut self, path: &str) -> Result<AudioHandle, AudioError> {
        match self {
            Self::Device(backend) => backend.open(path),
            Self::Silent(backend) => backend.open(path),
        }
    }

    fn play(&mut self, handle: AudioHandle) -> Result<(), AudioError> {
        match self {
            Self::Device(backend) => backend.play(handle),
            Self::Silent(backend) => backend.play(handle),
        }
    }

    fn pause(&mut self, handle: AudioHandle) {
        match self {
            Self::Device(backend) => backend.pause(handle),
            Self::Silent(backend) => backend.pause(handle),
        }
    }

    fn close(&mut self, handle: AudioHandle) {
        match self {
            Self::Device(backend) => backend.close(handle),
            Self::Silent(backend) => backend.close(handle),
        }
    }
}
