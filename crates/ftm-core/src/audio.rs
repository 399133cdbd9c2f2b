//! Audio backend seam.
//!
//! The playback controller is the only caller of an [`AudioBackend`].
//! It opens at most one clip at a time and always closes the previous
//! one first. Backends report the natural end of a clip out of band, by
//! delivering its [`AudioHandle`] to
//! [`Session::clip_ended`](crate::session::Session::clip_ended). Closing
//! a clip must never produce an end notification for it.

/// Opaque handle to an opened clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AudioHandle(pub u64);

impl core::fmt::Display for AudioHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "clip#{}", self.0)
    }
}

/// Errors an audio backend can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AudioError {
    /// The clip file does not exist or cannot be read.
    #[error("clip not found: {path}")]
    NotFound {
        /// Path as given to `open`.
        path: String,
    },

    /// The clip exists but could not be decoded.
    #[error("failed to decode {path}: {message}")]
    Decode {
        /// Path as given to `open`.
        path: String,
        /// Decoder message.
        message: String,
    },

    /// The output device is unavailable.
    #[error("audio device error: {message}")]
    Device {
        /// Description of the failure.
        message: String,
    },

    /// The handle does not refer to an open clip.
    #[error("unknown audio handle {handle}")]
    UnknownHandle {
        /// The offending handle.
        handle: AudioHandle,
    },

    /// The backend did not answer in time.
    #[error("audio backend did not answer within {waited_ms} ms")]
    Timeout {
        /// How long the caller waited.
        waited_ms: u64,
    },
}

/// Plays narration clips.
pub trait AudioBackend {
    /// Prepare the clip at `path`. The path is passed through unmodified.
    fn open(&mut self, path: &str) -> Result<AudioHandle, AudioError>;

    /// Start or resume playback.
    fn play(&mut self, handle: AudioHandle) -> Result<(), AudioError>;

    /// Pause playback.
    fn pause(&mut self, handle: AudioHandle);

    /// Release the clip. Idempotent and never reports an end.
    fn close(&mut self, handle: AudioHandle);
}

// ---------------------------------------------------------------------------
// Recording backend
// ---------------------------------------------------------------------------

/// One call observed by [`RecordingAudio`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCall {
    /// `open(path)` returned this handle.
    Open(String, AudioHandle),
    /// `play(handle)`.
    Play(AudioHandle),
    /// `pause(handle)`.
    Pause(AudioHandle),
    /// `close(handle)`.
    Close(AudioHandle),
}

/// In-memory backend that records every call and emits no sound.
///
/// Clips never end by themselves; the caller decides when to report an
/// end. Paths listed via [`fail_on`](Self::fail_on) fail to open.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    next: u64,
    open: Vec<(AudioHandle, String)>,
    calls: Vec<AudioCall>,
    failing: Vec<String>,
}

impl RecordingAudio {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open` fail with [`AudioError::NotFound`] for `path`.
    pub fn fail_on(&mut self, path: &str) {
        self.failing.push(path.to_owned());
    }

    /// Currently open clips, oldest first.
    pub fn open_clips(&self) -> Vec<AudioHandle> {
        self.open.iter().map(|(handle, _)| *handle).collect()
    }

    /// Path of an open clip.
    pub fn path_of(&self, handle: AudioHandle) -> Option<&str> {
        self.open
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, path)| path.as_str())
    }

    /// The most recently opened clip that is still open.
    pub fn current(&self) -> Option<AudioHandle> {
        self.open.last().map(|(handle, _)| *handle)
    }

    /// All calls in order.
    pub fn calls(&self) -> &[AudioCall] {
        &self.calls
    }

    /// Paths passed to `open`, in order.
    pub fn opened_paths(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                AudioCall::Open(path, _) => Some(path.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl AudioBackend for RecordingAudio {
    fn open(&mut self, path: &str) -> Result<AudioHandle, AudioError> {
        if self.failing.iter().any(|p| p == path) {
            return Err(AudioError::NotFound {
                path: path.to_owned(),
            });
        }
        self.next = self.next.wrapping_add(1);
        let handle = AudioHandle(self.next);
        self.open.push((handle, path.to_owned()));
        self.calls.push(AudioCall::Open(path.to_owned(), handle));
        Ok(handle)
    }

    fn play(&mut self, handle: AudioHandle) -> Result<(), AudioError> {
        if !self.open.iter().any(|(h, _)| *h == handle) {
            return Err(AudioError::UnknownHandle { handle });
        }
        self.calls.push(AudioCall::Play(handle));
        Ok(())
    }

    fn pause(&mut self, handle: AudioHandle) {
        self.calls.push(AudioCall::Pause(handle));
    }

    fn close(&mut self, handle: AudioHandle) {
        let before = self.open.len();
        self.open.retain(|(h, _)| *h != handle);
        if self.open.len() != before {
            self.calls.push(AudioCall::Close(handle));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn recorder_tracks_open_clips() {
        let mut audio = RecordingAudio::new();
        let a = audio.open("a.wav").unwrap();
        let b = audio.open("b.wav").unwrap();
        assert_eq!(audio.open_clips(), vec![a, b]);
        audio.close(a);
        audio.close(a);
        assert_eq!(audio.open_clips(), vec![b]);
        assert_eq!(audio.path_of(b), Some("b.wav"));
        let closes = audio
            .calls()
            .iter()
            .filter(|c| matches!(c, AudioCall::Close(_)))
            .count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn recorder_rejects_unknown_handle() {
        let mut audio = RecordingAudio::new();
        let err = audio.play(AudioHandle(99)).unwrap_err();
        assert_eq!(err, AudioError::UnknownHandle { handle: AudioHandle(99) });
    }

    #[test]
    fn recorder_fails_configured_paths() {
        let mut audio = RecordingAudio::new();
        audio.fail_on("missing.wav");
        assert!(matches!(
            audio.open("missing.wav"),
            Err(AudioError::NotFound { .. })
        ));
        assert!(audio.open_clips().is_empty());
    }
}
