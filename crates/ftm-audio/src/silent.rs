//! Silent timed backend for headless runs.
//!
//! Every clip "plays" for a fixed duration on the tokio clock and then
//! reports its end. Pausing discards the elapsed time; the next `play`
//! starts the full duration again.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

use ftm_core::audio::{AudioBackend, AudioError, AudioHandle};

/// Backend that emits no sound.
#[derive(Debug)]
pub struct SilentAudio {
    clip_length: Duration,
    ended: UnboundedSender<AudioHandle>,
    next: u64,
    clips: HashMap<AudioHandle, Option<JoinHandle<()>>>,
}

impl SilentAudio {
    /// Create a backend whose clips last `clip_length`.
    pub fn new(clip_length: Duration, ended: UnboundedSender<AudioHandle>) -> Self {
        Self {
            clip_length,
            ended,
            next: 0,
            clips: HashMap::new(),
        }
    }

    /// Number of open clips.
    pub fn open_clips(&self) -> usize {
        self.clips.len()
    }
}

impl AudioBackend for SilentAudio {
    fn open(&mut self, path: &str) -> Result<AudioHandle, AudioError> {
        self.next = self.next.wrapping_add(1);
        let handle = AudioHandle(self.next);
        self.clips.insert(handle, None);
        debug!(%handle, path, "silent clip opened");
        Ok(handle)
    }

    fn play(&mut self, handle: AudioHandle) -> Result<(), AudioError> {
        let slot = self
            .clips
            .get_mut(&handle)
            .ok_or(AudioError::UnknownHandle { handle })?;
        if slot.is_some() {
            return Ok(());
        }
        let ended = self.ended.clone();
        let length = self.clip_length;
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(length).await;
            let _ = ended.send(handle);
        }));
        Ok(())
    }

    fn pause(&mut self, handle: AudioHandle) {
        if let Some(task) = self.clips.get_mut(&handle).and_then(Option::take) {
            task.abort();
        }
    }

    fn close(&mut self, handle: AudioHandle) {
        if let Some(Some(task)) = self.clips.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for SilentAudio {
    fn drop(&mut self) {
        for task in self.clips.drain().filter_map(|(_, task)| task) {
            task.abort();
        }
    }
}
