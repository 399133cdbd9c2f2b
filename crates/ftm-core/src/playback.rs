//! Playback controller.
//!
//! Owns the [`PlaybackState`] value object and is the only component that
//! opens or closes audio clips. Every entry point tears down the previous
//! action first, so at most one clip is open and at most one clip-gap
//! timer is armed.
//!
//! # Transitions
//!
//! | From | Input | To |
//! |------|-------|----|
//! | any | `play_one(t)` with a queue entry | `PlayingOne`, clip for `t` open |
//! | any | `play_one(t)` without an entry | unchanged |
//! | any | `play_all()` with a non-empty queue | `PlayingAll`, cursor 0 |
//! | `PlayingOne` | clip ended | `Idle` |
//! | `PlayingAll` | clip ended | `PlayingAll`, clip gap armed, nothing open |
//! | `PlayingAll` | clip gap fired | next clip open, or `Idle` past the end |
//! | `PlayingOne`/`PlayingAll` | `stop()` | `Stopped` |
//! | `Idle`/`Stopped` | `stop()` | unchanged |

use std::time::Duration;

use tracing::{debug, info, warn};

use ftm_types::{PlaybackMode, PlaybackState, QueueEntry};

use crate::audio::{AudioBackend, AudioHandle};
use crate::presentation::Presentation;
use crate::timer::{CancelToken, TimerEvent, TimerService};

/// The single playback state machine.
#[derive(Debug, Clone)]
pub struct PlaybackController {
    state: PlaybackState,
    clip: Option<AudioHandle>,
    advance: Option<CancelToken>,
    clip_gap: Duration,
}

/// Collaborators a playback transition may touch.
pub struct PlaybackPorts<'a> {
    /// The queue built by the sequencer.
    pub queue: &'a [QueueEntry],
    /// Expansion flags.
    pub presentation: &'a mut Presentation,
    /// Clip output.
    pub audio: &'a mut dyn AudioBackend,
    /// Clip-gap scheduling.
    pub timers: &'a mut dyn TimerService,
}

impl PlaybackController {
    /// Create an idle controller.
    pub fn new(clip_gap: Duration) -> Self {
        Self {
            state: PlaybackState::default(),
            clip: None,
            advance: None,
            clip_gap,
        }
    }

    /// Snapshot of the state value object.
    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    /// Handle of the open clip, if any.
    pub const fn clip(&self) -> Option<AudioHandle> {
        self.clip
    }

    /// Play the clip of one turn and stop when it ends.
    ///
    /// A turn without a queue entry is ignored entirely.
    pub fn play_one(&mut self, turn_index: usize, ports: PlaybackPorts<'_>) {
        let Some(entry) = ports.queue.iter().find(|e| e.turn_index == turn_index) else {
            debug!(turn = turn_index, "no clip for turn, ignoring play request");
            return;
        };
        self.teardown(ports.audio, ports.timers);
        self.state = PlaybackState {
            mode: PlaybackMode::PlayingOne,
            active_turn: None,
            cursor: None,
        };
        ports.presentation.expand(turn_index);
        info!(turn = turn_index, "playing single clip");
        if !self.open_clip(entry, ports.audio) {
            self.state.mode = PlaybackMode::Idle;
        }
    }

    /// Play the whole queue in order with a pause between clips.
    pub fn play_all(&mut self, ports: PlaybackPorts<'_>) {
        if ports.queue.is_empty() {
            debug!("queue empty, ignoring play-all request");
            return;
        }
        self.teardown(ports.audio, ports.timers);
        ports.presentation.collapse_all();
        self.state = PlaybackState {
            mode: PlaybackMode::PlayingAll,
            active_turn: None,
            cursor: Some(0),
        };
        info!(clips = ports.queue.len(), "playing all clips");
        self.start_at(0, ports);
    }

    /// Stop whatever is playing. Idempotent.
    pub fn stop(&mut self, audio: &mut dyn AudioBackend, timers: &mut dyn TimerService) {
        let interrupted = self.state.mode.is_active();
        self.teardown(audio, timers);
        self.state.cursor = None;
        if interrupted {
            self.state.mode = PlaybackMode::Stopped;
            info!("playback stopped");
        }
    }

    /// Return to `Idle` as if nothing had ever played.
    pub fn reset(&mut self, audio: &mut dyn AudioBackend, timers: &mut dyn TimerService) {
        self.teardown(audio, timers);
        self.state = PlaybackState::default();
    }

    /// Natural end of a clip. Handles other than the open one are stale.
    pub fn clip_ended(&mut self, handle: AudioHandle, ports: PlaybackPorts<'_>) {
        if self.clip != Some(handle) {
            debug!(%handle, "ignoring end of a clip that is not open");
            return;
        }
        self.clip = None;
        ports.audio.close(handle);
        let finished = self.state.active_turn.take();
        debug!(%handle, turn = ?finished, "clip ended");

        match self.state.mode {
            PlaybackMode::PlayingOne => {
                self.state.mode = PlaybackMode::Idle;
            }
            PlaybackMode::PlayingAll => self.arm_gap(ports.timers),
            PlaybackMode::Idle | PlaybackMode::Stopped => {}
        }
    }

    /// Handle a fired clip-gap timer.
    pub fn on_timer(&mut self, token: CancelToken, ports: PlaybackPorts<'_>) {
        if self.advance != Some(token) {
            debug!(token = token.get(), "ignoring stale clip-gap timer");
            return;
        }
        self.advance = None;
        if self.state.mode != PlaybackMode::PlayingAll {
            return;
        }
        let next = self.state.cursor.map_or(0, |q| q.saturating_add(1));
        self.start_at(next, ports);
    }

    fn start_at(&mut self, position: usize, ports: PlaybackPorts<'_>) {
        let Some(entry) = ports.queue.get(position) else {
            info!("play-all finished");
            self.state = PlaybackState::default();
            return;
        };
        self.state.cursor = Some(position);
        ports.presentation.expand(entry.turn_index);
        if !self.open_clip(entry, ports.audio) {
            self.arm_gap(ports.timers);
        }
    }

    /// Open and start `entry`. On failure nothing stays open or highlighted.
    fn open_clip(&mut self, entry: &QueueEntry, audio: &mut dyn AudioBackend) -> bool {
        let handle = match audio.open(&entry.audio_path) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(turn = entry.turn_index, error = %e, "failed to open clip");
                return false;
            }
        };
        if let Err(e) = audio.play(handle) {
            warn!(turn = entry.turn_index, error = %e, "failed to start clip");
            audio.close(handle);
            return false;
        }
        self.clip = Some(handle);
        self.state.active_turn = Some(entry.turn_index);
        debug!(turn = entry.turn_index, %handle, path = %entry.audio_path, "clip open");
        true
    }

    fn arm_gap(&mut self, timers: &mut dyn TimerService) {
        if let Some(previous) = self.advance.take() {
            timers.cancel(previous);
        }
        self.advance = Some(timers.after(self.clip_gap, TimerEvent::ClipGap));
    }

    /// Close the open clip, disarm the gap timer, clear the highlight.
    fn teardown(&mut self, audio: &mut dyn AudioBackend, timers: &mut dyn TimerService) {
        if let Some(handle) = self.clip.take() {
            audio.pause(handle);
            audio.close(handle);
        }
        if let Some(token) = self.advance.take() {
            timers.cancel(token);
        }
        self.state.active_turn = None;
    }
}
