//! Turn reveal sequencing and audio playback for the Follow the Money
//! investigation presenter.
//!
//! Everything in this crate is synchronous. Delays are requested from a
//! [`TimerService`] and come back as typed [`TimerEvent`]s, so the same
//! state machines run against the tokio clock in the presenter and
//! against a virtual clock in tests.
//!
//! # Modules
//!
//! - [`audio`] -- [`AudioBackend`] seam and the recording test backend.
//! - [`config`] -- Configuration loading from `ftm-config.yaml` into
//!   strongly-typed structs.
//! - [`playback`] -- The single playback state machine.
//! - [`presentation`] -- Expansion flags and view-model derivation.
//! - [`sequencer`] -- Turn-by-turn reveal with simulated think time.
//! - [`session`] -- Investigation lifecycle tying the above together.
//! - [`timer`] -- Cancelable single-shot timers, virtual and tokio-backed.
//!
//! [`AudioBackend`]: audio::AudioBackend
//! [`TimerService`]: timer::TimerService
//! [`TimerEvent`]: timer::TimerEvent

pub mod audio;
pub mod config;
pub mod playback;
pub mod presentation;
pub mod sequencer;
pub mod session;
pub mod timer;
