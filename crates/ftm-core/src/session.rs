//! Investigation session.
//!
//! A [`Session`] owns every piece of presenter state for one user: the
//! investigation-delay phase, the [`RevealSequencer`], the
//! [`PlaybackController`] and the [`Presentation`] flags. All entry
//! points are synchronous and return immediately. Work that needs I/O
//! (looking up a demo, starting a live investigation) is returned to the
//! driver as an [`Effect`]. Its result comes back later through
//! [`Session::demo_lookup_finished`] or [`Session::live_finished`],
//! tagged with the [`InvestigationId`] it was issued for. Results for a
//! superseded investigation are dropped.
//!
//! # Lifecycle
//!
//! ```text
//! Selector --investigate--> Gathering --demo delay / live ok--> Conversation
//!                             |
//!                             +--live error--> Failed
//! any --back_to_selector--> Selector
//! any --investigate--> Gathering (previous investigation torn down)
//! ```

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use ftm_types::{
    Investigation, InvestigationId, PlaybackState, Publication, RevealState, Stage, Turn,
    ViewModel,
};

use crate::audio::{AudioBackend, AudioHandle};
use crate::config::{PresenterConfig, StatusMessages, TimingConfig};
use crate::playback::{PlaybackController, PlaybackPorts};
use crate::presentation::{Presentation, ViewInputs, render};
use crate::sequencer::{RevealEvent, RevealSequencer};
use crate::timer::{CancelToken, FiredTimer, ManualTimers, TimerEvent, TimerService};

/// I/O the driver must perform on the session's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Look up a pre-baked demo and report via
    /// [`Session::demo_lookup_finished`].
    LookupDemo {
        /// Investigation the result belongs to.
        id: InvestigationId,
        /// Publication slug.
        publication_id: String,
    },
    /// Start a live investigation and report via [`Session::live_finished`].
    StartLive {
        /// Investigation the result belongs to.
        id: InvestigationId,
        /// Publication slug.
        publication_id: String,
    },
}

/// The investigation currently on screen.
#[derive(Debug, Clone)]
struct Active {
    id: InvestigationId,
    publication: Publication,
    started_at: DateTime<Utc>,
}

/// Investigation-delay phase: the rotating status line and, for demos,
/// the simulated delay.
#[derive(Debug, Default)]
struct Gathering {
    rotation: Option<CancelToken>,
    delay: Option<CancelToken>,
    message: Option<String>,
    staged: Option<Vec<Turn>>,
}

/// All presenter state for one user.
pub struct Session<T: TimerService, A: AudioBackend> {
    timing: TimingConfig,
    messages: StatusMessages,
    stage: Stage,
    active: Option<Active>,
    gathering: Gathering,
    failure: Option<String>,
    sequencer: RevealSequencer,
    controller: PlaybackController,
    presentation: Presentation,
    timers: T,
    audio: A,
    rng: StdRng,
}

impl<T: TimerService, A: AudioBackend> Session<T, A> {
    /// Create a session on the selector screen.
    ///
    /// The randomness source is seeded from `config.seed` when set.
    pub fn new(config: &PresenterConfig, timers: T, audio: A) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self::with_rng(config, timers, audio, rng)
    }

    /// Create a session with an explicit randomness source.
    pub fn with_rng(config: &PresenterConfig, timers: T, audio: A, rng: StdRng) -> Self {
        Self {
            timing: config.timing.clone(),
            messages: config.status_messages.clone(),
            stage: Stage::Selector,
            active: None,
            gathering: Gathering::default(),
            failure: None,
            sequencer: RevealSequencer::new(
                config.timing.clone(),
                config.status_messages.clone(),
            ),
            controller: PlaybackController::new(config.timing.clip_gap()),
            presentation: Presentation::default(),
            timers,
            audio,
            rng,
        }
    }

    // -----------------------------------------------------------------------
    // Investigation lifecycle
    // -----------------------------------------------------------------------

    /// Begin investigating `publication`, superseding anything on screen.
    pub fn investigate(&mut self, publication: Publication) -> Effect {
        self.teardown();
        let id = InvestigationId::new();
        info!(investigation = %id, publication = %publication.id, "investigation started");
        let publication_id = publication.id.clone();
        self.active = Some(Active {
            id,
            publication,
            started_at: Utc::now(),
        });
        self.stage = Stage::Gathering;
        self.rotate_status();
        Effect::LookupDemo { id, publication_id }
    }

    /// Report the outcome of a demo lookup. `None` means no demo exists.
    pub fn demo_lookup_finished(
        &mut self,
        id: InvestigationId,
        demo: Option<Investigation>,
    ) -> Option<Effect> {
        if !self.is_gathering(id) {
            debug!(investigation = %id, "dropping superseded demo lookup");
            return None;
        }
        match demo {
            Some(investigation) => {
                let delay = self.timing.demo_delay(&mut self.rng);
                info!(
                    investigation = %id,
                    turns = investigation.turns.len(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "demo found, simulating investigation"
                );
                self.gathering.staged = Some(investigation.into_turns());
                self.gathering.delay = Some(self.timers.after(delay, TimerEvent::DemoDelay));
                None
            }
            None => {
                let publication_id = self
                    .active
                    .as_ref()
                    .map(|a| a.publication.id.clone())
                    .unwrap_or_default();
                info!(investigation = %id, "no demo, starting live investigation");
                Some(Effect::StartLive { id, publication_id })
            }
        }
    }

    /// Report the outcome of a live investigation.
    pub fn live_finished(&mut self, id: InvestigationId, result: Result<Investigation, String>) {
        if !self.is_gathering(id) {
            debug!(investigation = %id, "dropping superseded live result");
            return;
        }
        self.end_gathering();
        match result {
            Ok(investigation) => self.begin_reveal(investigation.into_turns()),
            Err(message) => {
                warn!(investigation = %id, error = %message, "investigation failed");
                self.stage = Stage::Failed;
                self.failure = Some(format!("Investigation failed: {message}"));
            }
        }
    }

    /// Reveal `turns` directly, superseding any reveal in flight.
    ///
    /// Playback is stopped first. The gathering phase, if running, ends.
    pub fn reveal(&mut self, turns: Vec<Turn>) {
        self.end_gathering();
        self.controller.reset(&mut self.audio, &mut self.timers);
        self.presentation.collapse_all();
        self.begin_reveal(turns);
    }

    /// Return to the publication picker.
    pub fn back_to_selector(&mut self) {
        info!("back to selector");
        self.teardown();
    }

    // -----------------------------------------------------------------------
    // Playback and presentation
    // -----------------------------------------------------------------------

    /// Play the clip of one turn.
    pub fn play_one(&mut self, turn_index: usize) {
        self.controller.play_one(
            turn_index,
            PlaybackPorts {
                queue: self.sequencer.queue(),
                presentation: &mut self.presentation,
                audio: &mut self.audio,
                timers: &mut self.timers,
            },
        );
    }

    /// Play every clip in order.
    pub fn play_all(&mut self) {
        self.controller.play_all(PlaybackPorts {
            queue: self.sequencer.queue(),
            presentation: &mut self.presentation,
            audio: &mut self.audio,
            timers: &mut self.timers,
        });
    }

    /// Stop playback. Idempotent.
    pub fn stop(&mut self) {
        self.controller.stop(&mut self.audio, &mut self.timers);
    }

    /// Flip the expanded flag of a revealed turn. Other turns are ignored.
    pub fn toggle(&mut self, turn_index: usize) {
        if self.sequencer.state(turn_index) == Some(RevealState::Revealed) {
            let expanded = self.presentation.toggle(turn_index);
            debug!(turn = turn_index, expanded, "turn toggled");
        }
    }

    // -----------------------------------------------------------------------
    // Driver callbacks
    // -----------------------------------------------------------------------

    /// Route a fired timer to the component that armed it.
    pub fn on_timer(&mut self, fired: FiredTimer) {
        let FiredTimer { token, event } = fired;
        match event {
            TimerEvent::StatusRotation => {
                if self.gathering.rotation == Some(token) {
                    self.gathering.rotation = None;
                    self.rotate_status();
                }
            }
            TimerEvent::DemoDelay => {
                if self.gathering.delay == Some(token) {
                    self.gathering.delay = None;
                    let turns = self.gathering.staged.take().unwrap_or_default();
                    self.end_gathering();
                    self.begin_reveal(turns);
                }
            }
            TimerEvent::ThinkTime | TimerEvent::TurnGap => {
                let events = self.sequencer.on_timer(token, event, &mut self.timers, &mut self.rng);
                self.after_reveal_events(&events);
            }
            TimerEvent::ClipGap => self.controller.on_timer(
                token,
                PlaybackPorts {
                    queue: self.sequencer.queue(),
                    presentation: &mut self.presentation,
                    audio: &mut self.audio,
                    timers: &mut self.timers,
                },
            ),
        }
    }

    /// Natural end of a clip, as reported by the audio backend.
    pub fn clip_ended(&mut self, handle: AudioHandle) {
        self.controller.clip_ended(
            handle,
            PlaybackPorts {
                queue: self.sequencer.queue(),
                presentation: &mut self.presentation,
                audio: &mut self.audio,
                timers: &mut self.timers,
            },
        );
    }

    // -----------------------------------------------------------------------
    // Views and accessors
    // -----------------------------------------------------------------------

    /// Derive the current view model.
    pub fn view(&self) -> ViewModel {
        let active = self.active.as_ref();
        render(&ViewInputs {
            stage: self.stage,
            investigation_id: active.map(|a| a.id),
            publication: active.map(|a| &a.publication),
            started_at: active.map(|a| a.started_at),
            gathering_message: self.gathering.message.as_deref(),
            failure: self.failure.as_deref(),
            sequencer: &self.sequencer,
            playback: self.controller.state(),
            presentation: &self.presentation,
        })
    }

    /// Current screen.
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Active investigation.
    pub fn investigation_id(&self) -> Option<InvestigationId> {
        self.active.as_ref().map(|a| a.id)
    }

    /// Playback state value object.
    pub const fn playback(&self) -> PlaybackState {
        self.controller.state()
    }

    /// Reveal sequencer (read-only).
    pub const fn sequencer(&self) -> &RevealSequencer {
        &self.sequencer
    }

    /// Timer service.
    pub const fn timers(&self) -> &T {
        &self.timers
    }

    /// Timer service, mutably (drivers filter fired timers through it).
    pub const fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    /// Audio backend.
    pub const fn audio(&self) -> &A {
        &self.audio
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn is_gathering(&self, id: InvestigationId) -> bool {
        self.stage == Stage::Gathering && self.investigation_id() == Some(id)
    }

    /// Pick a fresh status line and re-arm the rotation. A zero interval
    /// keeps the first line for the whole phase.
    fn rotate_status(&mut self) {
        self.gathering.message = Some(self.messages.pick(&mut self.rng));
        let interval = self.timing.status_rotation();
        if !interval.is_zero() {
            self.gathering.rotation =
                Some(self.timers.after(interval, TimerEvent::StatusRotation));
        }
    }

    /// End the investigation-delay phase. The rotation timer is always
    /// canceled here.
    fn end_gathering(&mut self) {
        if let Some(token) = self.gathering.rotation.take() {
            self.timers.cancel(token);
        }
        if let Some(token) = self.gathering.delay.take() {
            self.timers.cancel(token);
        }
        self.gathering.message = None;
        self.gathering.staged = None;
    }

    fn begin_reveal(&mut self, turns: Vec<Turn>) {
        self.stage = Stage::Conversation;
        self.failure = None;
        let events = self.sequencer.reveal(turns, &mut self.timers, &mut self.rng);
        self.after_reveal_events(&events);
    }

    fn after_reveal_events(&mut self, events: &[RevealEvent]) {
        for event in events {
            if let RevealEvent::Revealed { index, .. } = event {
                self.presentation.collapse(*index);
            }
        }
    }

    /// Stop playback, end the phase, cancel the reveal, clear the turns.
    fn teardown(&mut self) {
        self.controller.reset(&mut self.audio, &mut self.timers);
        self.end_gathering();
        self.sequencer.clear(&mut self.timers);
        self.presentation.collapse_all();
        self.failure = None;
        self.active = None;
        self.stage = Stage::Selector;
    }
}

impl<A: AudioBackend> Session<ManualTimers, A> {
    /// Advance the virtual clock by `by`, firing every timer that falls
    /// due in order, including timers armed along the way.
    pub fn advance(&mut self, by: std::time::Duration) {
        let until = self.timers.now().saturating_add(by);
        while let Some(fired) = self.timers.pop_due(until) {
            self.on_timer(fired);
        }
        self.timers.set_now(until);
    }
}
