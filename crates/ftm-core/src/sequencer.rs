//! Reveal sequencer.
//!
//! Drives a turn list through `Pending -> Investigating -> Revealed`, one
//! turn at a time:
//!
//! 1. Mark turn `i` `Investigating` and pick a cosmetic status line.
//! 2. Arm a think-time timer drawn from the configured range.
//! 3. On expiry mark it `Revealed`. If the turn has audio, append it to
//!    the playback queue.
//! 4. If more turns remain, arm the fixed turn gap and continue with
//!    `i + 1` when it fires.
//! 5. After the last turn, mark the queue ready if it is non-empty.
//!
//! At most one timer belonging to the sequencer is armed at any time.
//! [`RevealSequencer::reveal`] and [`RevealSequencer::clear`] cancel it
//! before touching any state, so nothing from a superseded pass can
//! reveal a turn afterwards.

use rand::rngs::StdRng;
use tracing::{debug, info};

use ftm_types::{QueueEntry, RevealState, Turn};

use crate::config::{StatusMessages, TimingConfig};
use crate::timer::{CancelToken, TimerEvent, TimerService};

/// Where the sequencer is in its pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPhase {
    /// No pass started, or the pass was cleared.
    #[default]
    Idle,
    /// Waiting for the think time of `index`.
    Thinking {
        /// Turn in `Investigating`.
        index: usize,
    },
    /// Waiting out the gap before `next` starts.
    Pausing {
        /// Turn that starts when the gap elapses.
        next: usize,
    },
    /// Every turn is revealed.
    Complete,
}

/// Observable transitions, returned for logging and for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEvent {
    /// A turn started "thinking".
    Investigating {
        /// Turn index.
        index: usize,
    },
    /// A turn's text became visible.
    Revealed {
        /// Turn index.
        index: usize,
        /// Whether it was appended to the queue.
        queued: bool,
    },
    /// The pass finished with a non-empty queue.
    QueueReady {
        /// Number of queue entries.
        len: usize,
    },
    /// The pass finished.
    Finished,
}

/// Sequences the reveal of one turn list and builds its playback queue.
#[derive(Debug, Clone)]
pub struct RevealSequencer {
    timing: TimingConfig,
    messages: StatusMessages,
    turns: Vec<Turn>,
    states: Vec<RevealState>,
    queue: Vec<QueueEntry>,
    queue_ready: bool,
    phase: RevealPhase,
    pending: Option<CancelToken>,
    status: Option<String>,
}

impl RevealSequencer {
    /// Create an idle sequencer.
    pub const fn new(timing: TimingConfig, messages: StatusMessages) -> Self {
        Self {
            timing,
            messages,
            turns: Vec::new(),
            states: Vec::new(),
            queue: Vec::new(),
            queue_ready: false,
            phase: RevealPhase::Idle,
            pending: None,
            status: None,
        }
    }

    /// Start a fresh pass over `turns`, discarding any pass in flight.
    ///
    /// Turn indices are taken from list position.
    pub fn reveal(
        &mut self,
        turns: Vec<Turn>,
        timers: &mut dyn TimerService,
        rng: &mut StdRng,
    ) -> Vec<RevealEvent> {
        self.clear(timers);
        self.turns = turns
            .into_iter()
            .enumerate()
            .map(|(index, turn)| Turn { index, ..turn })
            .collect();
        self.states = vec![RevealState::Pending; self.turns.len()];
        info!(turns = self.turns.len(), "reveal pass started");
        self.begin(0, timers, rng)
    }

    /// Cancel the pass in flight and forget all turns.
    pub fn clear(&mut self, timers: &mut dyn TimerService) {
        if let Some(token) = self.pending.take() {
            timers.cancel(token);
        }
        self.turns.clear();
        self.states.clear();
        self.queue.clear();
        self.queue_ready = false;
        self.phase = RevealPhase::Idle;
        self.status = None;
    }

    /// Handle a fired sequencer timer. Tokens the sequencer does not hold
    /// are ignored.
    pub fn on_timer(
        &mut self,
        token: CancelToken,
        event: TimerEvent,
        timers: &mut dyn TimerService,
        rng: &mut StdRng,
    ) -> Vec<RevealEvent> {
        if self.pending != Some(token) {
            debug!(token = token.get(), ?event, "ignoring stale reveal timer");
            return Vec::new();
        }
        self.pending = None;

        match (self.phase, event) {
            (RevealPhase::Thinking { index }, TimerEvent::ThinkTime) => {
                self.finish_turn(index, timers)
            }
            (RevealPhase::Pausing { next }, TimerEvent::TurnGap) => self.begin(next, timers, rng),
            (phase, event) => {
                debug!(?phase, ?event, "reveal timer does not match phase");
                Vec::new()
            }
        }
    }

    fn begin(
        &mut self,
        index: usize,
        timers: &mut dyn TimerService,
        rng: &mut StdRng,
    ) -> Vec<RevealEvent> {
        let Some(agent) = self.turns.get(index).map(|t| t.agent) else {
            return self.complete();
        };
        self.set_state(index, RevealState::Investigating);
        self.status = Some(self.messages.pick(rng));
        self.phase = RevealPhase::Thinking { index };
        let think = self.timing.think_time(rng);
        self.pending = Some(timers.after(think, TimerEvent::ThinkTime));
        debug!(
            turn = index,
            agent = %agent,
            think_ms = u64::try_from(think.as_millis()).unwrap_or(u64::MAX),
            "turn investigating"
        );
        vec![RevealEvent::Investigating { index }]
    }

    fn finish_turn(&mut self, index: usize, timers: &mut dyn TimerService) -> Vec<RevealEvent> {
        self.set_state(index, RevealState::Revealed);
        self.status = None;

        let entry = self.turns.get(index).and_then(|turn| {
            turn.audio_path.as_ref().map(|path| QueueEntry {
                turn_index: index,
                audio_path: path.clone(),
            })
        });
        let queued = entry.is_some();
        if let Some(entry) = entry {
            self.queue.push(entry);
        }
        info!(turn = index, queued, "turn revealed");

        let mut events = vec![RevealEvent::Revealed { index, queued }];
        let next = index.saturating_add(1);
        if next < self.turns.len() {
            self.phase = RevealPhase::Pausing { next };
            self.pending = Some(timers.after(self.timing.turn_gap(), TimerEvent::TurnGap));
        } else {
            events.extend(self.complete());
        }
        events
    }

    fn complete(&mut self) -> Vec<RevealEvent> {
        self.phase = RevealPhase::Complete;
        self.status = None;
        let mut events = Vec::new();
        if !self.queue.is_empty() {
            self.queue_ready = true;
            events.push(RevealEvent::QueueReady {
                len: self.queue.len(),
            });
        }
        info!(
            turns = self.turns.len(),
            clips = self.queue.len(),
            "reveal pass complete"
        );
        events.push(RevealEvent::Finished);
        events
    }

    fn set_state(&mut self, index: usize, next: RevealState) {
        if let Some(state) = self.states.get_mut(index) {
            if state.can_advance_to(next) {
                *state = next;
            }
        }
    }

    /// Turns of the current pass.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Reveal state of one turn.
    pub fn state(&self, index: usize) -> Option<RevealState> {
        self.states.get(index).copied()
    }

    /// Reveal states of all turns.
    pub fn states(&self) -> &[RevealState] {
        &self.states
    }

    /// Playback queue built so far.
    pub fn queue(&self) -> &[QueueEntry] {
        &self.queue
    }

    /// Whether the pass finished with a non-empty queue.
    pub const fn is_queue_ready(&self) -> bool {
        self.queue_ready
    }

    /// Current phase.
    pub const fn phase(&self) -> RevealPhase {
        self.phase
    }

    /// The turn in `Investigating` and its status line.
    pub fn investigating(&self) -> Option<(&Turn, &str)> {
        match self.phase {
            RevealPhase::Thinking { index } => {
                let turn = self.turns.get(index)?;
                Some((turn, self.status.as_deref().unwrap_or_default()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use ftm_types::Agent;
    use rand::SeedableRng;

    use super::*;
    use crate::timer::ManualTimers;

    fn make_turn(agent: Agent, audio: Option<&str>) -> Turn {
        Turn {
            index: 0,
            agent,
            text: format!("{agent} speaks"),
            audio_path: audio.map(ToOwned::to_owned),
        }
    }

    fn make_sequencer() -> RevealSequencer {
        RevealSequencer::new(TimingConfig::default(), StatusMessages::default())
    }

    /// Fire every due timer up to `until`, feeding each back in.
    fn run_until(
        seq: &mut RevealSequencer,
        timers: &mut ManualTimers,
        rng: &mut StdRng,
        until: Duration,
    ) -> Vec<RevealEvent> {
        let mut events = Vec::new();
        while let Some(fired) = timers.pop_due(until) {
            events.extend(seq.on_timer(fired.token, fired.event, timers, rng));
        }
        timers.set_now(until);
        events
    }

    #[test]
    fn first_turn_starts_investigating_immediately() {
        let mut seq = make_sequencer();
        let mut timers = ManualTimers::new();
        let mut rng = StdRng::seed_from_u64(1);
        let turns = vec![make_turn(Agent::Reporter, None), make_turn(Agent::Insider, None)];

        let events = seq.reveal(turns, &mut timers, &mut rng);

        assert_eq!(events, vec![RevealEvent::Investigating { index: 0 }]);
        assert_eq!(seq.states(), &[RevealState::Investigating, RevealState::Pending]);
        let (turn, message) = seq.investigating().unwrap();
        assert_eq!(turn.agent, Agent::Reporter);
        assert!(!message.is_empty());
        assert_eq!(timers.pending(), 1);
    }

    #[test]
    fn think_time_then_gap_then_next_turn() {
        let mut seq = make_sequencer();
        let mut timers = ManualTimers::new();
        let mut rng = StdRng::seed_from_u64(2);
        seq.reveal(
            vec![make_turn(Agent::Reporter, None), make_turn(Agent::Insider, None)],
            &mut timers,
            &mut rng,
        );

        // Nothing can be revealed before the minimum think time.
        run_until(&mut seq, &mut timers, &mut rng, Duration::from_millis(1_499));
        assert_eq!(seq.state(0), Some(RevealState::Investigating));

        // By the maximum it must be.
        run_until(&mut seq, &mut timers, &mut rng, Duration::from_millis(3_000));
        assert_eq!(seq.state(0), Some(RevealState::Revealed));
        assert!(matches!(
            seq.phase(),
            RevealPhase::Pausing { next: 1 } | RevealPhase::Thinking { index: 1 }
        ));
    }

    #[test]
    fn turn_gap_is_fixed() {
        let timing = TimingConfig {
            think_min_ms: 100,
            think_max_ms: 100,
            ..TimingConfig::default()
        };
        let mut seq = RevealSequencer::new(timing, StatusMessages::default());
        let mut timers = ManualTimers::new();
        let mut rng = StdRng::seed_from_u64(3);
        seq.reveal(
            vec![make_turn(Agent::Reporter, None), make_turn(Agent::Insider, None)],
            &mut timers,
            &mut rng,
        );

        run_until(&mut seq, &mut timers, &mut rng, Duration::from_millis(100));
        assert_eq!(seq.phase(), RevealPhase::Pausing { next: 1 });
        assert_eq!(timers.next_deadline(), Some(Duration::from_millis(900)));

        run_until(&mut seq, &mut timers, &mut rng, Duration::from_millis(899));
        assert_eq!(seq.state(1), Some(RevealState::Pending));
        run_until(&mut seq, &mut timers, &mut rng, Duration::from_millis(900));
        assert_eq!(seq.state(1), Some(RevealState::Investigating));
    }

    #[test]
    fn queue_holds_only_turns_with_audio_in_order() {
        let mut seq = RevealSequencer::new(TimingConfig::instant(), StatusMessages::default());
        let mut timers = ManualTimers::new();
        let mut rng = StdRng::seed_from_u64(4);
        let turns = vec![
            make_turn(Agent::Reporter, Some("t0.wav")),
            make_turn(Agent::Insider, None),
            make_turn(Agent::Reporter, Some("t2.wav")),
        ];

        seq.reveal(turns, &mut timers, &mut rng);
        let events = run_until(&mut seq, &mut timers, &mut rng, Duration::ZERO);

        let indices: Vec<usize> = seq.queue().iter().map(|e| e.turn_index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(seq.queue().get(1).unwrap().audio_path, "t2.wav");
        assert!(seq.is_queue_ready());
        assert!(events.contains(&RevealEvent::QueueReady { len: 2 }));
        assert_eq!(events.last(), Some(&RevealEvent::Finished));
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn no_gap_after_last_turn() {
        let mut seq = RevealSequencer::new(
            TimingConfig {
                think_min_ms: 10,
                think_max_ms: 10,
                ..TimingConfig::default()
            },
            StatusMessages::default(),
        );
        let mut timers = ManualTimers::new();
        let mut rng = StdRng::seed_from_u64(5);
        seq.reveal(vec![make_turn(Agent::Insider, None)], &mut timers, &mut rng);

        run_until(&mut seq, &mut timers, &mut rng, Duration::from_millis(10));

        assert_eq!(seq.phase(), RevealPhase::Complete);
        assert_eq!(timers.pending(), 0);
        assert!(!seq.is_queue_ready());
    }

    #[test]
    fn empty_list_completes_without_queue() {
        let mut seq = make_sequencer();
        let mut timers = ManualTimers::new();
        let mut rng = StdRng::seed_from_u64(6);
        let events = seq.reveal(Vec::new(), &mut timers, &mut rng);
        assert_eq!(events, vec![RevealEvent::Finished]);
        assert_eq!(seq.phase(), RevealPhase::Complete);
        assert!(!seq.is_queue_ready());
    }

    #[test]
    fn restart_discards_previous_pass() {
        let mut seq = make_sequencer();
        let mut timers = ManualTimers::new();
        let mut rng = StdRng::seed_from_u64(7);
        let five: Vec<Turn> = (0..5).map(|_| make_turn(Agent::Reporter, Some("x.wav"))).collect();
        seq.reveal(five.clone(), &mut timers, &mut rng);

        let restart = seq.reveal(five, &mut timers, &mut rng);

        assert_eq!(restart, vec![RevealEvent::Investigating { index: 0 }]);
        assert_eq!(timers.pending(), 1);
        assert!(seq.queue().is_empty());
        assert_eq!(seq.state(0), Some(RevealState::Investigating));
        assert!(seq.states().iter().skip(1).all(|s| *s == RevealState::Pending));
    }

    #[test]
    fn stale_token_is_ignored() {
        let mut seq = make_sequencer();
        let mut timers = ManualTimers::new();
        let mut rng = StdRng::seed_from_u64(8);
        seq.reveal(vec![make_turn(Agent::Reporter, None)], &mut timers, &mut rng);
        let stale = timers.after(Duration::ZERO, TimerEvent::ThinkTime);

        let events = seq.on_timer(stale, TimerEvent::ThinkTime, &mut timers, &mut rng);

        assert!(events.is_empty());
        assert_eq!(seq.state(0), Some(RevealState::Investigating));
    }

    #[test]
    fn clear_cancels_pending_timer() {
        let mut seq = make_sequencer();
        let mut timers = ManualTimers::new();
        let mut rng = StdRng::seed_from_u64(9);
        seq.reveal(vec![make_turn(Agent::Reporter, None)], &mut timers, &mut rng);
        seq.clear(&mut timers);
        assert_eq!(timers.pending(), 0);
        assert!(seq.turns().is_empty());
        assert_eq!(seq.phase(), RevealPhase::Idle);
    }
}
