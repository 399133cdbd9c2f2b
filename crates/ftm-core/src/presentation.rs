//! Presentation state and view-model derivation.
//!
//! The only presentation fact stored here is which turns are expanded,
//! because expansion is partly user-driven. Everything else in the
//! [`ViewModel`] (highlight, button visibility, loader) is computed on
//! demand from the sequencer and the playback state, so it cannot drift
//! from them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use ftm_types::{
    INVESTIGATING_ROLE, InvestigatingView, InvestigationId, PlaybackState, Publication,
    READY_STATUS, RevealState, Stage, TurnView, ViewModel,
};

use crate::sequencer::RevealSequencer;

/// Per-turn expansion flags. Every turn starts collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presentation {
    expanded: BTreeSet<usize>,
}

impl Presentation {
    /// Expand one turn.
    pub fn expand(&mut self, index: usize) {
        self.expanded.insert(index);
    }

    /// Collapse one turn.
    pub fn collapse(&mut self, index: usize) {
        self.expanded.remove(&index);
    }

    /// Flip one turn. Returns the new state.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.expanded.remove(&index) {
            false
        } else {
            self.expanded.insert(index);
            true
        }
    }

    /// Collapse every turn.
    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Whether a turn is expanded.
    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.contains(&index)
    }
}

/// Session facts the view is derived from.
pub struct ViewInputs<'a> {
    /// Current screen.
    pub stage: Stage,
    /// Active investigation.
    pub investigation_id: Option<InvestigationId>,
    /// Publication under investigation.
    pub publication: Option<&'a Publication>,
    /// When the investigation started.
    pub started_at: Option<DateTime<Utc>>,
    /// Gathering-phase status line.
    pub gathering_message: Option<&'a str>,
    /// Terminal failure text.
    pub failure: Option<&'a str>,
    /// Reveal progress and queue.
    pub sequencer: &'a RevealSequencer,
    /// Playback state value object.
    pub playback: PlaybackState,
    /// Expansion flags.
    pub presentation: &'a Presentation,
}

/// Build the view model for one frame.
pub fn render(inputs: &ViewInputs<'_>) -> ViewModel {
    let sequencer = inputs.sequencer;
    let playback = inputs.playback;

    let turns = sequencer
        .turns()
        .iter()
        .filter(|turn| sequencer.state(turn.index) == Some(RevealState::Revealed))
        .map(|turn| TurnView {
            index: turn.index,
            agent: turn.agent,
            display_name: turn.agent.display_name().to_owned(),
            role_label: turn.agent.role_label().to_owned(),
            reveal: RevealState::Revealed,
            status: READY_STATUS.to_owned(),
            text: turn.text.clone(),
            has_audio: turn.has_audio(),
            expanded: inputs.presentation.is_expanded(turn.index),
            highlighted: playback.active_turn == Some(turn.index),
        })
        .collect();

    let investigating = sequencer
        .investigating()
        .map(|(turn, message)| InvestigatingView {
            turn_index: turn.index,
            agent: turn.agent,
            display_name: turn.agent.display_name().to_owned(),
            role_text: INVESTIGATING_ROLE.to_owned(),
            message: message.to_owned(),
        });

    let queue_ready = sequencer.is_queue_ready() && !sequencer.queue().is_empty();

    ViewModel {
        stage: inputs.stage,
        investigation_id: inputs.investigation_id,
        publication: inputs.publication.cloned(),
        started_at: inputs.started_at,
        gathering_message: inputs.gathering_message.map(ToOwned::to_owned),
        investigating,
        turns,
        failure: inputs.failure.map(ToOwned::to_owned),
        playback,
        play_all_visible: !playback.mode.is_active() && queue_ready,
        stop_visible: playback.mode.is_active(),
    }
}
