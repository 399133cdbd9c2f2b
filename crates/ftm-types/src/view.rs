//! View-model types handed to the rendering layer.
//!
//! A [`ViewModel`] is recomputed from authoritative session state after
//! every event and is never mutated by the renderer. It carries every
//! fact the renderer needs to paint the investigation screen, including
//! the two control-button visibility flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Agent, RevealState, Stage};
use crate::ids::InvestigationId;
use crate::structs::{PlaybackState, Publication};

/// Status text on a turn whose text is visible.
pub const READY_STATUS: &str = "ready";

/// Role text on the per-turn loader while the agent is "thinking".
pub const INVESTIGATING_ROLE: &str = "investigating...";

/// Complete presentation state for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ViewModel {
    /// Current screen.
    pub stage: Stage,
    /// Active investigation, if any.
    pub investigation_id: Option<InvestigationId>,
    /// Publication under investigation.
    pub publication: Option<Publication>,
    /// When the active investigation was started.
    pub started_at: Option<DateTime<Utc>>,
    /// Rotating message shown during the investigation-delay phase.
    pub gathering_message: Option<String>,
    /// The turn currently "thinking", if any.
    pub investigating: Option<InvestigatingView>,
    /// Revealed turns in order.
    pub turns: Vec<TurnView>,
    /// Terminal failure text shown in place of the conversation.
    pub failure: Option<String>,
    /// Snapshot of the playback state machine.
    pub playback: PlaybackState,
    /// Whether the "Play All" control is shown.
    pub play_all_visible: bool,
    /// Whether the "Stop" control is shown.
    pub stop_visible: bool,
}

impl ViewModel {
    /// Index of the highlighted turn, if any.
    pub fn highlighted_turn(&self) -> Option<usize> {
        self.turns.iter().find(|t| t.highlighted).map(|t| t.index)
    }

    /// Look up a revealed turn by its conversation index.
    pub fn turn(&self, index: usize) -> Option<&TurnView> {
        self.turns.iter().find(|t| t.index == index)
    }
}

/// Transient loader for the turn being "thought about".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InvestigatingView {
    /// Index of the turn in `Investigating`.
    pub turn_index: usize,
    /// Who is thinking.
    pub agent: Agent,
    /// Header name.
    pub display_name: String,
    /// Always [`INVESTIGATING_ROLE`].
    pub role_text: String,
    /// Cosmetic status line.
    pub message: String,
}

/// A revealed turn as painted by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TurnView {
    /// Conversation index.
    pub index: usize,
    /// Speaker.
    pub agent: Agent,
    /// Header name.
    pub display_name: String,
    /// Header role label.
    pub role_label: String,
    /// Reveal progress (always `Revealed` for painted turns).
    pub reveal: RevealState,
    /// Always [`READY_STATUS`].
    pub status: String,
    /// Turn text.
    pub text: String,
    /// Whether a play control is offered.
    pub has_audio: bool,
    /// Whether the body is expanded.
    pub expanded: bool,
    /// Whether this turn's clip is the one open.
    pub highlighted: bool,
}
