//! Enumeration types for the investigation presenter.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// One of the two voices in an investigation.
///
/// The wire name is the agent's full title as produced by the
/// conversation generator. The display name and role label are what the
/// rendering layer puts in the turn header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Agent {
    /// The street reporter who works the public record.
    #[serde(rename = "Street Reporter")]
    Reporter,
    /// The industry insider who knows how the money moves.
    #[serde(rename = "Insider")]
    Insider,
}

impl Agent {
    /// Name used on the wire (`"Street Reporter"` / `"Insider"`).
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Reporter => "Street Reporter",
            Self::Insider => "Insider",
        }
    }

    /// First name shown in the turn header.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Reporter => "Andrew",
            Self::Insider => "FJ",
        }
    }

    /// Short role label shown next to the display name.
    pub const fn role_label(self) -> &'static str {
        match self {
            Self::Reporter => "Reporter",
            Self::Insider => "Insider",
        }
    }
}

impl core::fmt::Display for Agent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.wire_name())
    }
}

// ---------------------------------------------------------------------------
// Reveal
// ---------------------------------------------------------------------------

/// Per-turn reveal progress.
///
/// Transitions are strictly `Pending -> Investigating -> Revealed`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum RevealState {
    /// Not yet reached by the sequencer.
    #[default]
    Pending,
    /// The agent is "thinking"; the text is still hidden.
    Investigating,
    /// The text is visible.
    Revealed,
}

impl RevealState {
    /// Whether moving from `self` to `next` is a legal single step.
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Investigating) | (Self::Investigating, Self::Revealed)
        )
    }
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// Mode of the single playback state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum PlaybackMode {
    /// Nothing playing.
    #[default]
    Idle,
    /// A single clip chosen by the user is playing.
    PlayingOne,
    /// The whole queue is playing in order.
    PlayingAll,
    /// The user interrupted playback. Behaves like `Idle`.
    Stopped,
}

impl PlaybackMode {
    /// Whether a clip is playing or the queue is mid-advance.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::PlayingOne | Self::PlayingAll)
    }
}

// ---------------------------------------------------------------------------
// Session stage
// ---------------------------------------------------------------------------

/// Which screen the presenter is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Stage {
    /// Publication picker.
    #[default]
    Selector,
    /// Investigation-delay phase: the turn list is being obtained.
    Gathering,
    /// Turns are being revealed or have been revealed.
    Conversation,
    /// The turn list could not be obtained.
    Failed,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn agent_uses_full_title_on_the_wire() {
        let json = serde_json::to_string(&Agent::Reporter).unwrap();
        assert_eq!(json, "\"Street Reporter\"");
        let back: Agent = serde_json::from_str("\"Insider\"").unwrap();
        assert_eq!(back, Agent::Insider);
    }

    #[test]
    fn unknown_agent_is_rejected() {
        let parsed: Result<Agent, _> = serde_json::from_str("\"Narrator\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn agent_labels() {
        assert_eq!(Agent::Reporter.display_name(), "Andrew");
        assert_eq!(Agent::Insider.display_name(), "FJ");
        assert_eq!(Agent::Reporter.role_label(), "Reporter");
        assert_eq!(Agent::Reporter.to_string(), "Street Reporter");
    }

    #[test]
    fn reveal_state_only_steps_forward() {
        use RevealState::{Investigating, Pending, Revealed};
        assert!(Pending.can_advance_to(Investigating));
        assert!(Investigating.can_advance_to(Revealed));
        assert!(!Pending.can_advance_to(Revealed));
        assert!(!Revealed.can_advance_to(Pending));
        assert!(!Investigating.can_advance_to(Investigating));
    }

    #[test]
    fn playback_mode_activity() {
        assert!(PlaybackMode::PlayingOne.is_active());
        assert!(PlaybackMode::PlayingAll.is_active());
        assert!(!PlaybackMode::Idle.is_active());
        assert!(!PlaybackMode::Stopped.is_active());
    }
}
