//! Core data structs: publications, turns, the playback queue and the
//! playback state value object.

use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::enums::{Agent, PlaybackMode};

// ---------------------------------------------------------------------------
// Publications
// ---------------------------------------------------------------------------

/// A catalog entry the user can pick to investigate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Publication {
    /// Stable slug (e.g. `"washington-post"`).
    pub id: String,
    /// Masthead name.
    pub name: String,
    /// Controlling owner.
    pub owner: String,
    /// Bias rating, `"Unknown"` when unrated.
    pub bias: String,
    /// Factuality rating, `"Unknown"` when unrated.
    pub factuality: String,
    /// Ownership category, `"Unknown"` when unrated.
    pub category: String,
}

// ---------------------------------------------------------------------------
// Turns
// ---------------------------------------------------------------------------

/// One dialogue contribution, optionally narrated.
///
/// `index` is the position in the accepted turn list. It is not part of
/// the upstream payload and is assigned by [`Investigation::into_turns`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Turn {
    /// Zero-based position in the conversation.
    #[serde(default)]
    pub index: usize,
    /// Who is speaking.
    pub agent: Agent,
    /// What they say.
    pub text: String,
    /// Narration clip path, passed to the audio backend untouched.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub audio_path: Option<String>,
}

impl Turn {
    /// Whether the turn has a narration clip.
    pub const fn has_audio(&self) -> bool {
        self.audio_path.is_some()
    }
}

/// Treat `""` the same as a missing path.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|path| !path.is_empty()))
}

/// The payload returned by the demo lookup and the live investigation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Investigation {
    /// Publication name as recorded by the generator.
    #[serde(default)]
    pub publication: Option<String>,
    /// Owner as recorded by the generator.
    #[serde(default)]
    pub owner: Option<String>,
    /// Ordered dialogue.
    #[serde(default)]
    pub turns: Vec<Turn>,
}

impl Investigation {
    /// Consume the payload and return its turns with `index` set to each
    /// turn's position.
    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
            .into_iter()
            .enumerate()
            .map(|(index, turn)| Turn { index, ..turn })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// One playable clip, in turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QueueEntry {
    /// Index of the turn this clip narrates.
    pub turn_index: usize,
    /// Clip path, copied from the turn.
    pub audio_path: String,
}

/// The playback state value object.
///
/// `active_turn` is set exactly while a clip is open. `cursor` is only
/// meaningful in [`PlaybackMode::PlayingAll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlaybackState {
    /// Current mode.
    pub mode: PlaybackMode,
    /// Turn whose clip is open.
    pub active_turn: Option<usize>,
    /// Queue position during full-sequence playback.
    pub cursor: Option<usize>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn turn_parses_upstream_shape() {
        let json = r#"{"agent":"Street Reporter","text":"Who owns it?","audio_path":"demo/audio/wapo/turn_00.wav"}"#;
        let turn: Turn = serde_json::from_str(json).unwrap();
        assert_eq!(turn.index, 0);
        assert_eq!(turn.agent, Agent::Reporter);
        assert_eq!(turn.audio_path.as_deref(), Some("demo/audio/wapo/turn_00.wav"));
    }

    #[test]
    fn empty_or_null_audio_path_means_no_audio() {
        let empty: Turn =
            serde_json::from_str(r#"{"agent":"Insider","text":"x","audio_path":""}"#).unwrap();
        let null: Turn =
            serde_json::from_str(r#"{"agent":"Insider","text":"x","audio_path":null}"#).unwrap();
        let missing: Turn = serde_json::from_str(r#"{"agent":"Insider","text":"x"}"#).unwrap();
        assert!(!empty.has_audio());
        assert!(!null.has_audio());
        assert!(!missing.has_audio());
    }

    #[test]
    fn into_turns_assigns_positions() {
        let json = r#"{
            "publication": "The Post",
            "owner": "A Billionaire",
            "turns": [
                {"agent": "Street Reporter", "text": "a", "audio_path": "a.wav"},
                {"agent": "Insider", "text": "b"},
                {"agent": "Street Reporter", "text": "c", "audio_path": "c.wav"}
            ]
        }"#;
        let investigation: Investigation = serde_json::from_str(json).unwrap();
        let turns = investigation.into_turns();
        let indices: Vec<usize> = turns.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(!turns.get(1).unwrap().has_audio());
    }

    #[test]
    fn default_playback_state_is_idle() {
        let state = PlaybackState::default();
        assert_eq!(state.mode, PlaybackMode::Idle);
        assert!(state.active_turn.is_none());
        assert!(state.cursor.is_none());
    }
}
