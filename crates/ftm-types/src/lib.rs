//! Shared type definitions for the Follow the Money investigation presenter.
//!
//! This crate is the single source of truth for the data that crosses
//! crate boundaries: the upstream payloads, the playback state value
//! object and the view model. Types flow to `TypeScript` via `ts-rs` for
//! the web renderer.
//!
//! # Modules
//!
//! - [`ids`] -- The investigation identifier
//! - [`enums`] -- Agents, reveal states, playback modes, session stages
//! - [`structs`] -- Publications, turns, queue entries, playback state
//! - [`view`] -- The view model painted by the renderer

pub mod enums;
pub mod ids;
pub mod structs;
pub mod view;

// Re-export all public types at crate root for convenience.
pub use enums::{Agent, PlaybackMode, RevealState, Stage};
pub use ids::InvestigationId;
pub use structs::{Investigation, PlaybackState, Publication, QueueEntry, Turn};
pub use view::{INVESTIGATING_ROLE, InvestigatingView, READY_STATUS, TurnView, ViewModel};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings for types marked
        // #[ts(export)]. Files land in `bindings/` under the crate root.
        use ts_rs::TS;

        let _ = crate::ids::InvestigationId::export_all();

        let _ = crate::enums::Agent::export_all();
        let _ = crate::enums::RevealState::export_all();
        let _ = crate::enums::PlaybackMode::export_all();
        let _ = crate::enums::Stage::export_all();

        let _ = crate::structs::Publication::export_all();
        let _ = crate::structs::Turn::export_all();
        let _ = crate::structs::Investigation::export_all();
        let _ = crate::structs::QueueEntry::export_all();
        let _ = crate::structs::PlaybackState::export_all();

        let _ = crate::view::ViewModel::export_all();
        let _ = crate::view::InvestigatingView::export_all();
        let _ = crate::view::TurnView::export_all();
    }
}
