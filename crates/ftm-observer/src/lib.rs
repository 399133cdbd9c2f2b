//! Rendering bridge for the Follow the Money presenter.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/view`) streaming the view model after
//!   every change via [`tokio::sync::broadcast`]
//! - **REST endpoints** for the current view model and the publication
//!   catalog
//! - **Command endpoints** mapping to the presenter's entry points
//!   (investigate, play, play all, stop, toggle, back)
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! The observer never touches presenter state. Reads are served from the
//! last published [`ViewModel`](ftm_types::ViewModel) snapshot. Commands
//! are forwarded to the presenter's event loop over an mpsc channel and
//! take effect when the loop processes them.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerError, spawn_observer};
pub use state::{AppState, Command};
