//! Shared application state for the rendering bridge.
//!
//! [`AppState`] holds the broadcast channel for view-model updates, the
//! last published view model, the cached publication catalog, and the
//! command channel into the presenter's event loop.

use std::sync::Arc;

use ftm_types::{Publication, ViewModel};
use tokio::sync::{RwLock, broadcast, mpsc};

/// Capacity of the broadcast channel for view-model updates.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 64;

/// An entry-point request forwarded to the presenter's event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start investigating a publication from the catalog.
    Investigate(Publication),
    /// Play one turn's clip.
    PlayOne(usize),
    /// Play every clip in order.
    PlayAll,
    /// Stop playback.
    Stop,
    /// Flip one turn's expanded flag.
    Toggle(usize),
    /// Return to the publication picker.
    Back,
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for view-model updates.
    pub tx: broadcast::Sender<ViewModel>,
    /// The most recently published view model.
    pub snapshot: Arc<RwLock<ViewModel>>,
    /// Publication catalog loaded at startup.
    pub publications: Arc<RwLock<Vec<Publication>>>,
    /// Command channel into the presenter's event loop.
    pub commands: mpsc::Sender<Command>,
}

impl AppState {
    /// Create state with an empty view and catalog. Commands go to
    /// `commands`.
    pub fn new(commands: mpsc::Sender<Command>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            snapshot: Arc::new(RwLock::new(ViewModel::default())),
            publications: Arc::new(RwLock::new(Vec::new())),
            commands,
        }
    }

    /// Subscribe to view-model updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewModel> {
        self.tx.subscribe()
    }

    /// Store `view` as the current snapshot and push it to every
    /// connected client.
    ///
    /// Returns the number of receivers that got the message. Returns 0 if
    /// no clients are connected (this is not an error).
    pub async fn publish(&self, view: &ViewModel) -> usize {
        view.clone_into(&mut *self.snapshot.write().await);
        // send returns Err only when there are zero receivers.
        self.tx.send(view.clone()).unwrap_or(0)
    }

    /// Replace the cached catalog.
    pub async fn set_publications(&self, publications: Vec<Publication>) {
        *self.publications.write().await = publications;
    }

    /// Look up a publication by id in the cached catalog.
    pub async fn publication(&self, id: &str) -> Option<Publication> {
        self.publications
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }
}
