//! `WebSocket` stream of the presenter's view model.
//!
//! `GET /ws/view` upgrades to a socket that first carries the current
//! snapshot and then one JSON [`ViewModel`] per publish. A client that
//! falls behind the broadcast buffer skips straight to the newest view.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use ftm_types::ViewModel;

use crate::state::AppState;

/// Whether the connection should stay open.
enum Flow {
    Continue,
    Close(&'static str),
}

/// Upgrade to a view-model stream.
///
/// # Route
///
/// `GET /ws/view`
pub async fn ws_view(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_views(socket, state))
}

async fn stream_views(mut socket: WebSocket, state: Arc<AppState>) {
    // Subscribe before reading the snapshot so nothing published in
    // between is lost.
    let mut updates = state.subscribe();
    let snapshot = state.snapshot.read().await.clone();
    debug!(stage = ?snapshot.stage, "view stream opened");

    let mut flow = push(&mut socket, &snapshot).await;
    while let Flow::Continue = flow {
        flow = tokio::select! {
            update = updates.recv() => match update {
                Ok(view) => push(&mut socket, &view).await,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "view stream lagged, resuming at newest view");
                    Flow::Continue
                }
                Err(RecvError::Closed) => Flow::Close("presenter stopped publishing"),
            },
            frame = socket.recv() => from_client(&mut socket, frame).await,
        };
    }

    if let Flow::Close(reason) = flow {
        debug!(reason, "view stream closed");
    }
}

/// Send one view as a text frame.
async fn push(socket: &mut WebSocket, view: &ViewModel) -> Flow {
    let json = match serde_json::to_string(view) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to encode view model, skipping it");
            return Flow::Continue;
        }
    };
    if socket.send(Message::Text(json.into())).await.is_ok() {
        Flow::Continue
    } else {
        Flow::Close("send failed")
    }
}

/// React to a frame from the client. Only close and ping matter; the
/// stream is one-way.
async fn from_client(
    socket: &mut WebSocket,
    frame: Option<Result<Message, axum::Error>>,
) -> Flow {
    match frame {
        None | Some(Ok(Message::Close(_))) => Flow::Close("client disconnected"),
        Some(Ok(Message::Ping(payload))) => {
            if socket.send(Message::Pong(payload)).await.is_ok() {
                Flow::Continue
            } else {
                Flow::Close("pong failed")
            }
        }
        Some(Ok(_)) => Flow::Continue,
        Some(Err(e)) => {
            debug!(error = %e, "view stream socket error");
            Flow::Close("socket error")
        }
    }
}
