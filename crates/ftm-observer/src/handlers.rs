//! REST endpoint handlers for the rendering bridge.
//!
//! Reads come from the last published snapshot. Command handlers only
//! forward a [`Command`] to the presenter and answer `202 Accepted`; the
//! resulting view arrives on the `WebSocket` stream.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/view` | Current view model |
//! | `GET` | `/api/publications` | Publication catalog |
//! | `POST` | `/api/investigate/{id}` | Investigate a publication |
//! | `POST` | `/api/turns/{index}/play` | Play one turn's clip |
//! | `POST` | `/api/turns/{index}/toggle` | Expand or collapse a turn |
//! | `POST` | `/api/play-all` | Play every clip in order |
//! | `POST` | `/api/stop` | Stop playback |
//! | `POST` | `/api/back` | Back to the publication picker |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use tracing::debug;

use crate::error::ObserverError;
use crate::state::{AppState, Command};

/// Body returned by every command endpoint.
#[derive(Debug, serde::Serialize)]
struct Accepted {
    ok: bool,
    command: &'static str,
}

async fn forward(
    state: &AppState,
    command: Command,
    name: &'static str,
) -> Result<impl IntoResponse + use<>, ObserverError> {
    debug!(command = name, "forwarding command");
    state
        .commands
        .send(command)
        .await
        .map_err(|e| ObserverError::Unavailable(e.to_string()))?;
    Ok((
        StatusCode::ACCEPTED,
        Json(Accepted {
            ok: true,
            command: name,
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the presenter's stage and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.snapshot.read().await;
    let stage = format!("{:?}", view.stage);
    let publication = view
        .publication
        .as_ref()
        .map_or_else(|| "-".to_owned(), |p| p.name.clone());
    let revealed = view.turns.len();
    let mode = format!("{:?}", view.playback.mode);
    let catalog = state.publications.read().await.len();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Follow the Money</title>
    <style>
        body {{
            background: #101010;
            color: #e6e1d6;
            font-family: Georgia, 'Times New Roman', serif;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #d4a84b; margin-bottom: 0.25rem; }}
        .metric {{
            display: inline-block;
            border: 1px solid #3a3a3a;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8a857a; font-size: 0.85rem; }}
        .metric .value {{ color: #d4a84b; font-size: 1.4rem; }}
        code {{ color: #9cc2a0; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
    </style>
</head>
<body>
    <h1>Follow the Money</h1>
    <div>
        <div class="metric"><div class="label">Stage</div><div class="value">{stage}</div></div>
        <div class="metric"><div class="label">Publication</div><div class="value">{publication}</div></div>
        <div class="metric"><div class="label">Turns</div><div class="value">{revealed}</div></div>
        <div class="metric"><div class="label">Playback</div><div class="value">{mode}</div></div>
        <div class="metric"><div class="label">Catalog</div><div class="value">{catalog}</div></div>
    </div>
    <h2>API</h2>
    <ul>
        <li><code>GET /api/view</code> -- current view model</li>
        <li><code>GET /api/publications</code> -- publication catalog</li>
        <li><code>POST /api/investigate/{{id}}</code> -- investigate a publication</li>
        <li><code>POST /api/turns/{{index}}/play</code> -- play one clip</li>
        <li><code>POST /api/turns/{{index}}/toggle</code> -- expand or collapse a turn</li>
        <li><code>POST /api/play-all</code>, <code>/api/stop</code>, <code>/api/back</code></li>
        <li><code>ws://host:port/ws/view</code> -- live view-model stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Return the most recently published view model.
pub async fn get_view(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.snapshot.read().await.clone())
}

/// Return the publication catalog.
pub async fn list_publications(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.publications.read().await.clone())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Start investigating the publication with the given id.
pub async fn investigate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let publication = state
        .publication(&id)
        .await
        .ok_or_else(|| ObserverError::NotFound(format!("publication '{id}' not found")))?;
    forward(&state, Command::Investigate(publication), "investigate").await
}

/// Play one turn's clip.
pub async fn play_turn(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, ObserverError> {
    forward(&state, Command::PlayOne(index), "play").await
}

/// Expand or collapse one turn.
pub async fn toggle_turn(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, ObserverError> {
    forward(&state, Command::Toggle(index), "toggle").await
}

/// Play every clip in order.
pub async fn play_all(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    forward(&state, Command::PlayAll, "play-all").await
}

/// Stop playback.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    forward(&state, Command::Stop, "stop").await
}

/// Return to the publication picker.
pub async fn back(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    forward(&state, Command::Back, "back").await
}
