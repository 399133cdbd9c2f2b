//! Axum router construction for the rendering bridge.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router: status page, REST reads, command
/// endpoints, and the view-model `WebSocket`.
///
/// CORS allows any origin so a separately served front end can connect.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/view", get(ws::ws_view))
        // Reads
        .route("/api/view", get(handlers::get_view))
        .route("/api/publications", get(handlers::list_publications))
        // Commands
        .route("/api/investigate/{id}", post(handlers::investigate))
        .route("/api/turns/{index}/play", post(handlers::play_turn))
        .route("/api/turns/{index}/toggle", post(handlers::toggle_turn))
        .route("/api/play-all", post(handlers::play_all))
        .route("/api/stop", post(handlers::stop))
        .route("/api/back", post(handlers::back))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
