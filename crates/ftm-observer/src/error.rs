//! Request failures of the rendering bridge.
//!
//! Every failure renders as `{"error": "...", "status": <code>}` through
//! the [`IntoResponse`] impl.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Why a bridge request could not be served.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// No publication with this id is in the catalog.
    #[error("not found: {0}")]
    NotFound(String),

    /// The presenter's event loop has stopped taking commands.
    #[error("presenter unavailable: {0}")]
    Unavailable(String),
}

impl ObserverError {
    /// HTTP status for this failure.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}
