//! Error types for the investigation sources.

/// Errors from fetching publications, demos, or live investigations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request to {url} failed: {source}")]
    Http {
        /// Request URL.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Status {
        /// HTTP status code.
        status: u16,
        /// What the request was for, plus any body the server sent.
        message: String,
    },

    /// A response or data file was not valid JSON of the expected shape.
    #[error("invalid JSON in {origin}: {source}")]
    Decode {
        /// URL or file path the document came from.
        origin: String,
        /// Parser error.
        source: serde_json::Error,
    },

    /// A data file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The publication id is not in the catalog.
    #[error("publication '{id}' not found")]
    PublicationNotFound {
        /// The requested id.
        id: String,
    },

    /// This source cannot run live investigations.
    #[error("live investigation is not available in files mode")]
    LiveUnavailable,
}
