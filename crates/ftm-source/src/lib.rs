//! Publication catalog, demo lookup, and live investigation for the
//! Follow the Money presenter.
//!
//! [`InvestigationSource`] dispatches to either the HTTP API or a local
//! data directory, chosen by `source.mode` in the configuration. Enum
//! dispatch keeps the async methods usable without boxing.
//!
//! # Modules
//!
//! - [`error`] -- [`SourceError`].
//! - [`files`] -- [`FileSource`] over `publications.json` and `demo/`.
//! - [`http`] -- [`HttpSource`] against the investigation API.

pub mod error;
pub mod files;
pub mod http;

use ftm_core::config::{SourceConfig, SourceMode};
use ftm_types::{Investigation, Publication};

pub use error::SourceError;
pub use files::FileSource;
pub use http::HttpSource;

/// Where publications and investigations come from.
#[derive(Debug, Clone)]
pub enum InvestigationSource {
    /// Investigation API over HTTP.
    Http(HttpSource),
    /// Local data directory. Live investigations are unavailable.
    Files(FileSource),
}

impl InvestigationSource {
    /// Build the source selected by `config.mode`.
    pub fn from_config(config: &SourceConfig) -> Result<Self, SourceError> {
        Ok(match config.mode {
            SourceMode::Http => Self::Http(HttpSource::new(config)?),
            SourceMode::Files => Self::Files(FileSource::new(&config.data_dir)),
        })
    }

    /// Fetch the publication catalog.
    pub async fn publications(&self) -> Result<Vec<Publication>, SourceError> {
        match self {
            Self::Http(source) => source.publications().await,
            Self::Files(source) => source.publications().await,
        }
    }

    /// Look up the pre-baked demo for a publication. `Ok(None)` means
    /// there is none.
    pub async fn demo(&self, publication_id: &str) -> Result<Option<Investigation>, SourceError> {
        match self {
            Self::Http(source) => source.demo(publication_id).await,
            Self::Files(source) => source.demo(publication_id).await,
        }
    }

    /// Run a live investigation.
    pub async fn start(&self, publication_id: &str) -> Result<Investigation, SourceError> {
        match self {
            Self::Http(source) => source.start(publication_id).await,
            Self::Files(_) => Err(SourceError::LiveUnavailable),
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Files(_) => "files",
        }
    }
}

/// Find a publication in a catalog by id.
pub fn find_publication<'a>(
    catalog: &'a [Publication],
    id: &str,
) -> Result<&'a Publication, SourceError> {
    catalog
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| SourceError::PublicationNotFound { id: id.to_owned() })
}
