//! Local data directory source.
//!
//! ```text
//! {data_dir}/publications.json
//! {data_dir}/demo/{id}_conversation.json
//! ```
//!
//! The catalog file nests the rating fields under `ground_news_rating`;
//! they are flattened into [`Publication`] on load.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use ftm_types::{Investigation, Publication};

use crate::error::SourceError;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    publications: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: String,
    name: String,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    ground_news_rating: Rating,
}

#[derive(Debug, Default, Deserialize)]
struct Rating {
    bias: Option<String>,
    factuality: Option<String>,
    ownership_category: Option<String>,
}

impl From<CatalogEntry> for Publication {
    fn from(entry: CatalogEntry) -> Self {
        let rating = entry.ground_news_rating;
        let or_unknown = |v: Option<String>| v.unwrap_or_else(|| UNKNOWN.to_owned());
        Self {
            id: entry.id,
            name: entry.name,
            owner: entry.owner,
            bias: or_unknown(rating.bias),
            factuality: or_unknown(rating.factuality),
            category: or_unknown(rating.ownership_category),
        }
    }
}

/// Source backed by files under a data directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    /// Read from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the publication catalog.
    pub async fn publications(&self) -> Result<Vec<Publication>, SourceError> {
        let path = self.root.join("publications.json");
        let catalog: CatalogFile = read_json(&path).await?;
        Ok(catalog.publications.into_iter().map(Publication::from).collect())
    }

    /// Load the demo for a publication, if a file exists for it.
    pub async fn demo(&self, publication_id: &str) -> Result<Option<Investigation>, SourceError> {
        let path = self
            .root
            .join("demo")
            .join(format!("{publication_id}_conversation.json"));
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(path = %path.display(), "no demo file");
            return Ok(None);
        }
        read_json(&path).await.map(Some)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;
    serde_json::from_str(&contents).map_err(|source| SourceError::Decode {
        origin: path.display().to_string(),
        source,
    })
}
