//! HTTP client for the investigation API.
//!
//! Endpoints, relative to `source.api_url`:
//!
//! | Method | Path                        | Result                          |
//! |--------|-----------------------------|---------------------------------|
//! | GET    | `/api/publications`         | `[Publication]`                 |
//! | GET    | `/api/demo/{id}`            | `Investigation`, 404 = no demo  |
//! | POST   | `/api/investigate/{id}`     | `Investigation`                 |

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use ftm_core::config::SourceConfig;
use ftm_types::{Investigation, Publication};

use crate::error::SourceError;

/// Client for the investigation API.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    api_url: String,
}

impl HttpSource {
    /// Build a client with the configured request timeout.
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|source| SourceError::Http {
                url: config.api_url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Base URL requests are sent to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch the publication catalog.
    pub async fn publications(&self) -> Result<Vec<Publication>, SourceError> {
        let url = format!("{}/api/publications", self.api_url);
        let response = self.send(self.client.get(&url), &url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(response, "publication catalog unavailable").await);
        }
        decode(response, &url).await
    }

    /// Look up the pre-baked demo for a publication.
    pub async fn demo(&self, publication_id: &str) -> Result<Option<Investigation>, SourceError> {
        let url = format!("{}/api/demo/{publication_id}", self.api_url);
        let response = self.send(self.client.get(&url), &url).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(publication = %publication_id, "no demo available");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(response, "demo lookup failed").await);
        }
        decode(response, &url).await.map(Some)
    }

    /// Run a live investigation.
    pub async fn start(&self, publication_id: &str) -> Result<Investigation, SourceError> {
        let url = format!("{}/api/investigate/{publication_id}", self.api_url);
        let response = self.send(self.client.post(&url), &url).await?;
        if !response.status().is_success() {
            return Err(status_error(response, "server error").await);
        }
        decode(response, &url).await
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, SourceError> {
        debug!(url, "sending request");
        request.send().await.map_err(|source| SourceError::Http {
            url: url.to_owned(),
            source,
        })
    }
}

async fn status_error(response: reqwest::Response, what: &str) -> SourceError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error body".to_owned());
    let message = if body.trim().is_empty() {
        what.to_owned()
    } else {
        format!("{what}: {}", body.trim())
    };
    SourceError::Status { status, message }
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    url: &str,
) -> Result<T, SourceError> {
    let body = response.text().await.map_err(|source| SourceError::Http {
        url: url.to_owned(),
        source,
    })?;
    serde_json::from_str(&body).map_err(|source| SourceError::Decode {
        origin: url.to_owned(),
        source,
    })
}
