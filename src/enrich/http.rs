//! HTTP enrichment client
//!
//! POSTs each surface as JSON to a configured endpoint and expects
//! `{"description": "..."}` back.

use super::{EnrichError, Enricher};
use crate::surface::Surface;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_ENRICH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct EnrichRequest<'a> {
    surface: &'a Surface,
}

#[derive(Deserialize)]
struct EnrichResponse {
    description: String,
}

pub struct HttpEnricher {
    endpoint: String,
    http_client: Client,
    timeout: Duration,
}

impl HttpEnricher {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, EnrichError> {
        Self::with_timeout(endpoint, DEFAULT_ENRICH_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, EnrichError> {
        let endpoint = endpoint.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(EnrichError::Configuration(format!(
                "endpoint must be an http(s) URL, got '{}'",
                endpoint
            )));
        }
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichError::Configuration(e.to_string()))?;

        Ok(Self {
            endpoint,
            http_client,
            timeout,
        })
    }
}

impl fmt::Debug for HttpEnricher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpEnricher")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl Enricher for HttpEnricher {
    fn name(&self) -> &str {
        "http"
    }

    async fn enrich(&self, surface: &Surface) -> Result<Surface, EnrichError> {
        debug!(surface = surface.name(), endpoint = %self.endpoint, "Requesting description");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&EnrichRequest { surface })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EnrichError::Timeout {
                        seconds: self.timeout.as_secs(),
                    }
                } else {
                    EnrichError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Enrichment API returned an error");
            return Err(EnrichError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EnrichResponse = response
            .json()
            .await
            .map_err(|e| EnrichError::InvalidResponse(e.to_string()))?;
        let description = parsed.description.trim();
        if description.is_empty() {
            return Err(EnrichError::InvalidResponse("empty description".to_string()));
        }

        let mut enriched = surface.clone();
        enriched.set_description(description);
        Ok(enriched)
    }
}
