//! Optional description enrichment (stage C2)
//!
//! Enrichment is best-effort: every surface is attempted once under the request
//! throttle, and a failure keeps the surface as extracted. Each attempt is reported
//! as an [`EnrichmentOutcome`] so failures stay inspectable.

mod http;
mod throttle;

pub use http::HttpEnricher;
pub use throttle::RequestThrottle;

use crate::surface::Surface;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Enrichment client misconfigured: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Enrichment API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid enrichment response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait Enricher: Send + Sync {
    fn name(&self) -> &str;

    /// Return a copy of `surface` with its description filled in.
    async fn enrich(&self, surface: &Surface) -> Result<Surface, EnrichError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentOutcome {
    Enriched { name: String },
    Failed { name: String, reason: String },
}

impl EnrichmentOutcome {
    pub fn is_enriched(&self) -> bool {
        matches!(self, EnrichmentOutcome::Enriched { .. })
    }
}

/// Enrich every surface in order, keeping the original on failure.
pub async fn enrich_all(
    enricher: &dyn Enricher,
    throttle: &mut RequestThrottle,
    surfaces: Vec<Surface>,
) -> (Vec<Surface>, Vec<EnrichmentOutcome>) {
    let mut enriched = Vec::with_capacity(surfaces.len());
    let mut outcomes = Vec::with_capacity(surfaces.len());

    for surface in surfaces {
        throttle.acquire().await;
        let name = surface.name().to_string();
        match enricher.enrich(&surface).await {
            Ok(updated) => {
                debug!(surface = %name, "Enriched surface");
                enriched.push(updated);
                outcomes.push(EnrichmentOutcome::Enriched { name });
            }
            Err(e) => {
                warn!(surface = %name, enricher = enricher.name(), error = %e, "Enrichment failed, keeping surface as extracted");
                enriched.push(surface);
                outcomes.push(EnrichmentOutcome::Failed {
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }

    let ok = outcomes.iter().filter(|o| o.is_enriched()).count();
    info!(enriched = ok, failed = outcomes.len() - ok, "Enrichment complete");
    (enriched, outcomes)
}
