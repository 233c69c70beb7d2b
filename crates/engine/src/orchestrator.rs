//! Network fetch orchestration
//!
//! Resolves a seed set plus retrieval options into one raw network
//! payload: picks the single-seed or multi-seed request shape, translates
//! depth options into the form each endpoint accepts, and applies the
//! secondary-to-primary provider fallback when the first response carries
//! no citation edges.

use citegraph_common::config::FetchTuning;
use citegraph_common::errors::Result;
use citegraph_common::model::{DataSource, FetchOptions};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::client::{NetworkClient, RawNetwork};

/// Orchestrates calls to the backend aggregation endpoint
pub struct FetchOrchestrator {
    client: Arc<dyn NetworkClient>,
    tuning: FetchTuning,
}

impl FetchOrchestrator {
    pub fn new(client: Arc<dyn NetworkClient>, tuning: FetchTuning) -> Self {
        Self { client, tuning }
    }

    /// Fetch the raw network for the given seeds.
    ///
    /// Returns `Ok(None)` for an empty seed list: no request is made and
    /// the caller decides whether to keep a restored graph or clear the
    /// view. The cancellation token is checked between the first attempt
    /// and the fallback so superseded work stays inert.
    pub async fn fetch(
        &self,
        seeds: &[String],
        options: FetchOptions,
        token: &CancellationToken,
    ) -> Result<Option<RawNetwork>> {
        if seeds.is_empty() {
            return Ok(None);
        }

        if seeds.len() == 1 {
            return self.fetch_single(&seeds[0], options, token).await.map(Some);
        }

        // Multi-seed path accepts only token-based depths; no fallback
        // here (kept out for cost reasons)
        let network = self
            .client
            .build_multi(
                seeds,
                options.cited.token(),
                options.citing.token(),
                options.source,
                token,
            )
            .await?;

        Ok(Some(network))
    }

    async fn fetch_single(
        &self,
        seed: &str,
        options: FetchOptions,
        token: &CancellationToken,
    ) -> Result<RawNetwork> {
        let max_references = options
            .cited
            .max_count(self.tuning.top_cap, self.tuning.all_cap);
        let max_citations = options
            .citing
            .max_count(self.tuning.top_cap, self.tuning.all_cap);

        let first = self
            .client
            .build_single(seed, max_references, max_citations, options.source, token)
            .await?;

        // Secondary provider sometimes lacks citation linkage for papers
        // the primary provider covers well; retry once against primary
        // before surfacing an empty network
        if first.edges.is_empty() && options.source == DataSource::Secondary {
            if token.is_cancelled() {
                return Err(citegraph_common::errors::EngineError::Aborted);
            }

            tracing::info!(
                seed,
                "No edges from secondary provider, retrying against primary"
            );

            match self
                .client
                .build_single(
                    seed,
                    max_references,
                    max_citations,
                    DataSource::Primary,
                    token,
                )
                .await
            {
                Ok(fallback) if !fallback.edges.is_empty() => return Ok(fallback),
                Ok(_) => {
                    // Fallback is also empty: keep the original result,
                    // its paper metadata is what the user asked for
                    tracing::debug!(seed, "Primary fallback also returned no edges");
                }
                Err(e) if e.is_abort() => return Err(e),
                Err(e) => {
                    tracing::warn!(seed, error = %e, "Primary fallback failed, keeping secondary result");
                }
            }
        }

        Ok(first)
    }
}
