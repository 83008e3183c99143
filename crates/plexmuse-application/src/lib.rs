// SPDX-License-Identifier: GPL-3.0-or-later
use plexmuse_config::AppConfig;
pub mod cache;
pub mod curator;
pub mod error;
pub mod gateway;
pub mod matcher;
pub mod normalize;
pub mod plex_gateway;
pub mod recommendation;
pub mod reconcile;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(test)]
mod reconcile_tests;

pub use cache::CatalogCache;
pub use curator::{CuratedPlaylist, PlaylistCurator, PlaylistRequest};
pub use error::{ReconcileError, ReconcileResult};
pub use gateway::{CatalogGateway, GatewayError};
pub use matcher::{find_best_match, similarity};
pub use normalize::normalize;
pub use plex_gateway::PlexCatalogGateway;
pub use recommendation::{LlmRecommendationSource, RecommendationSource, TrackBounds};
pub use reconcile::{MatchSettings, ReconciliationEngine};

use anyhow::Context;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub cache: Arc<CatalogCache>,
    pub engine: Arc<ReconciliationEngine>,
    pub curator: Arc<PlaylistCurator>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        gateway: Arc<dyn CatalogGateway>,
        source: Arc<dyn RecommendationSource>,
    ) -> Self {
        let settings = MatchSettings::from(&config.catalog);
        let cache = Arc::new(CatalogCache::new(gateway.clone(), settings.request_timeout));
        let engine = Arc::new(ReconciliationEngine::new(gateway, cache.clone(), settings));
        let curator = Arc::new(PlaylistCurator::new(cache.clone(), engine.clone(), source));

        Self {
            config,
            cache,
            engine,
            curator,
        }
    }

    /// Wire the Plex gateway and the language-model source from configuration.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let gateway = PlexCatalogGateway::connect(&config.plex, config.catalog.request_timeout())
            .context("failed to configure Plex client")?;
        let source = LlmRecommendationSource::from_config(&config.llm)
            .context("failed to configure language model client")?;
        Ok(Self::new(config, Arc::new(gateway), Arc::new(source)))
    }

    /// Build the artist cache when configured to; a failure is logged and the
    /// cache is retried lazily on first use.
    pub async fn on_start(&self) {
        info!(target: "application", "application state initialized");
        if !self.config.catalog.warm_on_start {
            return;
        }
        match self.cache.initialize().await {
            Ok(artists) => info!(target: "cache", artists, "catalog cache warmed"),
            Err(err) => error!(target: "cache", error = %err, "catalog cache warm-up failed"),
        }
    }
}
