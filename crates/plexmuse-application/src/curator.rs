// SPDX-License-Identifier: GPL-3.0-or-later

use crate::cache::CatalogCache;
use crate::error::{ReconcileError, ReconcileResult};
use crate::reconcile::ReconciliationEngine;
use crate::recommendation::{RecommendationSource, TrackBounds};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

pub const MAX_MIN_TRACKS: u32 = 100;
pub const MAX_MAX_TRACKS: u32 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRequest {
    pub prompt: String,
    pub model: String,
    pub min_tracks: u32,
    pub max_tracks: u32,
}

impl PlaylistRequest {
    pub fn validate(&self) -> ReconcileResult<TrackBounds> {
        let invalid = |message: String| Err(ReconcileError::InvalidRequest(message));

        if self.prompt.trim().is_empty() {
            return invalid("prompt must not be empty".to_string());
        }
        if !(1..=MAX_MIN_TRACKS).contains(&self.min_tracks) {
            return invalid(format!("min_tracks must be between 1 and {MAX_MIN_TRACKS}"));
        }
        if !(1..=MAX_MAX_TRACKS).contains(&self.max_tracks) {
            return invalid(format!("max_tracks must be between 1 and {MAX_MAX_TRACKS}"));
        }
        if self.min_tracks > self.max_tracks {
            return invalid("min_tracks must not exceed max_tracks".to_string());
        }

        Ok(TrackBounds {
            min: self.min_tracks,
            max: self.max_tracks,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratedPlaylist {
    pub name: String,
    pub track_count: usize,
    /// Artists suggested in the first step, as returned by the source.
    pub artists: Vec<String>,
    pub id: Option<String>,
}

/// Prompt-to-playlist pipeline: pick artists from the catalog, ask for tracks
/// from their albums, name the playlist and reconcile it into the server.
pub struct PlaylistCurator {
    cache: Arc<CatalogCache>,
    engine: Arc<ReconciliationEngine>,
    source: Arc<dyn RecommendationSource>,
}

impl PlaylistCurator {
    pub fn new(
        cache: Arc<CatalogCache>,
        engine: Arc<ReconciliationEngine>,
        source: Arc<dyn RecommendationSource>,
    ) -> Self {
        Self {
            cache,
            engine,
            source,
        }
    }

    pub async fn curate(&self, request: &PlaylistRequest) -> ReconcileResult<CuratedPlaylist> {
        let request_id = Uuid::new_v4();
        let span = info_span!("curate", %request_id, model = %request.model);
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &PlaylistRequest) -> ReconcileResult<CuratedPlaylist> {
        let bounds = request.validate()?;
        let prompt = request.prompt.trim();
        info!(target: "reconcile", prompt, min = bounds.min, max = bounds.max, "curating playlist");

        self.cache.ensure_initialized().await?;
        let catalog = self.cache.list_all();

        let artists = self
            .source
            .recommend_artists(prompt, &catalog, &request.model)
            .await?;

        let albums = self.engine.bulk_album_lookup(&artists).await?;
        if albums.is_empty() {
            info!(target: "reconcile", suggested = artists.len(), "no suggested artist is in the catalog");
            return Err(ReconcileError::NoTracksMatched);
        }

        let tracks = self
            .source
            .recommend_tracks(prompt, &albums, &request.model, bounds)
            .await?;
        let name = self.source.playlist_name(prompt, &request.model).await?;

        let playlist = self.engine.create_curated_playlist(&name, &tracks).await?;

        Ok(CuratedPlaylist {
            track_count: playlist.track_count(),
            name: playlist.name,
            artists,
            id: playlist.external_id,
        })
    }
}
