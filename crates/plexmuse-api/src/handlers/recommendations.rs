// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{ApiError, ErrorResponse};
use axum::{extract::State, Json};
use plexmuse_application::{AppState, CuratedPlaylist, PlaylistRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

fn default_min_tracks() -> u32 {
    30
}

fn default_max_tracks() -> u32 {
    50
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecommendationRequest {
    /// Description of the desired playlist
    pub prompt: String,
    /// Model name or alias; the configured default when omitted
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_min_tracks")]
    pub min_tracks: u32,
    #[serde(default = "default_max_tracks")]
    pub max_tracks: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlaylistResponse {
    pub name: String,
    pub track_count: usize,
    pub artists: Vec<String>,
    pub id: Option<String>,
}

impl From<CuratedPlaylist> for PlaylistResponse {
    fn from(playlist: CuratedPlaylist) -> Self {
        Self {
            name: playlist.name,
            track_count: playlist.track_count,
            artists: playlist.artists,
            id: playlist.id,
        }
    }
}

/// Generate a playlist from a prompt and create it on the media server
#[utoipa::path(
    post,
    path = "/recommendations",
    request_body = RecommendationRequest,
    responses(
        (status = 200, description = "Playlist created", body = PlaylistResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 422, description = "No recommended track exists in the catalog", body = ErrorResponse),
        (status = 502, description = "Language model failed or answered unusably", body = ErrorResponse),
        (status = 503, description = "Media server unavailable", body = ErrorResponse)
    ),
    tag = "playlists"
)]
pub async fn create_recommendations(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<PlaylistResponse>, ApiError> {
    debug!(target: "api", ?request, "playlist requested");

    let request = PlaylistRequest {
        model: request
            .model
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| state.config.llm.default_model.clone()),
        prompt: request.prompt,
        min_tracks: request.min_tracks,
        max_tracks: request.max_tracks,
    };

    let playlist = state.curator.curate(&request).await?;
    Ok(Json(playlist.into()))
}
