// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{ApiError, ErrorResponse};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use plexmuse_application::AppState;
use plexmuse_domain::CacheStatus;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub artist_count: usize,
    pub section_count: usize,
    /// When the artist cache was last rebuilt; absent before the first build.
    pub cache_built_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CacheStatusResponse {
    pub artist_count: usize,
    pub section_count: usize,
    pub built_at: Option<DateTime<Utc>>,
}

impl From<CacheStatus> for CacheStatusResponse {
    fn from(status: CacheStatus) -> Self {
        Self {
            artist_count: status.artist_count,
            section_count: status.section_count,
            built_at: status.built_at,
        }
    }
}

/// Liveness plus a summary of the artist cache. Never touches the media server.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.cache.status();
    Json(HealthResponse {
        status: "healthy".to_string(),
        artist_count: cache.artist_count,
        section_count: cache.section_count,
        cache_built_at: cache.built_at,
    })
}

/// Rebuild the artist cache from the media server.
#[utoipa::path(
    post,
    path = "/cache/refresh",
    responses(
        (status = 200, description = "Cache rebuilt", body = CacheStatusResponse),
        (status = 503, description = "Media server unavailable; previous cache kept", body = ErrorResponse)
    ),
    tag = "system"
)]
pub async fn refresh_cache(
    State(state): State<AppState>,
) -> Result<Json<CacheStatusResponse>, ApiError> {
    let artists = state.cache.initialize().await?;
    info!(target: "api", artists, "cache refreshed on request");
    Ok(Json(state.cache.status().into()))
}
