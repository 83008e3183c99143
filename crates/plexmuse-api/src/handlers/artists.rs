// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{ApiError, ErrorResponse};
use axum::{extract::State, Json};
use plexmuse_application::AppState;
use plexmuse_domain::ArtistRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArtistResponse {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
}

impl From<ArtistRecord> for ArtistResponse {
    fn from(artist: ArtistRecord) -> Self {
        Self {
            id: artist.id.0,
            name: artist.name,
            genres: artist.genres,
        }
    }
}

/// List every artist in the media server's music sections
#[utoipa::path(
    get,
    path = "/artists",
    responses(
        (status = 200, description = "Cached artists in discovery order", body = Vec<ArtistResponse>),
        (status = 503, description = "Media server unavailable", body = ErrorResponse)
    ),
    tag = "artists"
)]
pub async fn list_artists(
    State(state): State<AppState>,
) -> Result<Json<Vec<ArtistResponse>>, ApiError> {
    state.cache.ensure_initialized().await?;
    let artists: Vec<ArtistResponse> = state
        .cache
        .list_all()
        .into_iter()
        .map(ArtistResponse::from)
        .collect();
    debug!(target: "api", count = artists.len(), "listing artists");
    Ok(Json(artists))
}
