// SPDX-License-Identifier: GPL-3.0-or-later

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use plexmuse_application::ReconcileError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable failure kind, e.g. `catalog_unavailable`.
    pub kind: String,
}

/// Handler error carrying a [`ReconcileError`] to its HTTP status.
#[derive(Debug)]
pub struct ApiError(pub ReconcileError);

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ReconcileError::CatalogUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ReconcileError::NoTracksMatched => StatusCode::UNPROCESSABLE_ENTITY,
            ReconcileError::RecommendationParse(_)
            | ReconcileError::RecommendationUnavailable(_) => StatusCode::BAD_GATEWAY,
            ReconcileError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ReconcileError::ArtistNotResolved(_) | ReconcileError::TrackNotMatched { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(target: "api", status = status.as_u16(), kind = self.0.kind(), error = %self.0, "request failed");
        } else {
            warn!(target: "api", status = status.as_u16(), kind = self.0.kind(), error = %self.0, "request rejected");
        }

        let body = ErrorResponse {
            error: self.0.to_string(),
            kind: self.0.kind().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
