// SPDX-License-Identifier: GPL-3.0-or-later

use crate::gateway::GatewayError;
use plexmuse_domain::Skipped;
use thiserror::Error;

/// Failure kinds of catalog reconciliation and playlist curation.
///
/// `ArtistNotResolved` and `TrackNotMatched` are soft: they are logged and
/// recorded against the playlist, never returned from a batch operation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("artist not found in catalog: {0}")]
    ArtistNotResolved(String),

    #[error("no catalog track matches '{title}' by {artist}")]
    TrackNotMatched { artist: String, title: String },

    #[error("No tracks could be matched from recommendations")]
    NoTracksMatched,

    #[error("recommendation could not be parsed: {0}")]
    RecommendationParse(String),

    #[error("recommendation source failed: {0}")]
    RecommendationUnavailable(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

impl ReconcileError {
    /// Stable machine-readable name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CatalogUnavailable(_) => "catalog_unavailable",
            Self::ArtistNotResolved(_) => "artist_not_resolved",
            Self::TrackNotMatched { .. } => "track_not_matched",
            Self::NoTracksMatched => "no_tracks_matched",
            Self::RecommendationParse(_) => "recommendation_parse",
            Self::RecommendationUnavailable(_) => "recommendation_unavailable",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }

    pub fn as_skipped(&self) -> Option<Skipped> {
        match self {
            Self::ArtistNotResolved(name) => Some(Skipped::Artist { name: name.clone() }),
            Self::TrackNotMatched { artist, title } => Some(Skipped::Track {
                artist: artist.clone(),
                title: title.clone(),
            }),
            _ => None,
        }
    }
}

impl From<GatewayError> for ReconcileError {
    fn from(err: GatewayError) -> Self {
        Self::CatalogUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn soft_errors_map_to_skipped_entries() {
        let err = ReconcileError::TrackNotMatched {
            artist: "Artist1".to_string(),
            title: "Track1".to_string(),
        };
        assert_eq!(
            err.as_skipped(),
            Some(Skipped::Track {
                artist: "Artist1".to_string(),
                title: "Track1".to_string()
            })
        );
    }

    #[test]
    fn hard_errors_are_not_skippable() {
        assert!(ReconcileError::NoTracksMatched.as_skipped().is_none());
        assert_eq!(
            ReconcileError::NoTracksMatched.to_string(),
            "No tracks could be matched from recommendations"
        );
    }

    #[test]
    fn gateway_timeout_becomes_catalog_unavailable() {
        let err: ReconcileError = GatewayError::Timeout(Duration::from_secs(5)).into();
        assert_eq!(err.kind(), "catalog_unavailable");
        assert!(err.to_string().contains("5s"));
    }
}
