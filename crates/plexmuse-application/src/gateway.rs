// SPDX-License-Identifier: GPL-3.0-or-later

//! Port to the media-server catalog.

use async_trait::async_trait;
use plexmuse_domain::{
    AlbumEntry, CatalogEntry, CatalogKey, CatalogSection, CreatedCollection, EntryKind, TrackEntry,
};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("catalog request failed: {0}")]
    Unavailable(String),

    #[error("catalog request timed out after {0:?}")]
    Timeout(Duration),
}

/// Read and write access to a media-server catalog.
///
/// Implementations must be safe to call concurrently.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn list_sections(&self) -> Result<Vec<CatalogSection>, GatewayError>;

    /// Entries of `kind` in `section`; all of them when `query` is `None`,
    /// otherwise those whose title matches the query.
    async fn search(
        &self,
        section: &CatalogSection,
        query: Option<&str>,
        kind: EntryKind,
    ) -> Result<Vec<CatalogEntry>, GatewayError>;

    async fn list_albums(&self, artist: &CatalogEntry) -> Result<Vec<AlbumEntry>, GatewayError>;

    async fn list_tracks(&self, album: &AlbumEntry) -> Result<Vec<TrackEntry>, GatewayError>;

    async fn create_collection(
        &self,
        name: &str,
        item_keys: &[CatalogKey],
    ) -> Result<CreatedCollection, GatewayError>;
}

/// Run a gateway call with an upper bound on its duration.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| GatewayError::Timeout(limit))?
}
