// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory snapshot of the artists known to the media server.
//!
//! Readers always see one complete snapshot. A rebuild assembles a new
//! snapshot off to the side and swaps it in only after every music section
//! was enumerated; a failed rebuild leaves the previous snapshot in place.

use crate::error::ReconcileResult;
use crate::gateway::{bounded, CatalogGateway, GatewayError};
use chrono::{DateTime, Utc};
use plexmuse_domain::{ArtistRecord, CacheStatus, CatalogKey, CatalogSection, EntryKind};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
struct Snapshot {
    artists: Vec<ArtistRecord>,
    sections: Vec<CatalogSection>,
    built_at: Option<DateTime<Utc>>,
}

pub struct CatalogCache {
    gateway: Arc<dyn CatalogGateway>,
    request_timeout: Duration,
    snapshot: RwLock<Arc<Snapshot>>,
    /// Serializes rebuilds.
    rebuild: Mutex<()>,
}

impl CatalogCache {
    pub fn new(gateway: Arc<dyn CatalogGateway>, request_timeout: Duration) -> Self {
        Self {
            gateway,
            request_timeout,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            rebuild: Mutex::new(()),
        }
    }

    /// Rebuild the snapshot from the media server and return the artist count.
    pub async fn initialize(&self) -> ReconcileResult<usize> {
        let _guard = self.rebuild.lock().await;
        self.rebuild_locked().await
    }

    /// Build the snapshot once if it was never built.
    pub async fn ensure_initialized(&self) -> ReconcileResult<()> {
        if self.is_initialized() {
            return Ok(());
        }
        let _guard = self.rebuild.lock().await;
        if self.is_initialized() {
            return Ok(());
        }
        self.rebuild_locked().await.map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.current().built_at.is_some()
    }

    pub fn size(&self) -> usize {
        self.current().artists.len()
    }

    /// Every cached artist, in discovery order.
    pub fn list_all(&self) -> Vec<ArtistRecord> {
        self.current().artists.clone()
    }

    /// Music sections seen by the last successful rebuild.
    pub fn sections(&self) -> Vec<CatalogSection> {
        self.current().sections.clone()
    }

    /// Cached artist whose name equals `name`, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<ArtistRecord> {
        let wanted = name.to_lowercase();
        self.current()
            .artists
            .iter()
            .find(|artist| artist.name.to_lowercase() == wanted)
            .cloned()
    }

    pub fn status(&self) -> CacheStatus {
        let snapshot = self.current();
        CacheStatus {
            artist_count: snapshot.artists.len(),
            section_count: snapshot.sections.len(),
            built_at: snapshot.built_at,
        }
    }

    fn current(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn rebuild_locked(&self) -> ReconcileResult<usize> {
        let snapshot = match self.build_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(target: "cache", error = %err, kept = self.size(), "catalog rebuild failed, keeping previous snapshot");
                return Err(err.into());
            }
        };

        let count = snapshot.artists.len();
        let sections = snapshot.sections.len();
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);

        info!(target: "cache", artists = count, sections, "catalog cache rebuilt");
        Ok(count)
    }

    async fn build_snapshot(&self) -> Result<Snapshot, GatewayError> {
        let sections = bounded(self.request_timeout, self.gateway.list_sections()).await?;
        let music: Vec<CatalogSection> = sections
            .into_iter()
            .filter(|section| section.kind.is_music())
            .collect();
        if music.is_empty() {
            warn!(target: "cache", "media server reports no music sections");
        }

        let mut seen: HashSet<CatalogKey> = HashSet::new();
        let mut artists = Vec::new();

        for section in &music {
            let entries = bounded(
                self.request_timeout,
                self.gateway.search(section, None, EntryKind::Artist),
            )
            .await?;
            debug!(target: "cache", section = %section.title, artists = entries.len(), "section enumerated");

            for entry in entries {
                if seen.insert(entry.key.clone()) {
                    artists.push(ArtistRecord {
                        id: entry.key,
                        name: entry.title,
                        genres: entry.genres,
                    });
                }
            }
        }

        Ok(Snapshot {
            artists,
            sections: music,
            built_at: Some(Utc::now()),
        })
    }
}
