// SPDX-License-Identifier: GPL-3.0-or-later

//! Reconciliation of free-text recommendations against the media catalog.
//!
//! Artists are processed independently: a failure while resolving one artist
//! or enumerating its tracks is logged and recorded, and the remaining
//! artists still contribute to the result.

use crate::cache::CatalogCache;
use crate::error::{ReconcileError, ReconcileResult};
use crate::gateway::{bounded, CatalogGateway, GatewayError};
use crate::matcher::{find_best_match, FALLBACK_MATCH_THRESHOLD, TRACK_MATCH_THRESHOLD};
use futures_util::stream::{self, StreamExt};
use plexmuse_config::CatalogConfig;
use plexmuse_domain::{
    AlbumIndex, AlbumSummary, ArtistAlbums, CatalogEntry, CatalogKey, CatalogSection, EntryKind,
    PlaylistResult, TrackCandidate, TrackRecommendation,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct MatchSettings {
    pub track_threshold: f64,
    pub fallback_threshold: f64,
    pub request_timeout: Duration,
    pub max_concurrent_artists: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            track_threshold: TRACK_MATCH_THRESHOLD,
            fallback_threshold: FALLBACK_MATCH_THRESHOLD,
            request_timeout: Duration::from_secs(30),
            max_concurrent_artists: 4,
        }
    }
}

impl From<&CatalogConfig> for MatchSettings {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            track_threshold: config.track_match_threshold,
            fallback_threshold: config.fallback_match_threshold,
            request_timeout: config.request_timeout(),
            max_concurrent_artists: config.max_concurrent_artists.max(1),
        }
    }
}

/// Recommended titles for one artist, in recommendation order.
#[derive(Debug, Clone, PartialEq)]
struct ArtistGroup {
    artist: String,
    titles: Vec<String>,
}

/// Group recommendations by artist name, ignoring case. The first spelling
/// seen names the group; group and title order follow the input.
fn group_by_artist(recommendations: &[TrackRecommendation]) -> Vec<ArtistGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<ArtistGroup> = Vec::new();

    for recommendation in recommendations {
        let slot = *index
            .entry(recommendation.artist.to_lowercase())
            .or_insert_with(|| {
                groups.push(ArtistGroup {
                    artist: recommendation.artist.clone(),
                    titles: Vec::new(),
                });
                groups.len() - 1
            });
        groups[slot].titles.push(recommendation.title.clone());
    }

    groups
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// What one artist contributed to a batch.
#[derive(Debug, Default)]
struct ArtistOutcome {
    matched: Vec<TrackCandidate>,
    skipped: Vec<ReconcileError>,
    failure: Option<GatewayError>,
}

impl ArtistOutcome {
    fn skip(&mut self, reason: ReconcileError) {
        warn!(target: "reconcile", reason = %reason, "recommendation skipped");
        self.skipped.push(reason);
    }
}

pub struct ReconciliationEngine {
    gateway: Arc<dyn CatalogGateway>,
    cache: Arc<CatalogCache>,
    settings: MatchSettings,
}

impl ReconciliationEngine {
    pub fn new(
        gateway: Arc<dyn CatalogGateway>,
        cache: Arc<CatalogCache>,
        settings: MatchSettings,
    ) -> Self {
        Self {
            gateway,
            cache,
            settings,
        }
    }

    /// Album summaries for each named artist the catalog knows.
    ///
    /// Names are looked up in the cache (exact, case-insensitive) and the
    /// result is keyed by the cached display name, in request order. Unknown
    /// names are logged and left out.
    pub async fn bulk_album_lookup(&self, artist_names: &[String]) -> ReconcileResult<AlbumIndex> {
        self.cache.ensure_initialized().await?;
        let sections = self.cache.sections();

        let mut seen = HashSet::new();
        let names: Vec<&String> = artist_names
            .iter()
            .filter(|name| seen.insert(name.to_lowercase()))
            .collect();

        let lookups: Vec<_> = names
            .into_iter()
            .map(|name| self.albums_for(name, &sections))
            .collect();
        let outcomes: Vec<Result<Option<ArtistAlbums>, GatewayError>> = stream::iter(lookups)
            .buffered(self.settings.max_concurrent_artists)
            .collect()
            .await;

        let mut index = Vec::new();
        let mut failure = None;
        for outcome in outcomes {
            match outcome {
                Ok(Some(albums)) => index.push(albums),
                Ok(None) => {}
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }

        if index.is_empty() {
            if let Some(err) = failure {
                return Err(err.into());
            }
        }

        info!(
            target: "reconcile",
            requested = artist_names.len(),
            resolved = index.len(),
            "bulk album lookup finished"
        );
        Ok(AlbumIndex(index))
    }

    async fn albums_for(
        &self,
        name: &str,
        sections: &[CatalogSection],
    ) -> Result<Option<ArtistAlbums>, GatewayError> {
        let Some(record) = self.cache.find_by_name(name) else {
            warn!(target: "reconcile", reason = %ReconcileError::ArtistNotResolved(name.to_string()), "artist not in cache");
            return Ok(None);
        };

        let artist = match self.resolve_artist(&record.name, sections).await {
            Ok(Some(artist)) => artist,
            Ok(None) => {
                warn!(target: "reconcile", reason = %ReconcileError::ArtistNotResolved(record.name.clone()), "artist vanished from catalog");
                return Ok(None);
            }
            Err(err) => {
                warn!(target: "reconcile", artist = %record.name, error = %err, "artist lookup failed");
                return Err(err);
            }
        };

        let albums = bounded(self.settings.request_timeout, self.gateway.list_albums(&artist))
            .await
            .map_err(|err| {
                warn!(target: "reconcile", artist = %record.name, error = %err, "album listing failed");
                err
            })?;
        debug!(target: "reconcile", artist = %record.name, albums = albums.len(), "albums listed");

        Ok(Some(ArtistAlbums {
            artist: record.name,
            albums: albums.iter().map(AlbumSummary::from).collect(),
        }))
    }

    /// Find an artist by name, searching the music sections in order.
    ///
    /// Within the first section with hits, an exact case-insensitive title
    /// match is preferred over the first hit. A failing section is skipped;
    /// its error is returned only when no section produced the artist.
    async fn resolve_artist(
        &self,
        name: &str,
        sections: &[CatalogSection],
    ) -> Result<Option<CatalogEntry>, GatewayError> {
        let mut failure = None;

        for section in sections {
            let search = self.gateway.search(section, Some(name), EntryKind::Artist);
            match bounded(self.settings.request_timeout, search).await {
                Ok(hits) if !hits.is_empty() => {
                    let exact = hits.iter().position(|hit| same_name(&hit.title, name));
                    return Ok(hits.into_iter().nth(exact.unwrap_or(0)));
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(target: "reconcile", artist = name, section = %section.title, error = %err, "artist search failed");
                    failure = Some(err);
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }

    /// Reconcile recommendations and create a playlist from what matched.
    ///
    /// Fails with [`ReconcileError::NoTracksMatched`] (nothing is created) when
    /// no recommendation matched, or with
    /// [`ReconcileError::CatalogUnavailable`] when nothing matched because the
    /// catalog could not be reached.
    pub async fn create_curated_playlist(
        &self,
        name: &str,
        recommendations: &[TrackRecommendation],
    ) -> ReconcileResult<PlaylistResult> {
        self.cache.ensure_initialized().await?;
        let sections = self.cache.sections();
        let groups = group_by_artist(recommendations);
        info!(
            target: "reconcile",
            playlist = name,
            recommendations = recommendations.len(),
            artists = groups.len(),
            "reconciling recommendations"
        );

        let lookups: Vec<_> = groups
            .iter()
            .map(|group| self.reconcile_group(group, &sections))
            .collect();
        let outcomes: Vec<ArtistOutcome> = stream::iter(lookups)
            .buffered(self.settings.max_concurrent_artists)
            .collect()
            .await;

        let mut seen: HashSet<CatalogKey> = HashSet::new();
        let mut matched = Vec::new();
        let mut skipped = Vec::new();
        let mut failure = None;

        for outcome in outcomes {
            for candidate in outcome.matched {
                if seen.insert(candidate.catalog_key.clone()) {
                    matched.push(candidate);
                }
            }
            skipped.extend(outcome.skipped.iter().filter_map(ReconcileError::as_skipped));
            if failure.is_none() {
                failure = outcome.failure;
            }
        }

        if matched.is_empty() {
            return Err(match failure {
                Some(err) => err.into(),
                None => ReconcileError::NoTracksMatched,
            });
        }

        let keys: Vec<CatalogKey> = matched.iter().map(|c| c.catalog_key.clone()).collect();
        let created = bounded(
            self.settings.request_timeout,
            self.gateway.create_collection(name, &keys),
        )
        .await?;

        info!(
            target: "reconcile",
            playlist = %created.title,
            matched = matched.len(),
            skipped = skipped.len(),
            "playlist created"
        );
        Ok(PlaylistResult {
            name: created.title,
            external_id: created.external_id,
            matched_items: matched,
            skipped,
        })
    }

    async fn reconcile_group(
        &self,
        group: &ArtistGroup,
        sections: &[CatalogSection],
    ) -> ArtistOutcome {
        let mut outcome = ArtistOutcome::default();

        let artist = match self.resolve_artist(&group.artist, sections).await {
            Ok(Some(artist)) => artist,
            Ok(None) => {
                outcome.skip(ReconcileError::ArtistNotResolved(group.artist.clone()));
                return outcome;
            }
            Err(err) => {
                outcome.skip(ReconcileError::ArtistNotResolved(group.artist.clone()));
                outcome.failure = Some(err);
                return outcome;
            }
        };

        let candidates = match self.artist_tracks(&artist).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(target: "reconcile", artist = %artist.title, error = %err, "track enumeration failed");
                outcome.skip(ReconcileError::ArtistNotResolved(group.artist.clone()));
                outcome.failure = Some(err);
                return outcome;
            }
        };
        debug!(target: "reconcile", artist = %artist.title, tracks = candidates.len(), "tracks enumerated");

        for title in &group.titles {
            let (best, score) = find_best_match(&candidates, title, self.settings.track_threshold);
            if let Some(best) = best {
                debug!(target: "reconcile", wanted = %title, found = %best.title, score, "track matched");
                outcome.matched.push(best.clone());
                continue;
            }

            match self.fallback_search(&group.artist, title, sections).await {
                Ok(Some(found)) => outcome.matched.push(found),
                Ok(None) => outcome.skip(ReconcileError::TrackNotMatched {
                    artist: group.artist.clone(),
                    title: title.clone(),
                }),
                Err(err) => {
                    outcome.skip(ReconcileError::TrackNotMatched {
                        artist: group.artist.clone(),
                        title: title.clone(),
                    });
                    outcome.failure.get_or_insert(err);
                }
            }
        }

        outcome
    }

    /// Every track of every album of `artist`.
    async fn artist_tracks(&self, artist: &CatalogEntry) -> Result<Vec<TrackCandidate>, GatewayError> {
        let timeout = self.settings.request_timeout;
        let albums = bounded(timeout, self.gateway.list_albums(artist)).await?;

        let mut candidates = Vec::new();
        for album in &albums {
            let tracks = bounded(timeout, self.gateway.list_tracks(album)).await?;
            candidates.extend(tracks.into_iter().map(TrackCandidate::from));
        }
        Ok(candidates)
    }

    /// Library-wide title search, accepted only when the best hit belongs to `artist`.
    async fn fallback_search(
        &self,
        artist: &str,
        title: &str,
        sections: &[CatalogSection],
    ) -> Result<Option<TrackCandidate>, GatewayError> {
        let mut pool: Vec<TrackCandidate> = Vec::new();
        let mut failure = None;

        for section in sections {
            let search = self.gateway.search(section, Some(title), EntryKind::Track);
            match bounded(self.settings.request_timeout, search).await {
                Ok(hits) => pool.extend(hits.into_iter().map(TrackCandidate::from)),
                Err(err) => {
                    warn!(target: "reconcile", title, section = %section.title, error = %err, "track search failed");
                    failure = Some(err);
                }
            }
        }

        if pool.is_empty() {
            if let Some(err) = failure {
                return Err(err);
            }
        }

        match find_best_match(&pool, title, self.settings.fallback_threshold) {
            (Some(best), score) if same_name(&best.artist_name, artist) => {
                debug!(target: "reconcile", wanted = title, found = %best.title, score, "fallback matched");
                Ok(Some(best.clone()))
            }
            (Some(best), score) => {
                debug!(
                    target: "reconcile",
                    wanted = title,
                    found = %best.title,
                    found_artist = %best.artist_name,
                    score,
                    "fallback hit belongs to another artist"
                );
                Ok(None)
            }
            (None, _) => Ok(None),
        }
    }
}
