// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory doubles for the catalog and recommendation ports.

use crate::error::{ReconcileError, ReconcileResult};
use crate::gateway::{CatalogGateway, GatewayError};
use crate::recommendation::{RecommendationSource, TrackBounds};
use async_trait::async_trait;
use plexmuse_domain::{
    AlbumEntry, AlbumIndex, ArtistRecord, CatalogEntry, CatalogKey, CatalogSection,
    CreatedCollection, EntryKind, SectionKind, TrackEntry, TrackRecommendation,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Catalog held in vectors. Searches match titles by case-insensitive substring,
/// like the Plex `title` filter.
#[derive(Default)]
pub struct InMemoryGateway {
    sections: Vec<CatalogSection>,
    artists: Vec<(String, CatalogEntry)>,
    albums: Vec<(CatalogKey, AlbumEntry)>,
    tracks: Vec<(CatalogKey, TrackEntry)>,
    failing_sections: Mutex<HashSet<String>>,
    failing_artists: Mutex<HashSet<CatalogKey>>,
    listing_fails: AtomicBool,
    creation_fails: AtomicBool,
    listings: AtomicUsize,
    album_latency: Option<Duration>,
    created: Mutex<Vec<(String, Vec<CatalogKey>)>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, id: &str, title: &str, section_type: &str) -> Self {
        self.sections.push(CatalogSection {
            id: id.to_string(),
            title: title.to_string(),
            kind: SectionKind::from_section_type(section_type),
        });
        self
    }

    pub fn with_music_section(self, id: &str, title: &str) -> Self {
        self.with_section(id, title, "artist")
    }

    pub fn with_artist(mut self, section_id: &str, key: &str, name: &str, genres: &[&str]) -> Self {
        self.artists.push((
            section_id.to_string(),
            CatalogEntry {
                key: CatalogKey::from(key),
                title: name.to_string(),
                genres: genres.iter().map(|genre| genre.to_string()).collect(),
                artist_name: None,
            },
        ));
        self
    }

    pub fn with_album(mut self, artist_key: &str, key: &str, title: &str, year: Option<i32>) -> Self {
        self.albums.push((
            CatalogKey::from(artist_key),
            AlbumEntry {
                key: CatalogKey::from(key),
                title: title.to_string(),
                year,
                track_count: 0,
            },
        ));
        self
    }

    /// Add a track; its artist name is taken from the album's artist.
    pub fn with_track(self, album_key: &str, key: &str, title: &str) -> Self {
        let artist_name = self
            .album_artist(&CatalogKey::from(album_key))
            .map(|entry| entry.title.clone())
            .unwrap_or_default();
        self.with_track_by(album_key, key, title, &artist_name)
    }

    /// Add a track credited to `artist_name`, e.g. on a compilation.
    pub fn with_track_by(mut self, album_key: &str, key: &str, title: &str, artist_name: &str) -> Self {
        let album_key = CatalogKey::from(album_key);
        let artist_name = artist_name.to_string();

        if let Some((_, album)) = self.albums.iter_mut().find(|(_, album)| album.key == album_key) {
            album.track_count += 1;
        }
        self.tracks.push((
            album_key,
            TrackEntry {
                key: CatalogKey::from(key),
                title: title.to_string(),
                duration_ms: Some(180_000),
                track_number: None,
                artist_name,
            },
        ));
        self
    }

    /// Delay every album listing, to exercise timeouts.
    pub fn with_album_latency(mut self, latency: Duration) -> Self {
        self.album_latency = Some(latency);
        self
    }

    pub fn fail_section(&self, section_id: &str) {
        self.failing_sections
            .lock()
            .unwrap()
            .insert(section_id.to_string());
    }

    pub fn fail_artist(&self, artist_key: &str) {
        self.failing_artists
            .lock()
            .unwrap()
            .insert(CatalogKey::from(artist_key));
    }

    pub fn fail_listing(&self) {
        self.listing_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_creation(&self) {
        self.creation_fails.store(true, Ordering::SeqCst);
    }

    pub fn section_listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    /// Collections created so far as `(name, item keys)`.
    pub fn created_collections(&self) -> Vec<(String, Vec<CatalogKey>)> {
        self.created.lock().unwrap().clone()
    }

    fn album_artist(&self, album_key: &CatalogKey) -> Option<&CatalogEntry> {
        let (artist_key, _) = self.albums.iter().find(|(_, album)| &album.key == album_key)?;
        self.artists
            .iter()
            .map(|(_, entry)| entry)
            .find(|entry| &entry.key == artist_key)
    }

    fn section_of_album(&self, album_key: &CatalogKey) -> Option<&str> {
        let (artist_key, _) = self.albums.iter().find(|(_, album)| &album.key == album_key)?;
        self.artists
            .iter()
            .find(|(_, entry)| &entry.key == artist_key)
            .map(|(section, _)| section.as_str())
    }
}

fn title_matches(title: &str, query: Option<&str>) -> bool {
    query.map_or(true, |query| {
        title.to_lowercase().contains(&query.to_lowercase())
    })
}

fn unavailable(what: &str) -> GatewayError {
    GatewayError::Unavailable(format!("{what} failed"))
}

#[async_trait]
impl CatalogGateway for InMemoryGateway {
    async fn list_sections(&self) -> Result<Vec<CatalogSection>, GatewayError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        if self.listing_fails.load(Ordering::SeqCst) {
            return Err(unavailable("section listing"));
        }
        Ok(self.sections.clone())
    }

    async fn search(
        &self,
        section: &CatalogSection,
        query: Option<&str>,
        kind: EntryKind,
    ) -> Result<Vec<CatalogEntry>, GatewayError> {
        if self.failing_sections.lock().unwrap().contains(&section.id) {
            return Err(unavailable("section search"));
        }

        let hits = match kind {
            EntryKind::Artist => self
                .artists
                .iter()
                .filter(|(id, entry)| id == &section.id && title_matches(&entry.title, query))
                .map(|(_, entry)| entry.clone())
                .collect(),
            EntryKind::Album => self
                .albums
                .iter()
                .filter(|(_, album)| {
                    self.section_of_album(&album.key) == Some(section.id.as_str())
                        && title_matches(&album.title, query)
                })
                .map(|(_, album)| CatalogEntry {
                    key: album.key.clone(),
                    title: album.title.clone(),
                    genres: Vec::new(),
                    artist_name: self.album_artist(&album.key).map(|a| a.title.clone()),
                })
                .collect(),
            EntryKind::Track => self
                .tracks
                .iter()
                .filter(|(album_key, track)| {
                    self.section_of_album(album_key) == Some(section.id.as_str())
                        && title_matches(&track.title, query)
                })
                .map(|(_, track)| CatalogEntry {
                    key: track.key.clone(),
                    title: track.title.clone(),
                    genres: Vec::new(),
                    artist_name: Some(track.artist_name.clone()),
                })
                .collect(),
        };
        Ok(hits)
    }

    async fn list_albums(&self, artist: &CatalogEntry) -> Result<Vec<AlbumEntry>, GatewayError> {
        if let Some(latency) = self.album_latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing_artists.lock().unwrap().contains(&artist.key) {
            return Err(unavailable("album listing"));
        }
        Ok(self
            .albums
            .iter()
            .filter(|(artist_key, _)| artist_key == &artist.key)
            .map(|(_, album)| album.clone())
            .collect())
    }

    async fn list_tracks(&self, album: &AlbumEntry) -> Result<Vec<TrackEntry>, GatewayError> {
        Ok(self
            .tracks
            .iter()
            .filter(|(album_key, _)| album_key == &album.key)
            .map(|(_, track)| track.clone())
            .collect())
    }

    async fn create_collection(
        &self,
        name: &str,
        item_keys: &[CatalogKey],
    ) -> Result<CreatedCollection, GatewayError> {
        if self.creation_fails.load(Ordering::SeqCst) {
            return Err(unavailable("playlist creation"));
        }
        let mut created = self.created.lock().unwrap();
        created.push((name.to_string(), item_keys.to_vec()));
        Ok(CreatedCollection {
            title: name.to_string(),
            external_id: Some(format!("playlist-{}", created.len())),
        })
    }
}

/// Recommendation source replaying canned answers.
#[derive(Default)]
pub struct ScriptedSource {
    artists: Vec<String>,
    tracks: Vec<TrackRecommendation>,
    name: String,
    track_requests: AtomicUsize,
    seen_albums: Mutex<Option<AlbumIndex>>,
}

impl ScriptedSource {
    pub fn new(artists: &[&str], tracks: &[(&str, &str)], name: &str) -> Self {
        Self {
            artists: artists.iter().map(|artist| artist.to_string()).collect(),
            tracks: tracks
                .iter()
                .map(|(artist, title)| TrackRecommendation::new(*artist, *title))
                .collect(),
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn track_requests(&self) -> usize {
        self.track_requests.load(Ordering::SeqCst)
    }

    /// Album context passed to the last track request.
    pub fn seen_albums(&self) -> Option<AlbumIndex> {
        self.seen_albums.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecommendationSource for ScriptedSource {
    async fn recommend_artists(
        &self,
        _prompt: &str,
        _artists: &[ArtistRecord],
        _model: &str,
    ) -> ReconcileResult<Vec<String>> {
        if self.artists.is_empty() {
            return Err(ReconcileError::RecommendationParse("artist selection: no artists".into()));
        }
        Ok(self.artists.clone())
    }

    async fn recommend_tracks(
        &self,
        _prompt: &str,
        albums: &AlbumIndex,
        _model: &str,
        bounds: TrackBounds,
    ) -> ReconcileResult<Vec<TrackRecommendation>> {
        self.track_requests.fetch_add(1, Ordering::SeqCst);
        *self.seen_albums.lock().unwrap() = Some(albums.clone());
        Ok(self.tracks.iter().take(bounds.max as usize).cloned().collect())
    }

    async fn playlist_name(&self, _prompt: &str, _model: &str) -> ReconcileResult<String> {
        Ok(self.name.clone())
    }
}
