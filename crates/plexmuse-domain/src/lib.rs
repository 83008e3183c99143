// SPDX-License-Identifier: GPL-3.0-or-later
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects & IDs
// ============================================================================

/// Opaque identifier the media server assigns to a catalog item (Plex `ratingKey`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogKey(pub String);

impl CatalogKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CatalogKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Declared content type of a library section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// Plex reports music libraries with the `artist` section type.
    Music,
    Other(String),
}

impl SectionKind {
    pub fn from_section_type(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "artist" | "music" => Self::Music,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_music(&self) -> bool {
        matches!(self, Self::Music)
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Music => write!(f, "music"),
            Self::Other(kind) => write!(f, "{kind}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Artist,
    Album,
    Track,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Artist => write!(f, "artist"),
            Self::Album => write!(f, "album"),
            Self::Track => write!(f, "track"),
        }
    }
}

// ============================================================================
// Catalog entries as reported by the media server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSection {
    pub id: String,
    pub title: String,
    pub kind: SectionKind,
}

/// Artist or track hit returned by a section search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub key: CatalogKey,
    pub title: String,
    pub genres: Vec<String>,
    /// Performing artist for track hits; `None` for artist hits.
    pub artist_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumEntry {
    pub key: CatalogKey,
    pub title: String,
    pub year: Option<i32>,
    pub track_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub key: CatalogKey,
    pub title: String,
    pub duration_ms: Option<u64>,
    pub track_number: Option<u32>,
    pub artist_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedCollection {
    pub title: String,
    pub external_id: Option<String>,
}

// ============================================================================
// Reconciliation model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub id: CatalogKey,
    pub name: String,
    pub genres: Vec<String>,
}

impl ArtistRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, genres: Vec<String>) -> Self {
        Self {
            id: CatalogKey::new(id),
            name: name.into(),
            genres,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSummary {
    pub name: String,
    pub year: Option<i32>,
    pub track_count: u32,
}

impl From<&AlbumEntry> for AlbumSummary {
    fn from(album: &AlbumEntry) -> Self {
        Self {
            name: album.title.clone(),
            year: album.year,
            track_count: album.track_count,
        }
    }
}

/// Albums of one resolved artist, keyed by the cached display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistAlbums {
    pub artist: String,
    pub albums: Vec<AlbumSummary>,
}

/// Ordered artist → albums mapping produced by a bulk lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumIndex(pub Vec<ArtistAlbums>);

impl AlbumIndex {
    pub fn get(&self, artist: &str) -> Option<&[AlbumSummary]> {
        self.0
            .iter()
            .find(|entry| entry.artist == artist)
            .map(|entry| entry.albums.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArtistAlbums> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackCandidate {
    pub title: String,
    pub catalog_key: CatalogKey,
    pub artist_name: String,
}

impl From<TrackEntry> for TrackCandidate {
    fn from(track: TrackEntry) -> Self {
        Self {
            title: track.title,
            catalog_key: track.key,
            artist_name: track.artist_name,
        }
    }
}

impl From<CatalogEntry> for TrackCandidate {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            title: entry.title,
            catalog_key: entry.key,
            artist_name: entry.artist_name.unwrap_or_default(),
        }
    }
}

/// An (artist, title) pair suggested by the recommendation source; untrusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecommendation {
    pub artist: String,
    pub title: String,
}

impl TrackRecommendation {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }
}

/// A recommendation that could not be reconciled and was left out of the playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Skipped {
    Artist { name: String },
    Track { artist: String, title: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistResult {
    pub name: String,
    pub external_id: Option<String>,
    pub matched_items: Vec<TrackCandidate>,
    pub skipped: Vec<Skipped>,
}

impl PlaylistResult {
    pub fn track_count(&self) -> usize {
        self.matched_items.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub artist_count: usize,
    pub section_count: usize,
    pub built_at: Option<DateTime<Utc>>,
}
