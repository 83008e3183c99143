// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

/// Every Plex JSON response wraps its payload in a `MediaContainer` object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaContainer<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: T,
}

/// Payload of `/library/sections`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DirectoryList {
    #[serde(rename = "Directory", default)]
    pub directories: Vec<Directory>,
}

/// A library section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Directory {
    /// Section key used in `/library/sections/{key}/...` paths.
    pub key: String,
    pub title: String,
    /// Section type; music libraries report `artist`.
    #[serde(rename = "type")]
    pub section_type: String,
}

/// Payload of listing endpoints (`/all`, `/children`, `/playlists`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetadataList {
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<Metadata>,
}

/// Artist, album or track metadata. Fields not reported for a given type stay `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub rating_key: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    /// Number of children (tracks for an album, items for a playlist).
    #[serde(default)]
    pub leaf_count: Option<u32>,
    /// Duration in milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,
    /// Track number within its album.
    #[serde(default)]
    pub index: Option<u32>,
    /// Album title for tracks.
    #[serde(default)]
    pub parent_title: Option<String>,
    /// Album artist for tracks.
    #[serde(default)]
    pub grandparent_title: Option<String>,
    /// Track-level artist when it differs from the album artist.
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(rename = "Genre", default)]
    pub genres: Vec<Tag>,
}

impl Metadata {
    /// Performing artist of a track: track artist first, album artist as fallback.
    pub fn track_artist(&self) -> Option<&str> {
        self.original_title
            .as_deref()
            .or(self.grandparent_title.as_deref())
    }

    pub fn genre_tags(&self) -> Vec<String> {
        self.genres.iter().map(|genre| genre.tag.clone()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub tag: String,
}

/// Payload of `/identity`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub machine_identifier: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Numeric item types accepted by the `type` filter of section listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlexItemType {
    Artist,
    Album,
    Track,
}

impl PlexItemType {
    pub fn type_id(self) -> u8 {
        match self {
            Self::Artist => 8,
            Self::Album => 9,
            Self::Track => 10,
        }
    }
}
