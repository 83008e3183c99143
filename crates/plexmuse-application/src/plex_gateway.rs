// SPDX-License-Identifier: GPL-3.0-or-later

//! [`CatalogGateway`] backed by a Plex Media Server.

use crate::gateway::{CatalogGateway, GatewayError};
use async_trait::async_trait;
use plexmuse_config::PlexConfig;
use plexmuse_domain::{
    AlbumEntry, CatalogEntry, CatalogKey, CatalogSection, CreatedCollection, EntryKind,
    SectionKind, TrackEntry,
};
use plexmuse_plex::{Metadata, PlexClient, PlexError, PlexItemType};
use std::time::Duration;
use tracing::{debug, info};

impl From<PlexError> for GatewayError {
    fn from(err: PlexError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct PlexCatalogGateway {
    client: PlexClient,
}

impl PlexCatalogGateway {
    pub fn new(client: PlexClient) -> Self {
        Self { client }
    }

    /// Build a gateway for the configured server; no request is made yet.
    pub fn connect(config: &PlexConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let mut builder = PlexClient::builder()
            .base_url(config.base_url.clone())
            .timeout(timeout);
        if let Some(token) = &config.token {
            builder = builder.token(token.clone());
        }
        let client = builder.build()?;
        info!(target: "plex", base_url = client.base_url(), "plex gateway configured");
        Ok(Self::new(client))
    }
}

fn item_type(kind: EntryKind) -> PlexItemType {
    match kind {
        EntryKind::Artist => PlexItemType::Artist,
        EntryKind::Album => PlexItemType::Album,
        EntryKind::Track => PlexItemType::Track,
    }
}

fn to_entry(item: Metadata) -> CatalogEntry {
    CatalogEntry {
        genres: item.genre_tags(),
        artist_name: item.track_artist().map(str::to_string),
        key: CatalogKey::new(item.rating_key),
        title: item.title,
    }
}

#[async_trait]
impl CatalogGateway for PlexCatalogGateway {
    async fn list_sections(&self) -> Result<Vec<CatalogSection>, GatewayError> {
        let directories = self.client.sections().await?;
        Ok(directories
            .into_iter()
            .map(|directory| CatalogSection {
                kind: SectionKind::from_section_type(&directory.section_type),
                id: directory.key,
                title: directory.title,
            })
            .collect())
    }

    async fn search(
        &self,
        section: &CatalogSection,
        query: Option<&str>,
        kind: EntryKind,
    ) -> Result<Vec<CatalogEntry>, GatewayError> {
        let items = self
            .client
            .section_items(&section.id, item_type(kind), query)
            .await?;
        debug!(target: "plex", section = %section.title, %kind, query, hits = items.len(), "section search");
        Ok(items.into_iter().map(to_entry).collect())
    }

    async fn list_albums(&self, artist: &CatalogEntry) -> Result<Vec<AlbumEntry>, GatewayError> {
        let children = self.client.children(artist.key.as_str()).await?;
        let mut albums = Vec::with_capacity(children.len());

        for album in children {
            let track_count = match album.leaf_count {
                Some(count) => count,
                None => self.client.children(&album.rating_key).await?.len() as u32,
            };
            albums.push(AlbumEntry {
                key: CatalogKey::new(album.rating_key),
                title: album.title,
                year: album.year,
                track_count,
            });
        }

        Ok(albums)
    }

    async fn list_tracks(&self, album: &AlbumEntry) -> Result<Vec<TrackEntry>, GatewayError> {
        let children = self.client.children(album.key.as_str()).await?;
        Ok(children
            .into_iter()
            .map(|track| TrackEntry {
                artist_name: track.track_artist().unwrap_or_default().to_string(),
                key: CatalogKey::new(track.rating_key),
                title: track.title,
                duration_ms: track.duration,
                track_number: track.index,
            })
            .collect())
    }

    async fn create_collection(
        &self,
        name: &str,
        item_keys: &[CatalogKey],
    ) -> Result<CreatedCollection, GatewayError> {
        let keys: Vec<&str> = item_keys.iter().map(CatalogKey::as_str).collect();
        let playlist = self.client.create_audio_playlist(name, &keys).await?;
        info!(target: "plex", title = %playlist.title, items = keys.len(), "playlist created");
        Ok(CreatedCollection {
            title: playlist.title,
            external_id: Some(playlist.rating_key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn gateway(server: &MockServer) -> PlexCatalogGateway {
        let config = PlexConfig {
            base_url: server.uri(),
            token: Some("token".to_string()),
        };
        PlexCatalogGateway::connect(&config, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn sections_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/library/sections"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MediaContainer": {"Directory": [
                    {"key": "1", "title": "Movies", "type": "movie"},
                    {"key": "3", "title": "Music", "type": "artist"}
                ]}
            })))
            .mount(&server)
            .await;

        let sections = gateway(&server).await.list_sections().await.unwrap();
        assert_eq!(sections.len(), 2);
        assert!(!sections[0].kind.is_music());
        assert!(sections[1].kind.is_music());
        assert_eq!(sections[1].id, "3");
    }

    #[tokio::test]
    async fn track_search_carries_artist_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/library/sections/3/all"))
            .and(query_param("type", "10"))
            .and(query_param("title", "Roads"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MediaContainer": {"Metadata": [
                    {"ratingKey": "77", "title": "Roads", "grandparentTitle": "Portishead"}
                ]}
            })))
            .mount(&server)
            .await;

        let section = CatalogSection {
            id: "3".to_string(),
            title: "Music".to_string(),
            kind: SectionKind::Music,
        };
        let hits = gateway(&server)
            .await
            .search(&section, Some("Roads"), EntryKind::Track)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key.as_str(), "77");
        assert_eq!(hits[0].artist_name.as_deref(), Some("Portishead"));
    }

    #[tokio::test]
    async fn compilation_tracks_report_performing_artist() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/library/sections/3/all"))
            .and(query_param("type", "10"))
            .and(query_param("title", "Karmacoma"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MediaContainer": {"Metadata": [
                    {
                        "ratingKey": "88",
                        "title": "Karmacoma",
                        "grandparentTitle": "Various Artists",
                        "originalTitle": "Massive Attack"
                    }
                ]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/library/metadata/40/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MediaContainer": {"Metadata": [
                    {
                        "ratingKey": "88",
                        "title": "Karmacoma",
                        "grandparentTitle": "Various Artists",
                        "originalTitle": "Massive Attack",
                        "index": 3
                    },
                    {"ratingKey": "89", "title": "Intro", "grandparentTitle": "Various Artists"}
                ]}
            })))
            .mount(&server)
            .await;

        let gateway = gateway(&server).await;
        let section = CatalogSection {
            id: "3".to_string(),
            title: "Music".to_string(),
            kind: SectionKind::Music,
        };
        let hits = gateway
            .search(&section, Some("Karmacoma"), EntryKind::Track)
            .await
            .unwrap();
        assert_eq!(hits[0].artist_name.as_deref(), Some("Massive Attack"));

        let album = AlbumEntry {
            key: CatalogKey::from("40"),
            title: "Trip Hop Classics".to_string(),
            year: None,
            track_count: 2,
        };
        let tracks = gateway.list_tracks(&album).await.unwrap();
        assert_eq!(tracks[0].artist_name, "Massive Attack");
        assert_eq!(tracks[0].track_number, Some(3));
        assert_eq!(tracks[1].artist_name, "Various Artists");
    }

    #[tokio::test]
    async fn album_track_count_falls_back_to_children() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/library/metadata/10/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MediaContainer": {"Metadata": [
                    {"ratingKey": "20", "title": "Dummy", "year": 1994, "leafCount": 11},
                    {"ratingKey": "21", "title": "Portishead", "year": 1997}
                ]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/library/metadata/21/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MediaContainer": {"Metadata": [
                    {"ratingKey": "30", "title": "Cowboys"},
                    {"ratingKey": "31", "title": "All Mine"}
                ]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let artist = CatalogEntry {
            key: CatalogKey::from("10"),
            title: "Portishead".to_string(),
            genres: Vec::new(),
            artist_name: None,
        };
        let albums = gateway(&server).await.list_albums(&artist).await.unwrap();
        assert_eq!(albums[0].track_count, 11);
        assert_eq!(albums[1].track_count, 2);
        assert_eq!(albums[1].year, Some(1997));
    }

    #[tokio::test]
    async fn server_errors_become_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/library/sections"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = gateway(&server).await.list_sections().await;
        assert!(matches!(result, Err(GatewayError::Unavailable(_))));
    }
}
