// SPDX-License-Identifier: GPL-3.0-or-later

//! End-to-end reconciliation against an in-memory catalog.

#[cfg(test)]
mod integration_tests {
    use crate::cache::CatalogCache;
    use crate::curator::PlaylistRequest;
    use crate::error::ReconcileError;
    use crate::reconcile::{MatchSettings, ReconciliationEngine};
    use crate::test_support::{InMemoryGateway, ScriptedSource};
    use crate::AppState;
    use plexmuse_config::AppConfig;
    use plexmuse_domain::{AlbumSummary, Skipped, TrackRecommendation};
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    fn catalog() -> InMemoryGateway {
        InMemoryGateway::new()
            .with_music_section("1", "Music")
            .with_artist("1", "1", "Artist1", &["Rock", "Alternative"])
            .with_artist("1", "2", "Artist2", &["Pop"])
            .with_album("1", "10", "Album1", Some(2020))
            .with_track("10", "100", "Track1")
            .with_track("10", "101", "Track One (Live Version)")
            .with_album("2", "20", "Hits", Some(2018))
            .with_track("20", "200", "Shine")
    }

    fn engine_for(gateway: &Arc<InMemoryGateway>, settings: MatchSettings) -> ReconciliationEngine {
        let cache = Arc::new(CatalogCache::new(gateway.clone(), settings.request_timeout));
        ReconciliationEngine::new(gateway.clone(), cache, settings)
    }

    fn engine(gateway: &Arc<InMemoryGateway>) -> ReconciliationEngine {
        engine_for(gateway, MatchSettings::default())
    }

    fn recs(pairs: &[(&str, &str)]) -> Vec<TrackRecommendation> {
        pairs
            .iter()
            .map(|(artist, title)| TrackRecommendation::new(*artist, *title))
            .collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[tokio::test]
    async fn cache_lists_every_artist_with_genres() {
        let cache = CatalogCache::new(Arc::new(catalog()), Duration::from_secs(5));
        cache.initialize().await.unwrap();

        let listed: BTreeSet<(String, Vec<String>)> = cache
            .list_all()
            .into_iter()
            .map(|artist| (artist.name, artist.genres))
            .collect();
        let expected: BTreeSet<(String, Vec<String>)> = [
            ("Artist1".to_string(), names(&["Rock", "Alternative"])),
            ("Artist2".to_string(), names(&["Pop"])),
        ]
        .into_iter()
        .collect();
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn bulk_lookup_summarizes_albums() {
        let gateway = Arc::new(catalog());
        let index = engine(&gateway)
            .bulk_album_lookup(&names(&["Artist1"]))
            .await
            .unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.get("Artist1").unwrap(),
            &[AlbumSummary {
                name: "Album1".to_string(),
                year: Some(2020),
                track_count: 2,
            }]
        );
    }

    #[tokio::test]
    async fn bulk_lookup_uses_cached_names_and_request_order() {
        let gateway = Arc::new(catalog());
        let index = engine(&gateway)
            .bulk_album_lookup(&names(&["artist2", "Nobody", "ARTIST1", "Artist2"]))
            .await
            .unwrap();

        let artists: Vec<&str> = index.iter().map(|entry| entry.artist.as_str()).collect();
        assert_eq!(artists, vec!["Artist2", "Artist1"]);
    }

    #[tokio::test]
    async fn bulk_lookup_of_unknown_artists_is_empty() {
        let gateway = Arc::new(catalog());
        let index = engine(&gateway)
            .bulk_album_lookup(&names(&["Nobody"]))
            .await
            .unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn exact_title_creates_playlist() {
        let gateway = Arc::new(catalog());
        let result = engine(&gateway)
            .create_curated_playlist("Evening", &recs(&[("Artist1", "Track1")]))
            .await
            .unwrap();

        assert_eq!(result.name, "Evening");
        assert_eq!(result.track_count(), 1);
        assert_eq!(result.matched_items[0].catalog_key.as_str(), "100");
        assert!(result.skipped.is_empty());

        let created = gateway.created_collections();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, "Evening");
    }

    #[tokio::test]
    async fn live_version_matches_plain_title() {
        let gateway = Arc::new(catalog());
        let result = engine(&gateway)
            .create_curated_playlist("Live", &recs(&[("Artist1", "Track One")]))
            .await
            .unwrap();

        assert_eq!(result.track_count(), 1);
        assert_eq!(result.matched_items[0].title, "Track One (Live Version)");
    }

    #[tokio::test]
    async fn unknown_artists_create_nothing() {
        let gateway = Arc::new(catalog());
        let result = engine(&gateway)
            .create_curated_playlist("Empty", &recs(&[("Nobody", "Track1"), ("Nobody Else", "Shine")]))
            .await;

        assert!(matches!(result, Err(ReconcileError::NoTracksMatched)));
        assert!(gateway.created_collections().is_empty());
    }

    #[tokio::test]
    async fn empty_recommendations_create_nothing() {
        let gateway = Arc::new(catalog());
        let result = engine(&gateway).create_curated_playlist("Empty", &[]).await;

        assert!(matches!(result, Err(ReconcileError::NoTracksMatched)));
        assert!(gateway.created_collections().is_empty());
    }

    #[tokio::test]
    async fn fallback_rejects_track_by_another_artist() {
        let gateway = Arc::new(catalog());
        let result = engine(&gateway)
            .create_curated_playlist("Mixed", &recs(&[("Artist1", "Track1"), ("Artist1", "Shine")]))
            .await
            .unwrap();

        assert_eq!(result.track_count(), 1);
        assert_eq!(
            result.skipped,
            vec![Skipped::Track {
                artist: "Artist1".to_string(),
                title: "Shine".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn fallback_finds_compilation_track() {
        let gateway = Arc::new(
            catalog()
                .with_artist("1", "3", "Various Artists", &[])
                .with_album("3", "30", "Summer Compilation", Some(2021))
                .with_track_by("30", "300", "Compilation Song Extended", "artist1"),
        );

        let result = engine(&gateway)
            .create_curated_playlist("Summer", &recs(&[("Artist1", "Compilation Song")]))
            .await
            .unwrap();

        assert_eq!(result.track_count(), 1);
        assert_eq!(result.matched_items[0].catalog_key.as_str(), "300");
    }

    #[tokio::test]
    async fn duplicate_matches_are_added_once() {
        let gateway = Arc::new(catalog());
        let result = engine(&gateway)
            .create_curated_playlist(
                "Twice",
                &recs(&[("Artist1", "Track1"), ("artist1", "track1"), ("Artist2", "Shine")]),
            )
            .await
            .unwrap();

        let keys: Vec<&str> = result
            .matched_items
            .iter()
            .map(|item| item.catalog_key.as_str())
            .collect();
        assert_eq!(keys, vec!["100", "200"]);
        assert_eq!(gateway.created_collections()[0].1.len(), 2);
    }

    #[tokio::test]
    async fn failing_artist_does_not_sink_the_batch() {
        let gateway = Arc::new(catalog());
        gateway.fail_artist("2");

        let result = engine(&gateway)
            .create_curated_playlist("Partial", &recs(&[("Artist2", "Shine"), ("Artist1", "Track1")]))
            .await
            .unwrap();

        assert_eq!(result.track_count(), 1);
        assert_eq!(result.matched_items[0].catalog_key.as_str(), "100");
        assert_eq!(
            result.skipped,
            vec![Skipped::Artist {
                name: "Artist2".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn unreachable_catalog_is_reported_as_unavailable() {
        let gateway = Arc::new(catalog());
        let engine = engine(&gateway);
        engine.bulk_album_lookup(&names(&["Artist1"])).await.unwrap();

        gateway.fail_section("1");
        let result = engine
            .create_curated_playlist("Offline", &recs(&[("Artist1", "Track1")]))
            .await;

        assert!(matches!(result, Err(ReconcileError::CatalogUnavailable(_))));
        assert!(gateway.created_collections().is_empty());
    }

    #[tokio::test]
    async fn failed_creation_is_reported_as_unavailable() {
        let gateway = Arc::new(catalog());
        gateway.fail_creation();

        let result = engine(&gateway)
            .create_curated_playlist("Nope", &recs(&[("Artist1", "Track1")]))
            .await;
        assert!(matches!(result, Err(ReconcileError::CatalogUnavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_catalog_calls_time_out() {
        let gateway = Arc::new(catalog().with_album_latency(Duration::from_secs(60)));
        let settings = MatchSettings {
            request_timeout: Duration::from_secs(1),
            ..MatchSettings::default()
        };

        let result = engine_for(&gateway, settings)
            .bulk_album_lookup(&names(&["Artist1"]))
            .await;
        assert!(matches!(result, Err(ReconcileError::CatalogUnavailable(_))));
    }

    fn two_section_catalog() -> InMemoryGateway {
        InMemoryGateway::new()
            .with_music_section("1", "Music")
            .with_music_section("2", "Archive")
            .with_artist("1", "1", "Artist1", &["Rock"])
            .with_album("1", "10", "Album1", Some(2020))
            .with_track("10", "100", "Track1")
            .with_artist("2", "5", "Artist3", &["Jazz"])
            .with_album("5", "50", "Archive Sessions", Some(1999))
            .with_track("50", "500", "Blue Room")
    }

    #[tokio::test]
    async fn artist_in_later_section_is_resolved() {
        let gateway = Arc::new(two_section_catalog());
        let engine = engine(&gateway);

        let index = engine.bulk_album_lookup(&names(&["Artist3"])).await.unwrap();
        assert_eq!(index.get("Artist3").unwrap()[0].name, "Archive Sessions");

        let result = engine
            .create_curated_playlist("Late Night", &recs(&[("Artist3", "Blue Room")]))
            .await
            .unwrap();
        assert_eq!(result.track_count(), 1);
        assert_eq!(result.matched_items[0].catalog_key.as_str(), "500");
    }

    #[tokio::test]
    async fn failing_section_is_skipped_when_later_section_has_artist() {
        let gateway = Arc::new(two_section_catalog());
        let engine = engine(&gateway);
        engine.bulk_album_lookup(&names(&["Artist3"])).await.unwrap();

        gateway.fail_section("1");
        let index = engine.bulk_album_lookup(&names(&["Artist3"])).await.unwrap();
        assert_eq!(index.len(), 1);

        let result = engine
            .create_curated_playlist("Late Night", &recs(&[("Artist3", "Blue Room")]))
            .await
            .unwrap();
        assert_eq!(result.matched_items[0].catalog_key.as_str(), "500");
        assert!(result.skipped.is_empty());
        assert_eq!(gateway.created_collections().len(), 1);
    }

    #[tokio::test]
    async fn first_section_wins_when_artist_is_in_both() {
        let gateway = Arc::new(
            two_section_catalog()
                .with_artist("2", "6", "Artist1", &[])
                .with_album("6", "60", "Album1 Remastered", Some(2022))
                .with_track("60", "600", "Track1"),
        );
        let engine = engine(&gateway);

        let index = engine.bulk_album_lookup(&names(&["Artist1"])).await.unwrap();
        let albums: Vec<&str> = index
            .get("Artist1")
            .unwrap()
            .iter()
            .map(|album| album.name.as_str())
            .collect();
        assert_eq!(albums, vec!["Album1"]);

        let result = engine
            .create_curated_playlist("Originals", &recs(&[("Artist1", "Track1")]))
            .await
            .unwrap();
        assert_eq!(result.matched_items[0].catalog_key.as_str(), "100");
    }

    #[tokio::test]
    async fn fallback_pools_hits_from_every_section() {
        let gateway = Arc::new(
            two_section_catalog()
                .with_artist("1", "3", "Various Artists", &[])
                .with_album("3", "30", "Party Mix", Some(2021))
                .with_track_by("30", "300", "Track Two Remix", "Artist1")
                .with_artist("2", "7", "Soundtracks", &[])
                .with_album("7", "70", "Film Songs", Some(2010))
                .with_track_by("70", "700", "Track Two", "Artist1"),
        );

        let result = engine(&gateway)
            .create_curated_playlist("Both Rooms", &recs(&[("Artist1", "Track Two")]))
            .await
            .unwrap();

        assert_eq!(result.track_count(), 1);
        assert_eq!(result.matched_items[0].catalog_key.as_str(), "700");
    }

    fn state(gateway: Arc<InMemoryGateway>, source: Arc<ScriptedSource>) -> AppState {
        AppState::new(AppConfig::default(), gateway, source)
    }

    fn request() -> PlaylistRequest {
        PlaylistRequest {
            prompt: "rainy night".to_string(),
            model: "gpt-4".to_string(),
            min_tracks: 1,
            max_tracks: 50,
        }
    }

    #[tokio::test]
    async fn curator_runs_the_whole_flow() {
        let gateway = Arc::new(catalog());
        let source = Arc::new(ScriptedSource::new(
            &["Artist1", "Nobody"],
            &[("Artist1", "Track1"), ("Artist1", "Track One")],
            "Rainy Night",
        ));
        let state = state(gateway.clone(), source.clone());

        let playlist = state.curator.curate(&request()).await.unwrap();

        assert_eq!(playlist.name, "Rainy Night");
        assert_eq!(playlist.track_count, 2);
        assert_eq!(playlist.artists, names(&["Artist1", "Nobody"]));
        assert_eq!(playlist.id.as_deref(), Some("playlist-1"));

        let albums = source.seen_albums().unwrap();
        assert_eq!(albums.len(), 1);
        assert!(albums.get("Artist1").is_some());
    }

    #[tokio::test]
    async fn curator_stops_when_no_artist_is_in_catalog() {
        let gateway = Arc::new(catalog());
        let source = Arc::new(ScriptedSource::new(&["Nobody"], &[("Nobody", "Song")], "Nothing"));
        let state = state(gateway.clone(), source.clone());

        let result = state.curator.curate(&request()).await;

        assert!(matches!(result, Err(ReconcileError::NoTracksMatched)));
        assert_eq!(source.track_requests(), 0);
        assert!(gateway.created_collections().is_empty());
    }

    #[tokio::test]
    async fn warm_up_failure_is_retried_lazily() {
        let gateway = Arc::new(catalog());
        gateway.fail_listing();
        let source = Arc::new(ScriptedSource::new(&["Artist1"], &[("Artist1", "Track1")], "Later"));
        let state = state(gateway.clone(), source);

        state.on_start().await;
        assert!(!state.cache.is_initialized());

        let result = state.curator.curate(&request()).await;
        assert!(matches!(result, Err(ReconcileError::CatalogUnavailable(_))));
        assert_eq!(gateway.section_listings(), 2);
    }
}
