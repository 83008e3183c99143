// SPDX-License-Identifier: GPL-3.0-or-later

//! Artist and track suggestions from a language model.
//!
//! Model output is untrusted: it is parsed against a fixed schema and
//! anything else is rejected as [`ReconcileError::RecommendationParse`].

use crate::error::{ReconcileError, ReconcileResult};
use async_trait::async_trait;
use lazy_static::lazy_static;
use plexmuse_config::LlmConfig;
use plexmuse_domain::{AlbumIndex, ArtistRecord, TrackRecommendation};
use plexmuse_llm::{ChatRequest, LlmClient};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

const TEMPERATURE: f32 = 0.7;
const ARTIST_MAX_TOKENS: u32 = 1024;
const TRACK_MAX_TOKENS: u32 = 2048;
const NAME_MAX_TOKENS: u32 = 30;

/// Inclusive bounds on the number of tracks to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackBounds {
    pub min: u32,
    pub max: u32,
}

#[async_trait]
pub trait RecommendationSource: Send + Sync {
    /// Names of catalog artists that fit the prompt.
    async fn recommend_artists(
        &self,
        prompt: &str,
        artists: &[ArtistRecord],
        model: &str,
    ) -> ReconcileResult<Vec<String>>;

    /// Specific tracks by the artists in `albums` that fit the prompt.
    async fn recommend_tracks(
        &self,
        prompt: &str,
        albums: &AlbumIndex,
        model: &str,
        bounds: TrackBounds,
    ) -> ReconcileResult<Vec<TrackRecommendation>>;

    async fn playlist_name(&self, prompt: &str, model: &str) -> ReconcileResult<String>;
}

const ARTIST_SYSTEM_PROMPT: &str = r#"You are a multilingual music curator helping to create playlists.
Your responses must ALWAYS be in English, even when the prompt is in another language.
Analyze the available artists and their genres,
then select the most appropriate ones for the requested playlist.

You must ALWAYS respond with valid JSON only, in this exact format:
{"artists": ["Artist1", "Artist2", "Artist3"]}

Do not add any explanations or other text - just the JSON object.
Select 10-15 artists that match the mood/theme, only from the provided list."#;

const NAME_SYSTEM_PROMPT: &str = "You are a creative assistant.
Generate a SINGLE catchy and relevant playlist name based on the following prompt. Do not wrap in quotes.";

fn track_system_prompt(bounds: TrackBounds) -> String {
    format!(
        r#"You are a multilingual music curator creating a cohesive playlist.
Your responses must ALWAYS be in English and contain ONLY a valid JSON object.

Based on your knowledge of these artists' albums and the playlist theme,
recommend specific songs that would create a great playlist. You can recommend
any tracks you know exist on these albums - you don't need to see the track list.

You must respond with ONLY a JSON object in this exact format:
{{
    "tracks": [
        {{"artist": "artist name", "title": "track title"}}
    ]
}}

Select between {min} and {max} tracks total.
Do not add any explanations or additional text."#,
        min = bounds.min,
        max = bounds.max,
    )
}

/// "Available artists and their genres" block, one `name - genre, genre` line each.
pub fn artist_context(artists: &[ArtistRecord]) -> String {
    let lines: Vec<String> = artists
        .iter()
        .filter(|artist| !artist.name.is_empty())
        .map(|artist| format!("{} - {}", artist.name, artist.genres.join(", ")))
        .collect();
    format!("Available artists and their genres:\n{}", lines.join("\n"))
}

/// "Available albums by artist" block with `- Album (year)` lines.
pub fn album_context(albums: &AlbumIndex) -> String {
    let mut context = String::from("Available albums by artist:\n");
    for entry in albums.iter() {
        context.push_str(&format!("\n{}:\n", entry.artist));
        for album in &entry.albums {
            let line = match album.year {
                Some(year) => format!("- {} ({year})\n", album.name),
                None => format!("- {}\n", album.name),
            };
            context.push_str(&line);
        }
    }
    context
}

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\n?(.*?)\s*```\s*$")
            .expect("valid code fence regex");
}

fn strip_code_fence(content: &str) -> &str {
    CODE_FENCE
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map_or(content, |body| body.as_str())
        .trim()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArtistSelection {
    artists: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrackSelection {
    tracks: Vec<SuggestedTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuggestedTrack {
    artist: String,
    title: String,
}

fn parse_error(what: &str, detail: impl std::fmt::Display) -> ReconcileError {
    ReconcileError::RecommendationParse(format!("{what}: {detail}"))
}

/// Parse `{"artists": [..]}`. Entries are trimmed; blanks and an empty list are rejected.
pub fn parse_artist_selection(content: &str) -> ReconcileResult<Vec<String>> {
    let selection: ArtistSelection = serde_json::from_str(strip_code_fence(content))
        .map_err(|err| parse_error("artist selection", err))?;

    let artists: Vec<String> = selection
        .artists
        .iter()
        .map(|name| name.trim().to_string())
        .collect();
    if artists.is_empty() {
        return Err(parse_error("artist selection", "no artists"));
    }
    if artists.iter().any(String::is_empty) {
        return Err(parse_error("artist selection", "blank artist name"));
    }
    Ok(artists)
}

/// Parse `{"tracks": [{"artist", "title"}]}`, keeping at most `max_tracks` entries.
pub fn parse_track_selection(
    content: &str,
    max_tracks: usize,
) -> ReconcileResult<Vec<TrackRecommendation>> {
    let selection: TrackSelection = serde_json::from_str(strip_code_fence(content))
        .map_err(|err| parse_error("track selection", err))?;

    if selection.tracks.is_empty() {
        return Err(parse_error("track selection", "no tracks"));
    }

    let mut tracks = Vec::with_capacity(selection.tracks.len());
    for track in selection.tracks {
        let artist = track.artist.trim();
        let title = track.title.trim();
        if artist.is_empty() || title.is_empty() {
            return Err(parse_error("track selection", "blank artist or title"));
        }
        tracks.push(TrackRecommendation::new(artist, title));
    }

    if tracks.len() > max_tracks {
        warn!(target: "llm", suggested = tracks.len(), max_tracks, "truncating track suggestions");
        tracks.truncate(max_tracks);
    }
    Ok(tracks)
}

/// First non-empty line, without surrounding quotes.
pub fn parse_playlist_name(content: &str) -> ReconcileResult<String> {
    let line = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();

    let unquoted = [('"', '"'), ('\'', '\''), ('\u{201C}', '\u{201D}')]
        .iter()
        .find_map(|(open, close)| {
            line.strip_prefix(*open)
                .and_then(|rest| rest.strip_suffix(*close))
        })
        .unwrap_or(line)
        .trim();

    if unquoted.is_empty() {
        return Err(parse_error("playlist name", "empty name"));
    }
    Ok(unquoted.to_string())
}

/// [`RecommendationSource`] backed by a chat-completion model.
#[derive(Debug, Clone)]
pub struct LlmRecommendationSource {
    client: LlmClient,
    config: LlmConfig,
}

impl LlmRecommendationSource {
    pub fn new(client: LlmClient, config: LlmConfig) -> Self {
        Self { client, config }
    }

    pub fn from_config(config: &LlmConfig) -> ReconcileResult<Self> {
        let client = LlmClient::builder()
            .openai_api_key(config.openai_api_key.clone())
            .anthropic_api_key(config.anthropic_api_key.clone())
            .openai_base_url(config.openai_base_url.clone())
            .anthropic_base_url(config.anthropic_base_url.clone())
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| ReconcileError::RecommendationUnavailable(err.to_string()))?;
        Ok(Self::new(client, config.clone()))
    }

    async fn complete(
        &self,
        model: &str,
        system: String,
        user: String,
        max_tokens: u32,
    ) -> ReconcileResult<String> {
        let request = ChatRequest {
            model: self.config.resolve_model(model).to_string(),
            system,
            user,
            max_tokens,
            temperature: TEMPERATURE,
        };
        self.client.complete(&request).await.map_err(|err| {
            warn!(target: "llm", model = %request.model, error = %err, "completion failed");
            ReconcileError::RecommendationUnavailable(err.to_string())
        })
    }
}

#[async_trait]
impl RecommendationSource for LlmRecommendationSource {
    async fn recommend_artists(
        &self,
        prompt: &str,
        artists: &[ArtistRecord],
        model: &str,
    ) -> ReconcileResult<Vec<String>> {
        let user = format!(
            "Context: {}\n\nCreate a playlist for: {prompt}",
            artist_context(artists)
        );
        let content = self
            .complete(model, ARTIST_SYSTEM_PROMPT.to_string(), user, ARTIST_MAX_TOKENS)
            .await?;
        debug!(target: "llm", content = %content, "artist selection received");

        let selected = parse_artist_selection(&content)?;
        info!(target: "llm", artists = ?selected, "artists selected");
        Ok(selected)
    }

    async fn recommend_tracks(
        &self,
        prompt: &str,
        albums: &AlbumIndex,
        model: &str,
        bounds: TrackBounds,
    ) -> ReconcileResult<Vec<TrackRecommendation>> {
        let user = format!(
            "Context: {}\n\nCreate a playlist with {}-{} tracks for: {prompt}",
            album_context(albums),
            bounds.min,
            bounds.max
        );
        let content = self
            .complete(model, track_system_prompt(bounds), user, TRACK_MAX_TOKENS)
            .await?;
        debug!(target: "llm", content = %content, "track selection received");

        let tracks = parse_track_selection(&content, bounds.max as usize)?;
        info!(target: "llm", tracks = tracks.len(), "tracks selected");
        Ok(tracks)
    }

    async fn playlist_name(&self, prompt: &str, model: &str) -> ReconcileResult<String> {
        let content = self
            .complete(
                model,
                NAME_SYSTEM_PROMPT.to_string(),
                prompt.to_string(),
                NAME_MAX_TOKENS,
            )
            .await?;
        let name = parse_playlist_name(&content)?;
        info!(target: "llm", name = %name, "playlist name generated");
        Ok(name)
    }
}
