// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{PlexError, Result};
use crate::models::{
    Directory, DirectoryList, Identity, MediaContainer, Metadata, MetadataList, PlexItemType,
};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, trace};
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:32400";
const TOKEN_HEADER: &str = "X-Plex-Token";
const PRODUCT: &str = "Plexmuse";
const CLIENT_IDENTIFIER: &str = concat!("plexmuse-", env!("CARGO_PKG_VERSION"));

/// Plex Media Server client speaking the JSON flavour of the library API.
#[derive(Debug, Clone)]
pub struct PlexClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    machine_identifier: Arc<OnceCell<String>>,
}

impl PlexClient {
    /// Create a client builder for custom configuration.
    pub fn builder() -> PlexClientBuilder {
        PlexClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the server identity. Doubles as a connectivity and token check.
    pub async fn identity(&self) -> Result<Identity> {
        let url = self.url("/identity")?;
        let response: MediaContainer<Identity> = self.send(Method::GET, url).await?;
        Ok(response.media_container)
    }

    /// Machine identifier of the server, fetched once and reused for playlist URIs.
    pub async fn machine_identifier(&self) -> Result<&str> {
        let identifier = self
            .machine_identifier
            .get_or_try_init(|| async {
                let identity = self.identity().await?;
                Ok::<_, PlexError>(identity.machine_identifier)
            })
            .await?;
        Ok(identifier.as_str())
    }

    /// List every library section on the server.
    pub async fn sections(&self) -> Result<Vec<Directory>> {
        let url = self.url("/library/sections")?;
        let response: MediaContainer<DirectoryList> = self.send(Method::GET, url).await?;
        Ok(response.media_container.directories)
    }

    /// List items of one type in a section, optionally filtered by title.
    ///
    /// # Example
    /// ```no_run
    /// # use plexmuse_plex::{PlexClient, PlexItemType};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = PlexClient::builder().token("secret").build()?;
    /// let artists = client.section_items("3", PlexItemType::Artist, Some("Portishead")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn section_items(
        &self,
        section_key: &str,
        item_type: PlexItemType,
        title: Option<&str>,
    ) -> Result<Vec<Metadata>> {
        let mut url = self.url(&format!("/library/sections/{section_key}/all"))?;
        url.query_pairs_mut()
            .append_pair("type", &item_type.type_id().to_string());

        if let Some(title) = title {
            url.query_pairs_mut().append_pair("title", title);
        }

        let response: MediaContainer<MetadataList> = self.send(Method::GET, url).await?;
        Ok(response.media_container.metadata)
    }

    /// Children of a metadata item: albums of an artist, tracks of an album.
    pub async fn children(&self, rating_key: &str) -> Result<Vec<Metadata>> {
        let url = self.url(&format!("/library/metadata/{rating_key}/children"))?;
        let response: MediaContainer<MetadataList> = self.send(Method::GET, url).await?;
        Ok(response.media_container.metadata)
    }

    /// Create a static audio playlist holding the given items, in order.
    pub async fn create_audio_playlist(
        &self,
        title: &str,
        rating_keys: &[&str],
    ) -> Result<Metadata> {
        let machine = self.machine_identifier().await?;
        let uri = format!(
            "server://{machine}/com.plexapp.plugins.library/library/metadata/{}",
            rating_keys.join(",")
        );

        let mut url = self.url("/playlists")?;
        url.query_pairs_mut()
            .append_pair("type", "audio")
            .append_pair("title", title)
            .append_pair("smart", "0")
            .append_pair("uri", &uri);

        let response: MediaContainer<MetadataList> = self.send(Method::POST, url).await?;
        response
            .media_container
            .metadata
            .into_iter()
            .next()
            .ok_or_else(|| {
                PlexError::InvalidResponse("playlist creation returned no metadata".to_string())
            })
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    /// Internal method performing an authenticated request and decoding the JSON body.
    async fn send<T: DeserializeOwned>(&self, method: Method, url: Url) -> Result<T> {
        trace!(target: "plex", %method, path = url.path(), "request");

        let mut request = self
            .client
            .request(method, url.clone())
            .header("Accept", "application/json")
            .header("X-Plex-Product", PRODUCT)
            .header("X-Plex-Client-Identifier", CLIENT_IDENTIFIER);

        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(target: "plex", path = url.path(), %status, "response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(PlexError::Unauthorized);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(PlexError::NotFound(url.path().to_string()));
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PlexError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        trace!(target: "plex", "response body: {}", body);

        serde_json::from_str(&body)
            .map_err(|e| PlexError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

/// Builder for configuring a Plex client.
#[derive(Debug)]
pub struct PlexClientBuilder {
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl Default for PlexClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl PlexClientBuilder {
    /// Server address, e.g. `http://192.168.1.10:32400`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Credential sent as `X-Plex-Token` on every request.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<PlexClient> {
        // Fail early on malformed addresses instead of on the first request.
        Url::parse(&self.base_url)?;

        let client = Client::builder().timeout(self.timeout).build()?;

        Ok(PlexClient {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            token: self.token.filter(|token| !token.is_empty()),
            machine_identifier: Arc::new(OnceCell::new()),
        })
    }
}
