// SPDX-License-Identifier: GPL-3.0-or-later
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Unprefixed variables accepted for compatibility with existing deployments.
const LEGACY_ENV_KEYS: [&str; 4] = [
    "PLEX_BASE_URL",
    "PLEX_TOKEN",
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlexConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:32400".to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Upper bound for any single call to the media server.
    pub request_timeout_secs: u64,
    pub max_concurrent_artists: usize,
    pub track_match_threshold: f64,
    pub fallback_match_threshold: f64,
    /// Build the artist cache before the HTTP listener starts.
    pub warm_on_start: bool,
}

impl CatalogConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_concurrent_artists: 4,
            track_match_threshold: 0.85,
            fallback_match_threshold: 0.75,
            warm_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub default_model: String,
    pub request_timeout_secs: u64,
    /// Short model names accepted by the API, mapped to provider model ids.
    pub model_aliases: BTreeMap<String, String>,
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve a requested model name through the alias table; unknown names pass through.
    pub fn resolve_model<'a>(&'a self, requested: &'a str) -> &'a str {
        self.model_aliases
            .get(requested)
            .map(String::as_str)
            .unwrap_or(requested)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut model_aliases = BTreeMap::new();
        model_aliases.insert("gpt-4".to_string(), "gpt-4".to_string());
        model_aliases.insert(
            "claude".to_string(),
            "anthropic/claude-3-5-sonnet-latest".to_string(),
        );

        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            default_model: "gpt-4".to_string(),
            request_timeout_secs: 60,
            model_aliases,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub telemetry: TelemetryConfig,
    pub plex: PlexConfig,
    pub catalog: CatalogConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("catalog.track_match_threshold", self.catalog.track_match_threshold),
            ("catalog.fallback_match_threshold", self.catalog.fallback_match_threshold),
        ] {
            ensure!(
                value.is_finite() && (0.0..=1.0).contains(&value),
                "{name} must be within [0.0, 1.0], got {value}"
            );
        }
        ensure!(
            self.catalog.request_timeout_secs > 0,
            "catalog.request_timeout_secs must be positive"
        );
        ensure!(
            self.catalog.max_concurrent_artists > 0,
            "catalog.max_concurrent_artists must be positive"
        );
        Ok(())
    }
}

/// Load configuration from defaults, optional TOML file, legacy variables and
/// environment overrides (prefix: PLEXMUSE_, `__` separates nested keys).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment
        .merge(
            Env::raw()
                .only(&LEGACY_ENV_KEYS)
                .map(|key| legacy_key(key.as_str()).into()),
        )
        .merge(Env::prefixed("PLEXMUSE_").split("__"));

    let config: AppConfig = figment.extract()?;
    config.validate()?;
    info!(target: "config", plex = %config.plex.base_url, "configuration loaded");
    Ok(config)
}

fn legacy_key(key: &str) -> &'static str {
    match key.to_ascii_uppercase().as_str() {
        "PLEX_BASE_URL" => "plex.base_url",
        "PLEX_TOKEN" => "plex.token",
        "OPENAI_API_KEY" => "llm.openai_api_key",
        "ANTHROPIC_API_KEY" => "llm.anthropic_api_key",
        _ => "unmapped",
    }
}
