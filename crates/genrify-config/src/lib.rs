// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use genrify_domain::SourceKind;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreConfig {
    /// Maximum number of genres written per release.
    pub limit: usize,
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
    pub uppercase: Vec<String>,
    pub score_up: Vec<String>,
    pub score_down: Vec<String>,
}

impl Default for GenreConfig {
    fn default() -> Self {
        Self {
            limit: 4,
            whitelist: Vec::new(),
            blacklist: strings(&["Live", "Unknown"]),
            uppercase: strings(&["IDM", "UK", "US"]),
            score_up: strings(&["Soundtrack"]),
            score_down: strings(&["Electronic", "Alternative", "Indie", "Other"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub fuzzy_threshold: f64,
    pub merge_bonus: f64,
    pub selection_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.875,
            merge_bonus: 1.05,
            selection_threshold: 0.69,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatCdConfig {
    pub enabled: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub base_url: Option<String>,
    pub rate_limit_ms: u64,
}

impl Default for WhatCdConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            username: None,
            password: None,
            base_url: None,
            rate_limit_ms: 2000,
        }
    }
}

impl WhatCdConfig {
    pub fn has_credentials(&self) -> bool {
        filled(&self.username) && filled(&self.password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastFmConfig {
    pub enabled: bool,
    /// Required: no key is built in, and Last.fm stays off without one.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Default for LastFmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrainzConfig {
    pub enabled: bool,
    pub base_url: Option<String>,
    pub rate_limit_ms: u64,
}

impl Default for MusicBrainzConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            rate_limit_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscogsConfig {
    pub enabled: bool,
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub rate_limit_ms: u64,
}

impl Default for DiscogsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            token: None,
            base_url: None,
            rate_limit_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Query order; sources missing here are never queried.
    pub order: Vec<SourceKind>,
    pub timeout_secs: u64,
    pub whatcd: WhatCdConfig,
    pub lastfm: LastFmConfig,
    pub musicbrainz: MusicBrainzConfig,
    pub discogs: DiscogsConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            order: SourceKind::ALL.to_vec(),
            timeout_secs: 30,
            whatcd: WhatCdConfig::default(),
            lastfm: LastFmConfig::default(),
            musicbrainz: MusicBrainzConfig::default(),
            discogs: DiscogsConfig::default(),
        }
    }
}

impl SourcesConfig {
    pub fn is_enabled(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::WhatCd => self.whatcd.enabled,
            SourceKind::LastFm => self.lastfm.enabled,
            SourceKind::MusicBrainz => self.musicbrainz.enabled,
            SourceKind::Discogs => self.discogs.enabled,
        }
    }

    pub fn set_enabled(&mut self, kind: SourceKind, enabled: bool) {
        match kind {
            SourceKind::WhatCd => self.whatcd.enabled = enabled,
            SourceKind::LastFm => self.lastfm.enabled = enabled,
            SourceKind::MusicBrainz => self.musicbrainz.enabled = enabled,
            SourceKind::Discogs => self.discogs.enabled = enabled,
        }
    }

    /// Enabled sources in query order, without duplicates.
    pub fn enabled_in_order(&self) -> Vec<SourceKind> {
        let mut kinds = Vec::new();
        for kind in &self.order {
            if self.is_enabled(*kind) && !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        kinds
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Ask the operator when a source returns several candidates.
    pub interactive: bool,
    /// Write the detected release type into FLAC/Ogg files.
    pub tag_release: bool,
    /// Compute genres without writing anything.
    pub dry_run: bool,
    pub use_cache: bool,
    pub cache_path: PathBuf,
    pub stats: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            interactive: false,
            tag_release: false,
            dry_run: false,
            use_cache: false,
            cache_path: PathBuf::from("genrify-cache.json"),
            stats: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub genres: GenreConfig,
    pub scoring: ScoringConfig,
    pub sources: SourcesConfig,
    pub run: RunConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Turn off features whose prerequisites are missing and fail when no
    /// source is left to query.
    pub fn validate(&mut self) -> Result<()> {
        if self.sources.whatcd.enabled && !self.sources.whatcd.has_credentials() {
            warn!(
                target: "config",
                hint = credential_hint(SourceKind::WhatCd),
                "no What.CD credentials specified, What.CD disabled"
            );
            self.sources.whatcd.enabled = false;
        }
        if self.sources.lastfm.enabled && !filled(&self.sources.lastfm.api_key) {
            warn!(
                target: "config",
                hint = credential_hint(SourceKind::LastFm),
                "Last.fm requires an API key and none is configured, Last.fm disabled"
            );
            self.sources.lastfm.enabled = false;
        }
        if self.run.tag_release && !self.sources.whatcd.enabled {
            warn!(target: "config", "release types come from What.CD, release tagging disabled");
            self.run.tag_release = false;
        }
        if self.run.dry_run && self.run.use_cache {
            warn!(target: "config", "cache is not used in dry-run mode, cache disabled");
            self.run.use_cache = false;
        }
        if self.sources.enabled_in_order().is_empty() {
            bail!("at least one source must be enabled");
        }
        Ok(())
    }
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: GENRIFY_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("GENRIFY_").split("__"));

    let config: AppConfig = figment.extract()?;
    info!(target: "config", "configuration loaded");
    Ok(config)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Where the credentials a source needs are configured.
pub fn credential_hint(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::WhatCd => {
            "set sources.whatcd.username and sources.whatcd.password \
             (GENRIFY_SOURCES__WHATCD__USERNAME, GENRIFY_SOURCES__WHATCD__PASSWORD)"
        }
        SourceKind::LastFm => {
            "set sources.lastfm.api_key (GENRIFY_SOURCES__LASTFM__API_KEY); \
             keys are issued at https://www.last.fm/api/account/create"
        }
        SourceKind::MusicBrainz => "no credentials needed",
        SourceKind::Discogs => {
            "optional: set sources.discogs.token (GENRIFY_SOURCES__DISCOGS__TOKEN)"
        }
    }
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|value| !value.trim().is_empty())
}
