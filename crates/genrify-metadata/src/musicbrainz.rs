// SPDX-License-Identifier: GPL-3.0-or-later

//! MusicBrainz web service client, limited to what tag lookups need.

use crate::rate_limiter::RateLimiter;
use crate::{TagCount, USER_AGENT};
use moka::sync::Cache;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;
use uuid::Uuid;

const MUSICBRAINZ_API_BASE: &str = "https://musicbrainz.org/ws/2";

#[derive(Debug, Error)]
pub enum MusicBrainzError {
    #[error("MusicBrainz request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// MusicBrainz answers 503 when clients go faster than allowed.
    #[error("MusicBrainz rate limit hit")]
    RateLimitExceeded,

    #[error("unexpected MusicBrainz payload: {0}")]
    InvalidResponse(String),

    #[error("no such MusicBrainz entity: {0}")]
    NotFound(String),

    #[error("MusicBrainz answered {status}: {message}")]
    ApiError { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, MusicBrainzError>;

/// A Lucene search against one entity type.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Lucene query string.
    pub query: String,
    /// Result cap; the service defaults to 25.
    pub limit: Option<u32>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
        }
    }

    /// Query for an artist by name.
    pub fn artist(name: &str) -> Self {
        Self::new(format!("artist:{}", phrase(name)))
    }

    /// Query for a release group by title, optionally restricted to an artist.
    pub fn release_group(artist: Option<&str>, title: &str) -> Self {
        let title = format!("releasegroup:{}", phrase(title));
        match artist {
            Some(artist) if !artist.is_empty() => {
                Self::new(format!("artist:{} AND {}", phrase(artist), title))
            }
            _ => Self::new(title),
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Quote a value as a Lucene phrase.
fn phrase(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Search hit for an artist or release group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    /// MusicBrainz ID (MBID).
    pub id: Uuid,
    /// Artist name.
    #[serde(default)]
    pub name: Option<String>,
    /// Release group title.
    #[serde(default)]
    pub title: Option<String>,
    /// Search score (0-100).
    #[serde(default)]
    pub score: Option<u32>,
}

/// Artist search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistSearchResult {
    #[serde(default)]
    pub artists: Vec<SearchHit>,
}

/// Release group search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseGroupSearchResult {
    #[serde(rename = "release-groups", default)]
    pub release_groups: Vec<SearchHit>,
}

/// An entity looked up with `inc=tags`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tagged {
    pub id: Uuid,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Folksonomy tag with its vote count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub count: i64,
}

impl Tagged {
    /// Tags with a positive vote count.
    pub fn tag_counts(&self) -> Vec<TagCount> {
        self.tags
            .iter()
            .filter(|tag| tag.count > 0)
            .map(|tag| TagCount::new(tag.name.clone(), tag.count as u64))
            .collect()
    }
}

/// MusicBrainz API client with rate limiting.
pub struct MusicBrainzClient {
    client: Client,
    base_url: String,
    rate_limiter: RateLimiter,
    cache_artist: Cache<Uuid, Vec<TagCount>>,
}

impl MusicBrainzClient {
    /// Client for musicbrainz.org with the default 1 s interval.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> MusicBrainzClientBuilder {
        MusicBrainzClientBuilder::default()
    }

    /// Search for artists.
    pub async fn search_artists(&self, query: SearchQuery) -> Result<Vec<SearchHit>> {
        let url = self.search_url("artist", &query)?;
        let result: ArtistSearchResult = self.get(url.as_str()).await?;
        Ok(result.artists)
    }

    /// Search for release groups.
    pub async fn search_release_groups(&self, query: SearchQuery) -> Result<Vec<SearchHit>> {
        let url = self.search_url("release-group", &query)?;
        let result: ReleaseGroupSearchResult = self.get(url.as_str()).await?;
        Ok(result.release_groups)
    }

    /// Tags of an artist. Results are cached for the lifetime of the client.
    pub async fn artist_tags(&self, mbid: Uuid) -> Result<Vec<TagCount>> {
        if let Some(cached) = self.cache_artist.get(&mbid) {
            return Ok(cached);
        }

        let url = format!("{}/artist/{}?inc=tags&fmt=json", self.base_url, mbid);
        let artist: Tagged = self.get(&url).await?;
        let tags = artist.tag_counts();
        self.cache_artist.insert(mbid, tags.clone());
        Ok(tags)
    }

    /// Tags of a release group.
    pub async fn release_group_tags(&self, mbid: Uuid) -> Result<Vec<TagCount>> {
        let url = format!("{}/release-group/{}?inc=tags&fmt=json", self.base_url, mbid);
        let group: Tagged = self.get(&url).await?;
        Ok(group.tag_counts())
    }

    fn search_url(&self, entity: &str, query: &SearchQuery) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, entity))
            .map_err(|e| MusicBrainzError::InvalidResponse(e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("query", &query.query)
            .append_pair("fmt", "json");

        if let Some(limit) = query.limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.rate_limiter.acquire().await;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!(target: "musicbrainz", %url, %status, "GET");

        if status == 404 {
            return Err(MusicBrainzError::NotFound(url.to_string()));
        }

        if status == 503 {
            return Err(MusicBrainzError::RateLimitExceeded);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(MusicBrainzError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        trace!(target: "musicbrainz", %body, "response");
        serde_json::from_str(&body).map_err(|e| MusicBrainzError::InvalidResponse(e.to_string()))
    }
}

/// Builder for configuring a MusicBrainz client.
#[derive(Debug)]
pub struct MusicBrainzClientBuilder {
    base_url: String,
    timeout: Duration,
    rate_limit_interval: Duration,
}

impl Default for MusicBrainzClientBuilder {
    fn default() -> Self {
        Self {
            base_url: MUSICBRAINZ_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            rate_limit_interval: Duration::from_secs(1),
        }
    }
}

impl MusicBrainzClientBuilder {
    /// Set a custom base URL (useful for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Give up on a request after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Minimum time between two requests.
    pub fn rate_limit_interval(mut self, interval: Duration) -> Self {
        self.rate_limit_interval = interval;
        self
    }

    pub fn build(self) -> Result<MusicBrainzClient> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(MusicBrainzClient {
            client,
            base_url: self.base_url,
            rate_limiter: RateLimiter::new(self.rate_limit_interval),
            cache_artist: Cache::new(10_000),
        })
    }
}
