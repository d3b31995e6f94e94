// SPDX-License-Identifier: GPL-3.0-or-later

//! What.CD (Gazelle JSON API) client.
//!
//! Gazelle requires a logged-in session: the client posts the credentials to
//! `login.php` once and keeps the session cookie for every later request.

use crate::lenient;
use crate::rate_limiter::RateLimiter;
use crate::{TagCount, USER_AGENT};
use moka::sync::Cache;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, instrument, trace};

const WHATCD_BASE: &str = "https://what.cd";

/// Error type returned by the What.CD client.
#[derive(Debug, Error)]
pub enum WhatCdError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("login rejected for user {0}")]
    LoginFailed(String),
    #[error("unsuccessful response: {0}")]
    Api(String),
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WhatCdError>;

/// A torrent group from a browse search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentGroup {
    #[serde(deserialize_with = "lenient::text", default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub group_name: String,
    #[serde(deserialize_with = "lenient::text", default)]
    pub artist: Option<String>,
    #[serde(deserialize_with = "lenient::year", default)]
    pub group_year: Option<i32>,
    /// Gazelle release type, usually a numeric code.
    #[serde(deserialize_with = "lenient::text", default)]
    pub release_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    response: Value,
}

#[derive(Debug, Deserialize)]
struct ArtistResponse {
    #[serde(default)]
    tags: Vec<ArtistTag>,
}

#[derive(Debug, Deserialize)]
struct ArtistTag {
    name: String,
    #[serde(deserialize_with = "lenient::count", default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct BrowseResponse {
    #[serde(default)]
    results: Vec<TorrentGroup>,
}

/// Map a Gazelle release type code to its name. Unknown codes and textual
/// values pass through.
pub fn release_type_name(value: &str) -> String {
    let name = match value.trim() {
        "1" => "Album",
        "3" => "Soundtrack",
        "5" => "EP",
        "6" => "Anthology",
        "7" => "Compilation",
        "9" => "Single",
        "11" => "Live album",
        "13" => "Remix",
        "14" => "Bootleg",
        "15" => "Interview",
        "16" => "Mixtape",
        "21" => "Unknown",
        other => other,
    };
    name.to_string()
}

/// What.CD API client with session login and rate limiting.
pub struct WhatCdClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    rate_limiter: RateLimiter,
    session: OnceCell<()>,
    cache_artist: Cache<String, Vec<TagCount>>,
}

impl WhatCdClient {
    /// Create a client builder.
    pub fn builder(username: impl Into<String>, password: impl Into<String>) -> WhatCdClientBuilder {
        WhatCdClientBuilder::new(username, password)
    }

    /// Tags of an artist, with counts.
    #[instrument(skip(self))]
    pub async fn artist_tags(&self, artist_name: &str) -> Result<Vec<TagCount>> {
        if let Some(cached) = self.cache_artist.get(artist_name) {
            return Ok(cached);
        }

        let response = self
            .query("artist", &[("id", "0"), ("artistname", artist_name)])
            .await?;
        let artist: ArtistResponse = serde_json::from_value(response)?;
        let tags: Vec<TagCount> = artist
            .tags
            .into_iter()
            .map(|tag| TagCount::new(tag.name, tag.count))
            .collect();

        self.cache_artist.insert(artist_name.to_string(), tags.clone());
        Ok(tags)
    }

    /// Search music torrent groups.
    #[instrument(skip(self))]
    pub async fn browse(&self, search: &str) -> Result<Vec<TorrentGroup>> {
        let response = self
            .query("browse", &[("searchstr", search), ("filter_cat[1]", "1")])
            .await?;
        let browse: BrowseResponse = serde_json::from_value(response)?;
        Ok(browse.results)
    }

    async fn query(&self, action: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.session.get_or_try_init(|| self.login()).await?;
        self.rate_limiter.acquire().await;

        let url = format!("{}/ajax.php", self.base_url);
        trace!(target: "whatcd", action, "GET {}", url);
        let response = self
            .client
            .get(&url)
            .query(&[("action", action)])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(WhatCdError::HttpStatus { status, body });
        }

        let envelope: Envelope = serde_json::from_str(&body)?;
        if envelope.status != "success" {
            return Err(WhatCdError::Api(
                envelope.error.unwrap_or(envelope.status),
            ));
        }
        Ok(envelope.response)
    }

    async fn login(&self) -> Result<()> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/login.php", self.base_url);
        debug!(target: "whatcd", user = %self.username, "logging in");
        let response = self
            .client
            .post(&url)
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?;

        // Gazelle answers a failed login with the login form again.
        let status = response.status();
        if !status.is_success() || response.url().path().ends_with("login.php") {
            return Err(WhatCdError::LoginFailed(self.username.clone()));
        }
        Ok(())
    }
}

/// Builder for configuring a What.CD client.
#[derive(Debug)]
pub struct WhatCdClientBuilder {
    username: String,
    password: String,
    base_url: String,
    timeout: Duration,
    rate_limit_interval: Duration,
}

impl WhatCdClientBuilder {
    fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: WHATCD_BASE.to_string(),
            timeout: Duration::from_secs(30),
            rate_limit_interval: Duration::from_secs(2),
        }
    }

    /// Set a custom base URL (useful for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Minimum time between two requests.
    pub fn rate_limit_interval(mut self, interval: Duration) -> Self {
        self.rate_limit_interval = interval;
        self
    }

    pub fn build(self) -> Result<WhatCdClient> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()?;

        Ok(WhatCdClient {
            client,
            base_url: self.base_url,
            username: self.username,
            password: self.password,
            rate_limiter: RateLimiter::new(self.rate_limit_interval),
            session: OnceCell::new(),
            cache_artist: Cache::new(10_000),
        })
    }
}
