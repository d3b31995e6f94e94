// SPDX-License-Identifier: GPL-3.0-or-later

//! Discogs database search, used for styles and genres of master releases.

use crate::lenient;
use crate::rate_limiter::RateLimiter;
use crate::USER_AGENT;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Duration;
use tracing::{debug, instrument};

/// A master release returned by a database search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MasterRelease {
    #[serde(deserialize_with = "lenient::text", default)]
    pub id: Option<String>,
    /// Discogs formats this as "Artist - Title".
    #[serde(default)]
    pub title: String,
    #[serde(deserialize_with = "lenient::year", default)]
    pub year: Option<i32>,
    /// Broad genres, e.g. "Electronic".
    #[serde(default)]
    pub genre: Vec<String>,
    /// Finer styles, e.g. "Ambient".
    #[serde(default)]
    pub style: Vec<String>,
}

#[derive(Debug, Error)]
pub enum DiscogsError {
    #[error("Discogs request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Discogs answered {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    /// A JSON body carrying only a `message`, e.g. for a rejected token.
    #[error("Discogs API error: {message}")]
    Api { message: String },
    #[error("unexpected Discogs payload: {0}")]
    Deserialization(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<MasterRelease>,
}

/// Rate-limited client for the Discogs database search.
pub struct DiscogsClient {
    token: Option<String>,
    client: Client,
    rate_limiter: RateLimiter,
    base_url: String,
}

impl DiscogsClient {
    /// Creates a new Discogs API client with the default one request per second.
    pub fn new(token: Option<String>, base_url: Option<String>) -> Self {
        Self::with_rate_limit(token, base_url, Duration::from_secs(1))
    }

    /// Creates a new Discogs API client with a custom minimum request interval.
    pub fn with_rate_limit(
        token: Option<String>,
        base_url: Option<String>,
        min_interval: Duration,
    ) -> Self {
        let client = Self {
            token,
            client: http_client(None),
            rate_limiter: RateLimiter::new(min_interval),
            base_url: base_url
                .unwrap_or_else(|| "https://api.discogs.com".to_string())
                .trim_end_matches('/')
                .to_string(),
        };
        debug!(target: "discogs", base_url = %client.base_url, "client ready");
        client
    }

    /// Replace the HTTP client with one that gives up after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(Some(timeout));
        self
    }

    /// Searches master releases by title.
    #[instrument(skip(self))]
    pub async fn search_masters(&self, release_title: &str) -> Result<Vec<MasterRelease>, DiscogsError> {
        let url = format!("{}/database/search", self.base_url);
        debug!(target: "discogs", %url, release_title, "searching masters");

        self.rate_limiter.acquire().await;
        let response = self
            .request(self.client.get(&url))
            .query(&[("type", "master"), ("release_title", release_title)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let value = parse_discogs_body(status, &body)?;
        let search: SearchResponse = serde_json::from_value(value)?;
        Ok(search.results)
    }

    fn request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.as_deref() {
            Some(token) if !token.trim().is_empty() => {
                request.header("Authorization", format!("Discogs token={}", token.trim()))
            }
            _ => request,
        }
    }
}

fn http_client(timeout: Option<Duration>) -> Client {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|error| {
        debug!(
            ?error,
            "could not build Discogs HTTP client, using the default one"
        );
        Client::new()
    })
}

fn parse_discogs_body(status: StatusCode, body: &str) -> Result<Value, DiscogsError> {
    if !status.is_success() {
        let body = body.to_string();
        return Err(DiscogsError::HttpStatus { status, body });
    }

    let value: Value = serde_json::from_str(body)?;
    match value.get("message").and_then(Value::as_str) {
        Some(message) => Err(DiscogsError::Api {
            message: message.to_string(),
        }),
        None => Ok(value),
    }
}
