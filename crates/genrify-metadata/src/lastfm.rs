// SPDX-License-Identifier: GPL-3.0-or-later

//! Last.fm top tags for artists and albums.

use crate::lenient;
use crate::{TagCount, USER_AGENT};
use moka::sync::Cache;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

const LASTFM_API_BASE: &str = "https://ws.audioscrobbler.com/2.0/";

/// Error type returned by the Last.fm client.
#[derive(Debug, Error)]
pub enum LastFmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("Last.fm API error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LastFmError>;

#[derive(Debug, Deserialize)]
struct TopTagsResponse {
    toptags: TopTags,
}

#[derive(Debug, Deserialize)]
struct TopTags {
    /// A list for several tags, a bare object for exactly one.
    #[serde(default)]
    tag: Option<OneOrMany>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<LastFmTag>),
    One(LastFmTag),
}

#[derive(Debug, Deserialize)]
struct LastFmTag {
    name: String,
    #[serde(deserialize_with = "lenient::count", default)]
    count: u64,
}

/// Struct representing the Last.fm API client.
pub struct LastFmClient {
    api_key: String,
    client: Client,
    base_url: String,
    cache_artist: Cache<String, Vec<TagCount>>,
}

impl LastFmClient {
    /// Creates a new Last.fm API client, optionally against a custom base URL.
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            api_key,
            client: http_client(None),
            base_url: base_url.unwrap_or_else(|| LASTFM_API_BASE.to_string()),
            cache_artist: Cache::new(10_000),
        }
    }

    /// Replace the HTTP client with one that gives up after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(Some(timeout));
        self
    }

    /// Top tags of an artist.
    #[instrument(skip(self))]
    pub async fn artist_top_tags(&self, artist_name: &str) -> Result<Vec<TagCount>> {
        if let Some(cached) = self.cache_artist.get(artist_name) {
            return Ok(cached);
        }

        let tags = self
            .top_tags(&[("method", "artist.gettoptags"), ("artist", artist_name)])
            .await?;
        self.cache_artist.insert(artist_name.to_string(), tags.clone());
        Ok(tags)
    }

    /// Top tags of an album.
    #[instrument(skip(self))]
    pub async fn album_top_tags(&self, artist_name: &str, album_name: &str) -> Result<Vec<TagCount>> {
        self.top_tags(&[
            ("method", "album.gettoptags"),
            ("artist", artist_name),
            ("album", album_name),
        ])
        .await
    }

    async fn top_tags(&self, params: &[(&str, &str)]) -> Result<Vec<TagCount>> {
        debug!(target: "lastfm", url = %self.base_url, ?params, "requesting top tags");
        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("api_key", self.api_key.as_str()), ("format", "json")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let value = parse_lastfm_body(status, &body)?;
        let parsed: TopTagsResponse = serde_json::from_value(value)?;

        let tags = match parsed.toptags.tag {
            Some(OneOrMany::Many(tags)) => tags,
            Some(OneOrMany::One(tag)) => vec![tag],
            None => Vec::new(),
        };
        Ok(tags
            .into_iter()
            .map(|tag| TagCount::new(tag.name, tag.count))
            .collect())
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
            "could not build Last.fm HTTP client, using the default one"
        );
        Client::new()
    })
}

fn parse_lastfm_body(status: StatusCode, body: &str) -> Result<Value> {
    // Last.fm reports API errors as JSON, sometimes with a non-2xx status.
    let parsed = serde_json::from_str::<Value>(body);
    if let Ok(value) = &parsed {
        if let Some(code) = value.get("error").and_then(Value::as_i64) {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(LastFmError::Api { code, message });
        }
    }

    if !status.is_success() {
        return Err(LastFmError::HttpStatus {
            status,
            body: body.to_string(),
        });
    }

    Ok(parsed?)
}
