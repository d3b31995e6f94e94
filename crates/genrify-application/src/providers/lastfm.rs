// SPDX-License-Identifier: GPL-3.0-or-later

use super::{contribute, settle, SourceReport, TagProvider};
use crate::error::ProviderResult;
use crate::query::search_string;
use async_trait::async_trait;
use genrify_domain::{ReleaseQuery, SourceKind};
use genrify_metadata::lastfm::LastFmClient;
use genrify_metadata::TagCount;
use genrify_tags::{similarity, RawTags, TagStore};
use tracing::instrument;

/// Popular Last.fm tags that describe the listener rather than the music.
const DENYLIST: &[&str] = &[
    "albums i own",
    "amazing",
    "awesome",
    "cool",
    "epic",
    "favorite albums",
    "favorites",
    "good",
    "love",
    "seen live",
    "sexy",
    "drjazzmrfunkmusic",
    "television",
];

/// Similarity at which a tag counts as a denylisted one.
const DENY_SIMILARITY: f64 = 0.6;

/// Tags need more votes than this.
const MIN_COUNT: u64 = 2;

const VARIOUS_ARTISTS: &str = "Various Artists";

/// Last.fm: top tags of the artist and the album, weighted by vote count.
pub struct LastFmProvider {
    client: LastFmClient,
}

impl LastFmProvider {
    pub fn new(client: LastFmClient) -> Self {
        Self { client }
    }

    async fn artist_tags(&self, query: &ReleaseQuery, store: &mut TagStore) -> ProviderResult<()> {
        let tags = self
            .client
            .artist_top_tags(&search_string(&query.artist))
            .await?;
        contribute(store, self.kind(), "artist", RawTags::Weighted(filter_tags(query, tags)))
    }

    async fn album_tags(&self, query: &ReleaseQuery, store: &mut TagStore) -> ProviderResult<()> {
        let artist = if query.various_artists {
            VARIOUS_ARTISTS
        } else {
            query.artist.as_str()
        };
        let tags = self
            .client
            .album_top_tags(&search_string(artist), &search_string(&query.album))
            .await?;
        contribute(store, self.kind(), "album", RawTags::Weighted(filter_tags(query, tags)))
    }
}

#[async_trait]
impl TagProvider for LastFmProvider {
    fn kind(&self) -> SourceKind {
        SourceKind::LastFm
    }

    #[instrument(skip(self, store), fields(release = %query.label()))]
    async fn fetch_tags(
        &self,
        query: &ReleaseQuery,
        store: &mut TagStore,
    ) -> ProviderResult<SourceReport> {
        let mut lookups = Vec::new();
        if !query.various_artists {
            lookups.push(("artist", self.artist_tags(query, store).await));
        }
        lookups.push(("album", self.album_tags(query, store).await));

        settle(self.kind(), lookups)?;
        Ok(SourceReport::default())
    }
}

/// Drop tags with too few votes and tags close to the denylist, the
/// artist's name or the album title.
fn filter_tags(query: &ReleaseQuery, tags: Vec<TagCount>) -> Vec<(String, u64)> {
    let artist = query.artist.to_lowercase();
    let album = query.album.to_lowercase();
    let denied: Vec<&str> = [artist.as_str(), album.as_str()]
        .into_iter()
        .filter(|value| !value.is_empty())
        .chain(DENYLIST.iter().copied())
        .collect();

    tags.into_iter()
        .filter(|tag| tag.count > MIN_COUNT)
        .filter(|tag| {
            let name = tag.name.to_lowercase();
            !denied
                .iter()
                .any(|bad| similarity(&name, bad) >= DENY_SIMILARITY)
        })
        .map(|tag| (tag.name, tag.count))
        .collect()
}
