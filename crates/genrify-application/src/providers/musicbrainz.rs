// SPDX-License-Identifier: GPL-3.0-or-later

use super::{contribute, settle, SourceReport, TagProvider};
use crate::error::{ProviderError, ProviderResult};
use crate::query::search_string;
use async_trait::async_trait;
use genrify_domain::{ReleaseQuery, SourceKind};
use genrify_metadata::musicbrainz::{MusicBrainzClient, SearchQuery};
use genrify_metadata::TagCount;
use genrify_tags::{RawTags, TagStore};
use tracing::{debug, instrument};

/// MusicBrainz: tags of the best matching artist and release group.
pub struct MusicBrainzProvider {
    client: MusicBrainzClient,
}

impl MusicBrainzProvider {
    pub fn new(client: MusicBrainzClient) -> Self {
        Self { client }
    }

    async fn artist_tags(&self, query: &ReleaseQuery, store: &mut TagStore) -> ProviderResult<()> {
        let search = SearchQuery::artist(&search_string(&query.artist)).limit(1);
        let hit = self
            .client
            .search_artists(search)
            .await?
            .into_iter()
            .next()
            .ok_or(ProviderError::NoTags("artist"))?;
        debug!(target: "musicbrainz", id = %hit.id, name = ?hit.name, "artist match");

        let tags = self.client.artist_tags(hit.id).await?;
        contribute(store, self.kind(), "artist", RawTags::Weighted(pairs(tags)))
    }

    async fn album_tags(&self, query: &ReleaseQuery, store: &mut TagStore) -> ProviderResult<()> {
        let artist = (!query.various_artists).then(|| search_string(&query.artist));
        let search =
            SearchQuery::release_group(artist.as_deref(), &search_string(&query.album)).limit(1);
        let hit = self
            .client
            .search_release_groups(search)
            .await?
            .into_iter()
            .next()
            .ok_or(ProviderError::NoTags("album"))?;
        debug!(target: "musicbrainz", id = %hit.id, title = ?hit.title, "release group match");

        let tags = self.client.release_group_tags(hit.id).await?;
        contribute(store, self.kind(), "album", RawTags::Weighted(pairs(tags)))
    }
}

#[async_trait]
impl TagProvider for MusicBrainzProvider {
    fn kind(&self) -> SourceKind {
        SourceKind::MusicBrainz
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

fn pairs(tags: Vec<TagCount>) -> Vec<(String, u64)> {
    tags.into_iter().map(|tag| (tag.name, tag.count)).collect()
}
