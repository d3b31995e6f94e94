// SPDX-License-Identifier: GPL-3.0-or-later

use super::{contribute, settle, SourceReport, TagProvider};
use crate::disambiguation::Disambiguator;
use crate::error::ProviderResult;
use crate::query::search_string;
use async_trait::async_trait;
use genrify_domain::{Candidate, ReleaseQuery, SourceKind};
use genrify_metadata::whatcd::{release_type_name, TorrentGroup, WhatCdClient};
use genrify_metadata::TagCount;
use genrify_tags::{RawTags, TagStore};
use tracing::{debug, instrument};

/// Site-wide tags that say nothing about the genre.
const DENYLIST: &[&str] = &["freely.available", "staff.picks", "vanity.house"];

/// What.CD: weighted artist tags plus the tags and release type of the
/// matching torrent group.
pub struct WhatCdProvider {
    client: WhatCdClient,
    disambiguator: Disambiguator,
}

impl WhatCdProvider {
    pub fn new(client: WhatCdClient, disambiguator: Disambiguator) -> Self {
        Self {
            client,
            disambiguator,
        }
    }

    async fn artist_tags(&self, query: &ReleaseQuery, store: &mut TagStore) -> ProviderResult<()> {
        let tags = self.client.artist_tags(&search_string(&query.artist)).await?;
        contribute(store, self.kind(), "artist", RawTags::Weighted(filter_counts(tags)))
    }

    async fn album_tags(
        &self,
        query: &ReleaseQuery,
        store: &mut TagStore,
        report: &mut SourceReport,
    ) -> ProviderResult<()> {
        let search = if query.various_artists {
            search_string(&query.album)
        } else {
            search_string(&format!("{} {}", query.artist, query.album))
        };

        let groups = self.client.browse(&search).await?;
        debug!(target: "whatcd", %search, results = groups.len(), "browse results");

        let group = self
            .disambiguator
            .pick(self.kind(), groups, query.year, candidate)?;
        report.release_type = group.release_type.as_deref().map(release_type_name);

        contribute(store, self.kind(), "album", RawTags::Unweighted(filter_names(group.tags)))
    }
}

#[async_trait]
impl TagProvider for WhatCdProvider {
    fn kind(&self) -> SourceKind {
        SourceKind::WhatCd
    }

    #[instrument(skip(self, store), fields(release = %query.label()))]
    async fn fetch_tags(
        &self,
        query: &ReleaseQuery,
        store: &mut TagStore,
    ) -> ProviderResult<SourceReport> {
        let mut report = SourceReport::default();
        let mut lookups = Vec::new();

        if !query.various_artists {
            lookups.push(("artist", self.artist_tags(query, store).await));
        }
        lookups.push(("album", self.album_tags(query, store, &mut report).await));

        settle(self.kind(), lookups)?;
        Ok(report)
    }
}

fn candidate(group: &TorrentGroup) -> Candidate {
    Candidate {
        id: group.group_id.clone().unwrap_or_default(),
        title: group.group_name.clone(),
        artist: group.artist.clone(),
        year: group.group_year,
        release_type: group.release_type.as_deref().map(release_type_name),
    }
}

fn allowed(name: &str) -> bool {
    !DENYLIST.contains(&name)
}

/// Gazelle joins words with dots ("hip.hop").
fn readable(name: &str) -> String {
    name.replace('.', " ")
}

fn filter_counts(tags: Vec<TagCount>) -> Vec<(String, u64)> {
    tags.into_iter()
        .filter(|tag| allowed(&tag.name))
        .map(|tag| (readable(&tag.name), tag.count))
        .collect()
}

fn filter_names(tags: Vec<String>) -> Vec<String> {
    tags.iter()
        .filter(|name| allowed(name))
        .map(|name| readable(name))
        .collect()
}
