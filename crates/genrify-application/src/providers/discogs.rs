// SPDX-License-Identifier: GPL-3.0-or-later

use super::{contribute, SourceReport, TagProvider};
use crate::disambiguation::Disambiguator;
use crate::error::ProviderResult;
use crate::query::search_string;
use async_trait::async_trait;
use genrify_domain::{Candidate, ReleaseQuery, SourceKind};
use genrify_metadata::discogs::{DiscogsClient, MasterRelease};
use genrify_tags::{RawTags, TagStore};
use tracing::{debug, instrument};

/// Discogs: styles and genres of the matching master release.
pub struct DiscogsProvider {
    client: DiscogsClient,
    disambiguator: Disambiguator,
}

impl DiscogsProvider {
    pub fn new(client: DiscogsClient, disambiguator: Disambiguator) -> Self {
        Self {
            client,
            disambiguator,
        }
    }
}

#[async_trait]
impl TagProvider for DiscogsProvider {
    fn kind(&self) -> SourceKind {
        SourceKind::Discogs
    }

    #[instrument(skip(self, store), fields(release = %query.label()))]
    async fn fetch_tags(
        &self,
        query: &ReleaseQuery,
        store: &mut TagStore,
    ) -> ProviderResult<SourceReport> {
        let masters = self
            .client
            .search_masters(&search_string(&query.album))
            .await?;
        debug!(target: "discogs", results = masters.len(), "master search results");

        let masters = narrow_by_artist(query, masters);
        let master = self
            .disambiguator
            .pick(self.kind(), masters, query.year, candidate)?;

        let tags: Vec<String> = master.style.into_iter().chain(master.genre).collect();
        contribute(store, self.kind(), "album", RawTags::Unweighted(tags))?;
        Ok(SourceReport::default())
    }
}

/// Master titles read "Artist - Title"; keep those naming the artist.
fn narrow_by_artist(query: &ReleaseQuery, masters: Vec<MasterRelease>) -> Vec<MasterRelease> {
    if masters.len() <= 1 || query.various_artists || query.artist.is_empty() {
        return masters;
    }
    let artist = query.artist.to_lowercase();
    masters
        .into_iter()
        .filter(|master| master.title.to_lowercase().contains(&artist))
        .collect()
}

fn candidate(master: &MasterRelease) -> Candidate {
    Candidate {
        year: master.year,
        ..Candidate::new(master.id.clone().unwrap_or_default(), master.title.clone())
    }
}
