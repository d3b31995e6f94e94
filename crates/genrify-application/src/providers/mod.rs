// SPDX-License-Identifier: GPL-3.0-or-later

//! Metadata sources as interchangeable tag providers.
//!
//! Every provider runs its lookups for one release and feeds whatever it
//! found into the release's [`TagStore`], scaled by the source's reliability
//! multiplier. Failures come back as [`ProviderError`] and never abort the
//! release.

mod discogs;
mod lastfm;
mod musicbrainz;
mod whatcd;

pub use discogs::DiscogsProvider;
pub use lastfm::LastFmProvider;
pub use musicbrainz::MusicBrainzProvider;
pub use whatcd::WhatCdProvider;

use crate::disambiguation::{CandidateResolver, Disambiguator};
use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use genrify_config::AppConfig;
use genrify_domain::{ReleaseQuery, SourceKind};
use genrify_metadata::discogs::DiscogsClient;
use genrify_metadata::lastfm::LastFmClient;
use genrify_metadata::musicbrainz::MusicBrainzClient;
use genrify_metadata::whatcd::WhatCdClient;
use genrify_tags::{RawTags, TagStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Side results of a successful lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceReport {
    /// Release type, when the source knows it.
    pub release_type: Option<String>,
}

/// A metadata source that contributes genre tags for a release.
#[async_trait]
pub trait TagProvider: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Look the release up and add what was found to `store`.
    async fn fetch_tags(
        &self,
        query: &ReleaseQuery,
        store: &mut TagStore,
    ) -> ProviderResult<SourceReport>;
}

/// Feed one lookup's tags into the store with the source's multiplier.
///
/// An empty result is reported as [`ProviderError::NoTags`] for `scope`.
pub(crate) fn contribute(
    store: &mut TagStore,
    kind: SourceKind,
    scope: &'static str,
    tags: RawTags,
) -> ProviderResult<()> {
    if tags.is_empty() {
        return Err(ProviderError::NoTags(scope));
    }
    let count = match &tags {
        RawTags::Unweighted(names) => names.len(),
        RawTags::Weighted(counts) => counts.len(),
    };
    debug!(target: "providers", source = %kind, scope, count, "adding tags");
    store.ingest(&tags, kind.score_multiplier());
    Ok(())
}

/// Combine the outcomes of a source's independent lookups.
///
/// The source succeeds when at least one lookup did; otherwise the last
/// error is returned. Failed lookups are logged either way.
pub(crate) fn settle(
    kind: SourceKind,
    lookups: Vec<(&'static str, ProviderResult<()>)>,
) -> ProviderResult<()> {
    let mut succeeded = false;
    let mut last_error = None;

    for (scope, result) in lookups {
        match result {
            Ok(()) => succeeded = true,
            Err(error) => {
                debug!(target: "providers", source = %kind, scope, %error, "lookup failed");
                last_error = Some(error);
            }
        }
    }

    match (succeeded, last_error) {
        (true, _) | (false, None) => Ok(()),
        (false, Some(error)) => Err(error),
    }
}

/// Build the enabled providers in configured query order.
///
/// `resolver` settles ambiguous album searches for every provider.
pub fn build_providers(
    config: &AppConfig,
    resolver: Arc<dyn CandidateResolver>,
) -> anyhow::Result<Vec<Box<dyn TagProvider>>> {
    let sources = &config.sources;
    let timeout = Duration::from_secs(sources.timeout_secs);
    let disambiguator = Disambiguator::new(resolver);
    let mut providers: Vec<Box<dyn TagProvider>> = Vec::new();

    for kind in sources.enabled_in_order() {
        let provider: Box<dyn TagProvider> = match kind {
            SourceKind::WhatCd => {
                let settings = &sources.whatcd;
                let mut builder = WhatCdClient::builder(
                    settings.username.clone().unwrap_or_default(),
                    settings.password.clone().unwrap_or_default(),
                )
                .timeout(timeout)
                .rate_limit_interval(Duration::from_millis(settings.rate_limit_ms));
                if let Some(url) = &settings.base_url {
                    builder = builder.base_url(url.as_str());
                }
                Box::new(WhatCdProvider::new(builder.build()?, disambiguator.clone()))
            }
            SourceKind::LastFm => {
                let settings = &sources.lastfm;
                let client = LastFmClient::new(
                    settings.api_key.clone().unwrap_or_default(),
                    settings.base_url.clone(),
                )
                .with_timeout(timeout);
                Box::new(LastFmProvider::new(client))
            }
            SourceKind::MusicBrainz => {
                let settings = &sources.musicbrainz;
                let mut builder = MusicBrainzClient::builder()
                    .timeout(timeout)
                    .rate_limit_interval(Duration::from_millis(settings.rate_limit_ms));
                if let Some(url) = &settings.base_url {
                    builder = builder.base_url(url.as_str());
                }
                Box::new(MusicBrainzProvider::new(builder.build()?))
            }
            SourceKind::Discogs => {
                let settings = &sources.discogs;
                let client = DiscogsClient::with_rate_limit(
                    settings.token.clone(),
                    settings.base_url.clone(),
                    Duration::from_millis(settings.rate_limit_ms),
                )
                .with_timeout(timeout);
                Box::new(DiscogsProvider::new(client, disambiguator.clone()))
            }
        };
        providers.push(provider);
    }

    info!(
        target: "providers",
        sources = ?providers.iter().map(|p| p.kind()).collect::<Vec<_>>(),
        "providers ready"
    );
    Ok(providers)
}
