// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-release orchestration of the tag providers.

use crate::disambiguation::CandidateResolver;
use crate::error::ProviderError;
use crate::providers::{build_providers, TagProvider};
use genrify_config::{AppConfig, GenreConfig, ScoringConfig};
use genrify_domain::{ReleaseQuery, SourceKind};
use genrify_tags::{GenreLists, ScoringSettings, TagStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A provider that failed for one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub error: ProviderError,
}

/// Outcome of aggregating all providers for one release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseGenres {
    /// Selected genres, best first.
    pub genres: Vec<String>,
    /// Release type reported by the first provider that knew one.
    pub release_type: Option<String>,
    pub failures: Vec<SourceFailure>,
}

/// Receives progress of a release's aggregation.
pub trait Reporter: Send + Sync {
    fn source_started(&self, source: SourceKind, query: &ReleaseQuery);

    fn source_failed(&self, source: SourceKind, error: &ProviderError);

    /// Called after each successful provider with the store's current
    /// view of plausible tags.
    fn source_finished(&self, source: SourceKind, good_tags: &[(String, f64)]);

    fn release_finished(&self, query: &ReleaseQuery, result: &ReleaseGenres);
}

/// Reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn source_started(&self, source: SourceKind, query: &ReleaseQuery) {
        debug!(target: "aggregator", %source, release = %query.label(), "querying source");
    }

    fn source_failed(&self, source: SourceKind, error: &ProviderError) {
        warn!(target: "aggregator", %source, %error, "could not get data");
    }

    fn source_finished(&self, source: SourceKind, good_tags: &[(String, f64)]) {
        let summary: Vec<String> = good_tags
            .iter()
            .map(|(name, score)| format!("{}: {:.2}", name, score))
            .collect();
        debug!(target: "aggregator", %source, good_tags = %summary.join(", "), "source done");
    }

    fn release_finished(&self, query: &ReleaseQuery, result: &ReleaseGenres) {
        if result.genres.is_empty() {
            info!(target: "aggregator", release = %query.label(), "no or not good enough tags found");
        } else {
            info!(
                target: "aggregator",
                release = %query.label(),
                genres = %result.genres.join(", "),
                release_type = ?result.release_type,
                "genres selected"
            );
        }
    }
}

/// Runs every enabled provider for a release and selects its genres.
///
/// Each call to [`Aggregator::process`] works on a fresh [`TagStore`], so
/// nothing leaks between releases. Provider state such as rate limits and
/// caches lives as long as the aggregator.
pub struct Aggregator {
    providers: Vec<Box<dyn TagProvider>>,
    lists: GenreLists,
    settings: ScoringSettings,
    limit: usize,
    reporter: Arc<dyn Reporter>,
}

impl Aggregator {
    pub fn new(
        providers: Vec<Box<dyn TagProvider>>,
        lists: GenreLists,
        settings: ScoringSettings,
        limit: usize,
    ) -> Self {
        Self {
            providers,
            lists,
            settings,
            limit,
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Build the aggregator and its providers from configuration.
    pub fn from_config(
        config: &AppConfig,
        resolver: Arc<dyn CandidateResolver>,
    ) -> anyhow::Result<Self> {
        let providers = build_providers(config, resolver)?;
        Ok(Self::new(
            providers,
            genre_lists(&config.genres),
            scoring_settings(&config.scoring),
            config.genres.limit,
        ))
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Sources in the order they are queried.
    pub fn sources(&self) -> Vec<SourceKind> {
        self.providers.iter().map(|provider| provider.kind()).collect()
    }

    /// Query every provider in order and select the release's genres.
    pub async fn process(&self, query: &ReleaseQuery) -> ReleaseGenres {
        let mut store = TagStore::seeded(self.lists.clone(), self.settings);
        let mut result = ReleaseGenres::default();

        for provider in &self.providers {
            let source = provider.kind();
            self.reporter.source_started(source, query);

            match provider.fetch_tags(query, &mut store).await {
                Ok(report) => {
                    if result.release_type.is_none() {
                        result.release_type = report.release_type;
                    }
                    self.reporter.source_finished(source, &store.debug_list());
                }
                Err(error) => {
                    self.reporter.source_failed(source, &error);
                    result.failures.push(SourceFailure { source, error });
                }
            }
        }

        result.genres = store.select(self.limit);
        self.reporter.release_finished(query, &result);
        result
    }
}

pub fn genre_lists(config: &GenreConfig) -> GenreLists {
    GenreLists {
        whitelist: config.whitelist.clone(),
        blacklist: config.blacklist.clone(),
        uppercase: config.uppercase.clone(),
        score_up: config.score_up.clone(),
        score_down: config.score_down.clone(),
    }
}

pub fn scoring_settings(config: &ScoringConfig) -> ScoringSettings {
    ScoringSettings {
        fuzzy_threshold: config.fuzzy_threshold,
        merge_bonus: config.merge_bonus,
        selection_threshold: config.selection_threshold,
        ..ScoringSettings::default()
    }
}
