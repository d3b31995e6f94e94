// SPDX-License-Identifier: GPL-3.0-or-later

//! Tagging a whole collection, one release at a time.

use crate::aggregator::Aggregator;
use crate::cache::ReleaseCache;
use crate::error::ReleaseError;
use crate::library::{ReleaseDir, ReleaseLibrary};
use crate::release::build_release_query;
use crate::stats::TagStats;
use genrify_config::RunConfig;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Switches of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    pub dry_run: bool,
    pub tag_release: bool,
    pub stats: bool,
}

impl From<&RunConfig> for BatchOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            dry_run: config.dry_run,
            tag_release: config.tag_release,
            stats: config.stats,
        }
    }
}

/// A release that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRelease {
    pub path: PathBuf,
    pub reason: String,
}

/// What a batch run did.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub found: usize,
    pub processed: usize,
    pub skipped: usize,
    /// Releases that ended up with at least one genre.
    pub tagged: usize,
    pub failed: Vec<FailedRelease>,
    /// The run stopped early on request.
    pub cancelled: bool,
    pub stats: Option<TagStats>,
}

/// Drives the aggregator over a list of releases.
///
/// A failing release is recorded and the run moves on. Cancellation is
/// honoured between releases only.
pub struct BatchRunner {
    aggregator: Aggregator,
    library: Arc<dyn ReleaseLibrary>,
    options: BatchOptions,
    cache: Option<ReleaseCache>,
    cancel: Arc<AtomicBool>,
}

impl BatchRunner {
    pub fn new(
        aggregator: Aggregator,
        library: Arc<dyn ReleaseLibrary>,
        options: BatchOptions,
    ) -> Self {
        Self {
            aggregator,
            library,
            options,
            cache: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Skip releases in `cache` and record newly saved ones.
    pub fn with_cache(mut self, cache: ReleaseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Flag that stops the run before the next release once set.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub async fn run(&mut self, releases: &[ReleaseDir]) -> BatchSummary {
        let mut summary = BatchSummary {
            found: releases.len(),
            stats: self.options.stats.then(TagStats::new),
            ..Default::default()
        };
        info!(target: "batch", releases = releases.len(), "found folders with possible releases");

        for (index, release) in releases.iter().enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                warn!(target: "batch", remaining = releases.len() - index, "run cancelled");
                summary.cancelled = true;
                break;
            }

            if self
                .cache
                .as_ref()
                .is_some_and(|cache| cache.contains(&release.path))
            {
                info!(
                    target: "batch",
                    release = %release.path.display(),
                    "found in cache, skipping"
                );
                summary.skipped += 1;
                continue;
            }

            info!(
                target: "batch",
                release = %release.path.display(),
                position = index + 1,
                total = releases.len(),
                "processing release"
            );
            summary.processed += 1;

            match self.process(release, &mut summary).await {
                Ok(()) => {
                    if let Some(cache) = self.cache.as_mut() {
                        if !self.options.dry_run {
                            cache.insert(&release.path);
                        }
                    }
                }
                Err(err) => {
                    error!(
                        target: "batch",
                        release = %release.path.display(),
                        error = %err,
                        "release failed"
                    );
                    summary.failed.push(FailedRelease {
                        path: release.path.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        if let Some(cache) = self.cache.as_mut() {
            if let Err(err) = cache.save() {
                warn!(target: "batch", error = %err, "could not save cache");
            }
        }

        info!(
            target: "batch",
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            "all done"
        );
        summary
    }

    async fn process(
        &self,
        release: &ReleaseDir,
        summary: &mut BatchSummary,
    ) -> Result<(), ReleaseError> {
        let tracks = self.library.read_tracks(release)?;
        let query = build_release_query(&tracks)?;
        info!(target: "batch", release = %query.label(), "getting tags");

        let result = self.aggregator.process(&query).await;

        let release_type = if self.options.tag_release {
            result.release_type.as_deref()
        } else {
            None
        };
        if let Some(release_type) = release_type {
            info!(target: "batch", %release_type, "release type");
        }
        if !result.genres.is_empty() {
            summary.tagged += 1;
            if let Some(stats) = summary.stats.as_mut() {
                stats.add(&result.genres);
            }
        }

        if self.options.dry_run {
            return Ok(());
        }
        self.library
            .write_genres(release, &result.genres, release_type)
    }
}
