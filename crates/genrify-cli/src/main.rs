// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use genrify_application::{
    find_release_dirs, Aggregator, AudioFileLibrary, BatchOptions, BatchRunner, BatchSummary,
    CandidateResolver, FailOnAmbiguity, PromptResolver, ReleaseCache,
};
use genrify_config::{load as load_config, AppConfig};
use genrify_domain::SourceKind;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "genrify",
    version,
    about = "Improves genre metadata of audio files based on tags from various music sites"
)]
struct Cli {
    /// Folder(s) to scan
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Run verbose (more output)
    #[arg(short, long)]
    verbose: bool,

    /// Dry run (write nothing)
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Tag release type from What.CD
    #[arg(short = 'r', long)]
    tag_release: bool,

    /// Ask which release is meant when a search is ambiguous
    #[arg(short, long)]
    interactive: bool,

    /// Collect statistics on the genres found
    #[arg(short, long)]
    stats: bool,

    /// Skip releases tagged in earlier runs
    #[arg(short = 'c', long)]
    use_cache: bool,

    /// Max. number of genre tags
    #[arg(short = 'l', long, value_name = "N")]
    tag_limit: Option<usize>,

    /// Disable lookup on What.CD
    #[arg(long)]
    no_whatcd: bool,

    /// Disable lookup on Last.fm
    #[arg(long)]
    no_lastfm: bool,

    /// Disable lookup on MusicBrainz
    #[arg(long)]
    no_mbrainz: bool,

    /// Disable lookup on Discogs
    #[arg(long)]
    no_discogs: bool,

    /// Location of the configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Location of the cache
    #[arg(long, value_name = "PATH")]
    cache: Option<PathBuf>,
}

impl Cli {
    /// Command line flags win over the configuration file.
    fn apply(&self, config: &mut AppConfig) {
        if self.verbose {
            config.telemetry.log_level = "debug".to_string();
        }
        config.run.dry_run |= self.dry_run;
        config.run.tag_release |= self.tag_release;
        config.run.interactive |= self.interactive;
        config.run.stats |= self.stats;
        config.run.use_cache |= self.use_cache;
        if let Some(limit) = self.tag_limit {
            config.genres.limit = limit;
        }
        if let Some(cache) = &self.cache {
            config.run.cache_path = cache.clone();
        }

        let disabled = [
            (SourceKind::WhatCd, self.no_whatcd),
            (SourceKind::LastFm, self.no_lastfm),
            (SourceKind::MusicBrainz, self.no_mbrainz),
            (SourceKind::Discogs, self.no_discogs),
        ];
        for (kind, off) in disabled {
            if off {
                config.sources.set_enabled(kind, false);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    cli.apply(&mut config);
    init_tracing(&config.telemetry.log_level);
    config.validate()?;

    let resolver: Arc<dyn CandidateResolver> = if config.run.interactive {
        Arc::new(PromptResolver::stdio())
    } else {
        Arc::new(FailOnAmbiguity)
    };
    let aggregator = Aggregator::from_config(&config, resolver)?;

    let mut runner = BatchRunner::new(
        aggregator,
        Arc::new(AudioFileLibrary),
        BatchOptions::from(&config.run),
    );
    if config.run.use_cache {
        runner = runner.with_cache(ReleaseCache::load(&config.run.cache_path)?);
    }
    tokio::spawn(cancel_on_interrupt(runner.cancel_flag()));

    let releases = find_release_dirs(&cli.paths);
    println!("Found {} folders with possible releases!", releases.len());

    let summary = runner.run(&releases).await;
    println!("{}", format_summary(&summary));
    Ok(())
}

fn init_tracing(level: &str) {
    let fmt_layer = fmt::layer().with_target(true).with_level(true);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Let the release in progress finish, then stop.
async fn cancel_on_interrupt(cancel: Arc<AtomicBool>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!(target: "cli", "interrupt received, stopping after the current release");
            cancel.store(true, Ordering::SeqCst);
        }
        Err(error) => warn!(target: "cli", %error, "could not listen for interrupts"),
    }
}

fn format_summary(summary: &BatchSummary) -> String {
    let mut lines = Vec::new();
    if summary.cancelled {
        lines.push("Cancelled.".to_string());
    } else {
        lines.push("All done!".to_string());
    }
    lines.push(format!(
        "Processed {} of {} releases ({} from cache, {} with genres).",
        summary.processed, summary.found, summary.skipped, summary.tagged
    ));

    if let Some(stats) = &summary.stats {
        lines.push(stats.to_string());
        lines.push(format!("Time elapsed: {}", format_elapsed(stats.elapsed())));
    }

    if !summary.failed.is_empty() {
        lines.push("Releases with errors:".to_string());
        for failed in &summary.failed {
            lines.push(format!("{}: {}", failed.path.display(), failed.reason));
        }
    }
    lines.join("\n")
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use genrify_application::{FailedRelease, TagStats};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("valid arguments")
    }

    #[test]
    fn test_requires_a_path() {
        assert!(Cli::try_parse_from(["genrify"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = parse(&[
            "genrify", "-v", "-n", "-i", "-s", "-c", "-l", "6", "--no-discogs", "--no-lastfm",
            "--cache", "/tmp/genrify.json", "/music",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.telemetry.log_level, "debug");
        assert!(config.run.dry_run);
        assert!(config.run.interactive);
        assert!(config.run.stats);
        assert!(config.run.use_cache);
        assert!(!config.run.tag_release);
        assert_eq!(config.genres.limit, 6);
        assert_eq!(config.run.cache_path, PathBuf::from("/tmp/genrify.json"));
        assert_eq!(
            config.sources.enabled_in_order(),
            vec![SourceKind::WhatCd, SourceKind::MusicBrainz]
        );
        assert_eq!(cli.paths, vec![PathBuf::from("/music")]);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = parse(&["genrify", "/a", "/b"]);
        let mut config = AppConfig::default();
        config.run.tag_release = true;
        cli.apply(&mut config);

        assert!(config.run.tag_release);
        assert_eq!(config.genres.limit, 4);
        assert_eq!(config.sources.enabled_in_order(), SourceKind::ALL.to_vec());
    }

    #[test]
    fn test_summary_lists_failures_and_stats() {
        let mut stats = TagStats::new();
        stats.add(&["Rock".to_string()]);
        let summary = BatchSummary {
            found: 3,
            processed: 2,
            skipped: 1,
            tagged: 1,
            failed: vec![FailedRelease {
                path: PathBuf::from("/music/broken"),
                reason: "no audio tracks found".to_string(),
            }],
            cancelled: false,
            stats: Some(stats),
        };

        let text = format_summary(&summary);
        assert!(text.starts_with("All done!"));
        assert!(text.contains("Processed 2 of 3 releases (1 from cache, 1 with genres)."));
        assert!(text.contains("Tag statistics: Rock: 1"));
        assert!(text.ends_with("Releases with errors:\n/music/broken: no audio tracks found"));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1:02:05");
    }
}
