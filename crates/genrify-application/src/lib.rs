// SPDX-License-Identifier: GPL-3.0-or-later

//! Genre aggregation: providers, disambiguation, per-release aggregation
//! and the batch run around it.

pub mod aggregator;
pub mod batch;
pub mod cache;
pub mod disambiguation;
pub mod error;
pub mod library;
pub mod providers;
pub mod query;
pub mod release;
pub mod stats;

pub use aggregator::{Aggregator, ReleaseGenres, Reporter, SourceFailure, TracingReporter};
pub use batch::{BatchOptions, BatchRunner, BatchSummary, FailedRelease};
pub use cache::{CacheError, ReleaseCache};
pub use disambiguation::{CandidateResolver, Choice, Disambiguator, FailOnAmbiguity, PromptResolver};
pub use error::{ProviderError, ProviderResult, ReleaseError};
pub use library::{find_release_dirs, AudioFileLibrary, ReleaseDir, ReleaseLibrary};
pub use providers::{build_providers, SourceReport, TagProvider};
pub use release::build_release_query;
pub use stats::TagStats;
