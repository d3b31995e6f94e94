// SPDX-License-Identifier: GPL-3.0-or-later

use genrify_metadata::discogs::DiscogsError;
use genrify_metadata::lastfm::LastFmError;
use genrify_metadata::musicbrainz::MusicBrainzError;
use genrify_metadata::whatcd::WhatCdError;
use thiserror::Error;

/// Recoverable failure of one source for one release.
///
/// Never aborts a release: the aggregator records it and moves on to the
/// next source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The source had nothing usable for this lookup.
    #[error("no tags for {0} found")]
    NoTags(&'static str),

    /// Several candidates remained and nobody picked one.
    #[error("too many ({0}) album results (use --interactive)")]
    TooManyResults(usize),

    /// Network, HTTP, authentication or payload failure.
    #[error("error while requesting: {0}")]
    Transport(String),
}

/// Result type for source lookups.
pub type ProviderResult<T> = Result<T, ProviderError>;

impl From<WhatCdError> for ProviderError {
    fn from(error: WhatCdError) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<LastFmError> for ProviderError {
    fn from(error: LastFmError) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<MusicBrainzError> for ProviderError {
    fn from(error: MusicBrainzError) -> Self {
        match error {
            MusicBrainzError::NotFound(_) => Self::NoTags("release"),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<DiscogsError> for ProviderError {
    fn from(error: DiscogsError) -> Self {
        Self::Transport(error.to_string())
    }
}

/// Failure that sinks a whole release, but never the batch.
#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("no audio tracks found")]
    NoTracks,

    #[error("missing {field} tag in {path}")]
    MissingTag { field: &'static str, path: String },

    #[error("not all tracks have the same album tag")]
    InconsistentAlbum,

    #[error("error loading metadata for {path}: {message}")]
    Read { path: String, message: String },

    #[error("error saving metadata for {path}: {message}")]
    Save { path: String, message: String },
}
