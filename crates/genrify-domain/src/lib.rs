// SPDX-License-Identifier: GPL-3.0-or-later
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Sources
// ============================================================================

/// A metadata source that can contribute genre tags for a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    WhatCd,
    LastFm,
    MusicBrainz,
    Discogs,
}

impl SourceKind {
    /// All sources in their default query order.
    pub const ALL: [SourceKind; 4] = [
        SourceKind::WhatCd,
        SourceKind::LastFm,
        SourceKind::MusicBrainz,
        SourceKind::Discogs,
    ];

    /// Fixed reliability weight applied to everything this source contributes.
    pub fn score_multiplier(&self) -> f64 {
        match self {
            Self::WhatCd => 1.5,
            Self::LastFm => 0.7,
            Self::MusicBrainz => 0.8,
            Self::Discogs => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WhatCd => "whatcd",
            Self::LastFm => "lastfm",
            Self::MusicBrainz => "musicbrainz",
            Self::Discogs => "discogs",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::WhatCd => "What.CD",
            Self::LastFm => "Last.fm",
            Self::MusicBrainz => "MusicBrainz",
            Self::Discogs => "Discogs",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Releases
// ============================================================================

/// Everything the sources are queried with for one release.
///
/// Built once per release and never mutated afterwards. For various-artists
/// releases `artist` is empty and artist-level lookups are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReleaseQuery {
    pub artist: String,
    pub album: String,
    pub year: Option<i32>,
    pub various_artists: bool,
    /// MusicBrainz artist id, carried through untouched.
    pub musicbrainz_artist_id: Option<String>,
    /// MusicBrainz release group id, carried through untouched.
    pub musicbrainz_release_group_id: Option<String>,
}

impl ReleaseQuery {
    pub fn new(artist: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            album: album.into(),
            ..Default::default()
        }
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn various_artists(mut self) -> Self {
        self.various_artists = true;
        self.artist.clear();
        self
    }

    /// Short label used in log lines and prompts.
    pub fn label(&self) -> String {
        if self.various_artists {
            format!("VA - {}", self.album)
        } else {
            format!("{} - {}", self.artist, self.album)
        }
    }
}

/// Tag metadata read from a single audio file of a release.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub path: PathBuf,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub date: Option<String>,
    pub musicbrainz_artist_id: Option<String>,
    pub musicbrainz_release_group_id: Option<String>,
}

// ============================================================================
// Disambiguation
// ============================================================================

/// One entry of a multi-result album search, offered for disambiguation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub release_type: Option<String>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Whether this candidate lies within `tolerance` years of `year`.
    ///
    /// Candidates without a year never match.
    pub fn near_year(&self, year: i32, tolerance: i32) -> bool {
        self.year
            .map(|candidate| (candidate - year).abs() <= tolerance)
            .unwrap_or(false)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(artist) = &self.artist {
            write!(f, "{} - ", artist)?;
        }
        write!(f, "{}", self.title)?;
        match self.year {
            Some(year) => write!(f, " [{}]", year)?,
            None => write!(f, " [?]")?,
        }
        if let Some(release_type) = &self.release_type {
            write!(f, " [{}]", release_type)?;
        }
        write!(f, " [#{}]", self.id)
    }
}
