// SPDX-License-Identifier: GPL-3.0-or-later

//! Building a release's query from the tags of its tracks.

use crate::error::ReleaseError;
use genrify_domain::{ReleaseQuery, TrackMetadata};
use genrify_tags::similarity;

/// Tracks whose tags are less similar than this differ.
const SAME_VALUE_SIMILARITY: f64 = 0.9;

/// Derive the query for a release from its tracks.
///
/// All tracks must share (nearly) the same album tag. Differing artist tags
/// mark the release as various artists. The year is read from the first
/// four characters of the first track's date.
pub fn build_release_query(tracks: &[TrackMetadata]) -> Result<ReleaseQuery, ReleaseError> {
    let first = tracks.first().ok_or(ReleaseError::NoTracks)?;
    let album = required(first, "album", &first.album)?;
    let artist = required(first, "artist", &first.artist)?;

    let mut various_artists = false;
    for track in &tracks[1..] {
        let other_album = required(track, "album", &track.album)?;
        if similarity(album, other_album) < SAME_VALUE_SIMILARITY {
            return Err(ReleaseError::InconsistentAlbum);
        }
        let other_artist = required(track, "artist", &track.artist)?;
        if similarity(artist, other_artist) < SAME_VALUE_SIMILARITY {
            various_artists = true;
        }
    }

    let mut query = ReleaseQuery::new(artist, album);
    if various_artists {
        query = query.various_artists();
    }
    query.year = first.date.as_deref().and_then(parse_year);
    query.musicbrainz_artist_id = first.musicbrainz_artist_id.clone();
    query.musicbrainz_release_group_id = first.musicbrainz_release_group_id.clone();
    Ok(query)
}

fn required<'a>(
    track: &TrackMetadata,
    field: &'static str,
    value: &'a Option<String>,
) -> Result<&'a str, ReleaseError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ReleaseError::MissingTag {
            field,
            path: track.path.display().to_string(),
        })
}

fn parse_year(date: &str) -> Option<i32> {
    let prefix: String = date.trim().chars().take(4).collect();
    if prefix.len() == 4 {
        prefix.parse().ok()
    } else {
        None
    }
}
