// SPDX-License-Identifier: GPL-3.0-or-later

//! Finding releases on disk and reading/writing their audio tags.

use crate::error::ReleaseError;
use genrify_domain::TrackMetadata;
use lofty::config::WriteOptions;
use lofty::file::FileType;
use lofty::prelude::*;
use lofty::tag::{ItemValue, Tag, TagItem};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File extensions a release directory is recognised by.
pub const AUDIO_EXTENSIONS: &[&str] = &["flac", "ogg", "mp3"];

const RELEASE_TYPE_KEY: &str = "RELEASETYPE";

/// A directory holding one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDir {
    pub path: PathBuf,
    /// Lower-cased extension shared by all `tracks`.
    pub extension: String,
    pub tracks: Vec<PathBuf>,
}

impl ReleaseDir {
    /// Whether the tracks can carry a release type tag.
    pub fn supports_release_type(&self) -> bool {
        matches!(self.extension.as_str(), "flac" | "ogg")
    }
}

/// Every directory below `roots` containing audio files.
///
/// The first audio extension found in a directory (by file name order)
/// decides which of its files belong to the release.
pub fn find_release_dirs(roots: &[PathBuf]) -> Vec<ReleaseDir> {
    let mut by_dir: BTreeMap<PathBuf, Vec<(String, PathBuf)>> = BTreeMap::new();

    for root in roots {
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!(
                        target: "library",
                        root = %root.display(),
                        %error,
                        "skipping unreadable entry"
                    );
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(extension) = audio_extension(entry.path()) else {
                continue;
            };
            if let Some(parent) = entry.path().parent() {
                by_dir
                    .entry(parent.to_path_buf())
                    .or_default()
                    .push((extension, entry.path().to_path_buf()));
            }
        }
    }

    by_dir
        .into_iter()
        .filter_map(|(path, files)| {
            let extension = files.first()?.0.clone();
            let tracks = files
                .into_iter()
                .filter(|(ext, _)| *ext == extension)
                .map(|(_, file)| file)
                .collect();
            Some(ReleaseDir {
                path,
                extension,
                tracks,
            })
        })
        .collect()
}

fn audio_extension(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    AUDIO_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Access to the tags of a release's tracks.
pub trait ReleaseLibrary: Send + Sync {
    fn read_tracks(&self, release: &ReleaseDir) -> Result<Vec<TrackMetadata>, ReleaseError>;

    /// Replace the genre tags of every track and, when given, set the
    /// release type.
    fn write_genres(
        &self,
        release: &ReleaseDir,
        genres: &[String],
        release_type: Option<&str>,
    ) -> Result<(), ReleaseError>;
}

/// [`ReleaseLibrary`] backed by the audio files' own tags.
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioFileLibrary;

impl AudioFileLibrary {
    fn read_track(path: &Path) -> Result<TrackMetadata, ReleaseError> {
        let tagged_file = lofty::read_from_path(path).map_err(|error| ReleaseError::Read {
            path: path.display().to_string(),
            message: error.to_string(),
        })?;

        let mut track = TrackMetadata {
            path: path.to_path_buf(),
            ..Default::default()
        };
        let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
            return Ok(track);
        };

        track.artist = tag.artist().map(|value| value.to_string());
        track.album = tag.album().map(|value| value.to_string());
        track.date = tag
            .get_string(&ItemKey::RecordingDate)
            .or_else(|| tag.get_string(&ItemKey::Year))
            .map(str::to_string);
        track.musicbrainz_artist_id = tag
            .get_string(&ItemKey::MusicBrainzArtistId)
            .map(str::to_string);
        track.musicbrainz_release_group_id = tag
            .get_string(&ItemKey::MusicBrainzReleaseGroupId)
            .map(str::to_string);
        Ok(track)
    }

    fn write_track(
        path: &Path,
        genres: &[String],
        release_type: Option<&str>,
    ) -> Result<(), ReleaseError> {
        let save_error = |message: String| ReleaseError::Save {
            path: path.display().to_string(),
            message,
        };

        let mut tagged_file =
            lofty::read_from_path(path).map_err(|error| save_error(error.to_string()))?;
        let file_type = tagged_file.file_type();
        let tag_type = tagged_file.primary_tag_type();

        if tagged_file.primary_tag_mut().is_none() {
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged_file
            .primary_tag_mut()
            .ok_or_else(|| save_error(format!("{:?} files cannot hold tags", file_type)))?;

        if !genres.is_empty() {
            tag.remove_key(&ItemKey::Genre);
            for genre in genres {
                tag.push(TagItem::new(ItemKey::Genre, ItemValue::Text(genre.clone())));
            }
        }
        if let Some(release_type) = release_type {
            if matches!(file_type, FileType::Flac | FileType::Vorbis) {
                tag.insert_text(
                    ItemKey::Unknown(RELEASE_TYPE_KEY.to_string()),
                    release_type.to_string(),
                );
            }
        }

        tag.save_to_path(path, WriteOptions::default())
            .map_err(|error| save_error(error.to_string()))
    }
}

impl ReleaseLibrary for AudioFileLibrary {
    fn read_tracks(&self, release: &ReleaseDir) -> Result<Vec<TrackMetadata>, ReleaseError> {
        release
            .tracks
            .iter()
            .map(|path| Self::read_track(path))
            .collect()
    }

    fn write_genres(
        &self,
        release: &ReleaseDir,
        genres: &[String],
        release_type: Option<&str>,
    ) -> Result<(), ReleaseError> {
        debug!(
            target: "library",
            release = %release.path.display(),
            tracks = release.tracks.len(),
            "saving metadata"
        );
        let release_type = release_type.filter(|_| release.supports_release_type());
        for track in &release.tracks {
            Self::write_track(track, genres, release_type)?;
        }
        Ok(())
    }
}
