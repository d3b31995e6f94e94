// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("cache format error: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    releases: BTreeSet<String>,
}

/// Set of release directories that were already tagged, kept as JSON.
#[derive(Debug)]
pub struct ReleaseCache {
    path: PathBuf,
    releases: BTreeSet<String>,
    dirty: bool,
}

impl ReleaseCache {
    /// Load the cache at `path`. A missing file is an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let releases = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<CacheFile>(&content)?.releases,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(target: "cache", path = %path.display(), "no cache yet");
                BTreeSet::new()
            }
            Err(error) => return Err(error.into()),
        };
        info!(target: "cache", path = %path.display(), entries = releases.len(), "cache loaded");

        Ok(Self {
            path,
            releases,
            dirty: false,
        })
    }

    pub fn contains(&self, release: &Path) -> bool {
        self.releases.contains(&key(release))
    }

    pub fn insert(&mut self, release: &Path) {
        self.dirty |= self.releases.insert(key(release));
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Write the cache back if anything was added.
    pub fn save(&mut self) -> Result<(), CacheError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = CacheFile {
            releases: self.releases.clone(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        self.dirty = false;
        debug!(target: "cache", path = %self.path.display(), entries = self.releases.len(), "cache saved");
        Ok(())
    }
}

fn key(release: &Path) -> String {
    release.to_string_lossy().into_owned()
}
