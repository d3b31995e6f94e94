// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// How often each genre was selected during a batch.
#[derive(Debug, Clone)]
pub struct TagStats {
    counts: HashMap<String, u64>,
    started: Instant,
}

impl Default for TagStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TagStats {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            started: Instant::now(),
        }
    }

    pub fn add(&mut self, genres: &[String]) {
        for genre in genres {
            *self.counts.entry(genre.clone()).or_insert(0) += 1;
        }
    }

    /// Counts, most frequent first; ties ordered by name, descending.
    pub fn sorted(&self) -> Vec<(String, u64)> {
        let mut counts: Vec<(String, u64)> = self
            .counts
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        counts
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl fmt::Display for TagStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<String> = self
            .sorted()
            .into_iter()
            .map(|(name, count)| format!("{}: {}", name, count))
            .collect();
        write!(f, "Tag statistics: {}", counts.join(", "))
    }
}
