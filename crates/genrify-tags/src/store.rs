// SPDX-License-Identifier: GPL-3.0-or-later

use crate::normalize::{is_acceptable, normalize, similarity};
use crate::vocabulary::{
    BASE_GENRES, BASE_SEED_SCORE, EXTENDED_GENRES, EXTENDED_SEED_SCORE, PREFERENCE_SEED_SCORE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Multiplier applied to incoming scores for boosted genres.
const BOOST_FACTOR: f64 = 1.2;

/// Multiplier applied to incoming scores for penalized genres.
const PENALTY_FACTOR: f64 = 0.8;

/// Per-tag decay for lists that carry no counts.
const UNWEIGHTED_DECAY: f64 = 0.85;

/// Counts below this share of the list maximum are dropped as noise.
const WEIGHTED_CUTOFF: f64 = 0.1;

/// Tunable constants of the merge and selection rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringSettings {
    /// Minimum similarity for two tags to be treated as the same genre.
    pub fuzzy_threshold: f64,
    /// Factor applied to the summed score whenever two tags merge.
    pub merge_bonus: f64,
    /// Tags must score strictly above this to be selected.
    pub selection_threshold: f64,
    /// Tags must score strictly above this to show up in [`TagStore::debug_list`].
    pub debug_threshold: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.875,
            merge_bonus: 1.05,
            selection_threshold: 0.69,
            debug_threshold: 0.4,
        }
    }
}

/// Operator supplied genre lists. All comparisons ignore case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreLists {
    /// When non-empty, only these genres are ever selected.
    pub whitelist: Vec<String>,
    /// Genres never selected. Ignored while a whitelist is set.
    pub blacklist: Vec<String>,
    /// Genres written fully upper-case ("IDM", "UK").
    pub uppercase: Vec<String>,
    /// Genres whose merged contributions are boosted.
    pub score_up: Vec<String>,
    /// Genres whose merged contributions are penalized.
    pub score_down: Vec<String>,
}

/// Raw tag data as a source returns it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTags {
    /// Ordered tag names without counts.
    Unweighted(Vec<String>),
    /// Tag names with occurrence counts, in source order.
    Weighted(Vec<(String, u64)>),
}

impl RawTags {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Unweighted(names) => names.is_empty(),
            Self::Weighted(counts) => counts.is_empty(),
        }
    }
}

/// A canonical tag name and its accumulated score.
#[derive(Debug, Clone, PartialEq)]
pub struct TagEntry {
    pub name: String,
    pub score: f64,
}

/// Accumulated genre scores for one release.
///
/// Entries keep their insertion order; the first spelling seen for a fuzzy
/// cluster stays the canonical name. A store must not outlive the release it
/// was created for.
#[derive(Debug, Clone)]
pub struct TagStore {
    entries: Vec<TagEntry>,
    lists: GenreLists,
    settings: ScoringSettings,
}

impl TagStore {
    /// Create an empty store.
    pub fn new(lists: GenreLists, settings: ScoringSettings) -> Self {
        Self {
            entries: Vec::new(),
            lists,
            settings,
        }
    }

    /// Create a store pre-populated with the genre vocabulary and the
    /// operator's boost and penalty lists.
    ///
    /// Seeds only fix canonical spellings and nudge scores; none of them is
    /// high enough to be selected on its own.
    pub fn seeded(lists: GenreLists, settings: ScoringSettings) -> Self {
        let mut store = Self::new(lists, settings);
        store.seed(BASE_GENRES.iter().copied(), BASE_SEED_SCORE);
        store.seed(EXTENDED_GENRES.iter().copied(), EXTENDED_SEED_SCORE);

        let score_up = store.lists.score_up.clone();
        let score_down = store.lists.score_down.clone();
        store.seed(score_up.iter().map(String::as_str), PREFERENCE_SEED_SCORE);
        store.seed(score_down.iter().map(String::as_str), -PREFERENCE_SEED_SCORE);
        store
    }

    pub fn settings(&self) -> &ScoringSettings {
        &self.settings
    }

    pub fn lists(&self) -> &GenreLists {
        &self.lists
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current score of a canonical tag name.
    pub fn score(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.score)
    }

    pub fn entries(&self) -> &[TagEntry] {
        &self.entries
    }

    /// Add a single tag. Returns `false` when the tag was rejected.
    pub fn add(&mut self, name: &str, score: f64) -> bool {
        if !is_acceptable(name, score) {
            trace!(target: "tags", tag = name, score, "tag rejected");
            return false;
        }

        let normalized = normalize(name, &self.lists.uppercase);
        match self.closest(&normalized) {
            Some((index, ratio)) => {
                let canonical = self.entries[index].name.clone();
                let incoming = if contains(&self.lists.score_up, &canonical) {
                    score * BOOST_FACTOR
                } else if contains(&self.lists.score_down, &canonical) {
                    score * PENALTY_FACTOR
                } else {
                    score
                };

                let entry = &mut self.entries[index];
                entry.score = (entry.score + incoming) * self.settings.merge_bonus;
                if ratio < 1.0 {
                    debug!(
                        target: "tags",
                        tag = %normalized,
                        canonical = %entry.name,
                        score = entry.score,
                        "merged into existing tag"
                    );
                }
            }
            None => {
                trace!(target: "tags", tag = %normalized, score, "new tag");
                self.entries.push(TagEntry {
                    name: normalized,
                    score,
                });
            }
        }
        true
    }

    /// Add every name with the same score.
    pub fn add_many<I, S>(&mut self, names: I, score: f64)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.add(name.as_ref(), score);
        }
    }

    /// Add tags that carry occurrence counts.
    ///
    /// Counts below 10% of the largest count are dropped; the rest score
    /// `count / max * multiplier`.
    pub fn add_many_weighted<S: AsRef<str>>(&mut self, tags: &[(S, u64)], multiplier: f64) {
        let Some(top) = tags.iter().map(|(_, count)| *count).max() else {
            return;
        };
        let top = top.max(1) as f64;

        for (name, count) in tags {
            let count = *count as f64;
            if count < top * WEIGHTED_CUTOFF {
                trace!(target: "tags", tag = name.as_ref(), count, "below count cutoff");
                continue;
            }
            self.add(name.as_ref(), count / top * multiplier);
        }
    }

    /// Add tags without counts. Every tag scores
    /// `0.85^(n - 1) * multiplier`, so long lists weigh less per tag.
    pub fn add_many_unweighted<S: AsRef<str>>(&mut self, names: &[S], multiplier: f64) {
        if names.is_empty() {
            return;
        }
        self.add_many(names, unweighted_score(names.len(), multiplier));
    }

    /// Route raw source data to the matching ingestion path.
    pub fn ingest(&mut self, tags: &RawTags, multiplier: f64) {
        match tags {
            RawTags::Unweighted(names) => self.add_many_unweighted(names, multiplier),
            RawTags::Weighted(counts) => self.add_many_weighted(counts, multiplier),
        }
    }

    /// The final genre list: at most `limit` names scoring above the
    /// selection threshold, best first, after white/blacklist filtering.
    pub fn select(&self, limit: usize) -> Vec<String> {
        let mut selected: Vec<&TagEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.score > self.settings.selection_threshold)
            .filter(|entry| self.allowed(&entry.name))
            .collect();

        // stable sort: equal scores keep insertion order
        selected.sort_by(|a, b| b.score.total_cmp(&a.score));
        selected
            .into_iter()
            .take(limit)
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Every tag above the debug threshold, best first.
    pub fn debug_list(&self) -> Vec<(String, f64)> {
        let mut good: Vec<(String, f64)> = self
            .entries
            .iter()
            .filter(|entry| entry.score > self.settings.debug_threshold)
            .map(|entry| (entry.name.clone(), entry.score))
            .collect();
        good.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        good
    }

    fn allowed(&self, name: &str) -> bool {
        if !self.lists.whitelist.is_empty() {
            contains(&self.lists.whitelist, name)
        } else {
            !contains(&self.lists.blacklist, name)
        }
    }

    /// Index and similarity of the best fuzzy match at or above the threshold.
    /// Equal similarities resolve to the lexicographically greater name.
    fn closest(&self, name: &str) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            let ratio = similarity(name, &entry.name);
            if ratio < self.settings.fuzzy_threshold {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_index, best_ratio)) => {
                    ratio > best_ratio
                        || (ratio == best_ratio && entry.name > self.entries[best_index].name)
                }
            };
            if better {
                best = Some((index, ratio));
            }
        }
        best
    }

    fn seed<'a>(&mut self, names: impl Iterator<Item = &'a str>, score: f64) {
        for name in names {
            let normalized = normalize(name, &self.lists.uppercase);
            match self.closest(&normalized) {
                Some((index, _)) => self.entries[index].score += score,
                None => self.entries.push(TagEntry {
                    name: normalized,
                    score,
                }),
            }
        }
    }
}

/// Per-tag score of an unweighted list of `len` tags.
pub fn unweighted_score(len: usize, multiplier: f64) -> f64 {
    let exponent = len.saturating_sub(1) as i32;
    UNWEIGHTED_DECAY.powi(exponent) * multiplier
}

fn contains(list: &[String], name: &str) -> bool {
    list.iter().any(|entry| entry.trim().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn bare() -> TagStore {
        TagStore::new(GenreLists::default(), ScoringSettings::default())
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_same_tag_twice_merges_with_bonus() {
        let mut store = bare();
        store.add("Shoegaze", 0.8);
        store.add("Shoegaze", 0.8);

        assert_eq!(store.len(), 1);
        assert_close(store.score("Shoegaze").unwrap(), (0.8 + 0.8) * 1.05);
    }

    #[test]
    fn test_decade_tags_never_stored() {
        let mut store = bare();
        assert!(!store.add("1990", 5.0));
        assert!(!store.add("90s", 5.0));
        assert!(store.is_empty());
    }

    #[test]
    fn test_boost_applies_before_merge_bonus() {
        let lists = GenreLists {
            score_up: vec!["Soundtrack".to_string()],
            ..Default::default()
        };
        let mut store = TagStore::new(lists, ScoringSettings::default());

        store.add("Soundtrack", 0.5);
        assert_close(store.score("Soundtrack").unwrap(), 0.5);

        store.add("soundtrack", 0.5);
        assert_close(store.score("Soundtrack").unwrap(), 1.155);
    }

    #[test]
    fn test_penalty_applies_before_merge_bonus() {
        let lists = GenreLists {
            score_down: vec!["Indie".to_string()],
            ..Default::default()
        };
        let mut store = TagStore::new(lists, ScoringSettings::default());

        store.add("Indie", 1.0);
        store.add("indie", 1.0);
        assert_close(store.score("Indie").unwrap(), (1.0 + 0.8) * 1.05);
    }

    #[test]
    fn test_first_spelling_stays_canonical() {
        let mut store = bare();
        store.add("Shoegazer", 1.0);
        store.add("shoegaze", 1.0);

        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].name, "Shoegazer");
    }

    #[test]
    fn test_plural_variants_merge() {
        for (singular, plural) in [("Rock", "Rocks"), ("Metal", "Metals"), ("Punk", "Punks")] {
            let mut store = bare();
            store.add(singular, 1.0);
            store.add(plural, 1.0);

            assert_eq!(store.len(), 1, "{plural} should merge into {singular}");
            assert_close(store.score(singular).unwrap(), 2.0 * 1.05);
        }
    }

    #[test]
    fn test_equally_close_tags_merge_into_greater_name() {
        let mut store = bare();
        store.add("Rocks", 1.0);
        store.add("Rocky", 1.0);
        store.add("Rock", 1.0);

        assert_eq!(store.len(), 2);
        assert_close(store.score("Rocks").unwrap(), 1.0);
        assert_close(store.score("Rocky").unwrap(), 2.0 * 1.05);
    }

    #[test]
    fn test_synonym_variants_merge() {
        let mut store = bare();
        store.add("Hip Hop", 1.0);
        store.add("hiphop", 1.0);
        store.add("Hip-Hop", 1.0);

        assert_eq!(store.len(), 1);
        assert_close(
            store.score("Hip-Hop").unwrap(),
            ((1.0 + 1.0) * 1.05 + 1.0) * 1.05,
        );
    }

    #[test]
    fn test_unweighted_decay() {
        assert_close(unweighted_score(3, 1.0), 0.7225);
        assert_close(unweighted_score(1, 1.5), 1.5);

        let mut store = bare();
        store.add_many_unweighted(&["Ambient", "Blues", "Chanson"], 1.0);
        for name in ["Ambient", "Blues", "Chanson"] {
            assert_close(store.score(name).unwrap(), 0.7225);
        }
    }

    #[test]
    fn test_weighted_drops_long_tail() {
        let mut store = bare();
        store.add_many_weighted(&[("Noise", 100), ("Drone", 5)], 1.0);

        assert_close(store.score("Noise").unwrap(), 1.0);
        assert_eq!(store.score("Drone"), None);
    }

    #[test]
    fn test_weighted_scales_by_count() {
        let mut store = bare();
        store.add_many_weighted(&[("Jazz", 50), ("Swing", 25)], 0.8);

        assert_close(store.score("Jazz").unwrap(), 0.8);
        assert_close(store.score("Swing").unwrap(), 0.4);
    }

    #[test]
    fn test_weighted_all_zero_counts() {
        let mut store = bare();
        store.add_many_weighted(&[("Jazz", 0)], 1.0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_ingest_routes_by_shape() {
        let mut store = bare();
        store.ingest(&RawTags::Weighted(vec![("Rock".to_string(), 10)]), 1.0);
        store.ingest(&RawTags::Unweighted(vec!["Rock".to_string()]), 1.0);

        assert_eq!(store.len(), 1);
        assert_close(store.score("Rock").unwrap(), (1.0 + 1.0) * 1.05);
    }

    #[test]
    fn test_select_threshold_order_and_limit() {
        let mut store = bare();
        store.add("Rock", 0.7);
        store.add("Jazz", 2.0);
        store.add("Blues", 1.0);
        store.add("Funk", 0.69);
        store.add("Soul", 1.0);

        assert_eq!(store.select(10), vec!["Jazz", "Blues", "Soul", "Rock"]);
        assert_eq!(store.select(2), vec!["Jazz", "Blues"]);
        assert!(store.select(0).is_empty());
    }

    #[test]
    fn test_select_has_no_duplicates_and_is_sorted() {
        let mut store = bare();
        for (name, score) in [
            ("Rock", 1.0),
            ("rock", 0.9),
            ("Post-Rock", 0.8),
            ("Post Rock", 0.8),
            ("Ambient", 0.75),
        ] {
            store.add(name, score);
        }

        let selected = store.select(10);
        let mut deduped = selected.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), selected.len());

        let scores: Vec<f64> = selected
            .iter()
            .map(|name| store.score(name).unwrap())
            .collect();
        assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn test_whitelist_takes_precedence() {
        let lists = GenreLists {
            whitelist: vec!["Jazz".to_string()],
            blacklist: vec!["Jazz".to_string(), "Rock".to_string()],
            ..Default::default()
        };
        let mut store = TagStore::new(lists, ScoringSettings::default());
        store.add("Jazz", 1.0);
        store.add("Rock", 2.0);
        store.add("Blues", 3.0);

        assert_eq!(store.select(4), vec!["Jazz"]);
    }

    #[test]
    fn test_blacklist_filters() {
        let lists = GenreLists {
            blacklist: vec!["live".to_string()],
            ..Default::default()
        };
        let mut store = TagStore::new(lists, ScoringSettings::default());
        store.add("Live", 3.0);
        store.add("Rock", 1.0);

        assert_eq!(store.select(4), vec!["Rock"]);
    }

    #[test]
    fn test_uppercase_names_are_canonical() {
        let lists = GenreLists {
            uppercase: vec!["IDM".to_string()],
            ..Default::default()
        };
        let mut store = TagStore::new(lists, ScoringSettings::default());
        store.add("idm", 1.0);
        store.add("Idm", 1.0);

        assert_eq!(store.len(), 1);
        assert!(store.score("IDM").is_some());
    }

    #[test]
    fn test_seeded_vocabulary_is_never_selected_alone() {
        let lists = GenreLists {
            score_up: vec!["Soundtrack".to_string()],
            score_down: vec!["Electronic".to_string()],
            ..Default::default()
        };
        let store = TagStore::seeded(lists, ScoringSettings::default());

        assert!(store.len() > 100);
        assert!(store.select(10).is_empty());
        assert_close(store.score("Soundtrack").unwrap(), 0.25);
        assert_close(store.score("Electronic").unwrap(), -0.15);
        assert_close(store.score("Chillout").unwrap(), 0.1);
    }

    #[test]
    fn test_seeded_vocabulary_fixes_spelling() {
        let mut store = TagStore::seeded(GenreLists::default(), ScoringSettings::default());
        store.add("Britpop", 1.0);

        assert_close(store.score("Britpop").unwrap(), (0.05 + 1.0) * 1.05);
    }

    #[test]
    fn test_custom_threshold_and_bonus() {
        let settings = ScoringSettings {
            fuzzy_threshold: 1.0,
            merge_bonus: 1.0,
            ..Default::default()
        };
        let mut store = TagStore::new(GenreLists::default(), settings);
        store.add("Shoegaze", 1.0);
        store.add("Shoegazer", 1.0);
        store.add("Shoegaze", 1.0);

        assert_eq!(store.len(), 2);
        assert_close(store.score("Shoegaze").unwrap(), 2.0);
    }

    #[test]
    fn test_debug_list() {
        let mut store = bare();
        store.add("Rock", 0.5);
        store.add("Jazz", 0.3);
        store.add("Blues", 0.9);

        let names: Vec<String> = store.debug_list().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Blues", "Rock"]);
    }
}
