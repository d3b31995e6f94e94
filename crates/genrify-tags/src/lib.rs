// SPDX-License-Identifier: GPL-3.0-or-later

//! Genre tag aggregation and scoring.
//!
//! A [`TagStore`] collects free-text tags for a single release from several
//! sources, folds spelling variants of the same genre into one entry through
//! fuzzy matching, and selects the best scoring genres at the end.

pub mod normalize;
pub mod store;
pub mod vocabulary;

pub use normalize::{is_acceptable, normalize, similarity, title_case};
pub use store::{GenreLists, RawTags, ScoringSettings, TagEntry, TagStore};
