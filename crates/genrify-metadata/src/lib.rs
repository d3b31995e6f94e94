// SPDX-License-Identifier: GPL-3.0-or-later

//! HTTP clients for the metadata sources genre tags are collected from.
//!
//! Each client speaks one source's protocol and returns its tag data in a
//! lightly parsed form. Scoring happens elsewhere.

pub mod discogs;
mod lenient;
pub mod lastfm;
pub mod musicbrainz;
pub mod rate_limiter;
pub mod whatcd;

pub use rate_limiter::RateLimiter;

/// User agent sent to every source.
pub const USER_AGENT: &str = concat!(
    "genrify/",
    env!("CARGO_PKG_VERSION"),
    " ( https://github.com/genrify/genrify )"
);

/// A tag name with its occurrence count, as returned by weighted sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub name: String,
    pub count: u64,
}

impl TagCount {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}
