// SPDX-License-Identifier: GPL-3.0-or-later

//! Tag name validation and canonical spelling.

use lazy_static::lazy_static;
use regex::Regex;

/// Shortest accepted tag name, in characters.
pub const MIN_TAG_LEN: usize = 2;

/// Longest accepted tag name, in characters.
pub const MAX_TAG_LEN: usize = 20;

/// Scores at or below this value are ignored by [`crate::TagStore::add`].
pub const MIN_TAG_SCORE: f64 = 0.05;

/// Spelling variants rewritten before a tag is stored. Applied in order,
/// on the lower-cased name.
const SYNONYMS: &[(&str, &str)] = &[
    ("deutsch", "german"),
    ("dnb", "d&b"),
    ("france", "french"),
    ("hiphop", "hip-hop"),
    ("hip hop", "hip-hop"),
    ("lo fi", "lo-fi"),
    ("prog ", "progressive "),
    ("rnb", "r&b"),
    ("rhythm and blues", "r&b"),
    ("rhythm & blues", "r&b"),
    ("scifi", "science fiction"),
    ("triphop", "trip-hop"),
    ("trip hop", "trip-hop"),
    ("tv soundtrack", "soundtrack"),
    (" and ", " & "),
];

/// Whether a raw tag is worth considering at all.
///
/// Rejects names outside 2..=20 characters, names starting with a year or
/// decade ("90s", "1990", "80s synth") and scores at or below 0.05.
pub fn is_acceptable(name: &str, score: f64) -> bool {
    lazy_static! {
        static ref DECADE_REGEX: Regex =
            Regex::new(r"^([0-9]{2}){1,2}s?").expect("valid decade regex");
    }

    let len = name.chars().count();
    (MIN_TAG_LEN..=MAX_TAG_LEN).contains(&len)
        && !DECADE_REGEX.is_match(name)
        && score > MIN_TAG_SCORE
}

/// Canonical spelling of a tag: synonyms replaced, title-cased, and fully
/// upper-cased when listed in `uppercase`.
pub fn normalize(name: &str, uppercase: &[String]) -> String {
    let mut lowered = name.trim().to_lowercase();
    for (from, to) in SYNONYMS {
        if lowered.contains(from) {
            lowered = lowered.replace(from, to);
        }
    }

    let titled = title_case(&lowered);
    if uppercase
        .iter()
        .any(|entry| entry.trim().eq_ignore_ascii_case(&titled))
    {
        titled.to_uppercase()
    } else {
        titled
    }
}

/// Upper-cases every letter that follows a non-letter and lower-cases the rest.
///
/// `"hip-hop"` becomes `"Hip-Hop"`, `"r&b"` becomes `"R&B"`.
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut previous_is_letter = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }
    result
}

/// Similarity ratio in `0.0..=1.0` used for fuzzy merging.
///
/// Ratcliff/Obershelp: `2 * M / T`, where `M` counts the characters of the
/// matching blocks found by repeatedly taking the longest common substring
/// and recursing on both sides of it, and `T` is the combined length. Two
/// empty strings are identical.
pub fn similarity(left: &str, right: &str) -> f64 {
    let left: Vec<char> = left.chars().collect();
    let right: Vec<char> = right.chars().collect();
    let total = left.len() + right.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&left, &right) as f64 / total as f64
}

fn matching_chars(left: &[char], right: &[char]) -> usize {
    let (i, j, size) = longest_match(left, right);
    if size == 0 {
        return 0;
    }
    size + matching_chars(&left[..i], &right[..j])
        + matching_chars(&left[i + size..], &right[j + size..])
}

/// Start in `left`, start in `right` and length of the longest common block.
/// Ties go to the block starting earliest in `left`, then in `right`.
fn longest_match(left: &[char], right: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    // suffix[j + 1]: common suffix length of the previous row and right[..=j]
    let mut suffix = vec![0usize; right.len() + 1];
    for (i, a) in left.iter().enumerate() {
        let mut row = vec![0usize; right.len() + 1];
        for (j, b) in right.iter().enumerate() {
            if a == b {
                let size = suffix[j] + 1;
                row[j + 1] = size;
                if size > best.2 {
                    best = (i + 1 - size, j + 1 - size, size);
                }
            }
        }
        suffix = row;
    }
    best
}
