// SPDX-License-Identifier: GPL-3.0-or-later

//! Search string shaping shared by every source.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lower-cased, accent-folded search text with punctuation, brackets and
/// connective words ("volume", "vol", "and") removed.
///
/// `"Café Tacvba: Vol. 2 (Live) and More"` becomes `"cafe tacvba 2 live more"`.
pub fn search_string(value: &str) -> String {
    lazy_static! {
        static ref NON_WORD_REGEX: Regex = Regex::new(r"[^\w]+").expect("valid non-word regex");
        static ref CONNECTIVE_REGEX: Regex =
            Regex::new(r"\b(volume|vol|and)\b").expect("valid connective regex");
        static ref SPACES_REGEX: Regex = Regex::new(r"\s+").expect("valid whitespace regex");
    }

    let folded: String = value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    let words = NON_WORD_REGEX.replace_all(&folded, " ");
    let words = CONNECTIVE_REGEX.replace_all(&words, " ");
    SPACES_REGEX.replace_all(&words, " ").trim().to_string()
}
