//! Trigram similarity following the `pg_trgm` extension.

use std::collections::HashSet;

/// Trigrams of `text`: lowercased words of alphanumerics, each padded with
/// two leading blanks and one trailing blank.
pub fn trigrams(text: &str) -> HashSet<[char; 3]> {
    let mut set = HashSet::new();
    let lowered = text.to_lowercase();
    for word in lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }
    set
}

/// `similarity(a, b)`: shared trigrams over all distinct trigrams.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let total = left.len() + right.len() - shared;
    shared as f64 / total as f64
}

/// `word_similarity(word, text)`: share of the word's trigrams found in `text`.
///
/// `pg_trgm` looks for the best matching extent of `text`; counting against
/// the whole text gives the same value whenever the word appears intact.
pub fn word_similarity(word: &str, text: &str) -> f64 {
    let needle = trigrams(word);
    if needle.is_empty() {
        return 0.0;
    }
    let haystack = trigrams(text);
    let shared = needle.intersection(&haystack).count();
    shared as f64 / needle.len() as f64
}
