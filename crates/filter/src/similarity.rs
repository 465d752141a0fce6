//! Bigram (Dice coefficient) text similarity.

use std::collections::HashMap;

use crate::normalize::clean_for_similarity;

/// Score at which two texts are treated as the same message.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Raw length below which [`are_similar`] never matches.
pub const DEFAULT_MIN_LENGTH: usize = 6;

/// Dice coefficient over character bigram multisets, in `[0, 1]`.
///
/// Equal strings score 1 (checked first), an empty side scores 0, and a
/// string shorter than two characters has no bigrams.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (bigrams_a, total_a) = bigrams(a);
    let (bigrams_b, total_b) = bigrams(b);
    if total_a + total_b == 0 {
        return 0.0;
    }

    let intersection: usize = bigrams_a
        .iter()
        .map(|(pair, &n)| bigrams_b.get(pair).map_or(0, |&m| n.min(m)))
        .sum();

    (2 * intersection) as f64 / (total_a + total_b) as f64
}

/// Whether two raw messages read as the same text.
///
/// Both raw strings must be at least `min_len` characters long; very short
/// fragments ("gg", "lol") are never similar regardless of score.
pub fn are_similar(raw_a: &str, raw_b: &str, min_len: usize, threshold: f64) -> bool {
    if raw_a.chars().count() < min_len || raw_b.chars().count() < min_len {
        return false;
    }
    similarity(&clean_for_similarity(raw_a), &clean_for_similarity(raw_b)) >= threshold
}

fn bigrams(s: &str) -> (HashMap<(char, char), usize>, usize) {
    let chars: Vec<char> = s.chars().collect();
    let mut counts = HashMap::new();
    for pair in chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    (counts, chars.len().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_scores_one() {
        for s in ["", "a", "hello there", "ññññ"] {
            assert_eq!(similarity(s, s), 1.0);
        }
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(similarity("hello", ""), 0.0);
        assert_eq!(similarity("", "hello"), 0.0);
    }

    #[test]
    fn single_characters_have_no_bigrams() {
        assert_eq!(similarity("a", "b"), 0.0);
        assert_eq!(similarity("a", "ab"), 0.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [
            ("night", "nacht"),
            ("hello there friend", "hello there friends"),
            ("aaaa", "aa"),
            ("abc", "xyz"),
            ("buy cheap followers", "buy cheap viewers now"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "{a} / {b}");
        }
    }

    #[test]
    fn known_values() {
        // night: ni ig gh ht / nacht: na ac ch ht -> one shared bigram
        assert!((similarity("night", "nacht") - 0.25).abs() < 1e-9);
        // multiset: "aaaa" has aa x3, "aa" has aa x1 -> 2*1 / (3+1)
        assert!((similarity("aaaa", "aa") - 0.5).abs() < 1e-9);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn near_duplicates_clear_default_threshold() {
        let score = similarity(
            "follow my channel for free stuff",
            "follow my channel for free stuf",
        );
        assert!(score >= DEFAULT_SIMILARITY_THRESHOLD, "score {score}");
    }

    #[test]
    fn are_similar_requires_min_length() {
        assert!(!are_similar("gg", "gg", DEFAULT_MIN_LENGTH, DEFAULT_SIMILARITY_THRESHOLD));
        assert!(are_similar(
            "Check out my stream!!",
            "check out my stream",
            DEFAULT_MIN_LENGTH,
            DEFAULT_SIMILARITY_THRESHOLD
        ));
        assert!(!are_similar(
            "check out my stream",
            "what a great play",
            DEFAULT_MIN_LENGTH,
            DEFAULT_SIMILARITY_THRESHOLD
        ));
    }
}
