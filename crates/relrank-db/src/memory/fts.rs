//! Full-text rank approximation for in-memory collections.
//!
//! Lexemes are lowercased alphanumeric runs; there is no stemming and no
//! stop-word list, so results match `ts_rank` only in ordering tendency, not
//! in absolute value.

use relrank_core::VectorWeight;

/// A document part with the weight class it was tagged with.
#[derive(Debug, Clone)]
pub struct WeightedText {
    pub text: String,
    pub weight: VectorWeight,
}

/// Lowercased lexemes of `text`, deduplicated, in first-seen order.
pub fn lexemes(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for lexeme in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|l| !l.is_empty())
    {
        if !out.iter().any(|l| l == lexeme) {
            out.push(lexeme.to_string());
        }
    }
    out
}

/// Rank `parts` against `query`.
///
/// Each query lexeme scores the largest class weight among the parts that
/// contain it (zero when none does); the rank is the mean over query lexemes.
/// `weights` is indexed D, C, B, A.
pub fn rank(parts: &[WeightedText], query: &str, weights: &[f64; 4]) -> f64 {
    let terms = lexemes(query);
    if terms.is_empty() {
        return 0.0;
    }

    let documents: Vec<(Vec<String>, f64)> = parts
        .iter()
        .map(|p| (lexemes(&p.text), weights[p.weight.rank_index()]))
        .collect();

    let total: f64 = terms
        .iter()
        .map(|term| {
            documents
                .iter()
                .filter(|(lexemes, _)| lexemes.contains(term))
                .map(|(_, weight)| *weight)
                .fold(0.0, f64::max)
        })
        .sum();

    total / terms.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEIGHTS: [f64; 4] = [0.2, 0.4, 0.6, 1.0];

    fn part(text: &str, weight: VectorWeight) -> WeightedText {
        WeightedText {
            text: text.to_string(),
            weight,
        }
    }

    #[test]
    fn test_lexemes() {
        assert_eq!(lexemes("Red apple, red!"), vec!["red", "apple"]);
        assert!(lexemes(" -- ").is_empty());
    }

    #[test]
    fn test_rank_uses_best_weight() {
        let parts = vec![
            part("Apple iPhone", VectorWeight::A),
            part("a phone by apple", VectorWeight::C),
        ];
        assert_eq!(rank(&parts, "apple", &WEIGHTS), 1.0);
        assert_eq!(rank(&parts, "phone", &WEIGHTS), 0.4);
    }

    #[test]
    fn test_rank_averages_terms() {
        let parts = vec![part("Apple iPhone", VectorWeight::B)];
        let score = rank(&parts, "apple galaxy", &WEIGHTS);
        assert!((score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_rank_empty_query() {
        let parts = vec![part("Apple", VectorWeight::A)];
        assert_eq!(rank(&parts, "...", &WEIGHTS), 0.0);
        assert_eq!(rank(&[], "apple", &WEIGHTS), 0.0);
    }
}
