//! Query text normalization and tokenization.

use once_cell::sync::Lazy;
use regex::Regex;

/// Anything that is not a word character.
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]+").expect("valid regex"));

/// Trim the query; `None` when nothing is left.
pub fn normalize_query(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Lowercased whitespace-separated tokens for containment matching.
pub fn contains_tokens(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in query.to_lowercase().split_whitespace() {
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Whitespace-separated tokens with punctuation stripped, for word similarity.
///
/// Tokens that are empty after stripping are skipped, as are repeats.
pub fn word_tokens(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for raw in query.split_whitespace() {
        let token = NON_WORD.replace_all(raw, "");
        if token.is_empty() || tokens.iter().any(|t| t.as_str() == token) {
            continue;
        }
        tokens.push(token.into_owned());
    }
    tokens
}
