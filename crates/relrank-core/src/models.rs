//! Result records produced by query backends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Names of the columns the ranked search builder attaches.
pub mod columns {
    /// Contains-group score.
    pub const ICONTAINS_RANK: &str = "icontains_rank";

    /// Prefix-group score.
    pub const ISTARTSWITH_RANK: &str = "istartswith_rank";

    /// Full-text vector rank.
    pub const RANK: &str = "rank";

    /// Number of signal columns strictly above zero.
    pub const FIELDS_TO_SUM: &str = "fields_to_sum";

    /// Sum of per-column bonuses.
    pub const BONUS_TO_SUM: &str = "bonus_to_sum";

    /// Largest signal, used only as the relevance gate.
    pub const SEARCH_RANK: &str = "search_rank";

    /// Mean of the nonzero signals.
    pub const ORDER_RANK: &str = "order_rank";

    /// `order_rank + bonus_to_sum`, the sort key.
    pub const COMPOSITE_RANK: &str = "composite_rank";

    use crate::defaults::MAX_IDENTIFIER_LEN;

    /// Trigram column for `field`, the `position`-th field of its group.
    ///
    /// Named `<field>_similarity`; when that exceeds the identifier limit the
    /// positional `similarity_<position>` is used instead.
    pub fn similarity(field: &str, position: usize) -> String {
        fit(
            format!("{}_similarity", field),
            || format!("similarity_{}", position),
        )
    }

    /// Word trigram column for `field` (the `position`-th field of its
    /// group) and the `token`-th query token.
    ///
    /// Long names fall back to `word_similarity_<position>_<token>`.
    pub fn word_similarity(field: &str, position: usize, token: usize) -> String {
        fit(
            format!("{}_word_similarity_{}", field, token),
            || format!("word_similarity_{}_{}", position, token),
        )
    }

    fn fit(name: String, positional: impl FnOnce() -> String) -> String {
        if name.len() <= MAX_IDENTIFIER_LEN {
            name
        } else {
            positional()
        }
    }
}

/// A record with the numeric annotations computed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// The base record as JSON.
    pub record: serde_json::Value,
    /// Annotation values by column name; null annotations are absent.
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
}

impl ScoredRecord {
    pub fn new(record: serde_json::Value) -> Self {
        Self {
            record,
            scores: BTreeMap::new(),
        }
    }

    pub fn score(&self, column: &str) -> Option<f64> {
        self.scores.get(column).copied()
    }

    /// Gate score (`max_signal`); zero when the record was not ranked.
    pub fn search_rank(&self) -> f64 {
        self.score(columns::SEARCH_RANK).unwrap_or(0.0)
    }

    pub fn order_rank(&self) -> f64 {
        self.score(columns::ORDER_RANK).unwrap_or(0.0)
    }

    /// Sort key (`composite_score`); zero when the record was not ranked.
    pub fn composite_rank(&self) -> f64 {
        self.score(columns::COMPOSITE_RANK).unwrap_or(0.0)
    }

    /// Number of signal columns that scored above zero.
    pub fn match_count(&self) -> u32 {
        self.score(columns::FIELDS_TO_SUM)
            .map(|n| n.max(0.0) as u32)
            .unwrap_or(0)
    }

    /// Top-level record field, if present.
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.record.get(field)
    }

    /// True when the builder ranked this record.
    pub fn is_ranked(&self) -> bool {
        self.scores.contains_key(columns::COMPOSITE_RANK)
    }
}
