//! Signal-group configuration for ranked search.

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::expr::{Comparator, OrderDirection};

/// Full-text vector class weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VectorWeight {
    #[default]
    A,
    B,
    C,
    D,
}

impl VectorWeight {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorWeight::A => "A",
            VectorWeight::B => "B",
            VectorWeight::C => "C",
            VectorWeight::D => "D",
        }
    }

    /// Index of this class in a `[D, C, B, A]` weight array.
    pub fn rank_index(&self) -> usize {
        match self {
            VectorWeight::D => 0,
            VectorWeight::C => 1,
            VectorWeight::B => 2,
            VectorWeight::A => 3,
        }
    }
}

/// A field contributing to the full-text vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorField {
    pub field: String,
    #[serde(default)]
    pub weight: VectorWeight,
    /// Text search configuration; falls back to the request language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

impl VectorField {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            weight: VectorWeight::default(),
            config: None,
        }
    }

    pub fn with_weight(mut self, weight: VectorWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = Some(config.into());
        self
    }
}

/// One scoring strategy and the fields it reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "fields", rename_all = "snake_case")]
pub enum SignalGroup {
    /// Case-insensitive token containment, scored with the contains bonus.
    Contains(Vec<String>),
    /// Trigram similarity against the whole query, one column per field.
    Trigram(Vec<String>),
    /// Word trigram similarity, one column per field and query token.
    WordTrigram(Vec<String>),
    /// Weighted full-text vector rank, a single column.
    Vector(Vec<VectorField>),
    /// Case-insensitive prefix match of the whole query, scored with the prefix bonus.
    Prefix(Vec<String>),
}

impl SignalGroup {
    /// Position in the fixed processing order.
    pub fn stage(&self) -> u8 {
        match self {
            SignalGroup::Contains(_) => 0,
            SignalGroup::Trigram(_) => 1,
            SignalGroup::WordTrigram(_) => 2,
            SignalGroup::Vector(_) => 3,
            SignalGroup::Prefix(_) => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignalGroup::Contains(_) => "contains",
            SignalGroup::Trigram(_) => "trigram",
            SignalGroup::WordTrigram(_) => "word_trigram",
            SignalGroup::Vector(_) => "vector",
            SignalGroup::Prefix(_) => "prefix",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SignalGroup::Contains(f)
            | SignalGroup::Trigram(f)
            | SignalGroup::WordTrigram(f)
            | SignalGroup::Prefix(f) => f.is_empty(),
            SignalGroup::Vector(f) => f.is_empty(),
        }
    }

    /// Append the fields of `other` (same kind) that are not already present.
    fn absorb(&mut self, other: SignalGroup) {
        match (self, other) {
            (SignalGroup::Contains(a), SignalGroup::Contains(b))
            | (SignalGroup::Trigram(a), SignalGroup::Trigram(b))
            | (SignalGroup::WordTrigram(a), SignalGroup::WordTrigram(b))
            | (SignalGroup::Prefix(a), SignalGroup::Prefix(b)) => {
                for field in b {
                    if !a.contains(&field) {
                        a.push(field);
                    }
                }
            }
            (SignalGroup::Vector(a), SignalGroup::Vector(b)) => {
                for field in b {
                    if !a.iter().any(|existing| existing.field == field.field) {
                        a.push(field);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Per-call ranking configuration.
///
/// Built fresh for every search and never mutated while a query is composed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub groups: Vec<SignalGroup>,
    /// Gate comparator applied to `search_rank`.
    pub comparator: Comparator,
    /// Gate threshold (`search_fields_average`).
    pub threshold: f64,
    /// `ts_rank` weights in D, C, B, A order.
    pub rank_weights: [f64; 4],
    pub vector_language: String,
    pub bonus_icontains: f64,
    pub bonus_startswith: f64,
    /// Added to the composite score once per signal column above `field_bonus_min`.
    pub field_bonus: f64,
    pub field_bonus_min: f64,
    pub order_direction: OrderDirection,
    /// Secondary ascending sort column for deterministic ties.
    pub tie_breaker: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            comparator: Comparator::Gte,
            threshold: defaults::SEARCH_FIELDS_AVERAGE,
            rank_weights: defaults::RANK_WEIGHTS,
            vector_language: defaults::VECTOR_LANGUAGE.to_string(),
            bonus_icontains: defaults::BONUS_ICONTAINS,
            bonus_startswith: defaults::BONUS_STARTSWITH,
            field_bonus: defaults::FIELD_BONUS,
            field_bonus_min: defaults::FIELD_BONUS_MIN,
            order_direction: OrderDirection::Descending,
            tie_breaker: Some(defaults::TIE_BREAKER.to_string()),
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: SignalGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_icontains_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_group(SignalGroup::Contains(collect(fields)))
    }

    pub fn with_trigram_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_group(SignalGroup::Trigram(collect(fields)))
    }

    pub fn with_word_trigram_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_group(SignalGroup::WordTrigram(collect(fields)))
    }

    pub fn with_vector_fields(self, fields: Vec<VectorField>) -> Self {
        self.with_group(SignalGroup::Vector(fields))
    }

    pub fn with_startswith_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_group(SignalGroup::Prefix(collect(fields)))
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_rank_weights(mut self, weights: [f64; 4]) -> Self {
        self.rank_weights = weights;
        self
    }

    pub fn with_vector_language(mut self, language: impl Into<String>) -> Self {
        self.vector_language = language.into();
        self
    }

    pub fn with_bonus_icontains(mut self, bonus: f64) -> Self {
        self.bonus_icontains = bonus;
        self
    }

    pub fn with_bonus_startswith(mut self, bonus: f64) -> Self {
        self.bonus_startswith = bonus;
        self
    }

    pub fn with_field_bonus(mut self, bonus: f64, min: f64) -> Self {
        self.field_bonus = bonus;
        self.field_bonus_min = min;
        self
    }

    pub fn with_order_direction(mut self, direction: OrderDirection) -> Self {
        self.order_direction = direction;
        self
    }

    pub fn with_tie_breaker(mut self, column: Option<String>) -> Self {
        self.tie_breaker = column;
        self
    }

    /// Groups merged by kind, empty ones dropped, in processing order.
    pub fn normalized_groups(&self) -> Vec<SignalGroup> {
        let mut merged: Vec<SignalGroup> = Vec::new();
        for group in self.groups.iter().filter(|g| !g.is_empty()) {
            match merged.iter_mut().find(|m| m.stage() == group.stage()) {
                Some(existing) => existing.absorb(group.clone()),
                None => merged.push(group.clone()),
            }
        }
        merged.sort_by_key(SignalGroup::stage);
        merged
    }

    /// True when no group has any field configured.
    pub fn has_signals(&self) -> bool {
        self.groups.iter().any(|g| !g.is_empty())
    }
}

fn collect<I, S>(fields: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fields.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.threshold, 0.35);
        assert_eq!(config.comparator, Comparator::Gte);
        assert_eq!(config.rank_weights, [0.2, 0.4, 0.6, 1.0]);
        assert_eq!(config.vector_language, "spanish");
        assert_eq!(config.bonus_icontains, 0.5);
        assert_eq!(config.bonus_startswith, 1.5);
        assert_eq!(config.field_bonus, 0.1);
        assert_eq!(config.order_direction, OrderDirection::Descending);
        assert_eq!(config.tie_breaker.as_deref(), Some("id"));
        assert!(!config.has_signals());
    }

    #[test]
    fn test_normalized_groups_order_and_merge() {
        let config = SearchConfig::new()
            .with_startswith_fields(["name"])
            .with_icontains_fields(["name"])
            .with_trigram_fields(Vec::<String>::new())
            .with_icontains_fields(["name", "sku"]);

        let groups = config.normalized_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[0],
            SignalGroup::Contains(vec!["name".to_string(), "sku".to_string()])
        );
        assert_eq!(groups[1], SignalGroup::Prefix(vec!["name".to_string()]));
    }

    #[test]
    fn test_vector_field_defaults_from_json() {
        let field: VectorField = serde_json::from_str(r#"{"field": "title"}"#).unwrap();
        assert_eq!(field.weight, VectorWeight::A);
        assert_eq!(field.config, None);

        let field: VectorField =
            serde_json::from_str(r#"{"field": "body", "weight": "C", "config": "english"}"#)
                .unwrap();
        assert_eq!(field.weight, VectorWeight::C);
        assert_eq!(field.config.as_deref(), Some("english"));
    }

    #[test]
    fn test_signal_group_serde_tagging() {
        let group: SignalGroup =
            serde_json::from_str(r#"{"kind": "word_trigram", "fields": ["name"]}"#).unwrap();
        assert_eq!(group, SignalGroup::WordTrigram(vec!["name".to_string()]));
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: SearchConfig = serde_json::from_str(
            r#"{"threshold": 0.5, "groups": [{"kind": "contains", "fields": ["name"]}]}"#,
        )
        .unwrap();
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.bonus_startswith, 1.5);
        assert!(config.has_signals());
    }

    #[test]
    fn test_rank_index_matches_weight_order() {
        let weights = [0.2, 0.4, 0.6, 1.0];
        assert_eq!(weights[VectorWeight::A.rank_index()], 1.0);
        assert_eq!(weights[VectorWeight::D.rank_index()], 0.2);
    }
}
