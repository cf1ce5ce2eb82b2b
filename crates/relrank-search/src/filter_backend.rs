//! Request-level search filter.
//!
//! Reads the search terms from request query pairs and ranks a collection
//! with the fields a list endpoint declares searchable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use relrank_core::defaults;
use relrank_core::{Comparator, QuerySet, Result, SearchConfig, SignalGroup, VectorField};

use crate::ranked::search;

/// Gate threshold used by data-table views.
pub const DATATABLE_SEARCH_FIELDS_AVERAGE: f64 = 0.4;

/// Searchable fields and ranking knobs declared by a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFieldsConfig {
    /// Query parameter holding the search terms.
    pub search_param: String,
    pub search_icontains_fields: Vec<String>,
    pub search_trigram_fields: Vec<String>,
    pub search_word_trigram_fields: Vec<String>,
    pub search_vector_fields: Vec<VectorField>,
    pub search_fields_bonus_rank_startswith: Vec<String>,
    /// Gate comparator (`gte`, `gt`, `lte`, `lt`).
    pub search_fields_filter: Comparator,
    /// Gate threshold.
    pub search_fields_average: f64,
    pub vector_language: String,
    pub search_rank_weights: [f64; 4],
}

impl Default for SearchFieldsConfig {
    fn default() -> Self {
        Self {
            search_param: defaults::SEARCH_PARAM.to_string(),
            search_icontains_fields: Vec::new(),
            search_trigram_fields: Vec::new(),
            search_word_trigram_fields: Vec::new(),
            search_vector_fields: Vec::new(),
            search_fields_bonus_rank_startswith: Vec::new(),
            search_fields_filter: Comparator::Gte,
            search_fields_average: defaults::SEARCH_FIELDS_AVERAGE,
            vector_language: defaults::VECTOR_LANGUAGE.to_string(),
            search_rank_weights: defaults::RANK_WEIGHTS,
        }
    }
}

impl SearchFieldsConfig {
    /// Defaults of data-table views, which gate at 0.4.
    pub fn datatable() -> Self {
        Self {
            search_fields_average: DATATABLE_SEARCH_FIELDS_AVERAGE,
            ..Self::default()
        }
    }

    /// Ranking configuration for these fields, layered over `base`.
    pub fn to_search_config(&self, base: SearchConfig) -> SearchConfig {
        SearchConfig {
            groups: vec![
                SignalGroup::Contains(self.search_icontains_fields.clone()),
                SignalGroup::Trigram(self.search_trigram_fields.clone()),
                SignalGroup::WordTrigram(self.search_word_trigram_fields.clone()),
                SignalGroup::Vector(self.search_vector_fields.clone()),
                SignalGroup::Prefix(self.search_fields_bonus_rank_startswith.clone()),
            ],
            comparator: self.search_fields_filter,
            threshold: self.search_fields_average,
            rank_weights: self.search_rank_weights,
            vector_language: self.vector_language.clone(),
            ..base
        }
    }
}

impl From<&SearchFieldsConfig> for SearchConfig {
    fn from(fields: &SearchFieldsConfig) -> Self {
        fields.to_search_config(SearchConfig::default())
    }
}

/// Ranks collections from request query pairs.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    fields: SearchFieldsConfig,
    config: SearchConfig,
}

impl SearchFilter {
    pub fn new(fields: SearchFieldsConfig) -> Self {
        let config = SearchConfig::from(&fields);
        Self { fields, config }
    }

    /// Use `base` for the knobs the field declaration does not cover
    /// (bonuses, direction, tie breaker).
    pub fn with_base_config(mut self, base: SearchConfig) -> Self {
        self.config = self.fields.to_search_config(base);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search terms from decoded query pairs.
    ///
    /// The first pair named after `search_param` wins; `+` separators read as
    /// spaces. Missing or blank terms yield `None`.
    pub fn search_terms<I, K, V>(&self, query_pairs: I) -> Option<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (_, value) = query_pairs
            .into_iter()
            .find(|(key, _)| key.as_ref() == self.fields.search_param)?;
        let terms = value.as_ref().replace('+', " ");
        let terms = terms.trim();
        if terms.is_empty() {
            None
        } else {
            Some(terms.to_string())
        }
    }

    /// Rank `base` with the request's search terms; pass-through without them.
    pub fn filter_queryset<Q, I, K, V>(&self, query_pairs: I, base: Q) -> Result<Q>
    where
        Q: QuerySet,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        match self.search_terms(query_pairs) {
            Some(terms) => search(base, &terms, &self.config),
            None => {
                debug!(
                    subsystem = "search",
                    component = "filter_backend",
                    op = "filter_queryset",
                    search_param = %self.fields.search_param,
                    "No search terms in request"
                );
                Ok(base)
            }
        }
    }
}
