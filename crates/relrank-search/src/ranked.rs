//! Ranked multi-signal search.
//!
//! Attaches one score column per configured signal, combines them into a
//! gate score (`search_rank`) and a sort score (`composite_rank`), filters on
//! the gate and orders by the composite. Works on any [`QuerySet`].
//!
//! For columns `c1..cn` (nulls read as 0):
//!
//! ```text
//! fields_to_sum  = count(ci > 0)
//! bonus_to_sum   = count(ci > field_bonus_min) * field_bonus
//! search_rank    = max(ci)
//! order_rank     = sum(ci) / fields_to_sum, or 0 when nothing scored
//! composite_rank = order_rank + bonus_to_sum
//! ```

use tracing::{debug, trace};

use relrank_core::{
    columns, contains_tokens, normalize_query, word_tokens, Expr, OrderBy, QuerySet, Result,
    SearchConfig, SignalGroup, VectorField, VectorSource,
};

/// Builds ranked queries for one [`SearchConfig`].
#[derive(Debug, Clone, Copy)]
pub struct RankedSearchBuilder<'a> {
    config: &'a SearchConfig,
}

impl<'a> RankedSearchBuilder<'a> {
    pub fn new(config: &'a SearchConfig) -> Self {
        Self { config }
    }

    /// Score columns for an already trimmed, non-empty query, in creation order.
    pub fn signal_columns(&self, query: &str) -> Vec<(String, Expr)> {
        let mut created = Vec::new();
        for group in self.config.normalized_groups() {
            match group {
                SignalGroup::Contains(fields) => {
                    let whens: Vec<(Expr, Expr)> = contains_tokens(query)
                        .iter()
                        .flat_map(|token| {
                            fields.iter().map(move |field| {
                                (
                                    Expr::field(field.as_str()).cast_text().icontains(token.as_str()),
                                    Expr::float(self.config.bonus_icontains),
                                )
                            })
                        })
                        .collect();
                    if !whens.is_empty() {
                        created.push((
                            columns::ICONTAINS_RANK.to_string(),
                            Expr::case(whens, Expr::float(0.0)),
                        ));
                    }
                }
                SignalGroup::Trigram(fields) => {
                    for (position, field) in fields.iter().enumerate() {
                        created.push((
                            columns::similarity(field, position),
                            Expr::TrigramSimilarity {
                                text: Box::new(Expr::field(field.as_str()).cast_text()),
                                query: Box::new(Expr::text(query)),
                            },
                        ));
                    }
                }
                SignalGroup::WordTrigram(fields) => {
                    let tokens = word_tokens(query);
                    for (position, field) in fields.iter().enumerate() {
                        for (index, token) in tokens.iter().enumerate() {
                            created.push((
                                columns::word_similarity(field, position, index),
                                Expr::WordSimilarity {
                                    word: Box::new(Expr::text(token.as_str())),
                                    text: Box::new(Expr::field(field.as_str()).cast_text()),
                                }
                                .or_zero(),
                            ));
                        }
                    }
                }
                SignalGroup::Vector(fields) => {
                    created.push((columns::RANK.to_string(), self.vector_rank(&fields, query)));
                }
                SignalGroup::Prefix(fields) => {
                    if self.config.bonus_startswith == 0.0 {
                        continue;
                    }
                    let whens = fields
                        .iter()
                        .map(|field| {
                            (
                                Expr::field(field.as_str()).cast_text().istartswith(query),
                                Expr::float(self.config.bonus_startswith),
                            )
                        })
                        .collect();
                    created.push((
                        columns::ISTARTSWITH_RANK.to_string(),
                        Expr::case(whens, Expr::float(0.0)),
                    ));
                }
            }
        }
        created
    }

    fn vector_rank(&self, fields: &[VectorField], query: &str) -> Expr {
        let sources = fields
            .iter()
            .map(|f| VectorSource {
                field: f.field.clone(),
                weight: f.weight,
                config: f
                    .config
                    .clone()
                    .unwrap_or_else(|| self.config.vector_language.clone()),
            })
            .collect();
        Expr::SearchRank {
            sources,
            query: query.to_string(),
            language: self.config.vector_language.clone(),
            weights: self.config.rank_weights,
        }
    }

    /// Rank `base` against `query`.
    ///
    /// Returns `base` unchanged when the trimmed query is empty or no signal
    /// column can be built.
    pub fn apply<Q: QuerySet>(&self, base: Q, query: &str) -> Result<Q> {
        let Some(query) = normalize_query(query) else {
            debug!(
                subsystem = "search",
                component = "ranked_search",
                op = "apply",
                "Empty query, returning base collection"
            );
            return Ok(base);
        };

        let created = self.signal_columns(query);
        if created.is_empty() {
            debug!(
                subsystem = "search",
                component = "ranked_search",
                op = "apply",
                query = %query,
                "No signal columns configured, returning base collection"
            );
            return Ok(base);
        }

        debug!(
            subsystem = "search",
            component = "ranked_search",
            op = "apply",
            query = %query,
            column_count = created.len(),
            threshold = self.config.threshold,
            comparator = %self.config.comparator,
            "Attaching ranked search columns"
        );

        let names: Vec<String> = created.iter().map(|(name, _)| name.clone()).collect();
        let mut qs = base;
        for (name, expr) in created {
            trace!(column = %name, "Signal column");
            qs = qs.annotate(&name, expr)?;
        }

        let value = |name: &String| Expr::column(name.as_str()).or_zero();

        let fields_to_sum = Expr::sum(names.iter().map(|name| {
            Expr::when(
                value(name).gt(Expr::float(0.0)),
                Expr::float(1.0),
                Expr::float(0.0),
            )
        }));
        let bonus_to_sum = Expr::sum(names.iter().map(|name| {
            Expr::when(
                value(name).gt(Expr::float(self.config.field_bonus_min)),
                Expr::float(self.config.field_bonus),
                Expr::float(0.0),
            )
        }));
        let search_rank = Expr::greatest(names.iter().map(value).collect());
        let order_rank = if names.len() == 1 {
            value(&names[0])
        } else {
            (Expr::sum(names.iter().map(value))
                / Expr::column(columns::FIELDS_TO_SUM).null_if(Expr::float(0.0)))
            .or_zero()
        };

        qs = qs
            .annotate(columns::FIELDS_TO_SUM, fields_to_sum)?
            .annotate(columns::BONUS_TO_SUM, bonus_to_sum)?
            .annotate(columns::SEARCH_RANK, search_rank)?
            .annotate(columns::ORDER_RANK, order_rank)?
            .annotate(
                columns::COMPOSITE_RANK,
                Expr::column(columns::ORDER_RANK) + Expr::column(columns::BONUS_TO_SUM),
            )?;

        qs = qs.filter(
            Expr::column(columns::SEARCH_RANK)
                .compare(self.config.comparator, Expr::float(self.config.threshold)),
        )?;

        let mut ordering = vec![OrderBy::new(
            Expr::column(columns::COMPOSITE_RANK),
            self.config.order_direction,
        )];
        if let Some(tie_breaker) = &self.config.tie_breaker {
            ordering.push(OrderBy::asc(Expr::field(tie_breaker.as_str())));
        }
        qs.order_by(ordering)
    }
}

/// Rank `base` against `query` with `config`.
pub fn search<Q: QuerySet>(base: Q, query: &str, config: &SearchConfig) -> Result<Q> {
    RankedSearchBuilder::new(config).apply(base, query)
}
