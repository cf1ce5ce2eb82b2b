//! Ranked search over PostgreSQL tables.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, instrument};

use relrank_core::defaults::PAGE_LIMIT_SEARCH;
use relrank_core::{Comparator, QuerySet, Result, ScoredRecord, SearchConfig, SignalGroup};
use relrank_db::{create_pool_with_config, PgQuerySet, PoolConfig};

use crate::ranked::RankedSearchBuilder;

/// Executes ranked searches against a database.
#[async_trait]
pub trait RankedSearch: Send + Sync {
    /// Rank `base` against `query` and return at most `limit` records.
    async fn search(
        &self,
        base: PgQuerySet,
        query: &str,
        config: &SearchConfig,
        limit: i64,
    ) -> Result<Vec<ScoredRecord>>;
}

/// Ranked search engine backed by a connection pool.
#[derive(Clone)]
pub struct RankedSearchEngine {
    pool: PgPool,
}

impl RankedSearchEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a read-only pool with the default statement timeout.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool_with_config(database_url, PoolConfig::new().read_only(true)).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RankedSearch for RankedSearchEngine {
    #[instrument(skip(self, base, config), fields(
        subsystem = "search",
        component = "ranked_search",
        op = "search",
        query = %query,
        db_table = %base.table_name(),
        threshold = config.threshold,
    ))]
    async fn search(
        &self,
        base: PgQuerySet,
        query: &str,
        config: &SearchConfig,
        limit: i64,
    ) -> Result<Vec<ScoredRecord>> {
        let start = Instant::now();

        let ranked = RankedSearchBuilder::new(config)
            .apply(base, query)?
            .limit(limit);
        let results = ranked.fetch(&self.pool).await?;

        info!(
            result_count = results.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Ranked search completed"
        );

        Ok(results)
    }
}

/// Builder for search requests.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    query: String,
    limit: i64,
    pub config: SearchConfig,
}

impl SearchRequest {
    /// Create a new search request with a text query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: PAGE_LIMIT_SEARCH,
            config: SearchConfig::default(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Replace the whole ranking configuration.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum number of results.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set the gate threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set the gate comparator.
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.config.comparator = comparator;
        self
    }

    /// Add signal groups.
    pub fn with_groups(mut self, groups: impl IntoIterator<Item = SignalGroup>) -> Self {
        self.config.groups.extend(groups);
        self
    }

    /// Rank any collection without executing it.
    pub fn apply<Q: QuerySet>(&self, base: Q) -> Result<Q> {
        Ok(RankedSearchBuilder::new(&self.config)
            .apply(base, &self.query)?
            .limit(self.limit))
    }

    /// Execute the search.
    pub async fn execute<E: RankedSearch + ?Sized>(
        &self,
        engine: &E,
        base: PgQuerySet,
    ) -> Result<Vec<ScoredRecord>> {
        engine
            .search(base, &self.query, &self.config, self.limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relrank_db::{MemoryQuerySet, QueryParam};
    use serde_json::json;

    #[test]
    fn test_search_request_defaults() {
        let request = SearchRequest::new("apple");
        assert_eq!(request.query(), "apple");
        assert_eq!(request.limit(), 20);
        assert_eq!(request.config, SearchConfig::default());
    }

    #[test]
    fn test_search_request_builder() {
        let request = SearchRequest::new("apple")
            .with_limit(5)
            .with_threshold(0.2)
            .with_comparator(Comparator::Gt)
            .with_groups([
                SignalGroup::Contains(vec!["name".to_string()]),
                SignalGroup::Prefix(vec!["name".to_string()]),
            ]);

        assert_eq!(request.limit(), 5);
        assert_eq!(request.config.threshold, 0.2);
        assert_eq!(request.config.comparator, Comparator::Gt);
        assert_eq!(request.config.groups.len(), 2);
    }

    #[test]
    fn test_apply_limits_memory_collection() {
        let base = MemoryQuerySet::new(vec![
            json!({"id": 1, "name": "Apple iPhone"}),
            json!({"id": 2, "name": "Apple iPad"}),
            json!({"id": 3, "name": "Apple Watch"}),
        ]);
        let results = SearchRequest::new("apple")
            .with_groups([SignalGroup::Contains(vec!["name".to_string()])])
            .with_limit(2)
            .apply(base)
            .unwrap()
            .evaluate()
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].get("id"), Some(&json!(1)));
    }

    #[test]
    fn test_apply_renders_limit_for_postgres() {
        let base = PgQuerySet::table("product").unwrap();
        let (sql, params) = SearchRequest::new("apple")
            .with_groups([SignalGroup::Contains(vec!["name".to_string()])])
            .with_limit(7)
            .apply(base)
            .unwrap()
            .to_sql()
            .unwrap();

        assert!(sql.contains("AS \"composite_rank\""));
        assert!(sql.contains("ORDER BY"));
        assert!(sql.ends_with(&format!("LIMIT ${}::int8", params.len())));
        assert_eq!(params.last(), Some(&QueryParam::Int(7)));
    }
}
