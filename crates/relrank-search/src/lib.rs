//! # relrank-search
//!
//! Ranked multi-signal search for relrank.
//!
//! This crate provides:
//! - The ranked search builder (contains, trigram, word trigram, full-text
//!   rank and prefix signals combined into one composite score)
//! - A search engine executing ranked queries against PostgreSQL
//! - A request-level filter reading search terms from query pairs
//! - Environment overrides for ranking defaults
//!
//! ## Example
//!
//! ```ignore
//! use relrank_search::{RankedSearchEngine, SearchRequest};
//! use relrank_db::{create_pool, PgQuerySet};
//!
//! let pool = create_pool("postgres://...").await?;
//! let engine = RankedSearchEngine::new(pool);
//!
//! let results = SearchRequest::new("apple")
//!     .with_config(
//!         SearchConfig::new()
//!             .with_icontains_fields(["name", "sku"])
//!             .with_trigram_fields(["name"])
//!             .with_startswith_fields(["name"]),
//!     )
//!     .with_limit(20)
//!     .execute(&engine, PgQuerySet::table("product")?.alive())
//!     .await?;
//! ```

pub mod engine;
pub mod env_config;
pub mod filter_backend;
pub mod ranked;

pub use engine::{RankedSearch, RankedSearchEngine, SearchRequest};
pub use env_config::SearchDefaults;
pub use filter_backend::{SearchFieldsConfig, SearchFilter};
pub use ranked::{search, RankedSearchBuilder};

// Re-export core types for convenience
pub use relrank_core::{
    Comparator, Error, OrderDirection, QuerySet, Result, ScoredRecord, SearchConfig, SignalGroup,
    VectorField, VectorWeight,
};
