//! # relrank-db
//!
//! Query backends for relrank.
//!
//! This crate provides:
//! - A SQL compiler lowering relrank expressions to parameterized PostgreSQL
//! - [`PgQuerySet`], a lazily built query over one table
//! - [`MemoryQuerySet`], the same semantics evaluated over JSON records
//! - Connection pool management
//!
//! ## Example
//!
//! ```rust,ignore
//! use relrank_db::{create_pool, PgQuerySet};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool("postgres://localhost/shop").await?;
//!     let products = PgQuerySet::table("product")?.alive().fetch(&pool).await?;
//!     println!("{} products", products.len());
//!     Ok(())
//! }
//! ```
pub mod compiler;
pub mod memory;
pub mod pool;
pub mod queryset;
pub mod schema_validation;

// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use relrank_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub use compiler::{QueryParam, SqlCompiler};
pub use memory::MemoryQuerySet;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use queryset::PgQuerySet;
pub use schema_validation::{quote_ident, validate_identifier};
