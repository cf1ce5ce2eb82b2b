//! # relrank-core
//!
//! Core types, traits, and abstractions for the relrank library.
//!
//! This crate provides the expression tree that ranking queries are written
//! in, the signal-group configuration, the [`QuerySet`] contract every query
//! backend implements, and the shared error and logging conventions.

pub mod defaults;
pub mod error;
pub mod expr;
pub mod logging;
pub mod models;
pub mod signals;
pub mod tokens;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use expr::{
    BinaryOp, Comparator, Expr, OrderBy, OrderDirection, SqlType, TextLookup, Value, VectorSource,
};
pub use models::{columns, ScoredRecord};
pub use signals::{SearchConfig, SignalGroup, VectorField, VectorWeight};
pub use tokens::{contains_tokens, normalize_query, word_tokens};
pub use traits::*;
