//! Trait definitions for relrank query backends.

use crate::expr::{Expr, OrderBy};
use crate::Result;

// =============================================================================
// QUERY BACKEND TRAITS
// =============================================================================

/// A lazily composed collection of records of one type.
///
/// Implementations only record the requested operations; evaluation happens
/// when the backend executes the collection. Each method consumes `self` and
/// returns the extended collection, so a base collection is never mutated
/// behind the caller's back.
///
/// Construction errors (unsafe identifiers, unknown annotations, unknown
/// fields) are reported from these methods.
pub trait QuerySet: Sized {
    /// Attach a computed column named `name`.
    fn annotate(self, name: &str, expr: Expr) -> Result<Self>;

    /// Keep only records for which `predicate` is true (null counts as false).
    fn filter(self, predicate: Expr) -> Result<Self>;

    /// Replace the ordering of the collection.
    fn order_by(self, ordering: Vec<OrderBy>) -> Result<Self>;

    /// Cap the number of records returned.
    fn limit(self, limit: i64) -> Self;

    /// Names of the annotations attached so far, in attachment order.
    fn annotation_names(&self) -> Vec<&str>;

    /// Whether any filter or ordering has been applied.
    fn is_refined(&self) -> bool;
}
