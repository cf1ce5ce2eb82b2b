//! Centralized default constants for relrank.
//!
//! **This module is the single source of truth** for ranking defaults. The
//! builder, the request filter backend and the environment overlay all read
//! from here instead of repeating magic numbers.

// =============================================================================
// GATING
// =============================================================================

/// Minimum `search_rank` a record needs to stay in the result set.
pub const SEARCH_FIELDS_AVERAGE: f64 = 0.35;

/// Comparator name used for the gate when none is configured.
pub const SEARCH_FIELDS_FILTER: &str = "gte";

// =============================================================================
// BONUSES
// =============================================================================

/// Score attached when any query token is contained in a contains-group field.
pub const BONUS_ICONTAINS: f64 = 0.5;

/// Score attached when a prefix-group field starts with the whole query.
pub const BONUS_STARTSWITH: f64 = 1.5;

/// Per-column bonus added to the composite score for every matching signal.
pub const FIELD_BONUS: f64 = 0.1;

/// A signal column must exceed this value to earn [`FIELD_BONUS`].
pub const FIELD_BONUS_MIN: f64 = 0.0;

// =============================================================================
// FULL-TEXT
// =============================================================================

/// Text search configuration used when a vector field does not name one.
pub const VECTOR_LANGUAGE: &str = "spanish";

/// `ts_rank` class weights in PostgreSQL order: D, C, B, A.
pub const RANK_WEIGHTS: [f64; 4] = [0.2, 0.4, 0.6, 1.0];

// =============================================================================
// ORDERING
// =============================================================================

/// Secondary sort column used to break ties between equal composite scores.
pub const TIE_BREAKER: &str = "id";

/// Request parameter carrying the search terms.
pub const SEARCH_PARAM: &str = "search";

/// Default page size for ranked search.
pub const PAGE_LIMIT_SEARCH: i64 = 20;

// =============================================================================
// FIELD PATHS
// =============================================================================

/// Separator between segments of a nested field path (`category__name`).
pub const LOOKUP_SEP: &str = "__";

/// PostgreSQL truncates identifiers beyond this many bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;
