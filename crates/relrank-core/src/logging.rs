//! Structured logging schema and field name constants for relrank.
//!
//! All crates use these names for structured `tracing` fields so log
//! aggregation can query ranking decisions consistently.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | WARN  | Recoverable issue, default value applied |
//! | INFO  | Completed search executions |
//! | DEBUG | Decision points: pass-through, column counts, compiled SQL size |
//! | TRACE | Per-column and per-record detail |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "search", "database"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "ranked_search", "sql_compiler", "memory", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "apply", "compile", "fetch", "evaluate"
pub const OPERATION: &str = "op";

// ─── Search fields ─────────────────────────────────────────────────────────

/// Search query text.
pub const QUERY: &str = "query";

/// Number of score columns created by the ranked search builder.
pub const COLUMN_COUNT: &str = "column_count";

/// Name of a score column.
pub const COLUMN: &str = "column";

/// Gate threshold applied to `search_rank`.
pub const THRESHOLD: &str = "threshold";

/// Request parameter searched for terms.
pub const SEARCH_PARAM: &str = "search_param";

/// Environment variable being read.
pub const ENV_KEY: &str = "key";

/// Comparator used for the gate ("gte", "gt", "lte", "lt").
pub const COMPARATOR: &str = "comparator";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records returned by a search or query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of input records evaluated by the in-memory backend.
pub const RECORD_COUNT: &str = "record_count";

/// Length in bytes of a compiled SQL statement.
pub const SQL_LEN: &str = "sql_len";

/// Number of bound SQL parameters.
pub const PARAM_COUNT: &str = "param_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Per-statement timeout configured on pooled connections.
pub const STATEMENT_TIMEOUT_MS: &str = "statement_timeout_ms";

/// Database table queried.
pub const DB_TABLE: &str = "db_table";
