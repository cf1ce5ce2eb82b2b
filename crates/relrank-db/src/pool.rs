//! Connection pools for ranked search.
//!
//! Ranked queries score every candidate row, so a badly chosen field list
//! can turn into a long sequential scan. Each pooled connection therefore
//! carries a `statement_timeout`, and pools serving only searches can be
//! opened read-only.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;
use tracing::info;

use relrank_core::{Error, Result};

/// Default maximum number of connections in the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default wait for a free connection, in seconds.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Default per-statement limit for ranked queries, in seconds.
pub const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 15;

/// Pool configuration options.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    /// Upper bound on open connections.
    pub max_connections: u32,
    /// How long acquiring a connection may wait before failing.
    pub acquire_timeout: Duration,
    /// `statement_timeout` applied to every new connection; `None` keeps
    /// the server setting.
    pub statement_timeout: Option<Duration>,
    /// Open connections with `default_transaction_read_only = on`.
    pub read_only: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            statement_timeout: Some(Duration::from_secs(DEFAULT_STATEMENT_TIMEOUT_SECS)),
            read_only: false,
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn statement_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.statement_timeout = timeout;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// `SET` statements run on every new connection.
    pub fn session_statements(&self) -> Vec<String> {
        let mut statements = Vec::new();
        if let Some(timeout) = self.statement_timeout {
            statements.push(format!("SET statement_timeout = {}", timeout.as_millis()));
        }
        if self.read_only {
            statements.push("SET default_transaction_read_only = on".to_string());
        }
        statements
    }
}

/// Connect with the default [`PoolConfig`].
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::default()).await
}

/// Connect with a custom [`PoolConfig`].
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();
    let statements = config.session_statements();

    info!(
        subsystem = "database",
        component = "pool",
        op = "create",
        max_connections = config.max_connections,
        statement_timeout_ms = config.statement_timeout.map(|t| t.as_millis() as u64),
        read_only = config.read_only,
        "Creating search connection pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .after_connect(move |conn, _meta| {
            let statements = statements.clone();
            Box::pin(async move {
                for statement in &statements {
                    (&mut *conn).execute(statement.as_str()).await?;
                }
                Ok(())
            })
        })
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "database",
        component = "pool",
        op = "established",
        pool_size = pool.size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Search connection pool established"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sets_statement_timeout() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(
            config.session_statements(),
            vec!["SET statement_timeout = 15000".to_string()]
        );
    }

    #[test]
    fn test_read_only_without_timeout() {
        let config = PoolConfig::new()
            .max_connections(4)
            .statement_timeout(None)
            .read_only(true);

        assert_eq!(config.max_connections, 4);
        assert_eq!(
            config.session_statements(),
            vec!["SET default_transaction_read_only = on".to_string()]
        );
    }

    #[test]
    fn test_sub_second_timeout_in_millis() {
        let config = PoolConfig::new().statement_timeout(Some(Duration::from_millis(250)));
        assert_eq!(config.session_statements()[0], "SET statement_timeout = 250");
    }
}
