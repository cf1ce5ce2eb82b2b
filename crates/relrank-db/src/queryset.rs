//! PostgreSQL query backend.
//!
//! [`PgQuerySet`] records annotations, filters and ordering as expression
//! trees and renders them into a single parameterized `SELECT` only when the
//! collection is executed.

use std::time::Instant;

use sqlx::{PgPool, Row};
use tracing::debug;

use relrank_core::{Error, Expr, OrderBy, QuerySet, Result, ScoredRecord, Value};

use crate::compiler::{annotation_alias, check_annotation, check_columns, QueryParam, SqlCompiler};
use crate::schema_validation::{quote_ident, validate_identifier};

/// Alias of the base table in generated SQL.
pub const TABLE_ALIAS: &str = "t";

/// A lazily built query over one table.
#[derive(Debug, Clone)]
pub struct PgQuerySet {
    table: String,
    annotations: Vec<(String, Expr)>,
    filters: Vec<Expr>,
    ordering: Vec<OrderBy>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PgQuerySet {
    /// Start a collection over every row of `table`.
    pub fn table(name: &str) -> Result<Self> {
        validate_identifier(name)?;
        Ok(Self {
            table: name.to_string(),
            annotations: Vec::new(),
            filters: Vec::new(),
            ordering: Vec::new(),
            limit: None,
            offset: None,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Exclude soft-deleted rows (`deleted_at IS NULL`).
    pub fn alive(mut self) -> Self {
        self.filters.push(Expr::field("deleted_at").is_null());
        self
    }

    /// Keep only rows flagged active (`is_active IS TRUE`).
    pub fn active(mut self) -> Self {
        self.filters.push(Expr::Coalesce(vec![
            Expr::field("is_active"),
            Expr::Literal(Value::Bool(false)),
        ]));
        self
    }

    /// Skip the first `offset` rows.
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset.max(0));
        self
    }

    /// `FROM` clause with one lateral subquery per annotation, and the
    /// select-list entries reading the annotation values.
    fn source(&self, compiler: &mut SqlCompiler<'_>) -> Result<(String, Vec<String>)> {
        let mut from = format!("{} AS {}", quote_ident(&self.table)?, TABLE_ALIAS);
        let mut columns = Vec::with_capacity(self.annotations.len());
        for (index, (name, expr)) in self.annotations.iter().enumerate() {
            let alias = annotation_alias(index);
            let column = quote_ident(name)?;
            from.push_str(&format!(
                " CROSS JOIN LATERAL (SELECT ({})::float8 AS {}) AS {}",
                compiler.compile(expr)?,
                column,
                alias
            ));
            columns.push(format!("{}.{}", alias, column));
        }
        Ok((from, columns))
    }

    fn where_clause(&self, compiler: &mut SqlCompiler<'_>) -> Result<String> {
        if self.filters.is_empty() {
            return Ok(String::new());
        }
        let clauses = self
            .filters
            .iter()
            .map(|f| compiler.compile(f))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!(" WHERE {}", clauses.join(" AND ")))
    }

    /// Render the query and its parameters.
    pub fn to_sql(&self) -> Result<(String, Vec<QueryParam>)> {
        let mut compiler = SqlCompiler::new(TABLE_ALIAS, &self.annotations, 0);
        let (from, columns) = self.source(&mut compiler)?;

        let mut select = vec![format!("to_jsonb({}) AS record", TABLE_ALIAS)];
        select.extend(columns);

        let mut sql = format!("SELECT {} FROM {}", select.join(", "), from);
        sql.push_str(&self.where_clause(&mut compiler)?);

        if !self.ordering.is_empty() {
            let terms = self
                .ordering
                .iter()
                .map(|o| compiler.compile_order(o))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        if let Some(limit) = self.limit {
            let placeholder = compiler.compile(&Expr::Literal(Value::Int(limit)))?;
            sql.push_str(&format!(" LIMIT {}", placeholder));
        }
        if let Some(offset) = self.offset {
            let placeholder = compiler.compile(&Expr::Literal(Value::Int(offset)))?;
            sql.push_str(&format!(" OFFSET {}", placeholder));
        }

        Ok((sql, compiler.into_params()))
    }

    /// Execute the query.
    pub async fn fetch(&self, pool: &PgPool) -> Result<Vec<ScoredRecord>> {
        let start = Instant::now();
        let (sql, params) = self.to_sql()?;

        debug!(
            subsystem = "database",
            component = "queryset",
            op = "fetch",
            db_table = %self.table,
            param_count = params.len(),
            sql_len = sql.len(),
            "Executing queryset"
        );

        let mut q = sqlx::query(&sql);
        for param in &params {
            q = match param {
                QueryParam::Float(val) => q.bind(val),
                QueryParam::Int(val) => q.bind(val),
                QueryParam::Bool(b) => q.bind(b),
                QueryParam::String(s) => q.bind(s),
                QueryParam::FloatArray(arr) => q.bind(arr),
            };
        }

        let rows = q.fetch_all(pool).await.map_err(Error::Database)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = ScoredRecord::new(row.try_get::<serde_json::Value, _>("record")?);
            for (name, _) in &self.annotations {
                if let Some(score) = row.try_get::<Option<f64>, _>(name.as_str())? {
                    record.scores.insert(name.clone(), score);
                }
            }
            records.push(record);
        }

        debug!(
            subsystem = "database",
            component = "queryset",
            op = "fetch",
            db_table = %self.table,
            result_count = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Queryset fetched"
        );
        Ok(records)
    }

    /// Count the rows that pass the filters, ignoring ordering and limits.
    pub async fn count(&self, pool: &PgPool) -> Result<i64> {
        let mut compiler = SqlCompiler::new(TABLE_ALIAS, &self.annotations, 0);
        let (from, _) = self.source(&mut compiler)?;
        let mut sql = format!("SELECT COUNT(*) FROM {}", from);
        sql.push_str(&self.where_clause(&mut compiler)?);

        let params = compiler.into_params();
        let mut q = sqlx::query_scalar::<_, i64>(&sql);
        for param in &params {
            q = match param {
                QueryParam::Float(val) => q.bind(val),
                QueryParam::Int(val) => q.bind(val),
                QueryParam::Bool(b) => q.bind(b),
                QueryParam::String(s) => q.bind(s),
                QueryParam::FloatArray(arr) => q.bind(arr),
            };
        }
        Ok(q.fetch_one(pool).await?)
    }
}

impl QuerySet for PgQuerySet {
    fn annotate(mut self, name: &str, expr: Expr) -> Result<Self> {
        check_annotation(name, &expr, &self.annotations)?;
        self.annotations.push((name.to_string(), expr));
        Ok(self)
    }

    fn filter(mut self, predicate: Expr) -> Result<Self> {
        check_columns(&predicate, &self.annotations)?;
        self.filters.push(predicate);
        Ok(self)
    }

    fn order_by(mut self, ordering: Vec<OrderBy>) -> Result<Self> {
        for order in &ordering {
            check_columns(&order.expr, &self.annotations)?;
        }
        self.ordering = ordering;
        Ok(self)
    }

    fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit.max(0));
        self
    }

    fn annotation_names(&self) -> Vec<&str> {
        self.annotations.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn is_refined(&self) -> bool {
        !self.filters.is_empty() || !self.ordering.is_empty()
    }
}
