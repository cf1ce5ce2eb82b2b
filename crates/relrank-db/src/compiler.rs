//! SQL compiler for the relrank expression tree.
//!
//! Lowers [`Expr`] values to PostgreSQL SQL fragments with positional
//! parameters, collecting the bound values in order. Requires the `pg_trgm`
//! extension for `similarity` / `word_similarity`.

use relrank_core::{Error, Expr, OrderBy, Result, SqlType, TextLookup, Value, VectorSource};

use crate::escape_like;
use crate::schema_validation::{field_sql, quote_ident, validate_identifier};

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// Double precision parameter.
    Float(f64),
    /// Bigint parameter.
    Int(i64),
    /// Boolean parameter.
    Bool(bool),
    /// String parameter.
    String(String),
    /// Array of reals (for `ts_rank` weights).
    FloatArray(Vec<f32>),
}

/// Lateral subquery alias computing the `index`-th annotation.
pub fn annotation_alias(index: usize) -> String {
    format!("a{}", index)
}

/// Generates SQL for expression trees with parameterized values.
///
/// Each annotation is computed once, in its own `CROSS JOIN LATERAL`
/// subquery aliased by [`annotation_alias`]. A `Column` reference compiles
/// to `a<i>."name"`, so it stays a plain column in `WHERE` and `ORDER BY`.
///
/// # Example
///
/// ```rust
/// use relrank_core::Expr;
/// use relrank_db::compiler::{QueryParam, SqlCompiler};
///
/// let mut compiler = SqlCompiler::new("t", &[], 0);
/// let sql = compiler.compile(&Expr::field("name").icontains("apple")).unwrap();
/// assert_eq!(sql, "(t.\"name\" ILIKE ('%' || $1::text || '%'))");
/// assert_eq!(compiler.into_params(), vec![QueryParam::String("apple".into())]);
/// ```
pub struct SqlCompiler<'a> {
    alias: &'a str,
    annotations: &'a [(String, Expr)],
    params: Vec<QueryParam>,
    param_offset: usize,
}

impl<'a> SqlCompiler<'a> {
    /// Create a compiler.
    ///
    /// # Parameters
    ///
    /// * `alias` - Table alias used for field references
    /// * `annotations` - Annotations `Column` references resolve against
    /// * `param_offset` - Number of parameters already in the query
    pub fn new(alias: &'a str, annotations: &'a [(String, Expr)], param_offset: usize) -> Self {
        Self {
            alias,
            annotations,
            params: Vec::new(),
            param_offset,
        }
    }

    /// Parameters collected so far, in placeholder order.
    pub fn params(&self) -> &[QueryParam] {
        &self.params
    }

    pub fn into_params(self) -> Vec<QueryParam> {
        self.params
    }

    fn bind(&mut self, param: QueryParam) -> String {
        self.params.push(param);
        format!("${}", self.param_offset + self.params.len())
    }

    /// Compile one expression to a SQL fragment.
    pub fn compile(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Literal(value) => Ok(self.literal(value)),
            Expr::Field(path) => field_sql(self.alias, path),
            Expr::Column(name) => {
                let index = self
                    .annotations
                    .iter()
                    .position(|(n, _)| n == name)
                    .ok_or_else(|| Error::UnknownColumn(name.clone()))?;
                Ok(format!("{}.{}", annotation_alias(index), quote_ident(name)?))
            }
            Expr::Cast { expr, to } => {
                let inner = self.compile(expr)?;
                let ty = match to {
                    SqlType::Text => "text",
                    SqlType::Float => "float8",
                };
                Ok(format!("({})::{}", inner, ty))
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.compile(lhs)?;
                let rhs = self.compile(rhs)?;
                Ok(format!("({} {} {})", lhs, op.as_sql(), rhs))
            }
            Expr::Compare { op, lhs, rhs } => {
                let lhs = self.compile(lhs)?;
                let rhs = self.compile(rhs)?;
                Ok(format!("({} {} {})", lhs, op.as_sql(), rhs))
            }
            Expr::And(args) => self.junction(args, " AND ", "TRUE"),
            Expr::Or(args) => self.junction(args, " OR ", "FALSE"),
            Expr::Not(inner) => Ok(format!("(NOT {})", self.compile(inner)?)),
            Expr::IsNull(inner) => Ok(format!("({} IS NULL)", self.compile(inner)?)),
            Expr::Case { whens, default } => {
                if whens.is_empty() {
                    return self.compile(default);
                }
                let mut sql = String::from("CASE");
                for (when, then) in whens {
                    let when = self.compile(when)?;
                    let then = self.compile(then)?;
                    sql.push_str(&format!(" WHEN {} THEN {}", when, then));
                }
                sql.push_str(&format!(" ELSE {} END", self.compile(default)?));
                Ok(sql)
            }
            Expr::Greatest(args) => self.function("GREATEST", args),
            Expr::Coalesce(args) => self.function("COALESCE", args),
            Expr::NullIf(lhs, rhs) => {
                let lhs = self.compile(lhs)?;
                let rhs = self.compile(rhs)?;
                Ok(format!("NULLIF({}, {})", lhs, rhs))
            }
            Expr::Lookup {
                expr,
                lookup,
                value,
            } => {
                let target = self.compile(expr)?;
                let pattern = self.bind(QueryParam::String(escape_like(value)));
                Ok(match lookup {
                    TextLookup::IContains => {
                        format!("({} ILIKE ('%' || {}::text || '%'))", target, pattern)
                    }
                    TextLookup::IStartsWith => {
                        format!("({} ILIKE ({}::text || '%'))", target, pattern)
                    }
                })
            }
            Expr::TrigramSimilarity { text, query } => {
                let text = self.compile(text)?;
                let query = self.compile(query)?;
                Ok(format!("similarity({}, {})", text, query))
            }
            Expr::WordSimilarity { word, text } => {
                let word = self.compile(word)?;
                let text = self.compile(text)?;
                Ok(format!("word_similarity({}, {})", word, text))
            }
            Expr::SearchRank {
                sources,
                query,
                language,
                weights,
            } => self.search_rank(sources, query, language, weights),
        }
    }

    /// Compile an ordering term.
    pub fn compile_order(&mut self, order: &OrderBy) -> Result<String> {
        Ok(format!(
            "{} {}",
            self.compile(&order.expr)?,
            order.direction.as_sql()
        ))
    }

    fn literal(&mut self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => format!("{}::boolean", self.bind(QueryParam::Bool(*b))),
            Value::Int(i) => format!("{}::int8", self.bind(QueryParam::Int(*i))),
            Value::Float(f) => format!("{}::float8", self.bind(QueryParam::Float(*f))),
            Value::Text(s) => format!("{}::text", self.bind(QueryParam::String(s.clone()))),
        }
    }

    fn junction(&mut self, args: &[Expr], separator: &str, empty: &str) -> Result<String> {
        if args.is_empty() {
            return Ok(empty.to_string());
        }
        let parts = args
            .iter()
            .map(|arg| self.compile(arg))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("({})", parts.join(separator)))
    }

    fn function(&mut self, name: &str, args: &[Expr]) -> Result<String> {
        if args.is_empty() {
            return Err(Error::InvalidInput(format!(
                "{} requires at least one argument",
                name
            )));
        }
        let parts = args
            .iter()
            .map(|arg| self.compile(arg))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("{}({})", name, parts.join(", ")))
    }

    fn search_rank(
        &mut self,
        sources: &[VectorSource],
        query: &str,
        language: &str,
        weights: &[f64; 4],
    ) -> Result<String> {
        if sources.is_empty() {
            return Err(Error::InvalidInput(
                "search rank requires at least one vector field".to_string(),
            ));
        }

        let weights = self.bind(QueryParam::FloatArray(
            weights.iter().map(|w| *w as f32).collect(),
        ));

        let mut vectors = Vec::with_capacity(sources.len());
        for source in sources {
            let field = field_sql(self.alias, &source.field)?;
            let config = self.bind(QueryParam::String(source.config.clone()));
            vectors.push(format!(
                "setweight(to_tsvector({}::text::regconfig, COALESCE(({})::text, '')), '{}')",
                config,
                field,
                source.weight.as_str()
            ));
        }

        let language = self.bind(QueryParam::String(language.to_string()));
        let query = self.bind(QueryParam::String(query.to_string()));

        Ok(format!(
            "ts_rank({}::float4[], {}, plainto_tsquery({}::text::regconfig, {}::text))",
            weights,
            vectors.join(" || "),
            language,
            query
        ))
    }
}

/// Validate the annotation name and every column reference in `expr`.
pub fn check_annotation(
    name: &str,
    expr: &Expr,
    annotations: &[(String, Expr)],
) -> Result<()> {
    validate_identifier(name)?;
    if annotations.iter().any(|(n, _)| n == name) {
        return Err(Error::InvalidInput(format!(
            "annotation '{}' conflicts with an existing annotation",
            name
        )));
    }
    check_columns(expr, annotations)
}

/// Every `Column` in `expr` must name an existing annotation.
pub fn check_columns(expr: &Expr, annotations: &[(String, Expr)]) -> Result<()> {
    for column in expr.column_refs() {
        if !annotations.iter().any(|(n, _)| n == column) {
            return Err(Error::UnknownColumn(column.to_string()));
        }
    }
    Ok(())
}
