//! In-memory query backend.
//!
//! [`MemoryQuerySet`] evaluates the same expression trees as the PostgreSQL
//! backend directly over JSON records. Comparison, logic and aggregate
//! functions follow SQL null semantics; trigram and full-text functions use
//! the approximations in [`trigram`] and [`fts`].

pub mod fts;
pub mod trigram;

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use relrank_core::defaults::LOOKUP_SEP;
use relrank_core::{
    BinaryOp, Error, Expr, OrderBy, OrderDirection, QuerySet, Result, ScoredRecord, SqlType,
    TextLookup, Value, VectorSource,
};

use crate::compiler::{check_annotation, check_columns};
use fts::WeightedText;

/// A lazily evaluated collection of JSON object records.
#[derive(Debug, Clone, Default)]
pub struct MemoryQuerySet {
    records: Vec<serde_json::Value>,
    annotations: Vec<(String, Expr)>,
    filters: Vec<Expr>,
    ordering: Vec<OrderBy>,
    limit: Option<i64>,
}

impl MemoryQuerySet {
    pub fn new(records: Vec<serde_json::Value>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Serialize `items` into records.
    pub fn from_items<T: Serialize>(items: &[T]) -> Result<Self> {
        let records = items
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Run annotations, filters, ordering and limit.
    pub fn evaluate(&self) -> Result<Vec<ScoredRecord>> {
        let mut rows: Vec<(Row<'_>, Vec<Value>)> = Vec::new();

        for record in &self.records {
            let mut row = Row {
                record,
                columns: BTreeMap::new(),
            };
            for (name, expr) in &self.annotations {
                let value = eval(expr, &row)?;
                row.columns.insert(name.as_str(), value);
            }

            let mut keep = true;
            for predicate in &self.filters {
                if eval(predicate, &row)? != Value::Bool(true) {
                    keep = false;
                    break;
                }
            }
            if !keep {
                continue;
            }

            let keys = self
                .ordering
                .iter()
                .map(|o| eval(&o.expr, &row))
                .collect::<Result<Vec<_>>>()?;
            rows.push((row, keys));
        }

        let ordering = &self.ordering;
        rows.sort_by(|(_, a), (_, b)| {
            for ((left, right), order) in a.iter().zip(b.iter()).zip(ordering) {
                let ord = compare_for_sort(left, right);
                let ord = match order.direction {
                    OrderDirection::Ascending => ord,
                    OrderDirection::Descending => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        if let Some(limit) = self.limit {
            rows.truncate(limit.max(0) as usize);
        }

        let results: Vec<ScoredRecord> = rows
            .into_iter()
            .map(|(row, _)| {
                let mut scored = ScoredRecord::new(row.record.clone());
                for (name, value) in row.columns {
                    if let Some(score) = score_of(&value) {
                        scored.scores.insert(name.to_string(), score);
                    }
                }
                scored
            })
            .collect();

        debug!(
            subsystem = "database",
            component = "memory",
            op = "evaluate",
            record_count = self.records.len(),
            result_count = results.len(),
            "Evaluated in-memory queryset"
        );
        Ok(results)
    }

    fn check_fields(&self, expr: &Expr) -> Result<()> {
        for path in expr.field_paths() {
            let column = path.split(LOOKUP_SEP).next().unwrap_or_default();
            for record in &self.records {
                let object = record.as_object().ok_or_else(|| {
                    Error::InvalidInput("in-memory records must be JSON objects".to_string())
                })?;
                if !object.contains_key(column) {
                    return Err(Error::UnknownField(path.to_string()));
                }
            }
        }
        Ok(())
    }
}

impl QuerySet for MemoryQuerySet {
    fn annotate(mut self, name: &str, expr: Expr) -> Result<Self> {
        check_annotation(name, &expr, &self.annotations)?;
        self.check_fields(&expr)?;
        trace!(
            subsystem = "database",
            component = "memory",
            column = name,
            "Annotation attached"
        );
        self.annotations.push((name.to_string(), expr));
        Ok(self)
    }

    fn filter(mut self, predicate: Expr) -> Result<Self> {
        check_columns(&predicate, &self.annotations)?;
        self.check_fields(&predicate)?;
        self.filters.push(predicate);
        Ok(self)
    }

    /// Fields missing from a record sort as null, so a tie-breaker on a key
    /// the records lack leaves the order stable instead of failing.
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

/// One record with the annotations computed for it so far.
#[derive(Debug)]
struct Row<'a> {
    record: &'a serde_json::Value,
    columns: BTreeMap<&'a str, Value>,
}

fn score_of(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => other.as_f64(),
    }
}

fn eval(expr: &Expr, row: &Row<'_>) -> Result<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Field(path) => Ok(resolve_field(row.record, path)),
        Expr::Column(name) => row
            .columns
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| Error::UnknownColumn(name.clone())),
        Expr::Cast { expr, to } => {
            let value = eval(expr, row)?;
            match to {
                SqlType::Text => Ok(to_text(&value).map_or(Value::Null, Value::Text)),
                SqlType::Float => to_float(&value),
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs, row)?;
            let rhs = eval(rhs, row)?;
            arithmetic(*op, &lhs, &rhs)
        }
        Expr::Compare { op, lhs, rhs } => {
            let lhs = eval(lhs, row)?;
            let rhs = eval(rhs, row)?;
            if lhs.is_null() || rhs.is_null() {
                return Ok(Value::Null);
            }
            let ord = compare_values(&lhs, &rhs)?;
            Ok(Value::Bool(op.accepts(ord)))
        }
        Expr::And(args) => {
            let mut saw_null = false;
            for arg in args {
                match truth(&eval(arg, row)?)? {
                    Some(false) => return Ok(Value::Bool(false)),
                    None => saw_null = true,
                    Some(true) => {}
                }
            }
            Ok(if saw_null { Value::Null } else { Value::Bool(true) })
        }
        Expr::Or(args) => {
            let mut saw_null = false;
            for arg in args {
                match truth(&eval(arg, row)?)? {
                    Some(true) => return Ok(Value::Bool(true)),
                    None => saw_null = true,
                    Some(false) => {}
                }
            }
            Ok(if saw_null { Value::Null } else { Value::Bool(false) })
        }
        Expr::Not(inner) => Ok(match truth(&eval(inner, row)?)? {
            Some(b) => Value::Bool(!b),
            None => Value::Null,
        }),
        Expr::IsNull(inner) => Ok(Value::Bool(eval(inner, row)?.is_null())),
        Expr::Case { whens, default } => {
            for (when, then) in whens {
                if eval(when, row)? == Value::Bool(true) {
                    return eval(then, row);
                }
            }
            eval(default, row)
        }
        Expr::Greatest(args) => {
            if args.is_empty() {
                return Err(Error::InvalidInput(
                    "GREATEST requires at least one argument".to_string(),
                ));
            }
            let mut best = Value::Null;
            for arg in args {
                let value = eval(arg, row)?;
                if value.is_null() {
                    continue;
                }
                if best.is_null() || compare_values(&value, &best)? == Ordering::Greater {
                    best = value;
                }
            }
            Ok(best)
        }
        Expr::Coalesce(args) => {
            if args.is_empty() {
                return Err(Error::InvalidInput(
                    "COALESCE requires at least one argument".to_string(),
                ));
            }
            for arg in args {
                let value = eval(arg, row)?;
                if !value.is_null() {
                    return Ok(value);
                }
            }
            Ok(Value::Null)
        }
        Expr::NullIf(lhs, rhs) => {
            let lhs = eval(lhs, row)?;
            let rhs = eval(rhs, row)?;
            if !lhs.is_null() && !rhs.is_null() && compare_values(&lhs, &rhs)? == Ordering::Equal {
                Ok(Value::Null)
            } else {
                Ok(lhs)
            }
        }
        Expr::Lookup {
            expr,
            lookup,
            value,
        } => {
            let Some(target) = to_text(&eval(expr, row)?) else {
                return Ok(Value::Null);
            };
            let target = target.to_lowercase();
            let needle = value.to_lowercase();
            Ok(Value::Bool(match lookup {
                TextLookup::IContains => target.contains(&needle),
                TextLookup::IStartsWith => target.starts_with(&needle),
            }))
        }
        Expr::TrigramSimilarity { text, query } => {
            match (to_text(&eval(text, row)?), to_text(&eval(query, row)?)) {
                (Some(text), Some(query)) => Ok(Value::Float(trigram::similarity(&text, &query))),
                _ => Ok(Value::Null),
            }
        }
        Expr::WordSimilarity { word, text } => {
            match (to_text(&eval(word, row)?), to_text(&eval(text, row)?)) {
                (Some(word), Some(text)) => {
                    Ok(Value::Float(trigram::word_similarity(&word, &text)))
                }
                _ => Ok(Value::Null),
            }
        }
        Expr::SearchRank {
            sources,
            query,
            weights,
            ..
        } => Ok(Value::Float(search_rank(row, sources, query, weights))),
    }
}

fn search_rank(row: &Row<'_>, sources: &[VectorSource], query: &str, weights: &[f64; 4]) -> f64 {
    let parts: Vec<WeightedText> = sources
        .iter()
        .map(|source| WeightedText {
            text: to_text(&resolve_field(row.record, &source.field)).unwrap_or_default(),
            weight: source.weight,
        })
        .collect();
    fts::rank(&parts, query, weights)
}

/// Read a `__`-separated path; missing keys read as null.
fn resolve_field(record: &serde_json::Value, path: &str) -> Value {
    let mut current = record;
    for segment in path.split(LOOKUP_SEP) {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    json_to_value(current)
}

fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        serde_json::Value::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Text(s) => Some(s.clone()),
    }
}

fn to_float(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| Error::Evaluation(format!("invalid input for float: '{}'", s))),
        Value::Bool(_) => Err(Error::Evaluation(
            "cannot cast boolean to float".to_string(),
        )),
    }
}

fn truth(value: &Value) -> Result<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        other => Err(Error::Evaluation(format!(
            "expected a boolean, found {:?}",
            other
        ))),
    }
}

fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Value::Null);
    }
    let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
        return Err(Error::Evaluation(format!(
            "operator {} requires numeric operands, found {:?} and {:?}",
            op.as_sql(),
            lhs,
            rhs
        )));
    };
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(Error::Evaluation("division by zero".to_string()));
            }
            a / b
        }
    };
    Ok(Value::Float(result))
}

/// Compare two non-null values of compatible types.
fn compare_values(lhs: &Value, rhs: &Value) -> Result<Ordering> {
    match (lhs, rhs) {
        (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Ok(a.partial_cmp(&b).unwrap_or(Ordering::Equal)),
            _ => Err(Error::Evaluation(format!(
                "cannot compare {:?} with {:?}",
                lhs, rhs
            ))),
        },
    }
}

/// Total order for sorting: nulls sort as the largest value, mismatched
/// types by kind.
fn compare_for_sort(lhs: &Value, rhs: &Value) -> Ordering {
    match (lhs.is_null(), rhs.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            compare_values(lhs, rhs).unwrap_or_else(|_| kind_rank(lhs).cmp(&kind_rank(rhs)))
        }
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Int(_) | Value::Float(_) => 1,
        Value::Text(_) => 2,
        Value::Null => 3,
    }
}
