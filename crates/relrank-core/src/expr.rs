//! Backend-agnostic expression tree for ranking queries.
//!
//! Ranking logic builds [`Expr`] values; each query backend lowers them on
//! its own (SQL text for PostgreSQL, direct evaluation for in-memory
//! collections). Nothing in this module knows how an expression is executed.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::signals::VectorWeight;
use crate::{Error, Result};

/// A literal scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// Comparison operator used for gating and predicates.
///
/// Parses from the lookup suffixes used in view configuration (`gte`, `gt`,
/// `lte`, `lt`) as well as the operator symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    #[default]
    Gte,
    Gt,
    Lte,
    Lt,
}

impl Comparator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparator::Gte => ">=",
            Comparator::Gt => ">",
            Comparator::Lte => "<=",
            Comparator::Lt => "<",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Gte => "gte",
            Comparator::Gt => "gt",
            Comparator::Lte => "lte",
            Comparator::Lt => "lt",
        }
    }

    /// Whether `ordering` (of lhs relative to rhs) satisfies the comparator.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Comparator::Gte => ordering != Ordering::Less,
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Lte => ordering != Ordering::Greater,
            Comparator::Lt => ordering == Ordering::Less,
        }
    }

    /// Compare two floats; NaN never satisfies any comparator.
    pub fn compare(&self, lhs: f64, rhs: f64) -> bool {
        lhs.partial_cmp(&rhs)
            .map(|ord| self.accepts(ord))
            .unwrap_or(false)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gte" | ">=" => Ok(Comparator::Gte),
            "gt" | ">" => Ok(Comparator::Gt),
            "lte" | "<=" => Ok(Comparator::Lte),
            "lt" | "<" => Ok(Comparator::Lt),
            other => Err(Error::Config(format!(
                "unknown comparator '{}', expected one of gte, gt, lte, lt",
                other
            ))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    #[serde(alias = "desc")]
    Descending,
    #[serde(alias = "asc")]
    Ascending,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Descending => "DESC",
            OrderDirection::Ascending => "ASC",
        }
    }
}

impl FromStr for OrderDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "desc" | "descending" => Ok(OrderDirection::Descending),
            "asc" | "ascending" => Ok(OrderDirection::Ascending),
            other => Err(Error::Config(format!("unknown order direction '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Target type of a cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Float,
}

/// Case-insensitive text lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLookup {
    /// Field contains the value anywhere.
    IContains,
    /// Field starts with the value.
    IStartsWith,
}

/// One weighted field feeding a full-text vector.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSource {
    pub field: String,
    pub weight: VectorWeight,
    /// Text search configuration (language) used to build the vector.
    pub config: String,
}

/// Expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Field path on the base record (`name`, `category__name`).
    Field(String),
    /// Previously attached annotation.
    Column(String),
    Cast {
        expr: Box<Expr>,
        to: SqlType,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Compare {
        op: Comparator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    IsNull(Box<Expr>),
    /// First matching `when` wins; `default` otherwise.
    Case {
        whens: Vec<(Expr, Expr)>,
        default: Box<Expr>,
    },
    /// Largest non-null argument.
    Greatest(Vec<Expr>),
    /// First non-null argument.
    Coalesce(Vec<Expr>),
    /// Null when both sides are equal, `lhs` otherwise.
    NullIf(Box<Expr>, Box<Expr>),
    Lookup {
        expr: Box<Expr>,
        lookup: TextLookup,
        value: String,
    },
    /// Trigram similarity between `text` and `query`, in [0, 1].
    TrigramSimilarity {
        text: Box<Expr>,
        query: Box<Expr>,
    },
    /// Trigram similarity between `word` and the best matching part of `text`.
    WordSimilarity {
        word: Box<Expr>,
        text: Box<Expr>,
    },
    /// Full-text rank of the weighted vector built from `sources` against `query`.
    SearchRank {
        sources: Vec<VectorSource>,
        query: String,
        language: String,
        weights: [f64; 4],
    },
}

impl Expr {
    pub fn float(v: f64) -> Self {
        Expr::Literal(Value::Float(v))
    }

    pub fn text(v: impl Into<String>) -> Self {
        Expr::Literal(Value::Text(v.into()))
    }

    pub fn null() -> Self {
        Expr::Literal(Value::Null)
    }

    pub fn field(path: impl Into<String>) -> Self {
        Expr::Field(path.into())
    }

    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn cast_text(self) -> Self {
        Expr::Cast {
            expr: Box::new(self),
            to: SqlType::Text,
        }
    }

    pub fn icontains(self, value: impl Into<String>) -> Self {
        Expr::Lookup {
            expr: Box::new(self),
            lookup: TextLookup::IContains,
            value: value.into(),
        }
    }

    pub fn istartswith(self, value: impl Into<String>) -> Self {
        Expr::Lookup {
            expr: Box::new(self),
            lookup: TextLookup::IStartsWith,
            value: value.into(),
        }
    }

    pub fn compare(self, op: Comparator, rhs: Expr) -> Self {
        Expr::Compare {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    pub fn gt(self, rhs: Expr) -> Self {
        self.compare(Comparator::Gt, rhs)
    }

    pub fn is_null(self) -> Self {
        Expr::IsNull(Box::new(self))
    }

    /// `COALESCE(self, 0)`.
    pub fn or_zero(self) -> Self {
        Expr::Coalesce(vec![self, Expr::float(0.0)])
    }

    pub fn null_if(self, rhs: Expr) -> Self {
        Expr::NullIf(Box::new(self), Box::new(rhs))
    }

    pub fn case(whens: Vec<(Expr, Expr)>, default: Expr) -> Self {
        Expr::Case {
            whens,
            default: Box::new(default),
        }
    }

    /// `CASE WHEN predicate THEN then ELSE otherwise END`.
    pub fn when(predicate: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::case(vec![(predicate, then)], otherwise)
    }

    /// Sum of `terms`; zero when empty.
    pub fn sum(terms: impl IntoIterator<Item = Expr>) -> Self {
        terms
            .into_iter()
            .reduce(|acc, term| acc + term)
            .unwrap_or_else(|| Expr::float(0.0))
    }

    /// `GREATEST(...)`, collapsing to the only argument when there is one.
    pub fn greatest(mut args: Vec<Expr>) -> Self {
        if args.len() == 1 {
            args.remove(0)
        } else {
            Expr::Greatest(args)
        }
    }

    /// Visit this node and every descendant, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Expr::Literal(_) | Expr::Field(_) | Expr::Column(_) | Expr::SearchRank { .. } => {}
            Expr::Cast { expr, .. }
            | Expr::Not(expr)
            | Expr::IsNull(expr)
            | Expr::Lookup { expr, .. } => expr.walk(f),
            Expr::Binary { lhs, rhs, .. } | Expr::Compare { lhs, rhs, .. } => {
                lhs.walk(f);
                rhs.walk(f);
            }
            Expr::NullIf(lhs, rhs) => {
                lhs.walk(f);
                rhs.walk(f);
            }
            Expr::And(args) | Expr::Or(args) | Expr::Greatest(args) | Expr::Coalesce(args) => {
                for arg in args {
                    arg.walk(f);
                }
            }
            Expr::Case { whens, default } => {
                for (when, then) in whens {
                    when.walk(f);
                    then.walk(f);
                }
                default.walk(f);
            }
            Expr::TrigramSimilarity { text, query } => {
                text.walk(f);
                query.walk(f);
            }
            Expr::WordSimilarity { word, text } => {
                word.walk(f);
                text.walk(f);
            }
        }
    }

    /// Field paths referenced anywhere in the tree, including vector sources.
    pub fn field_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        self.walk(&mut |node| match node {
            Expr::Field(path) => paths.push(path.as_str()),
            Expr::SearchRank { sources, .. } => {
                paths.extend(sources.iter().map(|s| s.field.as_str()));
            }
            _ => {}
        });
        paths
    }

    /// Annotation names referenced anywhere in the tree.
    pub fn column_refs(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(&mut |node| {
            if let Expr::Column(name) = node {
                names.push(name.as_str());
            }
        });
        names
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::Binary {
            op: BinaryOp::Div,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }
}

/// One ordering term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub direction: OrderDirection,
}

impl OrderBy {
    pub fn new(expr: Expr, direction: OrderDirection) -> Self {
        Self { expr, direction }
    }

    pub fn asc(expr: Expr) -> Self {
        Self::new(expr, OrderDirection::Ascending)
    }

    pub fn desc(expr: Expr) -> Self {
        Self::new(expr, OrderDirection::Descending)
    }
}
