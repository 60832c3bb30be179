//! Predicate AST: filters over node fields and edges, referenced by name.

use crate::error::Result;
use crate::sql::{CmpOp, Selector};
use crate::value::Value;
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::fmt;
use std::sync::Arc;

/// Field operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerdeSerialize, SerdeDeserialize)]
pub enum Op {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// String starts with the literal.
    HasPrefix,
    /// String ends with the literal.
    HasSuffix,
    /// String contains the literal.
    Contains,
    /// Case-insensitive equality.
    EqualFold,
    /// Case-insensitive containment.
    ContainsFold,
}

impl Op {
    /// The plain comparison this operator maps to, if any.
    pub fn cmp(&self) -> Option<CmpOp> {
        match self {
            Op::Eq => Some(CmpOp::Eq),
            Op::Ne => Some(CmpOp::Ne),
            Op::Lt => Some(CmpOp::Lt),
            Op::Le => Some(CmpOp::Le),
            Op::Gt => Some(CmpOp::Gt),
            Op::Ge => Some(CmpOp::Ge),
            _ => None,
        }
    }

    /// Check if this operator only applies to text.
    pub fn is_string_op(&self) -> bool {
        self.cmp().is_none()
    }
}

/// Callback signature of [`RawPredicate`].
///
/// Receives the selector of the current scope and the name the current
/// node's columns are qualified with.
pub type RawFn = dyn Fn(&mut Selector, &str) -> Result<()> + Send + Sync;

/// Caller-supplied SQL hook, run against the selector of the scope it
/// appears in (a subquery when nested inside [`Predicate::HasEdgeWith`]).
#[derive(Clone)]
pub struct RawPredicate(Arc<RawFn>);

impl RawPredicate {
    /// Wrap a callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Selector, &str) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, selector: &mut Selector, qualifier: &str) -> Result<()> {
        (self.0)(selector, qualifier)
    }
}

impl fmt::Debug for RawPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawPredicate(..)")
    }
}

impl PartialEq for RawPredicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A filter over the rows of one node type.
///
/// Predicates only hold names; they are resolved against a [`Graph`] when
/// compiled. Raw hooks cannot be serialized.
///
/// [`Graph`]: crate::schema::Graph
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub enum Predicate {
    /// `field OP literal`.
    Compare { field: String, op: Op, value: Value },
    /// `field OP field` on the same node.
    CompareFields { left: String, op: Op, right: String },
    /// `field [NOT] IN (values)`.
    In {
        field: String,
        values: Vec<Value>,
        #[serde(default)]
        negated: bool,
    },
    /// `field IS [NOT] NULL`.
    IsNull {
        field: String,
        #[serde(default)]
        negated: bool,
    },
    /// All children hold.
    And(Vec<Predicate>),
    /// At least one child holds.
    Or(Vec<Predicate>),
    /// The child does not hold.
    Not(Box<Predicate>),
    /// At least one row is reachable over the edge.
    HasEdge(String),
    /// At least one row reachable over the edge satisfies all predicates,
    /// evaluated against the edge's target node.
    HasEdgeWith {
        edge: String,
        predicates: Vec<Predicate>,
    },
    /// Caller-supplied SQL hook.
    #[serde(skip)]
    Raw(RawPredicate),
}

impl Predicate {
    /// Create a field comparison.
    pub fn compare(field: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Op::Eq, value)
    }

    /// Create a not-equal filter.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Op::Ne, value)
    }

    /// Create a less-than filter.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Op::Lt, value)
    }

    /// Create a less-than-or-equal filter.
    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Op::Le, value)
    }

    /// Create a greater-than filter.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Op::Gt, value)
    }

    /// Create a greater-than-or-equal filter.
    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Op::Ge, value)
    }

    /// Create a prefix filter.
    pub fn has_prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::compare(field, Op::HasPrefix, Value::String(prefix.into()))
    }

    /// Create a suffix filter.
    pub fn has_suffix(field: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::compare(field, Op::HasSuffix, Value::String(suffix.into()))
    }

    /// Create a substring filter.
    pub fn contains(field: impl Into<String>, sub: impl Into<String>) -> Self {
        Self::compare(field, Op::Contains, Value::String(sub.into()))
    }

    /// Create a case-insensitive equality filter.
    pub fn equal_fold(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(field, Op::EqualFold, Value::String(value.into()))
    }

    /// Create a case-insensitive substring filter.
    pub fn contains_fold(field: impl Into<String>, sub: impl Into<String>) -> Self {
        Self::compare(field, Op::ContainsFold, Value::String(sub.into()))
    }

    /// Compare two fields of the same node.
    pub fn fields(left: impl Into<String>, op: Op, right: impl Into<String>) -> Self {
        Predicate::CompareFields {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    /// Create an IN filter.
    pub fn in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        Predicate::In {
            field: field.into(),
            values,
            negated: false,
        }
    }

    /// Create a NOT IN filter.
    pub fn not_in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        Predicate::In {
            field: field.into(),
            values,
            negated: true,
        }
    }

    /// Create an IS NULL filter.
    pub fn is_null(field: impl Into<String>) -> Self {
        Predicate::IsNull {
            field: field.into(),
            negated: false,
        }
    }

    /// Create an IS NOT NULL filter.
    pub fn not_null(field: impl Into<String>) -> Self {
        Predicate::IsNull {
            field: field.into(),
            negated: true,
        }
    }

    /// Conjunction.
    pub fn and(predicates: Vec<Predicate>) -> Self {
        Predicate::And(predicates)
    }

    /// Disjunction.
    pub fn or(predicates: Vec<Predicate>) -> Self {
        Predicate::Or(predicates)
    }

    /// Negation.
    pub fn not(predicate: Predicate) -> Self {
        Predicate::Not(Box::new(predicate))
    }

    /// Edge existence.
    pub fn has_edge(edge: impl Into<String>) -> Self {
        Predicate::HasEdge(edge.into())
    }

    /// Edge existence with predicates on the target node.
    pub fn has_edge_with(edge: impl Into<String>, predicates: Vec<Predicate>) -> Self {
        Predicate::HasEdgeWith {
            edge: edge.into(),
            predicates,
        }
    }

    /// Raw SQL hook.
    pub fn raw<F>(f: F) -> Self
    where
        F: Fn(&mut Selector, &str) -> Result<()> + Send + Sync + 'static,
    {
        Predicate::Raw(RawPredicate::new(f))
    }

    /// Parse a predicate from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::Error::Deserialization(e.to_string()))
    }

    /// Number of edge traversals on the deepest path.
    pub fn depth(&self) -> usize {
        match self {
            Predicate::And(ps) | Predicate::Or(ps) => {
                ps.iter().map(Predicate::depth).max().unwrap_or(0)
            }
            Predicate::Not(p) => p.depth(),
            Predicate::HasEdge(_) => 1,
            Predicate::HasEdgeWith { predicates, .. } => {
                1 + predicates.iter().map(Predicate::depth).max().unwrap_or(0)
            }
            _ => 0,
        }
    }
}
