//! Edge (relationship) storage metadata.

use crate::error::{Error, Result};
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::fmt;

/// Relationship kind, seen from the owning node.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Archive,
    Serialize,
    Deserialize,
    SerdeSerialize,
    SerdeDeserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Rel {
    /// One-to-one.
    O2O,
    /// One-to-many (foreign key on the target table).
    O2M,
    /// Many-to-one (foreign key on the owning table).
    M2O,
    /// Many-to-many through a join table.
    M2M,
}

impl Rel {
    /// The kind of the counterpart edge.
    pub fn reversed(&self) -> Rel {
        match self {
            Rel::O2M => Rel::M2O,
            Rel::M2O => Rel::O2M,
            other => *other,
        }
    }

    /// Short name.
    pub fn name(&self) -> &'static str {
        match self {
            Rel::O2O => "o2o",
            Rel::O2M => "o2m",
            Rel::M2O => "m2o",
            Rel::M2M => "m2m",
        }
    }
}

impl fmt::Display for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How an edge is stored, resolved from its kind and inverse flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    /// The foreign key lives on the target table and references the owning
    /// node's primary key.
    TargetFk { table: &'a str, column: &'a str },
    /// The foreign key lives on the owning table and references the target's
    /// primary key.
    OwnerFk { table: &'a str, column: &'a str },
    /// A join table with one column per side.
    JoinTable {
        table: &'a str,
        /// Column referencing the owning node.
        own: &'a str,
        /// Column referencing the target node.
        other: &'a str,
    },
}

/// A directed relationship from an owning node to a target node type.
///
/// Columns follow the `[owner-side, target-side]` convention of the logical
/// relationship; the inverse side of a many-to-many pair carries the same
/// column list as its counterpart and picks its own column by the
/// [`inverse`](EdgeSpec::inverse) flag.
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct EdgeSpec {
    /// Edge name on the owning node. Set on registration.
    pub name: String,
    /// Relationship kind.
    pub rel: Rel,
    /// Whether this is the back-reference side of a bidirectional pair.
    pub inverse: bool,
    /// Storage table: the table holding the foreign key, or the join table.
    pub table: String,
    /// Foreign key column(s).
    pub columns: Vec<String>,
    /// Target node type. Set on registration.
    pub target: String,
    /// Name of the counterpart edge on the target node. Set on registration.
    pub inverse_of: Option<String>,
}

impl EdgeSpec {
    fn new(rel: Rel, table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: String::new(),
            rel,
            inverse: false,
            table: table.into(),
            columns,
            target: String::new(),
            inverse_of: None,
        }
    }

    /// Create a one-to-one edge stored as `table.column`.
    pub fn o2o(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(Rel::O2O, table, vec![column.into()])
    }

    /// Create a one-to-many edge; `table.column` on the target references the
    /// owner.
    pub fn o2m(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(Rel::O2M, table, vec![column.into()])
    }

    /// Create a many-to-one edge; `table.column` on the owner references the
    /// target.
    pub fn m2o(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(Rel::M2O, table, vec![column.into()]).as_inverse()
    }

    /// Create a many-to-many edge through a join table.
    pub fn m2m(
        join_table: impl Into<String>,
        owner_column: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self::new(
            Rel::M2M,
            join_table,
            vec![owner_column.into(), target_column.into()],
        )
    }

    /// Mark as the back-reference side of a pair.
    pub fn as_inverse(mut self) -> Self {
        self.inverse = true;
        self
    }

    /// The spec of the counterpart edge: same storage, reversed kind and
    /// flipped inverse flag.
    pub fn reversed(&self) -> Self {
        Self {
            name: String::new(),
            rel: self.rel.reversed(),
            inverse: !self.inverse,
            table: self.table.clone(),
            columns: self.columns.clone(),
            target: String::new(),
            inverse_of: None,
        }
    }

    /// Check if this is a many-to-many edge.
    pub fn is_many_to_many(&self) -> bool {
        self.rel == Rel::M2M
    }

    /// Whether the foreign key lives on the owning node's table.
    pub fn owns_fk(&self) -> bool {
        match self.rel {
            Rel::M2O => true,
            Rel::O2O => self.inverse,
            Rel::O2M | Rel::M2M => false,
        }
    }

    /// Whether following this edge yields at most one row.
    pub fn is_unique(&self) -> bool {
        matches!(self.rel, Rel::O2O | Rel::M2O)
    }

    /// Resolve the storage layout used to compile this edge.
    pub fn step(&self) -> Result<Step<'_>> {
        match (self.rel, self.columns.as_slice()) {
            (Rel::M2M, [first, second]) => {
                let (own, other) = if self.inverse {
                    (second.as_str(), first.as_str())
                } else {
                    (first.as_str(), second.as_str())
                };
                Ok(Step::JoinTable {
                    table: &self.table,
                    own,
                    other,
                })
            }
            (Rel::M2M, cols) => Err(Error::unsupported_edge(
                &self.name,
                format!("many-to-many edge needs 2 columns, has {}", cols.len()),
            )),
            (_, [column]) if self.owns_fk() => Ok(Step::OwnerFk {
                table: &self.table,
                column: column.as_str(),
            }),
            (_, [column]) => Ok(Step::TargetFk {
                table: &self.table,
                column: column.as_str(),
            }),
            (rel, cols) => Err(Error::unsupported_edge(
                &self.name,
                format!("{} edge needs 1 column, has {}", rel, cols.len()),
            )),
        }
    }
}
