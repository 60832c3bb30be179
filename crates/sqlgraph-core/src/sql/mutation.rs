//! INSERT, UPDATE and DELETE statement builders.

use super::builder::{Builder, Querier};
use super::dialect::Dialect;
use super::expr::P;
use crate::error::{Error, Result};
use crate::value::Value;

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBuilder {
    dialect: Dialect,
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    returning: Vec<String>,
}

impl InsertBuilder {
    /// Insert into `table`.
    pub fn new(dialect: Dialect, table: impl Into<String>) -> Self {
        Self {
            dialect,
            table: table.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            returning: Vec::new(),
        }
    }

    /// Set the column list.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a row of values, in column order.
    pub fn values(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }

    /// Add a `RETURNING` clause.
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = columns.into_iter().map(Into::into).collect();
        self
    }
}

impl Querier for InsertBuilder {
    fn query(&self) -> Result<(String, Vec<Value>)> {
        if self.columns.is_empty() || self.rows.is_empty() {
            return Err(Error::invalid_query(format!(
                "INSERT into {} needs columns and at least one row",
                self.table
            )));
        }
        if let Some(row) = self.rows.iter().find(|r| r.len() != self.columns.len()) {
            return Err(Error::invalid_query(format!(
                "INSERT row has {} value(s) for {} column(s)",
                row.len(),
                self.columns.len()
            )));
        }
        if !self.returning.is_empty() && !self.dialect.supports_returning() {
            return Err(Error::invalid_query(format!(
                "{} does not support RETURNING",
                self.dialect
            )));
        }

        let mut b = Builder::new(self.dialect);
        b.push("INSERT INTO ").ident(&self.table).push(" (");
        push_idents(&mut b, &self.columns);
        b.push(") VALUES ");
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                b.push(", ");
            }
            b.push("(");
            for (j, v) in row.iter().enumerate() {
                if j > 0 {
                    b.push(", ");
                }
                b.arg(v.clone());
            }
            b.push(")");
        }
        if !self.returning.is_empty() {
            b.push(" RETURNING ");
            push_idents(&mut b, &self.returning);
        }
        Ok(b.finish())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Assignment {
    Set(String, Value),
    Null(String),
    Add(String, Value),
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBuilder {
    dialect: Dialect,
    table: String,
    assignments: Vec<Assignment>,
    predicate: Option<P>,
}

impl UpdateBuilder {
    /// Update rows of `table`.
    pub fn new(dialect: Dialect, table: impl Into<String>) -> Self {
        Self {
            dialect,
            table: table.into(),
            assignments: Vec::new(),
            predicate: None,
        }
    }

    /// `SET column = value`.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments
            .push(Assignment::Set(column.into(), value.into()));
        self
    }

    /// `SET column = NULL`.
    pub fn set_null(mut self, column: impl Into<String>) -> Self {
        self.assignments.push(Assignment::Null(column.into()));
        self
    }

    /// `SET column = COALESCE(column, 0) + value`.
    pub fn add(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments
            .push(Assignment::Add(column.into(), value.into()));
        self
    }

    /// Add a WHERE predicate, conjunctively.
    pub fn where_p(mut self, p: P) -> Self {
        self.predicate = Some(match self.predicate.take() {
            None => p,
            Some(existing) => existing.and_also(p),
        });
        self
    }
}

impl Querier for UpdateBuilder {
    fn query(&self) -> Result<(String, Vec<Value>)> {
        if self.assignments.is_empty() {
            return Err(Error::invalid_query(format!(
                "UPDATE {} without SET",
                self.table
            )));
        }
        let mut b = Builder::new(self.dialect);
        b.push("UPDATE ").ident(&self.table).push(" SET ");
        for (i, a) in self.assignments.iter().enumerate() {
            if i > 0 {
                b.push(", ");
            }
            match a {
                Assignment::Set(c, v) => {
                    b.ident(c).push(" = ").arg(v.clone());
                }
                Assignment::Null(c) => {
                    b.ident(c).push(" = NULL");
                }
                Assignment::Add(c, v) => {
                    if !matches!(v, Value::Int(_) | Value::Float(_)) {
                        return Err(Error::invalid_query(format!(
                            "cannot add {} value to column {}",
                            v.type_name(),
                            c
                        )));
                    }
                    b.ident(c).push(" = COALESCE(");
                    b.ident(c).push(", 0) + ").arg(v.clone());
                }
            }
        }
        if let Some(p) = &self.predicate {
            b.push(" WHERE ");
            p.build(&mut b)?;
        }
        Ok(b.finish())
    }
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteBuilder {
    dialect: Dialect,
    table: String,
    predicate: Option<P>,
}

impl DeleteBuilder {
    /// Delete rows of `table`.
    pub fn new(dialect: Dialect, table: impl Into<String>) -> Self {
        Self {
            dialect,
            table: table.into(),
            predicate: None,
        }
    }

    /// Add a WHERE predicate, conjunctively.
    pub fn where_p(mut self, p: P) -> Self {
        self.predicate = Some(match self.predicate.take() {
            None => p,
            Some(existing) => existing.and_also(p),
        });
        self
    }
}

impl Querier for DeleteBuilder {
    fn query(&self) -> Result<(String, Vec<Value>)> {
        let mut b = Builder::new(self.dialect);
        b.push("DELETE FROM ").ident(&self.table);
        if let Some(p) = &self.predicate {
            b.push(" WHERE ");
            p.build(&mut b)?;
        }
        Ok(b.finish())
    }
}

fn push_idents(b: &mut Builder, names: &[String]) {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            b.push(", ");
        }
        b.ident(name);
    }
}
