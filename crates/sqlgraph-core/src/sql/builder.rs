//! Statement text and positional argument accumulation.

use super::dialect::Dialect;
use crate::error::{Error, Result};
use crate::value::Value;

/// Anything that renders to a SQL string plus its positional arguments.
pub trait Querier {
    /// Render the statement. The argument order matches the placeholders
    /// left to right.
    fn query(&self) -> Result<(String, Vec<Value>)>;
}

/// Accumulates SQL text and the argument list for one statement.
///
/// Placeholders are numbered as arguments are appended, so nested
/// subqueries rendered into the same builder share one monotonic sequence.
#[derive(Debug)]
pub struct Builder {
    dialect: Dialect,
    sql: String,
    args: Vec<Value>,
}

impl Builder {
    /// Create an empty builder for a dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            args: Vec::new(),
        }
    }

    /// The builder's dialect.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Append trusted SQL text.
    pub fn push(&mut self, s: &str) -> &mut Self {
        self.sql.push_str(s);
        self
    }

    /// Append a quoted identifier.
    pub fn ident(&mut self, name: &str) -> &mut Self {
        let quoted = self.dialect.quote(name);
        self.sql.push_str(&quoted);
        self
    }

    /// Append `"qualifier"."name"`, or just `"name"` without a qualifier.
    pub fn qualified(&mut self, qualifier: Option<&str>, name: &str) -> &mut Self {
        if let Some(q) = qualifier {
            self.ident(q);
            self.sql.push('.');
        }
        self.ident(name)
    }

    /// Append a placeholder and bind `value` to it.
    pub fn arg(&mut self, value: Value) -> &mut Self {
        self.args.push(value);
        let ph = self.dialect.placeholder(self.args.len());
        self.sql.push_str(&ph);
        self
    }

    /// Append raw SQL whose `?` marks are bound, in order, to `args`.
    pub fn raw(&mut self, sql: &str, args: &[Value]) -> Result<&mut Self> {
        let marks = sql.matches('?').count();
        if marks != args.len() {
            return Err(Error::invalid_query(format!(
                "raw fragment has {} placeholder(s) but {} argument(s)",
                marks,
                args.len()
            )));
        }
        let mut args = args.iter();
        for (i, part) in sql.split('?').enumerate() {
            if i > 0 {
                if let Some(v) = args.next() {
                    self.arg(v.clone());
                }
            }
            self.sql.push_str(part);
        }
        Ok(self)
    }

    /// Consume the builder.
    pub fn finish(self) -> (String, Vec<Value>) {
        (self.sql, self.args)
    }
}
