//! SQL dialects.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Target SQL dialect. Fixed for the lifetime of a statement builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Postgres: double-quoted identifiers, numbered `$n` placeholders.
    Postgres,
    /// MySQL: backtick identifiers, `?` placeholders.
    MySql,
    /// SQLite: double-quoted identifiers, `?` placeholders.
    Sqlite,
}

impl Dialect {
    /// All supported dialects.
    pub const ALL: [Dialect; 3] = [Dialect::Postgres, Dialect::MySql, Dialect::Sqlite];

    /// Quote an identifier, doubling any embedded quote character.
    pub fn quote(&self, ident: &str) -> String {
        let q = self.quote_char();
        let mut out = String::with_capacity(ident.len() + 2);
        out.push(q);
        for c in ident.chars() {
            if c == q {
                out.push(q);
            }
            out.push(c);
        }
        out.push(q);
        out
    }

    /// The identifier quote character.
    pub fn quote_char(&self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        }
    }

    /// Placeholder for the argument at 1-based position `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Whether `RETURNING` is accepted on INSERT statements.
    pub fn supports_returning(&self) -> bool {
        !matches!(self, Dialect::MySql)
    }

    /// Whether row locking clauses (`FOR UPDATE`, `FOR SHARE`) exist.
    pub fn supports_locking(&self) -> bool {
        !matches!(self, Dialect::Sqlite)
    }

    /// Whether `NULLS FIRST` / `NULLS LAST` are accepted in ORDER BY.
    pub fn supports_nulls_order(&self) -> bool {
        !matches!(self, Dialect::MySql)
    }

    /// The canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            other => Err(Error::invalid_query(format!("unknown dialect '{}'", other))),
        }
    }
}
