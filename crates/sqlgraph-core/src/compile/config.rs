//! Compiler configuration.

use crate::error::{Error, Result};
use crate::sql::DEFAULT_ALIAS_PREFIX;
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Default maximum nesting of edge traversals.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default maximum nesting of predicates, combinators included.
pub const DEFAULT_MAX_NESTING: usize = 128;

/// Compiler configuration.
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Prefix of generated table aliases.
    pub alias_prefix: String,

    /// Maximum nesting of edge traversals in one predicate.
    pub max_depth: usize,

    /// Maximum nesting of predicates of any kind. Bounds the evaluator's
    /// recursion.
    pub max_nesting: usize,

    /// List node columns explicitly instead of `*` in generated SELECTs.
    pub select_columns: bool,
}

impl CompilerConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            alias_prefix: DEFAULT_ALIAS_PREFIX.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_nesting: DEFAULT_MAX_NESTING,
            select_columns: true,
        }
    }

    /// Set the alias prefix.
    pub fn with_alias_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.alias_prefix = prefix.into();
        self
    }

    /// Set the maximum traversal depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the maximum predicate nesting.
    pub fn with_max_nesting(mut self, nesting: usize) -> Self {
        self.max_nesting = nesting;
        self
    }

    /// Select `*` instead of listing columns.
    pub fn with_select_star(mut self) -> Self {
        self.select_columns = false;
        self
    }

    /// Check the settings.
    pub fn validate(&self) -> Result<()> {
        let mut chars = self.alias_prefix.chars();
        let valid_prefix = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_prefix {
            return Err(Error::invalid_query(format!(
                "alias prefix '{}' is not a plain identifier",
                self.alias_prefix
            )));
        }
        if self.max_depth == 0 {
            return Err(Error::invalid_query("max_depth must be at least 1"));
        }
        if self.max_nesting == 0 {
            return Err(Error::invalid_query("max_nesting must be at least 1"));
        }
        Ok(())
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::new()
    }
}
