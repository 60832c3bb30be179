//! Field-to-column mapping.

use super::types::FieldType;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// A node field and the column storing it.
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct FieldSpec {
    /// Logical field name used by predicates.
    pub name: String,
    /// Storage column name.
    pub column: String,
    /// Semantic type.
    pub field_type: FieldType,
    /// Whether the column may hold NULL.
    pub nullable: bool,
}

impl FieldSpec {
    /// Create a required field stored in a column of the same name.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            field_type,
            nullable: false,
        }
    }

    /// Create a nullable field.
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type).nullable()
    }

    /// Store the field in a differently named column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Mark as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}
