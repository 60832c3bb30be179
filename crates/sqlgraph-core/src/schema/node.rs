//! Node (entity) definitions.

use super::edge::EdgeSpec;
use super::field::FieldSpec;
use super::types::FieldType;
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::collections::BTreeMap;

/// One entity type and the table storing it.
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct Node {
    /// Logical type name (unique within a graph).
    pub type_name: String,
    /// Storage table name.
    pub table: String,
    /// Primary key.
    pub id: FieldSpec,
    /// Fields in declaration order.
    pub fields: Vec<FieldSpec>,
    /// Edges keyed by name. Only populated through `Graph::add_edge`.
    pub(crate) edges: BTreeMap<String, EdgeSpec>,
}

impl Node {
    /// Create a node with an integer `id` primary key.
    pub fn new(type_name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            table: table.into(),
            id: FieldSpec::new("id", FieldType::Int),
            fields: Vec::new(),
            edges: BTreeMap::new(),
        }
    }

    /// Set the primary key.
    pub fn with_id(mut self, id: FieldSpec) -> Self {
        self.id = id;
        self
    }

    /// Add a field.
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by logical name. The primary key is addressable by
    /// its own name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        if self.id.name == name {
            return Some(&self.id);
        }
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up an edge by name.
    pub fn edge(&self, name: &str) -> Option<&EdgeSpec> {
        self.edges.get(name)
    }

    /// Edges in name order.
    pub fn edges(&self) -> impl Iterator<Item = &EdgeSpec> {
        self.edges.values()
    }

    /// Storage columns: primary key first, then fields in declaration order.
    pub fn columns(&self) -> Vec<&str> {
        std::iter::once(self.id.column.as_str())
            .chain(self.fields.iter().map(|f| f.column.as_str()))
            .collect()
    }

    /// Check for a duplicate field or column name.
    pub(crate) fn duplicate_field(&self) -> Option<&str> {
        let all: Vec<&FieldSpec> = std::iter::once(&self.id).chain(&self.fields).collect();
        all.iter().enumerate().find_map(|(i, f)| {
            all[..i]
                .iter()
                .any(|g| g.name == f.name || g.column == f.column)
                .then_some(f.name.as_str())
        })
    }
}
