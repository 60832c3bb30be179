//! Serde-loadable graph descriptions.
//!
//! A [`GraphDef`] is the plain data form produced by a schema compiler (or
//! written by hand as JSON). [`Graph::from_definition`] replays it through
//! [`Graph::add_node`] and [`Graph::add_edge`], so a description gets the
//! same validation as a graph built in code.

use super::edge::{EdgeSpec, Rel};
use super::field::FieldSpec;
use super::graph::Graph;
use super::node::Node;
use super::types::FieldType;
use crate::error::{Error, Result};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// A whole graph.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct GraphDef {
    #[serde(default)]
    pub version: u64,
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
}

/// One node.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct NodeDef {
    pub name: String,
    pub table: String,
    /// Primary key; defaults to an integer `id` column.
    #[serde(default)]
    pub id: Option<FieldDef>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// One field. `column` defaults to the field name.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
}

/// One directed edge.
#[derive(Debug, Clone, PartialEq, SerdeSerialize, SerdeDeserialize)]
pub struct EdgeDef {
    pub name: String,
    pub from: String,
    pub to: String,
    pub rel: Rel,
    /// Defaults to true for `m2o`, false otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<bool>,
    pub table: String,
    pub columns: Vec<String>,
}

impl From<&FieldDef> for FieldSpec {
    fn from(def: &FieldDef) -> Self {
        let mut spec = FieldSpec::new(def.name.clone(), def.field_type);
        if let Some(column) = &def.column {
            spec = spec.with_column(column.clone());
        }
        if def.nullable {
            spec = spec.nullable();
        }
        spec
    }
}

impl From<&EdgeDef> for EdgeSpec {
    fn from(def: &EdgeDef) -> Self {
        EdgeSpec {
            name: def.name.clone(),
            rel: def.rel,
            inverse: def.inverse.unwrap_or(def.rel == Rel::M2O),
            table: def.table.clone(),
            columns: def.columns.clone(),
            target: def.to.clone(),
            inverse_of: None,
        }
    }
}

impl GraphDef {
    /// Parse a JSON description.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Render as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl Graph {
    /// Build a graph from a description, validating every edge.
    pub fn from_definition(def: &GraphDef) -> Result<Self> {
        let mut graph = Graph::new(def.version);
        for n in &def.nodes {
            let mut node = Node::new(n.name.clone(), n.table.clone());
            if let Some(id) = &n.id {
                node = node.with_id(id.into());
            }
            for f in &n.fields {
                node = node.with_field(f.into());
            }
            graph.add_node(node)?;
        }
        for e in &def.edges {
            graph.add_edge(&e.name, e.into(), &e.from, &e.to)?;
        }
        Ok(graph)
    }

    /// Build a graph from a JSON description.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_definition(&GraphDef::from_json(json)?)
    }

    /// The description of this graph. Each bidirectional pair is emitted as
    /// two edges; re-loading the description yields an equal graph.
    pub fn to_definition(&self) -> GraphDef {
        let nodes = self
            .nodes()
            .map(|n| NodeDef {
                name: n.type_name.clone(),
                table: n.table.clone(),
                id: Some(field_def(&n.id)),
                fields: n.fields.iter().map(field_def).collect(),
            })
            .collect();
        let edges = self
            .nodes()
            .flat_map(|n| {
                n.edges().map(move |e| EdgeDef {
                    name: e.name.clone(),
                    from: n.type_name.clone(),
                    to: e.target.clone(),
                    rel: e.rel,
                    inverse: Some(e.inverse),
                    table: e.table.clone(),
                    columns: e.columns.clone(),
                })
            })
            .collect();
        GraphDef {
            version: self.version,
            nodes,
            edges,
        }
    }
}

fn field_def(spec: &FieldSpec) -> FieldDef {
    FieldDef {
        name: spec.name.clone(),
        column: (spec.column != spec.name).then(|| spec.column.clone()),
        field_type: spec.field_type,
        nullable: spec.nullable,
    }
}
