//! The schema graph: nodes plus validated edge registration.

use super::edge::{EdgeSpec, Rel};
use super::node::Node;
use crate::error::{Error, Result};
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::collections::BTreeMap;
use tracing::debug;

/// The set of nodes and edges a predicate is compiled against.
///
/// A graph is built once and only read afterwards; compilations borrow it
/// immutably and can share it across threads.
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct Graph {
    /// Schema version (monotonically increasing).
    pub version: u64,
    nodes: BTreeMap<String, Node>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            nodes: BTreeMap::new(),
        }
    }

    /// Register a node. Edges present on the node are ignored; register them
    /// with [`Graph::add_edge`].
    pub fn add_node(&mut self, mut node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.type_name) {
            return Err(Error::duplicate_node(&node.type_name));
        }
        if let Some(field) = node.duplicate_field() {
            return Err(Error::invalid_query(format!(
                "field or column '{}' declared twice on node '{}'",
                field, node.type_name
            )));
        }
        node.edges.clear();
        debug!(node = %node.type_name, table = %node.table, "registered node");
        self.nodes.insert(node.type_name.clone(), node);
        Ok(())
    }

    /// Register edge `name` from `from` to `to`.
    ///
    /// Validates column arity and foreign-key table ownership, and checks the
    /// edge against every registered edge sharing its storage table. A
    /// counterpart (swapped endpoints, reversed kind, opposite inverse flag,
    /// same storage) is linked through [`EdgeSpec::inverse_of`] on both sides;
    /// any other edge sharing a storage key is a conflict.
    pub fn add_edge(&mut self, name: &str, mut spec: EdgeSpec, from: &str, to: &str) -> Result<()> {
        let from_node = self.node(from)?;
        let to_node = self.node(to)?;
        if from_node.edges.contains_key(name) {
            return Err(Error::conflicting_edge(
                name,
                format!("node '{}' already has an edge with this name", from),
            ));
        }
        if from_node.field(name).is_some() {
            return Err(Error::conflicting_edge(
                name,
                format!("node '{}' has a field with this name", from),
            ));
        }

        spec.name = name.to_string();
        spec.target = to.to_string();
        spec.inverse_of = None;
        Self::check_storage(&spec, from_node, to_node)?;

        let mut counterpart = None;
        for (owner, other) in self.edges_on_table(&spec.table) {
            if !shares_storage_key(&spec, other) {
                continue;
            }
            if !is_counterpart(&spec, from, to, other, owner) {
                if spec.is_many_to_many()
                    && other.is_many_to_many()
                    && spec.columns != other.columns
                {
                    return Err(Error::conflicting_edge(
                        name,
                        format!(
                            "join table '{}' is registered by '{}.{}' with columns {:?}",
                            spec.table, owner, other.name, other.columns
                        ),
                    ));
                }
                return Err(Error::conflicting_edge(
                    name,
                    format!(
                        "storage of '{}' is already used by unrelated {} edge '{}.{}'",
                        spec.table, other.rel, owner, other.name
                    ),
                ));
            }
            if let Some(paired) = &other.inverse_of {
                return Err(Error::conflicting_edge(
                    name,
                    format!(
                        "'{}.{}' is already paired with '{}'",
                        owner, other.name, paired
                    ),
                ));
            }
            if counterpart.is_some() {
                return Err(Error::conflicting_edge(
                    name,
                    "more than one counterpart edge shares this storage",
                ));
            }
            counterpart = Some((owner.to_string(), other.name.clone()));
        }

        if let Some((owner, other)) = &counterpart {
            spec.inverse_of = Some(other.clone());
            if let Some(edge) = self
                .nodes
                .get_mut(owner)
                .and_then(|n| n.edges.get_mut(other))
            {
                edge.inverse_of = Some(name.to_string());
            }
        }

        debug!(
            edge = name,
            from,
            to,
            rel = %spec.rel,
            table = %spec.table,
            inverse_of = ?spec.inverse_of,
            "registered edge"
        );
        if let Some(node) = self.nodes.get_mut(from) {
            node.edges.insert(name.to_string(), spec);
        }
        Ok(())
    }

    fn check_storage(spec: &EdgeSpec, from: &Node, to: &Node) -> Result<()> {
        let expected = if spec.is_many_to_many() { 2 } else { 1 };
        if spec.columns.len() != expected {
            return Err(Error::conflicting_edge(
                &spec.name,
                format!(
                    "{} edge needs {} column(s), got {}",
                    spec.rel,
                    expected,
                    spec.columns.len()
                ),
            ));
        }
        if spec.columns.iter().any(String::is_empty) || spec.table.is_empty() {
            return Err(Error::conflicting_edge(
                &spec.name,
                "storage table and columns must be named",
            ));
        }
        match spec.rel {
            Rel::M2M => {
                if spec.columns[0] == spec.columns[1] {
                    return Err(Error::conflicting_edge(
                        &spec.name,
                        "join table columns must differ",
                    ));
                }
            }
            _ => {
                let owner = if spec.owns_fk() { from } else { to };
                if spec.table != owner.table {
                    return Err(Error::conflicting_edge(
                        &spec.name,
                        format!(
                            "foreign key of a {}{} edge must live on table '{}', got '{}'",
                            spec.rel,
                            if spec.inverse { " inverse" } else { "" },
                            owner.table,
                            spec.table
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    fn edges_on_table<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a EdgeSpec)> + 'a {
        self.nodes.values().flat_map(move |n| {
            n.edges
                .values()
                .filter(move |e| e.table == table)
                .map(move |e| (n.type_name.as_str(), e))
        })
    }

    /// Get a node by type name.
    pub fn node(&self, name: &str) -> Result<&Node> {
        self.nodes.get(name).ok_or_else(|| Error::unknown_node(name))
    }

    /// Get an edge of a node.
    pub fn edge(&self, node: &str, edge: &str) -> Result<&EdgeSpec> {
        self.node(node)?
            .edge(edge)
            .ok_or_else(|| Error::unknown_edge(node, edge))
    }

    /// Nodes in type-name order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Serialize the graph to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a graph from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Whether two edges on the same table store their link in the same column.
fn shares_storage_key(a: &EdgeSpec, b: &EdgeSpec) -> bool {
    a.columns.iter().any(|c| b.columns.contains(c))
}

/// Whether `other` (owned by `other_owner`) is the back-reference of a new
/// edge from `from` to `to`.
fn is_counterpart(
    spec: &EdgeSpec,
    from: &str,
    to: &str,
    other: &EdgeSpec,
    other_owner: &str,
) -> bool {
    other_owner == to
        && other.target == from
        && other.rel == spec.rel.reversed()
        && other.inverse != spec.inverse
        && other.columns == spec.columns
}
