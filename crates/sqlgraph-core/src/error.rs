//! Core error types.

use thiserror::Error;

/// Errors produced while building a schema graph or compiling a predicate.
///
/// Every variant is a deterministic function of the graph and the predicate:
/// a compilation that fails here never reaches the database.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A node type is not registered in the graph.
    #[error("unknown node type '{node}'")]
    UnknownNode { node: String },

    /// A node type name was registered twice.
    #[error("node type '{node}' is already registered")]
    DuplicateNode { node: String },

    /// A predicate references a field absent from the resolved node.
    #[error("unknown field '{field}' on node '{node}'")]
    UnknownField { node: String, field: String },

    /// A predicate references a relationship absent from the resolved node.
    #[error("unknown edge '{edge}' on node '{node}'")]
    UnknownEdge { node: String, edge: String },

    /// Graph registration found inconsistent storage metadata.
    #[error("conflicting edge spec for '{edge}': {reason}")]
    ConflictingEdgeSpec { edge: String, reason: String },

    /// The requested compilation shape is not valid for the edge.
    #[error("unsupported operation on edge '{edge}': {reason}")]
    UnsupportedEdgeOperation { edge: String, reason: String },

    /// Builder-level misuse (missing FROM, incompatible literal, ...).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

/// Kinds of errors, for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownNode,
    DuplicateNode,
    UnknownField,
    UnknownEdge,
    ConflictingEdgeSpec,
    UnsupportedEdgeOperation,
    InvalidQuery,
    Serialization,
    Deserialization,
}

impl Error {
    /// Create an unknown field error.
    pub fn unknown_field(node: &str, field: &str) -> Self {
        Error::UnknownField {
            node: node.to_string(),
            field: field.to_string(),
        }
    }

    /// Create an unknown edge error.
    pub fn unknown_edge(node: &str, edge: &str) -> Self {
        Error::UnknownEdge {
            node: node.to_string(),
            edge: edge.to_string(),
        }
    }

    /// Create an unknown node error.
    pub fn unknown_node(node: &str) -> Self {
        Error::UnknownNode {
            node: node.to_string(),
        }
    }

    /// Create a duplicate node error.
    pub fn duplicate_node(node: &str) -> Self {
        Error::DuplicateNode {
            node: node.to_string(),
        }
    }

    /// Create a conflicting edge spec error.
    pub fn conflicting_edge(edge: &str, reason: impl Into<String>) -> Self {
        Error::ConflictingEdgeSpec {
            edge: edge.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported edge operation error.
    pub fn unsupported_edge(edge: &str, reason: impl Into<String>) -> Self {
        Error::UnsupportedEdgeOperation {
            edge: edge.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Error::InvalidQuery(message.into())
    }

    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownNode { .. } => ErrorKind::UnknownNode,
            Error::DuplicateNode { .. } => ErrorKind::DuplicateNode,
            Error::UnknownField { .. } => ErrorKind::UnknownField,
            Error::UnknownEdge { .. } => ErrorKind::UnknownEdge,
            Error::ConflictingEdgeSpec { .. } => ErrorKind::ConflictingEdgeSpec,
            Error::UnsupportedEdgeOperation { .. } => ErrorKind::UnsupportedEdgeOperation,
            Error::InvalidQuery(_) => ErrorKind::InvalidQuery,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::Deserialization(_) => ErrorKind::Deserialization,
        }
    }

    /// Whether the error was caused by the caller's predicate or query shape
    /// rather than by the graph description.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnknownField
                | ErrorKind::UnknownEdge
                | ErrorKind::UnknownNode
                | ErrorKind::UnsupportedEdgeOperation
                | ErrorKind::InvalidQuery
        )
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
