//! Command execution against a loaded graph.

use crate::formatter::Formatter;
use sqlgraph_core::{Compiler, Dialect, FieldType, Graph, Predicate, Querier, Value};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Execution errors.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// Graph or predicate file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Compilation or graph validation error.
    #[error("{0}")]
    Compile(#[from] sqlgraph_core::Error),

    /// Command-line argument that cannot be interpreted.
    #[error("{0}")]
    Argument(String),
}

/// Row window applied to generated SELECTs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Read a file, or stdin when `path` is `-`.
pub fn read_input(path: &Path) -> Result<String, ExecuteError> {
    let io_err = |source| ExecuteError::Io {
        path: path.display().to_string(),
        source,
    };
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(io_err)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).map_err(io_err)
    }
}

/// Load and validate a graph description.
pub fn load_graph(path: &Path) -> Result<Graph, ExecuteError> {
    let graph = Graph::from_json(&read_input(path)?)?;
    info!(path = %path.display(), version = graph.version, "loaded graph");
    Ok(graph)
}

/// Compile `predicate` (no filter when absent) into a SELECT over `node`.
pub fn compile(
    graph: &Graph,
    node: &str,
    predicate: Option<&str>,
    dialect: Dialect,
    window: Window,
    formatter: &dyn Formatter,
) -> Result<String, ExecuteError> {
    let predicate = match predicate {
        Some(json) => Predicate::from_json(json)?,
        None => Predicate::and(vec![]),
    };
    debug!(node, depth = predicate.depth(), "compiling predicate");

    let mut selector = Compiler::new(graph).select(node, &predicate, dialect)?;
    if let Some(limit) = window.limit {
        selector.limit(limit);
    }
    if let Some(offset) = window.offset {
        selector.offset(offset);
    }
    let (sql, args) = selector.query()?;
    Ok(formatter.format_statement(&sql, &args))
}

/// Summarize a graph that passed validation.
pub fn validate(graph: &Graph, formatter: &dyn Formatter) -> String {
    formatter.format_graph(graph)
}

/// Compile a SELECT of the rows related to one `node` row over `edge`.
pub fn neighbors(
    graph: &Graph,
    node: &str,
    edge: &str,
    id: &str,
    dialect: Dialect,
    window: Window,
    formatter: &dyn Formatter,
) -> Result<String, ExecuteError> {
    let id = parse_id(graph.node(node)?.id.field_type, id)?;
    let mut selector = Compiler::new(graph).neighbors(node, edge, id, dialect)?;
    if let Some(limit) = window.limit {
        selector.limit(limit);
    }
    if let Some(offset) = window.offset {
        selector.offset(offset);
    }
    let (sql, args) = selector.query()?;
    Ok(formatter.format_statement(&sql, &args))
}

/// Interpret a command-line primary key according to the key's type.
fn parse_id(field_type: FieldType, raw: &str) -> Result<Value, ExecuteError> {
    let invalid = || ExecuteError::Argument(format!("'{}' is not a valid {} id", raw, field_type));
    match field_type {
        FieldType::Int => raw.parse::<i64>().map(Value::Int).map_err(|_| invalid()),
        FieldType::Float => raw.parse::<f64>().map(Value::Float).map_err(|_| invalid()),
        FieldType::Bool => raw.parse::<bool>().map(Value::Bool).map_err(|_| invalid()),
        FieldType::Time => raw.parse::<i64>().map(Value::Timestamp).map_err(|_| invalid()),
        FieldType::String | FieldType::Enum => Ok(Value::String(raw.to_string())),
        FieldType::Uuid => {
            let bytes = hex::decode(raw.replace('-', "")).map_err(|_| invalid())?;
            let bytes: [u8; 16] = bytes.try_into().map_err(|_| invalid())?;
            Ok(Value::Uuid(bytes))
        }
        FieldType::Bytes => hex::decode(raw).map(Value::Bytes).map_err(|_| invalid()),
        FieldType::Json => Err(ExecuteError::Argument(format!(
            "json primary keys are not supported (got '{}')",
            raw
        ))),
    }
}
