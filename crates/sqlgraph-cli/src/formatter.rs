//! Output formatters for compiled statements and graphs.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use sqlgraph_core::value::format_uuid;
use sqlgraph_core::{Graph, Value};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// SQL followed by commented arguments
    Text,
    /// JSON format
    Json,
    /// ASCII table format
    Table,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format a rendered statement and its arguments.
    fn format_statement(&self, sql: &str, args: &[Value]) -> String;

    /// Format a summary of a validated graph.
    fn format_graph(&self, graph: &Graph) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Table => Box::new(TableFormatter),
    }
}

/// Plain text formatter: the statement, then one comment line per argument.
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_statement(&self, sql: &str, args: &[Value]) -> String {
        let mut lines = vec![sql.to_string()];
        for (i, arg) in args.iter().enumerate() {
            lines.push(format!("-- {}: {}", i + 1, arg));
        }
        lines.join("\n")
    }

    fn format_graph(&self, graph: &Graph) -> String {
        let mut lines = Vec::new();
        let mut edges = 0;
        for node in graph.nodes() {
            lines.push(format!(
                "{} ({}, {} field(s))",
                node.type_name,
                node.table,
                node.fields.len()
            ));
            for edge in node.edges() {
                edges += 1;
                lines.push(format!("  {} -> {} {}", edge.name, edge.target, storage(edge)));
            }
        }
        lines.push(format!(
            "graph v{}: {} node(s), {} edge(s)",
            graph.version,
            graph.nodes().count(),
            edges
        ));
        lines.join("\n")
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_statement(&self, sql: &str, args: &[Value]) -> String {
        let args: Vec<serde_json::Value> = args.iter().map(value_to_json).collect();
        serde_json::to_string_pretty(&serde_json::json!({
            "sql": sql,
            "args": args,
        }))
        .unwrap_or_else(|_| "{}".to_string())
    }

    fn format_graph(&self, graph: &Graph) -> String {
        graph
            .to_definition()
            .to_json()
            .unwrap_or_else(|_| "{}".to_string())
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_statement(&self, sql: &str, args: &[Value]) -> String {
        if args.is_empty() {
            return format!("{}\n0 argument(s)", sql);
        }
        let mut table = Table::new();
        table.set_header(vec!["#", "Type", "Value"]);
        for (i, arg) in args.iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(arg.type_name()),
                Cell::new(arg.to_string()),
            ]);
        }
        format!("{}\n{}\n{} argument(s)", sql, table, args.len())
    }

    fn format_graph(&self, graph: &Graph) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Node", "Edge", "Target", "Storage", "Inverse of"]);
        for node in graph.nodes() {
            let mut any = false;
            for edge in node.edges() {
                any = true;
                table.add_row(vec![
                    Cell::new(&node.type_name),
                    Cell::new(&edge.name),
                    Cell::new(&edge.target),
                    Cell::new(storage(edge)),
                    Cell::new(edge.inverse_of.as_deref().unwrap_or("-")),
                ]);
            }
            if !any {
                table.add_row(vec![node.type_name.as_str(), "-", "-", "-", "-"]);
            }
        }
        format!("{}\ngraph v{}", table, graph.version)
    }
}

/// `[o2m pets(owner_id)]`, with `inverse` marked.
fn storage(edge: &sqlgraph_core::EdgeSpec) -> String {
    format!(
        "[{}{} {}({})]",
        edge.rel,
        if edge.inverse { " inverse" } else { "" },
        edge.table,
        edge.columns.join(", ")
    )
}

/// Convert an argument to plain JSON.
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(b) => serde_json::Value::String(hex::encode(b)),
        Value::Timestamp(ts) => serde_json::Value::Number((*ts).into()),
        Value::Uuid(bytes) => serde_json::Value::String(format_uuid(bytes)),
    }
}
