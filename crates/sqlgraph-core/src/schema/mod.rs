//! Schema graph: nodes, their fields, and the edges between them.

mod definition;
mod edge;
mod field;
mod graph;
mod node;
mod types;

pub use definition::{EdgeDef, FieldDef, GraphDef, NodeDef};
pub use edge::{EdgeSpec, Rel, Step};
pub use field::FieldSpec;
pub use graph::Graph;
pub use node::Node;
pub use types::FieldType;
