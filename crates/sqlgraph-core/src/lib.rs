//! sqlgraph core - graph-aware predicate to SQL compiler.
//!
//! Translates dialect-independent predicates over typed node fields and
//! named edges into parameterized SQL for Postgres, MySQL and SQLite.
//!
//! # Modules
//!
//! - [`sql`] - Dialect-aware statement builders (SELECT, INSERT, UPDATE, DELETE)
//! - [`schema`] - Schema graph: nodes, fields and validated edges
//! - [`predicate`] - Predicate AST
//! - [`compile`] - Predicate evaluator
//! - [`value`] - Literal values bound as statement arguments
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```
//! use sqlgraph_core::schema::{EdgeSpec, FieldSpec, FieldType, Graph, Node};
//! use sqlgraph_core::sql::{Dialect, Querier, Selector, Table};
//! use sqlgraph_core::{Compiler, Predicate};
//!
//! let mut graph = Graph::new(1);
//! let name = FieldSpec::new("name", FieldType::String);
//! graph.add_node(Node::new("User", "users").with_field(name.clone()))?;
//! graph.add_node(Node::new("Pet", "pets").with_field(name))?;
//! graph.add_edge("pets", EdgeSpec::o2m("pets", "owner_id"), "User", "Pet")?;
//!
//! let mut selector = Selector::new(Dialect::Postgres).from(Table::new("users"));
//! let predicate = Predicate::has_edge_with("pets", vec![Predicate::eq("name", "pedro")]);
//! Compiler::new(&graph).apply("User", &predicate, &mut selector)?;
//!
//! let (sql, args) = selector.query()?;
//! assert_eq!(
//!     sql,
//!     concat!(
//!         r#"SELECT * FROM "users" WHERE EXISTS (SELECT "t1"."owner_id" FROM "pets" AS "t1" "#,
//!         r#"WHERE "users"."id" = "t1"."owner_id" AND "t1"."name" = $1)"#
//!     )
//! );
//! assert_eq!(args.len(), 1);
//! # Ok::<(), sqlgraph_core::Error>(())
//! ```

pub mod compile;
pub mod error;
pub mod predicate;
pub mod schema;
pub mod sql;
pub mod value;

pub use compile::{Compiler, CompilerConfig};
pub use error::{Error, ErrorKind, Result};
pub use predicate::{Op, Predicate, RawPredicate};
pub use schema::{EdgeSpec, FieldSpec, FieldType, Graph, Node, Rel};
pub use sql::{Dialect, Querier, Selector};
pub use value::Value;
