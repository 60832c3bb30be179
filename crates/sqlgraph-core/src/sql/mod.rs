//! Dialect-aware SQL statement builders.
//!
//! Every identifier passes through [`Dialect::quote`] and every literal is
//! bound as a positional argument; the only way to put unquoted text into a
//! statement is the explicit raw escape ([`P::raw`], [`Selection::Raw`]).

mod builder;
mod dialect;
mod expr;
mod mutation;
mod page;
mod select;

pub use builder::{Builder, Querier};
pub use dialect::Dialect;
pub use expr::{escape_like, CmpOp, Column, Operand, Table, P};
pub use mutation::{DeleteBuilder, InsertBuilder, UpdateBuilder};
pub use page::{keyset_predicate, Page};
pub use select::{
    Join, JoinKind, Lock, LockStrength, LockWait, NullsOrder, Order, OrderDirection, Selection,
    Selector, DEFAULT_ALIAS_PREFIX,
};
