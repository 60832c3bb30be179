//! Predicate evaluator.
//!
//! [`Compiler::apply`] walks a [`Predicate`] against the [`Graph`], starting
//! from one node type, and mutates a [`Selector`] on that node's table:
//! field predicates become WHERE terms, edge predicates become correlated
//! subqueries. The join strategy depends on where the edge stores its link:
//!
//! | storage                      | `HasEdge`                          | `HasEdgeWith`                                           |
//! |------------------------------|------------------------------------|---------------------------------------------------------|
//! | FK on target (O2M, O2O)      | `EXISTS (SELECT fk FROM target ..)`| same, target aliased, nested predicate ANDed            |
//! | FK on owner (M2O, O2O inv.)  | `fk IS NOT NULL`                   | `fk IN (SELECT tN.pk FROM target AS tN WHERE ..)`       |
//! | join table (M2M)             | `pk IN (SELECT own FROM join)`     | same, joined to `target AS tN`, nested predicate on tN  |
//!
//! Existence checks without a nested predicate never read target columns.

mod config;

pub use config::{CompilerConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NESTING};

use crate::error::{Error, Result};
use crate::predicate::{Op, Predicate};
use crate::schema::{FieldSpec, Graph, Node, Step};
use crate::sql::{Column, Dialect, Join, Selection, Selector, Table, P};
use crate::value::Value;
use tracing::{debug, instrument, trace};

/// The node a predicate is evaluated against, and the table name or alias
/// its columns are qualified with.
struct Scope<'a> {
    node: &'a Node,
    qualifier: String,
    depth: usize,
}

impl<'a> Scope<'a> {
    fn column(&self, name: &str) -> Column {
        Column::qualified(&self.qualifier, name)
    }

    fn pk(&self) -> Column {
        self.column(&self.node.id.column)
    }

    fn field(&self, name: &str) -> Result<&'a FieldSpec> {
        self.node
            .field(name)
            .ok_or_else(|| Error::unknown_field(&self.node.type_name, name))
    }

    fn nested(&self, node: &'a Node, table: &Table) -> Scope<'a> {
        Scope {
            node,
            qualifier: table.qualifier().to_string(),
            depth: self.depth + 1,
        }
    }
}

/// Compiles predicates against one graph.
///
/// The compiler only borrows the graph; any number of compilers may share
/// one graph across threads.
#[derive(Debug, Clone)]
pub struct Compiler<'g> {
    graph: &'g Graph,
    config: CompilerConfig,
}

impl<'g> Compiler<'g> {
    /// Create a compiler with default settings.
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            config: CompilerConfig::default(),
        }
    }

    /// Set the configuration. Fails with `InvalidQuery` when the settings
    /// do not validate.
    pub fn with_config(mut self, config: CompilerConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// The graph predicates are resolved against.
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// The active configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Add `predicate`, evaluated against `node`, to `selector`.
    ///
    /// The selector must read from the node's table (aliased or not). Its
    /// alias prefix is replaced with the configured one. On error the
    /// selector may hold part of the predicate and should be discarded.
    #[instrument(
        level = "debug",
        skip(self, predicate, selector),
        fields(dialect = %selector.dialect())
    )]
    pub fn apply(&self, node: &str, predicate: &Predicate, selector: &mut Selector) -> Result<()> {
        let node = self.graph.node(node)?;
        let qualifier = match selector.table() {
            None => return Err(Error::invalid_query("selector has no FROM table")),
            Some(t) if t.name != node.table => {
                return Err(Error::invalid_query(format!(
                    "selector reads from '{}' but node '{}' is stored in '{}'",
                    t.name, node.type_name, node.table
                )))
            }
            Some(t) => t.qualifier().to_string(),
        };
        let scope = Scope {
            node,
            qualifier,
            depth: 0,
        };
        selector.set_alias_prefix(self.config.alias_prefix.clone());
        self.eval(&scope, predicate, selector, 0)?;
        debug!(node = %node.type_name, "compiled predicate");
        Ok(())
    }

    /// A new SELECT over `node`'s table filtered by `predicate`.
    #[instrument(level = "debug", skip(self, predicate))]
    pub fn select(&self, node: &str, predicate: &Predicate, dialect: Dialect) -> Result<Selector> {
        let mut selector = self.base_select(self.graph.node(node)?, dialect);
        self.apply(node, predicate, &mut selector)?;
        Ok(selector)
    }

    /// The WHERE predicate for `predicate` over `node`'s table, qualified with
    /// the table name. Used to scope UPDATE and DELETE statements. `None` when
    /// the predicate adds no condition.
    pub fn predicate(
        &self,
        node: &str,
        predicate: &Predicate,
        dialect: Dialect,
    ) -> Result<Option<P>> {
        let table = &self.graph.node(node)?.table;
        let mut selector = Selector::new(dialect)
            .with_alias_prefix(self.config.alias_prefix.clone())
            .from(Table::new(table.clone()));
        self.apply(node, predicate, &mut selector)?;
        Ok(selector.take_where())
    }

    /// A SELECT of the rows of `edge`'s target related to the `node` row
    /// whose primary key is `id`.
    #[instrument(level = "debug", skip(self, id))]
    pub fn neighbors(
        &self,
        node: &str,
        edge: &str,
        id: Value,
        dialect: Dialect,
    ) -> Result<Selector> {
        let owner = self.graph.node(node)?;
        let spec = self.graph.edge(node, edge)?;
        let target = self.graph.node(&spec.target)?;
        check_literal(&owner.id, &id)?;

        let mut s = self.base_select(target, dialect);
        match spec.step()? {
            Step::TargetFk { column, .. } => {
                s.add_where(P::eq(s.c(column), id));
            }
            Step::OwnerFk { table, column } => {
                let mut sub = s.sub_select();
                let t = sub_table(&mut sub, table, false);
                sub.set_selection(vec![t.c(column).into()]);
                sub.add_where(P::eq(t.c(&owner.id.column), id));
                sub.set_from(t);
                s.merge_aliases(&sub);
                s.add_where(P::in_select(s.c(&target.id.column), sub));
            }
            Step::JoinTable { table, own, other } => {
                let mut sub = s.sub_select();
                let t = sub_table(&mut sub, table, false);
                sub.set_selection(vec![t.c(other).into()]);
                sub.add_where(P::eq(t.c(own), id));
                sub.set_from(t);
                s.merge_aliases(&sub);
                s.add_where(P::in_select(s.c(&target.id.column), sub));
            }
        }
        Ok(s)
    }

    fn base_select(&self, node: &Node, dialect: Dialect) -> Selector {
        let mut s = Selector::new(dialect)
            .with_alias_prefix(self.config.alias_prefix.clone())
            .from(Table::new(node.table.clone()));
        if self.config.select_columns {
            let columns: Vec<Selection> =
                node.columns().into_iter().map(|c| s.c(c).into()).collect();
            s.set_selection(columns);
        }
        s
    }

    /// `level` counts every enclosing predicate, combinators included.
    fn eval(
        &self,
        scope: &Scope<'_>,
        predicate: &Predicate,
        s: &mut Selector,
        level: usize,
    ) -> Result<()> {
        if level >= self.config.max_nesting {
            return Err(Error::invalid_query(format!(
                "predicate nesting exceeds {} levels",
                self.config.max_nesting
            )));
        }
        match predicate {
            Predicate::Compare { field, op, value } => {
                let f = scope.field(field)?;
                s.add_where(compare(scope.column(&f.column), f, *op, value)?);
            }
            Predicate::CompareFields { left, op, right } => {
                let l = scope.field(left)?;
                let r = scope.field(right)?;
                let cmp = op.cmp().ok_or_else(|| {
                    Error::invalid_query(format!(
                        "operator {:?} cannot compare fields '{}' and '{}'",
                        op, left, right
                    ))
                })?;
                s.add_where(P::columns(scope.column(&l.column), cmp, scope.column(&r.column)));
            }
            Predicate::In {
                field,
                values,
                negated,
            } => {
                let f = scope.field(field)?;
                for v in values {
                    check_literal(f, v)?;
                }
                let c = scope.column(&f.column);
                s.add_where(if *negated {
                    P::not_in_values(c, values.clone())
                } else {
                    P::in_values(c, values.clone())
                });
            }
            Predicate::IsNull { field, negated } => {
                let c = scope.column(&scope.field(field)?.column);
                s.add_where(if *negated { P::not_null(c) } else { P::is_null(c) });
            }
            Predicate::And(children) => {
                for child in children {
                    self.eval(scope, child, s, level + 1)?;
                }
            }
            Predicate::Or(children) => {
                let mut branches = Vec::with_capacity(children.len());
                for child in children {
                    let mut fragment = s.fragment();
                    self.eval(scope, child, &mut fragment, level + 1)?;
                    branches.push(s.absorb(fragment).unwrap_or(P::Bool(true)));
                }
                s.add_where(P::or(branches));
            }
            Predicate::Not(inner) => {
                let mut fragment = s.fragment();
                self.eval(scope, inner, &mut fragment, level + 1)?;
                let p = s.absorb(fragment).unwrap_or(P::Bool(true));
                s.add_where(P::not(p));
            }
            Predicate::HasEdge(edge) => {
                let p = self.edge(scope, edge, &[], s, level)?;
                s.add_where(p);
            }
            Predicate::HasEdgeWith { edge, predicates } => {
                let p = self.edge(scope, edge, predicates, s, level)?;
                s.add_where(p);
            }
            Predicate::Raw(raw) => raw.call(s, &scope.qualifier)?,
        }
        Ok(())
    }

    /// Compile an edge traversal. An empty `nested` list is a plain
    /// existence check.
    fn edge(
        &self,
        scope: &Scope<'_>,
        name: &str,
        nested: &[Predicate],
        s: &mut Selector,
        level: usize,
    ) -> Result<P> {
        let edge = scope
            .node
            .edge(name)
            .ok_or_else(|| Error::unknown_edge(&scope.node.type_name, name))?;
        if scope.depth >= self.config.max_depth {
            return Err(Error::invalid_query(format!(
                "edge '{}' exceeds the maximum traversal depth of {}",
                name, self.config.max_depth
            )));
        }
        let target = self.graph.node(&edge.target)?;

        let p = match edge.step()? {
            Step::TargetFk { table, column } => {
                let mut sub = s.sub_select();
                let t = sub_table(&mut sub, table, !nested.is_empty());
                let inner = scope.nested(target, &t);
                sub.set_selection(vec![t.c(column).into()]);
                sub.add_where(P::columns_eq(scope.pk(), t.c(column)));
                sub.set_from(t);
                for p in nested {
                    self.eval(&inner, p, &mut sub, level + 1)?;
                }
                trace!(edge = %edge.name, rel = %edge.rel, strategy = "exists", "compiled edge");
                s.merge_aliases(&sub);
                P::exists(sub)
            }
            Step::OwnerFk { column, .. } if nested.is_empty() => {
                trace!(edge = %edge.name, rel = %edge.rel, strategy = "not-null", "compiled edge");
                P::not_null(scope.column(column))
            }
            Step::OwnerFk { column, .. } => {
                let mut sub = s.sub_select();
                let t = sub_table(&mut sub, &target.table, true);
                let inner = scope.nested(target, &t);
                sub.set_selection(vec![t.c(&target.id.column).into()]);
                sub.set_from(t);
                for p in nested {
                    self.eval(&inner, p, &mut sub, level + 1)?;
                }
                trace!(edge = %edge.name, rel = %edge.rel, strategy = "in-target", "compiled edge");
                s.merge_aliases(&sub);
                P::in_select(scope.column(column), sub)
            }
            Step::JoinTable { table, own, other } => {
                let mut sub = s.sub_select();
                let jt = sub_table(&mut sub, table, false);
                sub.set_selection(vec![jt.c(own).into()]);
                sub.set_from(jt.clone());
                if !nested.is_empty() {
                    let tt = Table::new(target.table.clone()).with_alias(sub.alloc_alias());
                    let inner = scope.nested(target, &tt);
                    sub.join(Join::inner(tt.clone()).on(jt.c(other), tt.c(&target.id.column)));
                    for p in nested {
                        self.eval(&inner, p, &mut sub, level + 1)?;
                    }
                }
                trace!(
                    edge = %edge.name,
                    rel = %edge.rel,
                    strategy = "in-join-table",
                    "compiled edge"
                );
                s.merge_aliases(&sub);
                P::in_select(scope.pk(), sub)
            }
        };
        Ok(p)
    }
}

/// The FROM table of a subquery: aliased when `always` is set or when the
/// name is visible from an enclosing scope.
fn sub_table(sub: &mut Selector, table: &str, always: bool) -> Table {
    let t = Table::new(table);
    if always || sub.is_visible(table) {
        t.with_alias(sub.alloc_alias())
    } else {
        t
    }
}

fn string_predicate(op: Op) -> Option<fn(Column, &str) -> P> {
    match op {
        Op::HasPrefix => Some(P::has_prefix),
        Op::HasSuffix => Some(P::has_suffix),
        Op::Contains => Some(P::contains),
        Op::EqualFold => Some(P::equal_fold),
        Op::ContainsFold => Some(P::contains_fold),
        Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge => None,
    }
}

fn compare(column: Column, field: &FieldSpec, op: Op, value: &Value) -> Result<P> {
    match (op.cmp(), string_predicate(op)) {
        (Some(cmp), _) => {
            check_literal(field, value)?;
            Ok(P::compare(column, cmp, value.clone()))
        }
        (None, Some(build)) => match value {
            Value::String(text) if field.field_type.is_textual() => Ok(build(column, text)),
            _ => Err(Error::invalid_query(format!(
                "operator {:?} needs a text field and a string literal, got {} field '{}' and {} literal",
                op,
                field.field_type,
                field.name,
                value.type_name()
            ))),
        },
        (None, None) => Err(Error::invalid_query(format!("unsupported operator {:?}", op))),
    }
}

fn check_literal(field: &FieldSpec, value: &Value) -> Result<()> {
    if value.is_null() {
        return Err(Error::invalid_query(format!(
            "field '{}' compared with NULL; use IsNull",
            field.name
        )));
    }
    if !field.field_type.accepts(value) {
        return Err(Error::invalid_query(format!(
            "{} field '{}' cannot be compared with a {} literal",
            field.field_type,
            field.name,
            value.type_name()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EdgeSpec, FieldType};
    use crate::sql::{DeleteBuilder, Querier};
    use pretty_assertions::assert_eq;

    fn graph() -> Graph {
        let mut g = Graph::new(1);
        g.add_node(
            Node::new("User", "users")
                .with_id(FieldSpec::new("id", FieldType::Int).with_column("uid"))
                .with_field(FieldSpec::new("name", FieldType::String))
                .with_field(FieldSpec::optional("age", FieldType::Int)),
        )
        .unwrap();
        g.add_node(Node::new("Pet", "pets").with_field(FieldSpec::new("name", FieldType::String)))
            .unwrap();
        g.add_node(
            Node::new("Group", "groups").with_field(FieldSpec::new("name", FieldType::String)),
        )
        .unwrap();
        g.add_node(
            Node::new("Card", "cards").with_field(FieldSpec::new("number", FieldType::String)),
        )
        .unwrap();

        let pets = EdgeSpec::o2m("pets", "owner_id");
        g.add_edge("owner", pets.reversed(), "Pet", "User").unwrap();
        g.add_edge("pets", pets, "User", "Pet").unwrap();
        let groups = EdgeSpec::m2m("user_groups", "user_id", "group_id");
        g.add_edge("users", groups.reversed(), "Group", "User").unwrap();
        g.add_edge("groups", groups, "User", "Group").unwrap();
        let card = EdgeSpec::o2o("cards", "owner_id");
        g.add_edge("owner", card.reversed(), "Card", "User").unwrap();
        g.add_edge("card", card, "User", "Card").unwrap();
        let children = EdgeSpec::o2m("users", "parent_id");
        g.add_edge("parent", children.reversed(), "User", "User").unwrap();
        g.add_edge("children", children, "User", "User").unwrap();
        g
    }

    fn from(table: &str, dialect: Dialect) -> Selector {
        Selector::new(dialect).from(Table::new(table))
    }

    fn compile(
        g: &Graph,
        node: &str,
        table: &str,
        p: &Predicate,
        dialect: Dialect,
    ) -> (String, Vec<Value>) {
        let mut s = from(table, dialect);
        Compiler::new(g).apply(node, p, &mut s).unwrap();
        s.query().unwrap()
    }

    #[test]
    fn test_m2o_existence_is_not_null() {
        let g = graph();
        let p = Predicate::has_edge("owner");
        let (sql, args) = compile(&g, "Pet", "pets", &p, Dialect::Postgres);
        assert_eq!(sql, r#"SELECT * FROM "pets" WHERE "pets"."owner_id" IS NOT NULL"#);
        assert!(args.is_empty());
    }

    #[test]
    fn test_m2o_nested_uses_target_subquery() {
        let g = graph();
        let p = Predicate::has_edge_with("owner", vec![Predicate::eq("name", "a8m")]);
        let (sql, args) = compile(&g, "Pet", "pets", &p, Dialect::Postgres);
        assert_eq!(
            sql,
            r#"SELECT * FROM "pets" WHERE "pets"."owner_id" IN (SELECT "t1"."uid" FROM "users" AS "t1" WHERE "t1"."name" = $1)"#
        );
        assert_eq!(args, vec![Value::from("a8m")]);
    }

    #[test]
    fn test_inverse_m2m_uses_second_column() {
        let g = graph();
        let p = Predicate::has_edge_with("users", vec![Predicate::eq("name", "a8m")]);
        let (sql, _) = compile(&g, "Group", "groups", &p, Dialect::Sqlite);
        assert_eq!(
            sql,
            concat!(
                r#"SELECT * FROM "groups" WHERE "groups"."id" IN "#,
                r#"(SELECT "user_groups"."group_id" FROM "user_groups" "#,
                r#"JOIN "users" AS "t1" ON "user_groups"."user_id" = "t1"."uid" "#,
                r#"WHERE "t1"."name" = ?)"#
            )
        );
    }

    #[test]
    fn test_o2o_sides() {
        let g = graph();
        let (sql, _) = compile(&g, "User", "users", &Predicate::has_edge("card"), Dialect::MySql);
        assert_eq!(
            sql,
            "SELECT * FROM `users` WHERE EXISTS (SELECT `cards`.`owner_id` FROM `cards` WHERE `users`.`uid` = `cards`.`owner_id`)"
        );
        let (sql, _) = compile(&g, "Card", "cards", &Predicate::has_edge("owner"), Dialect::MySql);
        assert_eq!(sql, "SELECT * FROM `cards` WHERE `cards`.`owner_id` IS NOT NULL");
    }

    #[test]
    fn test_self_reference_is_aliased() {
        let g = graph();
        let p = Predicate::has_edge("children");
        let (sql, _) = compile(&g, "User", "users", &p, Dialect::Postgres);
        assert_eq!(
            sql,
            r#"SELECT * FROM "users" WHERE EXISTS (SELECT "t1"."parent_id" FROM "users" AS "t1" WHERE "users"."uid" = "t1"."parent_id")"#
        );
    }

    #[test]
    fn test_self_reference_traversed_twice() {
        let g = graph();
        let p = Predicate::has_edge_with(
            "children",
            vec![Predicate::has_edge_with("children", vec![Predicate::eq("name", "x")])],
        );
        let (sql, args) = compile(&g, "User", "users", &p, Dialect::Postgres);
        assert_eq!(
            sql,
            concat!(
                r#"SELECT * FROM "users" WHERE EXISTS (SELECT "t1"."parent_id" FROM "users" AS "t1" "#,
                r#"WHERE "users"."uid" = "t1"."parent_id" AND EXISTS "#,
                r#"(SELECT "t2"."parent_id" FROM "users" AS "t2" "#,
                r#"WHERE "t1"."uid" = "t2"."parent_id" AND "t2"."name" = $1))"#
            )
        );
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_or_branches_keep_prior_where_and_fresh_aliases() {
        let g = graph();
        let p = Predicate::and(vec![
            Predicate::gt("age", 30),
            Predicate::or(vec![
                Predicate::has_edge_with("pets", vec![Predicate::eq("name", "a")]),
                Predicate::has_edge_with("pets", vec![Predicate::eq("name", "b")]),
            ]),
        ]);
        let (sql, args) = compile(&g, "User", "users", &p, Dialect::Postgres);
        assert_eq!(
            sql,
            concat!(
                r#"SELECT * FROM "users" WHERE "users"."age" > $1 AND "#,
                r#"(EXISTS (SELECT "t1"."owner_id" FROM "pets" AS "t1" WHERE "users"."uid" = "t1"."owner_id" AND "t1"."name" = $2) "#,
                r#"OR EXISTS (SELECT "t2"."owner_id" FROM "pets" AS "t2" WHERE "users"."uid" = "t2"."owner_id" AND "t2"."name" = $3))"#
            )
        );
        assert_eq!(args, vec![Value::Int(30), Value::from("a"), Value::from("b")]);
    }

    #[test]
    fn test_not_wraps_fragment() {
        let g = graph();
        let p = Predicate::not(Predicate::has_edge("pets"));
        let (sql, _) = compile(&g, "User", "users", &p, Dialect::Sqlite);
        assert_eq!(
            sql,
            r#"SELECT * FROM "users" WHERE NOT (EXISTS (SELECT "pets"."owner_id" FROM "pets" WHERE "users"."uid" = "pets"."owner_id"))"#
        );
    }

    #[test]
    fn test_field_to_field_and_in() {
        let g = graph();
        let p = Predicate::and(vec![
            Predicate::fields("age", Op::Lt, "id"),
            Predicate::in_values("name", vec!["a".into(), "b".into()]),
            Predicate::not_in_values("age", vec![]),
            Predicate::is_null("age"),
        ]);
        let (sql, args) = compile(&g, "User", "users", &p, Dialect::Postgres);
        assert_eq!(
            sql,
            r#"SELECT * FROM "users" WHERE "users"."age" < "users"."uid" AND "users"."name" IN ($1, $2) AND TRUE AND "users"."age" IS NULL"#
        );
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_literal_type_checks() {
        let g = graph();
        let c = Compiler::new(&g);
        let cases = [
            Predicate::eq("age", "thirty"),
            Predicate::eq("name", Value::Null),
            Predicate::has_prefix("age", "3"),
            Predicate::fields("name", Op::Contains, "name"),
            Predicate::in_values("name", vec!["a".into(), 1.into()]),
        ];
        for p in &cases {
            let err = c.apply("User", p, &mut from("users", Dialect::Postgres)).unwrap_err();
            assert!(matches!(err, Error::InvalidQuery(_)), "{:?} gave {:?}", p, err);
        }
    }

    #[test]
    fn test_unknown_names() {
        let g = graph();
        let c = Compiler::new(&g);
        let mut s = from("users", Dialect::Postgres);
        assert_eq!(
            c.apply("User", &Predicate::has_edge("cars"), &mut s).unwrap_err(),
            Error::unknown_edge("User", "cars")
        );
        let nested = Predicate::has_edge_with("pets", vec![Predicate::eq("age", 1)]);
        assert_eq!(
            c.apply("User", &nested, &mut s).unwrap_err(),
            Error::unknown_field("Pet", "age")
        );
        assert_eq!(
            c.select("Car", &Predicate::and(vec![]), Dialect::Postgres).unwrap_err(),
            Error::unknown_node("Car")
        );
    }

    #[test]
    fn test_selector_must_read_node_table() {
        let g = graph();
        let c = Compiler::new(&g);
        let err = c
            .apply("User", &Predicate::eq("name", "a"), &mut from("pets", Dialect::Postgres))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
        let err = c
            .apply("User", &Predicate::eq("name", "a"), &mut Selector::new(Dialect::Postgres))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[test]
    fn test_max_depth() {
        let g = graph();
        let c = Compiler::new(&g)
            .with_config(CompilerConfig::new().with_max_depth(1))
            .unwrap();
        let ok = Predicate::has_edge("pets");
        assert!(c.apply("User", &ok, &mut from("users", Dialect::Postgres)).is_ok());
        let deep = Predicate::has_edge_with("pets", vec![Predicate::has_edge("owner")]);
        let err = c.apply("User", &deep, &mut from("users", Dialect::Postgres)).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[test]
    fn test_max_nesting_counts_combinators() {
        let g = graph();
        let c = Compiler::new(&g)
            .with_config(CompilerConfig::new().with_max_nesting(4))
            .unwrap();
        let mut p = Predicate::eq("name", "a");
        for _ in 0..3 {
            p = Predicate::not(p);
        }
        assert!(c.apply("User", &p, &mut from("users", Dialect::Postgres)).is_ok());

        let p = Predicate::not(p);
        let err = c.apply("User", &p, &mut from("users", Dialect::Postgres)).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[test]
    fn test_deep_combinators_fail_with_default_config() {
        let g = graph();
        let mut p = Predicate::eq("name", "a");
        for i in 0..2_000 {
            p = if i % 2 == 0 {
                Predicate::not(p)
            } else {
                Predicate::and(vec![p])
            };
        }
        let err = Compiler::new(&g)
            .apply("User", &p, &mut from("users", Dialect::Postgres))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[test]
    fn test_with_config_validates() {
        let g = graph();
        let err = Compiler::new(&g)
            .with_config(CompilerConfig::new().with_alias_prefix(""))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
        assert!(Compiler::new(&g)
            .with_config(CompilerConfig::new().with_max_depth(0))
            .is_err());
        assert!(Compiler::new(&g)
            .with_config(CompilerConfig::new().with_max_nesting(0))
            .is_err());
    }

    #[test]
    fn test_apply_uses_configured_prefix() {
        let g = graph();
        let c = Compiler::new(&g)
            .with_config(CompilerConfig::new().with_alias_prefix("j"))
            .unwrap();
        let p = Predicate::has_edge_with("pets", vec![Predicate::eq("name", "x")]);
        let mut s = from("users", Dialect::Postgres);
        c.apply("User", &p, &mut s).unwrap();
        let (sql, _) = s.query().unwrap();
        assert_eq!(
            sql,
            concat!(
                r#"SELECT * FROM "users" WHERE EXISTS "#,
                r#"(SELECT "j1"."owner_id" FROM "pets" AS "j1" "#,
                r#"WHERE "users"."uid" = "j1"."owner_id" AND "j1"."name" = $1)"#
            )
        );
    }

    #[test]
    fn test_raw_runs_in_subquery_scope() {
        let g = graph();
        let raw = Predicate::raw(|s, q| {
            s.add_where(P::raw(format!("LENGTH({}.name) > ?", q), vec![3.into()]));
            Ok(())
        });
        let p = Predicate::has_edge_with("pets", vec![raw]);
        let (sql, args) = compile(&g, "User", "users", &p, Dialect::Postgres);
        assert_eq!(
            sql,
            r#"SELECT * FROM "users" WHERE EXISTS (SELECT "t1"."owner_id" FROM "pets" AS "t1" WHERE "users"."uid" = "t1"."owner_id" AND (LENGTH(t1.name) > $1))"#
        );
        assert_eq!(args, vec![Value::Int(3)]);
    }

    #[test]
    fn test_select_lists_columns_with_prefix() {
        let g = graph();
        let c = Compiler::new(&g)
            .with_config(CompilerConfig::new().with_alias_prefix("j"))
            .unwrap();
        let p = Predicate::has_edge_with("owner", vec![Predicate::contains_fold("name", "A8")]);
        let (sql, args) = c.select("Pet", &p, Dialect::Sqlite).unwrap().query().unwrap();
        assert_eq!(
            sql,
            concat!(
                r#"SELECT "pets"."id", "pets"."name" FROM "pets" WHERE "pets"."owner_id" IN "#,
                r#"(SELECT "j1"."uid" FROM "users" AS "j1" WHERE LOWER("j1"."name") LIKE LOWER(?))"#
            )
        );
        assert_eq!(args, vec![Value::from("%A8%")]);
    }

    #[test]
    fn test_predicate_scopes_delete() {
        let g = graph();
        let c = Compiler::new(&g);
        let p = c
            .predicate("User", &Predicate::eq("name", "a8m"), Dialect::Postgres)
            .unwrap()
            .unwrap();
        let (sql, _) = DeleteBuilder::new(Dialect::Postgres, "users").where_p(p).query().unwrap();
        assert_eq!(sql, r#"DELETE FROM "users" WHERE "users"."name" = $1"#);

        let none = c
            .predicate("User", &Predicate::and(vec![]), Dialect::Postgres)
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_neighbors() {
        let g = graph();
        let c = Compiler::new(&g);
        let (sql, args) = c
            .neighbors("User", "pets", Value::Int(1), Dialect::Postgres)
            .unwrap()
            .query()
            .unwrap();
        assert_eq!(
            sql,
            r#"SELECT "pets"."id", "pets"."name" FROM "pets" WHERE "pets"."owner_id" = $1"#
        );
        assert_eq!(args, vec![Value::Int(1)]);

        let c = c.with_config(CompilerConfig::new().with_select_star()).unwrap();
        let (sql, _) = c
            .neighbors("Pet", "owner", Value::Int(5), Dialect::Postgres)
            .unwrap()
            .query()
            .unwrap();
        assert_eq!(
            sql,
            r#"SELECT * FROM "users" WHERE "users"."uid" IN (SELECT "pets"."owner_id" FROM "pets" WHERE "pets"."id" = $1)"#
        );

        let (sql, _) = c
            .neighbors("User", "groups", Value::Int(1), Dialect::MySql)
            .unwrap()
            .query()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM `groups` WHERE `groups`.`id` IN (SELECT `user_groups`.`group_id` FROM `user_groups` WHERE `user_groups`.`user_id` = ?)"
        );

        let (sql, _) = c
            .neighbors("User", "parent", Value::Int(2), Dialect::Postgres)
            .unwrap()
            .query()
            .unwrap();
        assert_eq!(
            sql,
            r#"SELECT * FROM "users" WHERE "users"."uid" IN (SELECT "t1"."parent_id" FROM "users" AS "t1" WHERE "t1"."uid" = $1)"#
        );

        let err = c
            .neighbors("User", "pets", Value::from("x"), Dialect::Postgres)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }
}
