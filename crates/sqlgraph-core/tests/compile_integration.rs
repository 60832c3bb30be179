//! End-to-end compilation tests across all dialects.

use pretty_assertions::assert_eq;
use sqlgraph_core::schema::{EdgeSpec, FieldSpec, FieldType, Graph, Node};
use sqlgraph_core::sql::{Dialect, Querier, Selector, Table};
use sqlgraph_core::{Compiler, Error, ErrorKind, Predicate, Value};

fn graph() -> Graph {
    let mut g = Graph::new(1);
    g.add_node(
        Node::new("User", "users")
            .with_id(FieldSpec::new("id", FieldType::Int).with_column("uid"))
            .with_field(FieldSpec::new("name", FieldType::String))
            .with_field(FieldSpec::new("a", FieldType::Int))
            .with_field(FieldSpec::new("b", FieldType::Int))
            .with_field(FieldSpec::new("c", FieldType::Int)),
    )
    .unwrap();
    g.add_node(
        Node::new("Pet", "pets")
            .with_field(FieldSpec::new("name", FieldType::String))
            .with_field(FieldSpec::optional("age", FieldType::Int)),
    )
    .unwrap();
    g.add_node(Node::new("Group", "groups").with_field(FieldSpec::new("name", FieldType::String)))
        .unwrap();

    let pets = EdgeSpec::o2m("pets", "owner_id");
    g.add_edge("owner", pets.reversed(), "Pet", "User").unwrap();
    g.add_edge("pets", pets, "User", "Pet").unwrap();
    let groups = EdgeSpec::m2m("user_groups", "user_id", "group_id");
    g.add_edge("users", groups.reversed(), "Group", "User").unwrap();
    g.add_edge("groups", groups, "User", "Group").unwrap();
    let friends = EdgeSpec::m2m("friendships", "user_id", "friend_id");
    g.add_edge("friends", friends, "User", "User").unwrap();
    g
}

fn compile(
    g: &Graph,
    p: &Predicate,
    dialect: Dialect,
) -> sqlgraph_core::Result<(String, Vec<Value>)> {
    let mut s = Selector::new(dialect).from(Table::new("users"));
    Compiler::new(g).apply("User", p, &mut s)?;
    s.query()
}

/// A predicate touching every edge strategy with literals at several depths.
fn mixed() -> Predicate {
    Predicate::and(vec![
        Predicate::has_prefix("name", "a"),
        Predicate::has_edge_with(
            "pets",
            vec![
                Predicate::gt("age", 2),
                Predicate::has_edge_with("owner", vec![Predicate::eq("b", 7)]),
            ],
        ),
        Predicate::or(vec![
            Predicate::has_edge_with("groups", vec![Predicate::eq("name", "GitHub")]),
            Predicate::has_edge_with("friends", vec![Predicate::contains("name", "x")]),
        ]),
        Predicate::not(Predicate::has_edge("pets")),
    ])
}

/// Generated aliases (`AS "tN"`) in Postgres output.
fn aliases(sql: &str) -> Vec<String> {
    sql.split(r#" AS ""#)
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(String::from)
        .collect()
}

#[test]
fn test_determinism() {
    let g = graph();
    for dialect in Dialect::ALL {
        let first = compile(&g, &mixed(), dialect).unwrap();
        let second = compile(&g, &mixed(), dialect).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_placeholders_follow_arguments() {
    let g = graph();
    let (sql, args) = compile(&g, &mixed(), Dialect::Postgres).unwrap();
    assert_eq!(args.len(), 5);
    let mut last = 0;
    for n in 1..=args.len() {
        let ph = format!("${}", n);
        let at = sql.find(&ph).unwrap_or_else(|| panic!("{} missing in {}", ph, sql));
        assert!(at > last || n == 1, "{} out of order in {}", ph, sql);
        assert_eq!(sql.matches(&ph).count(), 1);
        last = at;
    }
    assert!(!sql.contains(&format!("${}", args.len() + 1)));
    assert_eq!(
        args,
        vec![
            Value::from("a%"),
            Value::Int(2),
            Value::Int(7),
            Value::from("GitHub"),
            Value::from("%x%"),
        ]
    );

    for dialect in [Dialect::MySql, Dialect::Sqlite] {
        let (sql, other) = compile(&g, &mixed(), dialect).unwrap();
        assert_eq!(sql.matches('?').count(), 5);
        assert!(!sql.contains('$'));
        assert_eq!(other, args);
    }
}

#[test]
fn test_alias_uniqueness() {
    let g = graph();
    let (sql, _) = compile(&g, &mixed(), Dialect::Postgres).unwrap();
    let found = aliases(&sql);
    // pets, owner, groups join, friends join
    assert_eq!(found.len(), 4, "{}", sql);
    let mut distinct = found.clone();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), found.len());
    for alias in &found {
        assert!(alias.starts_with('t'));
        let tables = ["users", "pets", "groups", "user_groups", "friendships"];
        assert!(!tables.contains(&alias.as_str()));
    }
}

#[test]
fn test_existence_reads_only_link_columns() {
    let g = graph();
    for dialect in Dialect::ALL {
        let (sql, args) = compile(&g, &Predicate::has_edge("groups"), dialect).unwrap();
        assert!(!sql.contains(&dialect.quote("groups")), "{}", sql);
        assert!(!sql.contains("name"), "{}", sql);
        assert!(args.is_empty());

        let (sql, _) = compile(&g, &Predicate::has_edge("pets"), dialect).unwrap();
        assert!(!sql.contains("name"), "{}", sql);
        assert!(!sql.contains("age"), "{}", sql);
    }
}

#[test]
fn test_prefix_scenario() {
    let g = graph();
    let (sql, args) = compile(&g, &Predicate::has_prefix("name", "a"), Dialect::Postgres).unwrap();
    assert_eq!(sql, r#"SELECT * FROM "users" WHERE "users"."name" LIKE $1"#);
    assert_eq!(args, vec![Value::from("a%")]);
}

#[test]
fn test_o2m_existence_scenario() {
    let g = graph();
    let (sql, _) = compile(&g, &Predicate::has_edge("pets"), Dialect::Postgres).unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM "users" WHERE EXISTS (SELECT "pets"."owner_id" FROM "pets" WHERE "users"."uid" = "pets"."owner_id")"#
    );
}

#[test]
fn test_m2m_nested_scenario() {
    let g = graph();
    let p = Predicate::has_edge_with("groups", vec![Predicate::eq("name", "GitHub")]);
    let (sql, args) = compile(&g, &p, Dialect::Postgres).unwrap();
    assert_eq!(
        sql,
        concat!(
            r#"SELECT * FROM "users" WHERE "users"."uid" IN "#,
            r#"(SELECT "user_groups"."user_id" FROM "user_groups" "#,
            r#"JOIN "groups" AS "t1" ON "user_groups"."group_id" = "t1"."id" "#,
            r#"WHERE "t1"."name" = $1)"#
        )
    );
    assert_eq!(args, vec![Value::from("GitHub")]);

    let (sql, _) = compile(&g, &p, Dialect::MySql).unwrap();
    assert_eq!(
        sql,
        concat!(
            "SELECT * FROM `users` WHERE `users`.`uid` IN ",
            "(SELECT `user_groups`.`user_id` FROM `user_groups` ",
            "JOIN `groups` AS `t1` ON `user_groups`.`group_id` = `t1`.`id` ",
            "WHERE `t1`.`name` = ?)"
        )
    );
}

#[test]
fn test_combinator_precedence() {
    let g = graph();
    let p = Predicate::and(vec![
        Predicate::eq("a", 1),
        Predicate::or(vec![Predicate::eq("b", 2), Predicate::eq("c", 3)]),
    ]);
    let (sql, args) = compile(&g, &p, Dialect::Postgres).unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM "users" WHERE "users"."a" = $1 AND ("users"."b" = $2 OR "users"."c" = $3)"#
    );
    assert_eq!(args, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_unknown_field() {
    let g = graph();
    for dialect in Dialect::ALL {
        let err = compile(&g, &Predicate::eq("nonexistent", 1), dialect).unwrap_err();
        assert_eq!(err, Error::unknown_field("User", "nonexistent"));
        assert_eq!(err.kind(), ErrorKind::UnknownField);
        assert!(err.is_bad_request());
    }
}

#[test]
fn test_conflicting_edge_spec() {
    let mut g = graph();
    let err = g
        .add_edge("toys", EdgeSpec::o2m("pets", "owner_id"), "User", "Pet")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConflictingEdgeSpec);

    let err = g
        .add_edge(
            "members",
            EdgeSpec::m2m("user_groups", "group_id", "user_id"),
            "User",
            "Group",
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConflictingEdgeSpec);
}

#[test]
fn test_repeated_edge_compiles_independently() {
    let g = graph();
    let p = Predicate::and(vec![
        Predicate::has_edge_with("groups", vec![Predicate::eq("name", "a")]),
        Predicate::has_edge_with("groups", vec![Predicate::eq("name", "b")]),
    ]);
    let (sql, args) = compile(&g, &p, Dialect::Sqlite).unwrap();
    assert_eq!(
        sql,
        concat!(
            r#"SELECT * FROM "users" WHERE "users"."uid" IN "#,
            r#"(SELECT "user_groups"."user_id" FROM "user_groups" "#,
            r#"JOIN "groups" AS "t1" ON "user_groups"."group_id" = "t1"."id" "#,
            r#"WHERE "t1"."name" = ?) "#,
            r#"AND "users"."uid" IN "#,
            r#"(SELECT "user_groups"."user_id" FROM "user_groups" "#,
            r#"JOIN "groups" AS "t2" ON "user_groups"."group_id" = "t2"."id" "#,
            r#"WHERE "t2"."name" = ?)"#
        )
    );
    assert_eq!(args, vec![Value::from("a"), Value::from("b")]);
}

#[test]
fn test_graph_from_json_compiles() {
    let g = Graph::from_json(
        r#"{
            "version": 3,
            "nodes": [
                {"name": "User", "table": "users", "fields": [{"name": "name", "type": "string"}]},
                {"name": "Pet", "table": "pets", "fields": [{"name": "name", "type": "string"}]}
            ],
            "edges": [
                {"name": "pets", "from": "User", "to": "Pet", "rel": "o2m", "table": "pets", "columns": ["owner_id"]},
                {"name": "owner", "from": "Pet", "to": "User", "rel": "m2o", "table": "pets", "columns": ["owner_id"]}
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(g.version, 3);
    assert_eq!(g.edge("User", "pets").unwrap().inverse_of.as_deref(), Some("owner"));

    let p = Predicate::from_json(
        r#"{"HasEdgeWith": {"edge": "owner", "predicates": [
            {"Compare": {"field": "name", "op": "EqualFold", "value": {"String": "A8M"}}}
        ]}}"#,
    )
    .unwrap();
    let (sql, args) = Compiler::new(&g)
        .select("Pet", &p, Dialect::MySql)
        .unwrap()
        .query()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT `pets`.`id`, `pets`.`name` FROM `pets` WHERE `pets`.`owner_id` IN (SELECT `t1`.`id` FROM `users` AS `t1` WHERE LOWER(`t1`.`name`) = LOWER(?))"
    );
    assert_eq!(args, vec![Value::from("A8M")]);
}

#[test]
fn test_shared_graph_across_threads() {
    let g = std::sync::Arc::new(graph());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let g = g.clone();
            std::thread::spawn(move || compile(&g, &mixed(), Dialect::Postgres).unwrap())
        })
        .collect();
    let expected = compile(&g, &mixed(), Dialect::Postgres).unwrap();
    for h in handles {
        assert_eq!(h.join().unwrap(), expected);
    }
}
