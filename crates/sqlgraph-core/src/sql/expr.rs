//! Column and table references and the SQL-level predicate tree.

use super::builder::Builder;
use super::dialect::Dialect;
use super::select::Selector;
use crate::error::Result;
use crate::value::Value;

/// A column reference, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    /// Table name or alias.
    pub table: Option<String>,
    /// Column name.
    pub name: String,
}

impl Column {
    /// An unqualified column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    /// A column qualified by a table name or alias.
    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub(crate) fn build(&self, b: &mut Builder) {
        b.qualified(self.table.as_deref(), &self.name);
    }
}

/// A table in a FROM or JOIN clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Storage table name.
    pub name: String,
    /// Optional alias.
    pub alias: Option<String>,
}

impl Table {
    /// A table without alias.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// Set the alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The name columns of this table are qualified with.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// A column of this table.
    pub fn c(&self, column: impl Into<String>) -> Column {
        Column::qualified(self.qualifier(), column)
    }

    pub(crate) fn build(&self, b: &mut Builder) {
        b.ident(&self.name);
        if let Some(alias) = &self.alias {
            b.push(" AS ").ident(alias);
        }
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    /// SQL token.
    pub fn sql(&self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A column reference.
    Column(Column),
    /// A literal, bound as an argument.
    Value(Value),
    /// `LOWER(<operand>)`.
    Lower(Box<Operand>),
}

impl Operand {
    /// Wrap in a lower-casing call.
    pub fn lower(self) -> Self {
        Operand::Lower(Box::new(self))
    }

    fn build(&self, b: &mut Builder) {
        match self {
            Operand::Column(c) => c.build(b),
            Operand::Value(v) => {
                b.arg(v.clone());
            }
            Operand::Lower(inner) => {
                b.push("LOWER(");
                inner.build(b);
                b.push(")");
            }
        }
    }
}

impl From<Column> for Operand {
    fn from(c: Column) -> Self {
        Operand::Column(c)
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

/// Backslash-escape LIKE wildcards (`%`, `_`) and the escape character
/// itself. Returns whether anything was escaped.
pub fn escape_like(literal: &str) -> (String, bool) {
    let mut out = String::with_capacity(literal.len());
    let mut escaped = false;
    for ch in literal.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
            escaped = true;
        }
        out.push(ch);
    }
    (out, escaped)
}

/// A SQL predicate tree, rendered into WHERE, ON and HAVING clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum P {
    /// `left OP right`.
    Compare {
        left: Operand,
        op: CmpOp,
        right: Operand,
    },
    /// `left [NOT] LIKE pattern`, with an explicit escape clause where the
    /// dialect needs one.
    Like {
        left: Operand,
        pattern: Operand,
        escaped: bool,
        negated: bool,
    },
    /// `left [NOT] IN (v1, v2, ...)`.
    In {
        left: Operand,
        values: Vec<Value>,
        negated: bool,
    },
    /// `column [NOT] IN (SELECT ...)`.
    InSelect {
        column: Column,
        select: Box<Selector>,
        negated: bool,
    },
    /// `column IS [NOT] NULL`.
    IsNull { column: Column, negated: bool },
    /// `[NOT] EXISTS (SELECT ...)`.
    Exists { select: Box<Selector>, negated: bool },
    /// Conjunction.
    And(Vec<P>),
    /// Disjunction.
    Or(Vec<P>),
    /// Negation.
    Not(Box<P>),
    /// `TRUE` / `FALSE`.
    Bool(bool),
    /// Caller-supplied SQL; each `?` is bound to the next argument.
    Raw { sql: String, args: Vec<Value> },
}

impl P {
    /// `column = value`.
    pub fn eq(column: Column, value: impl Into<Value>) -> Self {
        Self::compare(column, CmpOp::Eq, value)
    }

    /// `column <> value`.
    pub fn ne(column: Column, value: impl Into<Value>) -> Self {
        Self::compare(column, CmpOp::Ne, value)
    }

    /// `column OP value`.
    pub fn compare(column: Column, op: CmpOp, value: impl Into<Value>) -> Self {
        P::Compare {
            left: Operand::Column(column),
            op,
            right: Operand::Value(value.into()),
        }
    }

    /// `left OP right` over two columns.
    pub fn columns(left: Column, op: CmpOp, right: Column) -> Self {
        P::Compare {
            left: Operand::Column(left),
            op,
            right: Operand::Column(right),
        }
    }

    /// `left = right` over two columns.
    pub fn columns_eq(left: Column, right: Column) -> Self {
        Self::columns(left, CmpOp::Eq, right)
    }

    /// `column IN (values)`.
    pub fn in_values(column: Column, values: Vec<Value>) -> Self {
        P::In {
            left: Operand::Column(column),
            values,
            negated: false,
        }
    }

    /// `column NOT IN (values)`.
    pub fn not_in_values(column: Column, values: Vec<Value>) -> Self {
        P::In {
            left: Operand::Column(column),
            values,
            negated: true,
        }
    }

    /// `column IN (SELECT ...)`.
    pub fn in_select(column: Column, select: Selector) -> Self {
        P::InSelect {
            column,
            select: Box::new(select),
            negated: false,
        }
    }

    /// `EXISTS (SELECT ...)`.
    pub fn exists(select: Selector) -> Self {
        P::Exists {
            select: Box::new(select),
            negated: false,
        }
    }

    /// `NOT EXISTS (SELECT ...)`.
    pub fn not_exists(select: Selector) -> Self {
        P::Exists {
            select: Box::new(select),
            negated: true,
        }
    }

    /// `column IS NULL`.
    pub fn is_null(column: Column) -> Self {
        P::IsNull {
            column,
            negated: false,
        }
    }

    /// `column IS NOT NULL`.
    pub fn not_null(column: Column) -> Self {
        P::IsNull {
            column,
            negated: true,
        }
    }

    /// `column LIKE pattern`, where the pattern is bound as-is.
    pub fn like(column: Column, pattern: impl Into<String>) -> Self {
        P::Like {
            left: Operand::Column(column),
            pattern: Operand::Value(Value::String(pattern.into())),
            escaped: false,
            negated: false,
        }
    }

    /// `column LIKE 'prefix%'`.
    pub fn has_prefix(column: Column, prefix: &str) -> Self {
        Self::like_escaped(Operand::Column(column), prefix, "", "%", false)
    }

    /// `column LIKE '%suffix'`.
    pub fn has_suffix(column: Column, suffix: &str) -> Self {
        Self::like_escaped(Operand::Column(column), suffix, "%", "", false)
    }

    /// `column LIKE '%sub%'`.
    pub fn contains(column: Column, sub: &str) -> Self {
        Self::like_escaped(Operand::Column(column), sub, "%", "%", false)
    }

    /// `LOWER(column) LIKE LOWER('%sub%')`.
    pub fn contains_fold(column: Column, sub: &str) -> Self {
        Self::like_escaped(Operand::Column(column).lower(), sub, "%", "%", true)
    }

    /// `LOWER(column) = LOWER(value)`.
    pub fn equal_fold(column: Column, value: &str) -> Self {
        P::Compare {
            left: Operand::Column(column).lower(),
            op: CmpOp::Eq,
            right: Operand::Value(Value::from(value)).lower(),
        }
    }

    fn like_escaped(left: Operand, literal: &str, before: &str, after: &str, fold: bool) -> Self {
        let (escaped_literal, escaped) = escape_like(literal);
        let pattern = Operand::Value(Value::String(format!(
            "{}{}{}",
            before, escaped_literal, after
        )));
        P::Like {
            left,
            pattern: if fold { pattern.lower() } else { pattern },
            escaped,
            negated: false,
        }
    }

    /// Conjunction. A single predicate is returned unchanged and an empty
    /// list is `TRUE`.
    pub fn and(mut preds: Vec<P>) -> Self {
        match preds.len() {
            0 => P::Bool(true),
            1 => preds.remove(0),
            _ => P::And(preds),
        }
    }

    /// Disjunction. A single predicate is returned unchanged and an empty
    /// list is `FALSE`.
    pub fn or(mut preds: Vec<P>) -> Self {
        match preds.len() {
            0 => P::Bool(false),
            1 => preds.remove(0),
            _ => P::Or(preds),
        }
    }

    /// Negation.
    pub fn not(pred: P) -> Self {
        P::Not(Box::new(pred))
    }

    /// Raw SQL with `?` argument marks.
    pub fn raw(sql: impl Into<String>, args: Vec<Value>) -> Self {
        P::Raw {
            sql: sql.into(),
            args,
        }
    }

    /// Append `other` conjunctively, flattening an existing AND chain.
    pub fn and_also(self, other: P) -> Self {
        match self {
            P::And(mut preds) => {
                preds.push(other);
                P::And(preds)
            }
            p => P::And(vec![p, other]),
        }
    }

    /// Render into a builder.
    pub fn build(&self, b: &mut Builder) -> Result<()> {
        match self {
            P::Compare { left, op, right } => {
                left.build(b);
                b.push(" ").push(op.sql()).push(" ");
                right.build(b);
            }
            P::Like {
                left,
                pattern,
                escaped,
                negated,
            } => {
                left.build(b);
                b.push(if *negated { " NOT LIKE " } else { " LIKE " });
                pattern.build(b);
                if *escaped && b.dialect() == Dialect::Sqlite {
                    b.push(" ESCAPE '\\'");
                }
            }
            P::In {
                left,
                values,
                negated,
            } => {
                if values.is_empty() {
                    b.push(if *negated { "TRUE" } else { "FALSE" });
                    return Ok(());
                }
                left.build(b);
                b.push(if *negated { " NOT IN (" } else { " IN (" });
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        b.push(", ");
                    }
                    b.arg(v.clone());
                }
                b.push(")");
            }
            P::InSelect {
                column,
                select,
                negated,
            } => {
                column.build(b);
                b.push(if *negated { " NOT IN (" } else { " IN (" });
                select.build(b)?;
                b.push(")");
            }
            P::IsNull { column, negated } => {
                column.build(b);
                b.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            P::Exists { select, negated } => {
                b.push(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
                select.build(b)?;
                b.push(")");
            }
            P::And(preds) => Self::build_chain(preds, " AND ", true, b)?,
            P::Or(preds) => Self::build_chain(preds, " OR ", false, b)?,
            P::Not(inner) => {
                b.push("NOT (");
                inner.build(b)?;
                b.push(")");
            }
            P::Bool(v) => {
                b.push(if *v { "TRUE" } else { "FALSE" });
            }
            P::Raw { sql, args } => {
                b.raw(sql, args)?;
            }
        }
        Ok(())
    }

    fn build_chain(preds: &[P], sep: &str, conjunction: bool, b: &mut Builder) -> Result<()> {
        if preds.is_empty() {
            b.push(if conjunction { "TRUE" } else { "FALSE" });
            return Ok(());
        }
        let grouped = preds.len() > 1;
        for (i, p) in preds.iter().enumerate() {
            if i > 0 {
                b.push(sep);
            }
            if grouped && p.needs_parens_in(conjunction) {
                b.push("(");
                p.build(b)?;
                b.push(")");
            } else {
                p.build(b)?;
            }
        }
        Ok(())
    }

    /// Whether this predicate must be parenthesized as a member of an
    /// AND chain (`conjunction`) or an OR chain.
    fn needs_parens_in(&self, conjunction: bool) -> bool {
        match self {
            P::Or(preds) => conjunction && preds.len() > 1,
            P::And(preds) => !conjunction && preds.len() > 1,
            P::Raw { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(p: &P, dialect: Dialect) -> (String, Vec<Value>) {
        let mut b = Builder::new(dialect);
        p.build(&mut b).unwrap();
        b.finish()
    }

    fn c(name: &str) -> Column {
        Column::qualified("t", name)
    }

    #[test]
    fn test_and_chain_is_flat_or_group_parenthesized() {
        let p = P::and(vec![
            P::eq(c("a"), 1),
            P::or(vec![P::eq(c("b"), 2), P::eq(c("c"), 3)]),
        ]);
        let (sql, args) = render(&p, Dialect::Postgres);
        assert_eq!(
            sql,
            r#""t"."a" = $1 AND ("t"."b" = $2 OR "t"."c" = $3)"#
        );
        assert_eq!(args, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_and_inside_or_is_parenthesized() {
        let p = P::or(vec![
            P::and(vec![P::eq(c("a"), 1), P::eq(c("b"), 2)]),
            P::eq(c("c"), 3),
        ]);
        let (sql, _) = render(&p, Dialect::Sqlite);
        assert_eq!(sql, r#"("t"."a" = ? AND "t"."b" = ?) OR "t"."c" = ?"#);
    }

    #[test]
    fn test_not_wraps_operand() {
        let p = P::not(P::is_null(c("a")));
        let (sql, _) = render(&p, Dialect::MySql);
        assert_eq!(sql, "NOT (`t`.`a` IS NULL)");
    }

    #[test]
    fn test_in_values_and_empty_in() {
        let p = P::in_values(c("a"), vec![1.into(), 2.into()]);
        assert_eq!(render(&p, Dialect::Postgres).0, r#""t"."a" IN ($1, $2)"#);

        let empty = P::in_values(c("a"), vec![]);
        assert_eq!(render(&empty, Dialect::Postgres).0, "FALSE");
        let empty_not = P::not_in_values(c("a"), vec![]);
        assert_eq!(render(&empty_not, Dialect::Postgres).0, "TRUE");
    }

    #[test]
    fn test_like_escape_only_on_sqlite() {
        let p = P::Like {
            left: Operand::Column(c("name")),
            pattern: Operand::Value("50\\%%".into()),
            escaped: true,
            negated: false,
        };
        assert_eq!(
            render(&p, Dialect::Sqlite).0,
            r#""t"."name" LIKE ? ESCAPE '\'"#
        );
        assert_eq!(render(&p, Dialect::MySql).0, "`t`.`name` LIKE ?");
    }

    #[test]
    fn test_string_operators_wrap_and_escape() {
        let (sql, args) = render(&P::has_prefix(c("name"), "a"), Dialect::Postgres);
        assert_eq!(sql, r#""t"."name" LIKE $1"#);
        assert_eq!(args, vec![Value::from("a%")]);

        let (_, args) = render(&P::has_suffix(c("name"), "a"), Dialect::Postgres);
        assert_eq!(args, vec![Value::from("%a")]);

        let (sql, args) = render(&P::contains(c("name"), "50%_off"), Dialect::Sqlite);
        assert_eq!(sql, r#""t"."name" LIKE ? ESCAPE '\'"#);
        assert_eq!(args, vec![Value::from("%50\\%\\_off%")]);
    }

    #[test]
    fn test_fold_operators_lower_both_sides() {
        let (sql, args) = render(&P::contains_fold(c("name"), "Git"), Dialect::MySql);
        assert_eq!(sql, "LOWER(`t`.`name`) LIKE LOWER(?)");
        assert_eq!(args, vec![Value::from("%Git%")]);

        let (sql, _) = render(&P::equal_fold(c("name"), "GitHub"), Dialect::Postgres);
        assert_eq!(sql, r#"LOWER("t"."name") = LOWER($1)"#);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), ("plain".to_string(), false));
        assert_eq!(escape_like("a\\b"), ("a\\\\b".to_string(), true));
    }

    #[test]
    fn test_and_collapses_singletons() {
        assert_eq!(P::and(vec![P::Bool(true)]), P::Bool(true));
        assert_eq!(P::and(vec![]), P::Bool(true));
        assert_eq!(P::or(vec![]), P::Bool(false));
    }

    #[test]
    fn test_and_also_flattens() {
        let p = P::eq(c("a"), 1)
            .and_also(P::eq(c("b"), 2))
            .and_also(P::eq(c("c"), 3));
        match p {
            P::And(preds) => assert_eq!(preds.len(), 3),
            other => panic!("expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_in_chain_is_grouped() {
        let p = P::and(vec![
            P::eq(c("a"), 1),
            P::raw("x = ? OR y = ?", vec![2.into(), 3.into()]),
        ]);
        assert_eq!(
            render(&p, Dialect::Postgres).0,
            r#""t"."a" = $1 AND (x = $2 OR y = $3)"#
        );
    }
}
