//! SELECT statement builder.

use super::builder::{Builder, Querier};
use super::dialect::Dialect;
use super::expr::{Column, Table, P};
use crate::error::{Error, Result};
use crate::value::Value;

/// Default prefix for generated table aliases (`t1`, `t2`, ...).
pub const DEFAULT_ALIAS_PREFIX: &str = "t";

/// MySQL has no "no limit" keyword; OFFSET without LIMIT uses the max value.
const MYSQL_MAX_LIMIT: &str = "18446744073709551615";

/// An item of the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// `*`.
    Star,
    /// A column.
    Column(Column),
    /// `COUNT(*)` or `COUNT([DISTINCT] column)`.
    Count {
        column: Option<Column>,
        distinct: bool,
    },
    /// Trusted SQL text, e.g. an aggregate expression written by the caller.
    Raw(String),
}

impl From<Column> for Selection {
    fn from(c: Column) -> Self {
        Selection::Column(c)
    }
}

/// Join types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `JOIN`.
    Inner,
    /// `LEFT JOIN`.
    Left,
}

impl JoinKind {
    fn sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Join type.
    pub kind: JoinKind,
    /// Joined table.
    pub table: Table,
    /// ON condition.
    pub on: Option<P>,
}

impl Join {
    /// An inner join.
    pub fn inner(table: Table) -> Self {
        Self {
            kind: JoinKind::Inner,
            table,
            on: None,
        }
    }

    /// A left join.
    pub fn left(table: Table) -> Self {
        Self {
            kind: JoinKind::Left,
            table,
            on: None,
        }
    }

    /// `ON left = right`.
    pub fn on(mut self, left: Column, right: Column) -> Self {
        self.on = Some(P::columns_eq(left, right));
        self
    }

    /// Arbitrary ON predicate.
    pub fn on_p(mut self, p: P) -> Self {
        self.on = Some(p);
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// Placement of NULLs in an ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// An ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Column to order by.
    pub column: Column,
    /// Sort direction.
    pub direction: OrderDirection,
    /// NULL placement.
    pub nulls: Option<NullsOrder>,
}

impl Order {
    /// Ascending order.
    pub fn asc(column: Column) -> Self {
        Self {
            column,
            direction: OrderDirection::Asc,
            nulls: None,
        }
    }

    /// Descending order.
    pub fn desc(column: Column) -> Self {
        Self {
            column,
            direction: OrderDirection::Desc,
            nulls: None,
        }
    }

    /// Set NULL placement.
    pub fn with_nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = Some(nulls);
        self
    }
}

/// Row lock strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStrength {
    Update,
    Share,
}

/// Behaviour when a row lock is not immediately available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockWait {
    #[default]
    Wait,
    NoWait,
    SkipLocked,
}

/// A locking clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lock {
    pub strength: LockStrength,
    pub wait: LockWait,
}

/// Alias generation state, shared down the subquery chain by value and
/// merged back after a child selector is finished.
#[derive(Debug, Clone, PartialEq)]
struct Aliases {
    prefix: String,
    next: u32,
    /// Table names and aliases visible from enclosing scopes.
    reserved: Vec<String>,
}

/// A SELECT statement under construction.
///
/// A selector is owned by the single call stack building one query. It is
/// mutated in place by the predicate compiler and rendered once at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    dialect: Dialect,
    distinct: bool,
    selection: Vec<Selection>,
    from: Option<Table>,
    joins: Vec<Join>,
    predicate: Option<P>,
    group_by: Vec<Column>,
    having: Option<P>,
    order_by: Vec<Order>,
    limit: Option<u64>,
    offset: Option<u64>,
    lock: Option<Lock>,
    aliases: Aliases,
}

impl Selector {
    /// Create an empty selector (`SELECT *`, no FROM yet).
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            distinct: false,
            selection: Vec::new(),
            from: None,
            joins: Vec::new(),
            predicate: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            lock: None,
            aliases: Aliases {
                prefix: DEFAULT_ALIAS_PREFIX.to_string(),
                next: 1,
                reserved: Vec::new(),
            },
        }
    }

    /// Create a selector for the given columns.
    pub fn select(dialect: Dialect, columns: impl IntoIterator<Item = Column>) -> Self {
        Self::new(dialect).with_columns(columns)
    }

    /// Set the FROM table.
    pub fn from(mut self, table: Table) -> Self {
        self.set_from(table);
        self
    }

    /// Set the FROM table in place.
    pub fn set_from(&mut self, table: Table) {
        self.from = Some(table);
    }

    /// Replace the SELECT list with columns.
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.selection = columns.into_iter().map(Selection::Column).collect();
        self
    }

    /// Replace the SELECT list.
    pub fn set_selection(&mut self, selection: Vec<Selection>) {
        self.selection = selection;
    }

    /// Add an item to the SELECT list.
    pub fn add_selection(&mut self, selection: impl Into<Selection>) {
        self.selection.push(selection.into());
    }

    /// Set the alias prefix used by [`Selector::alloc_alias`].
    pub fn with_alias_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.set_alias_prefix(prefix);
        self
    }

    /// Set the alias prefix in place. Aliases allocated earlier keep their
    /// names; the counter is not reset.
    pub fn set_alias_prefix(&mut self, prefix: impl Into<String>) {
        self.aliases.prefix = prefix.into();
    }

    /// `SELECT DISTINCT`.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// The selector's dialect.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The FROM table, if set.
    pub fn table(&self) -> Option<&Table> {
        self.from.as_ref()
    }

    /// The name columns of the FROM table are qualified with.
    pub fn qualifier(&self) -> Option<&str> {
        self.from.as_ref().map(|t| t.qualifier())
    }

    /// A column of the FROM table; unqualified when no FROM is set.
    pub fn c(&self, column: impl Into<String>) -> Column {
        match self.qualifier() {
            Some(q) => Column::qualified(q, column),
            None => Column::new(column),
        }
    }

    /// Add a join.
    pub fn join(&mut self, join: Join) {
        self.joins.push(join);
    }

    /// Joins added so far.
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Add a predicate to the WHERE clause, conjunctively.
    pub fn add_where(&mut self, p: P) {
        self.predicate = Some(match self.predicate.take() {
            None => p,
            Some(existing) => existing.and_also(p),
        });
    }

    /// The accumulated WHERE predicate.
    pub fn where_clause(&self) -> Option<&P> {
        self.predicate.as_ref()
    }

    /// Remove and return the WHERE predicate.
    pub fn take_where(&mut self) -> Option<P> {
        self.predicate.take()
    }

    /// Add GROUP BY columns.
    pub fn group_by(&mut self, columns: impl IntoIterator<Item = Column>) {
        self.group_by.extend(columns);
    }

    /// Add a HAVING predicate, conjunctively.
    pub fn having(&mut self, p: P) {
        self.having = Some(match self.having.take() {
            None => p,
            Some(existing) => existing.and_also(p),
        });
    }

    /// Add an ORDER BY term.
    pub fn order_by(&mut self, order: Order) {
        self.order_by.push(order);
    }

    /// Set LIMIT.
    pub fn limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    /// Set OFFSET.
    pub fn offset(&mut self, offset: u64) {
        self.offset = Some(offset);
    }

    /// `FOR UPDATE`.
    pub fn for_update(&mut self, wait: LockWait) {
        self.lock = Some(Lock {
            strength: LockStrength::Update,
            wait,
        });
    }

    /// `FOR SHARE`.
    pub fn for_share(&mut self, wait: LockWait) {
        self.lock = Some(Lock {
            strength: LockStrength::Share,
            wait,
        });
    }

    /// Allocate a fresh table alias.
    ///
    /// Aliases are never reused within one top-level statement as long as
    /// child selectors are merged back with [`Selector::merge_aliases`], and
    /// never equal a table name visible from this scope.
    pub fn alloc_alias(&mut self) -> String {
        loop {
            let candidate = format!("{}{}", self.aliases.prefix, self.aliases.next);
            self.aliases.next += 1;
            if !self.is_visible(&candidate) {
                return candidate;
            }
        }
    }

    /// Whether a table name or alias is visible from this scope: the FROM
    /// table, a joined table, or a table of an enclosing selector.
    pub fn is_visible(&self, name: &str) -> bool {
        self.aliases.reserved.iter().any(|r| r == name)
            || self.own_names().any(|n| n == name)
    }

    fn own_names(&self) -> impl Iterator<Item = &str> {
        self.from
            .iter()
            .chain(self.joins.iter().map(|j| &j.table))
            .flat_map(|t| std::iter::once(t.name.as_str()).chain(t.alias.as_deref()))
    }

    /// A new empty selector nested inside this one: same dialect, alias
    /// sequence continuing from this selector, and this scope's tables
    /// reserved.
    pub fn sub_select(&self) -> Selector {
        let mut reserved = self.aliases.reserved.clone();
        reserved.extend(self.own_names().map(String::from));
        let mut sub = Selector::new(self.dialect);
        sub.aliases = Aliases {
            prefix: self.aliases.prefix.clone(),
            next: self.aliases.next,
            reserved,
        };
        sub
    }

    /// A WHERE-only view of this selector: same FROM table and alias state,
    /// empty WHERE, and this selector's joined tables reserved. Used to
    /// compile independent fragments (OR branches).
    pub fn fragment(&self) -> Selector {
        let mut frag = Selector::new(self.dialect);
        frag.from = self.from.clone();
        frag.aliases = self.aliases.clone();
        for join in &self.joins {
            frag.aliases.reserved.push(join.table.name.clone());
            frag.aliases.reserved.extend(join.table.alias.clone());
        }
        frag
    }

    /// Continue the alias sequence after a finished child selector.
    pub fn merge_aliases(&mut self, child: &Selector) {
        self.aliases.next = self.aliases.next.max(child.aliases.next);
    }

    /// Fold a finished fragment back into this selector: continue its alias
    /// sequence, keep the joins it added and return its WHERE predicate.
    pub fn absorb(&mut self, mut fragment: Selector) -> Option<P> {
        self.merge_aliases(&fragment);
        self.joins.append(&mut fragment.joins);
        fragment.predicate.take()
    }

    /// Render into an existing builder (used for subqueries).
    pub fn build(&self, b: &mut Builder) -> Result<()> {
        let table = self
            .from
            .as_ref()
            .ok_or_else(|| Error::invalid_query("SELECT without a FROM table"))?;

        b.push("SELECT ");
        if self.distinct {
            b.push("DISTINCT ");
        }
        if self.selection.is_empty() {
            b.push("*");
        }
        for (i, s) in self.selection.iter().enumerate() {
            if i > 0 {
                b.push(", ");
            }
            match s {
                Selection::Star => {
                    b.push("*");
                }
                Selection::Column(c) => c.build(b),
                Selection::Count { column, distinct } => {
                    b.push("COUNT(");
                    match column {
                        Some(c) => {
                            if *distinct {
                                b.push("DISTINCT ");
                            }
                            c.build(b);
                        }
                        None => {
                            b.push("*");
                        }
                    }
                    b.push(")");
                }
                Selection::Raw(sql) => {
                    b.push(sql);
                }
            }
        }

        b.push(" FROM ");
        table.build(b);

        for join in &self.joins {
            b.push(" ").push(join.kind.sql()).push(" ");
            join.table.build(b);
            let on = join.on.as_ref().ok_or_else(|| {
                Error::invalid_query(format!("JOIN {} without ON clause", join.table.name))
            })?;
            b.push(" ON ");
            on.build(b)?;
        }

        if let Some(p) = &self.predicate {
            b.push(" WHERE ");
            p.build(b)?;
        }

        if !self.group_by.is_empty() {
            b.push(" GROUP BY ");
            for (i, c) in self.group_by.iter().enumerate() {
                if i > 0 {
                    b.push(", ");
                }
                c.build(b);
            }
        }

        if let Some(p) = &self.having {
            if self.group_by.is_empty() {
                return Err(Error::invalid_query("HAVING without GROUP BY"));
            }
            b.push(" HAVING ");
            p.build(b)?;
        }

        if !self.order_by.is_empty() {
            b.push(" ORDER BY ");
            for (i, o) in self.order_by.iter().enumerate() {
                if i > 0 {
                    b.push(", ");
                }
                o.column.build(b);
                if o.direction == OrderDirection::Desc {
                    b.push(" DESC");
                }
                if let Some(nulls) = o.nulls {
                    if !b.dialect().supports_nulls_order() {
                        return Err(Error::invalid_query(format!(
                            "{} does not support NULLS FIRST/LAST",
                            b.dialect()
                        )));
                    }
                    b.push(match nulls {
                        NullsOrder::First => " NULLS FIRST",
                        NullsOrder::Last => " NULLS LAST",
                    });
                }
            }
        }

        self.build_limit(b);
        self.build_lock(b)?;
        Ok(())
    }

    fn build_limit(&self, b: &mut Builder) {
        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                b.push(&format!(" LIMIT {}", limit));
                if let Some(offset) = offset {
                    b.push(&format!(" OFFSET {}", offset));
                }
            }
            (None, Some(offset)) => {
                match b.dialect() {
                    Dialect::MySql => {
                        b.push(" LIMIT ").push(MYSQL_MAX_LIMIT);
                    }
                    Dialect::Sqlite => {
                        b.push(" LIMIT -1");
                    }
                    Dialect::Postgres => {}
                }
                b.push(&format!(" OFFSET {}", offset));
            }
            (None, None) => {}
        }
    }

    fn build_lock(&self, b: &mut Builder) -> Result<()> {
        let Some(lock) = self.lock else {
            return Ok(());
        };
        if !b.dialect().supports_locking() {
            return Err(Error::invalid_query(format!(
                "{} does not support row locking",
                b.dialect()
            )));
        }
        b.push(match lock.strength {
            LockStrength::Update => " FOR UPDATE",
            LockStrength::Share => " FOR SHARE",
        });
        b.push(match lock.wait {
            LockWait::Wait => "",
            LockWait::NoWait => " NOWAIT",
            LockWait::SkipLocked => " SKIP LOCKED",
        });
        Ok(())
    }
}

impl Querier for Selector {
    fn query(&self) -> Result<(String, Vec<Value>)> {
        let mut b = Builder::new(self.dialect);
        self.build(&mut b)?;
        Ok(b.finish())
    }
}
