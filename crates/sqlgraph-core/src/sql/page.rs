//! Keyset (cursor) pagination.

use super::expr::{CmpOp, Column, P};
use super::select::{Order, OrderDirection, Selector};
use crate::error::{Error, Result};
use crate::value::Value;

/// A page request over an ordered key.
///
/// `order` lists the sort key, most significant first; the last term should
/// be unique (usually the primary key) for pages to be stable. `after` holds
/// the key values of the last row of the previous page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Sort key.
    pub order: Vec<(Column, OrderDirection)>,
    /// Key values of the last row already seen.
    pub after: Option<Vec<Value>>,
    /// Maximum number of rows.
    pub limit: Option<u64>,
}

impl Page {
    /// First page ordered by the given key.
    pub fn new(order: Vec<(Column, OrderDirection)>) -> Self {
        Self {
            order,
            after: None,
            limit: None,
        }
    }

    /// Continue after the given key values.
    pub fn after(mut self, values: Vec<Value>) -> Self {
        self.after = Some(values);
        self
    }

    /// Set the page size.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Build the keyset predicate
/// `(k1 > v1) OR (k1 = v1 AND k2 > v2) OR ...`, using `<` for descending
/// terms.
pub fn keyset_predicate(order: &[(Column, OrderDirection)], after: &[Value]) -> Result<P> {
    if order.is_empty() {
        return Err(Error::invalid_query("cursor pagination needs an order key"));
    }
    if order.len() != after.len() {
        return Err(Error::invalid_query(format!(
            "cursor has {} value(s) for {} order column(s)",
            after.len(),
            order.len()
        )));
    }
    if after.iter().any(Value::is_null) {
        return Err(Error::invalid_query("cursor values must not be null"));
    }

    let mut branches = Vec::with_capacity(order.len());
    for i in 0..order.len() {
        let mut terms: Vec<P> = order[..i]
            .iter()
            .zip(after)
            .map(|((c, _), v)| P::eq(c.clone(), v.clone()))
            .collect();
        let (column, direction) = &order[i];
        let op = match direction {
            OrderDirection::Asc => CmpOp::Gt,
            OrderDirection::Desc => CmpOp::Lt,
        };
        terms.push(P::compare(column.clone(), op, after[i].clone()));
        branches.push(P::and(terms));
    }
    Ok(P::or(branches))
}

impl Selector {
    /// Apply a page: keyset predicate, ORDER BY over the key and LIMIT.
    pub fn paginate(&mut self, page: &Page) -> Result<()> {
        if let Some(after) = &page.after {
            let p = keyset_predicate(&page.order, after)?;
            self.add_where(p);
        }
        for (column, direction) in &page.order {
            self.order_by(match direction {
                OrderDirection::Asc => Order::asc(column.clone()),
                OrderDirection::Desc => Order::desc(column.clone()),
            });
        }
        if let Some(limit) = page.limit {
            self.limit(limit);
        }
        Ok(())
    }
}
