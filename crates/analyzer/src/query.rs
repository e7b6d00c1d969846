// Copyright (c) opaldb.org 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::fmt::{self, Display, Formatter};

use opal_type::{ColumnId, SortDirection, StatementKind, TableId};

use crate::expression::Expr;

/// Column descriptor of a range table entry, in table definition order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
	pub id: ColumnId,
	pub name: String,
}

/// One table reference visible in a query block.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeTableEntry {
	pub table_id: TableId,
	pub name: String,
	pub columns: Vec<ColumnDef>,
}

/// A named output expression. Entry order defines output column positions;
/// a `None` name marks a derived column.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetEntry {
	pub name: Option<String>,
	pub expr: Expr,
}

impl TargetEntry {
	pub fn named(name: impl Into<String>, expr: Expr) -> Self {
		Self {
			name: Some(name.into()),
			expr,
		}
	}

	pub fn anonymous(expr: Expr) -> Self {
		Self {
			name: None,
			expr,
		}
	}
}

impl Display for TargetEntry {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.name {
			Some(name) => write!(f, "{}: {}", name, self.expr),
			None => Display::fmt(&self.expr, f),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
	pub expr: Expr,
	pub direction: SortDirection,
}

impl Display for OrderByItem {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.expr, self.direction)
	}
}

/// One analyzed query block. Produced by semantic analysis, read-only to the
/// planner; every expression that ends up in a plan is deep-copied out.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
	pub stmt: StatementKind,
	pub range_table: Vec<RangeTableEntry>,
	pub target_list: Vec<TargetEntry>,
	pub where_clause: Option<Expr>,
	pub group_by: Vec<Expr>,
	pub having: Option<Expr>,
	pub order_by: Vec<OrderByItem>,
	/// Link to the next query block of a UNION chain.
	pub next_query: Option<Box<Query>>,
}

impl Query {
	pub fn new(stmt: StatementKind) -> Self {
		Self {
			stmt,
			range_table: Vec::new(),
			target_list: Vec::new(),
			where_clause: None,
			group_by: Vec::new(),
			having: None,
			order_by: Vec::new(),
			next_query: None,
		}
	}

	/// True when any target expression contains an aggregate call.
	pub fn has_aggregates(&self) -> bool {
		self.target_list.iter().any(|tle| tle.expr.contains_aggregate())
	}
}

#[cfg(test)]
mod tests {
	use opal_type::Value;

	use super::*;
	use crate::expression::{AggregateExpr, AggregateKind};

	#[test]
	fn test_target_entry_display() {
		let named = TargetEntry::named("a", Expr::column(0, TableId(1), ColumnId(1)));
		assert_eq!(named.to_string(), "a: #0.1");

		let anonymous = TargetEntry::anonymous(Expr::Literal(Value::Int(1)));
		assert_eq!(anonymous.to_string(), "1");
	}

	#[test]
	fn test_has_aggregates() {
		let mut query = Query::new(StatementKind::Select);
		query.target_list.push(TargetEntry::named("a", Expr::column(0, TableId(1), ColumnId(1))));
		assert!(!query.has_aggregates());

		query.target_list.push(TargetEntry::anonymous(Expr::Aggregate(AggregateExpr {
			kind: AggregateKind::Count,
			arg: None,
			distinct: false,
		})));
		assert!(query.has_aggregates());
	}
}
