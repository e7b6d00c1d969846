// Copyright (c) opaldb.org 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Predicate decomposition and classification over analyzed expressions.

use std::collections::BTreeSet;

use super::{ColumnRef, ComparisonExpr, Expr, LogicalOp};

/// Conjuncts of a boolean predicate, grouped by how many range table entries
/// each one references: exactly one (scan), two or more (join), none
/// (constant).
#[derive(Debug, Default)]
pub struct PredicateGroups<'a> {
	pub scan_predicates: Vec<&'a Expr>,
	pub join_predicates: Vec<&'a Expr>,
	pub constant_predicates: Vec<&'a Expr>,
}

impl Expr {
	/// Split the top-level AND tree into conjuncts and classify each one.
	/// OR trees are opaque: they classify as a whole.
	pub fn group_predicates<'a>(&'a self, groups: &mut PredicateGroups<'a>) {
		if let Expr::Logical(logical) = self {
			if logical.op == LogicalOp::And {
				logical.left.group_predicates(groups);
				logical.right.group_predicates(groups);
				return;
			}
		}
		let mut rte_set = BTreeSet::new();
		self.collect_rte_indexes(&mut rte_set);
		match rte_set.len() {
			0 => groups.constant_predicates.push(self),
			1 => groups.scan_predicates.push(self),
			_ => groups.join_predicates.push(self),
		}
	}

	/// Detect a bare-column vs constant comparison eligible for storage
	/// pushdown. Returns the normalized predicate (column on the left, the
	/// operator mirrored when the input had the constant first) and the
	/// range table index the column reads from.
	pub fn normalize_simple_predicate(&self) -> Option<(Expr, usize)> {
		let cmp = match self {
			Expr::Comparison(cmp) => cmp,
			_ => return None,
		};
		match (cmp.left.as_ref(), cmp.right.as_ref()) {
			(Expr::Column(column), Expr::Literal(_)) => Some((self.clone(), column.column.rte_idx)),
			(Expr::Literal(_), Expr::Column(column)) => {
				let normalized = Expr::Comparison(ComparisonExpr {
					op: cmp.op.mirror(),
					left: cmp.right.clone(),
					right: cmp.left.clone(),
				});
				Some((normalized, column.column.rte_idx))
			}
			_ => None,
		}
	}

	/// Collect the set of range table indexes referenced anywhere below.
	pub fn collect_rte_indexes(&self, rte_set: &mut BTreeSet<usize>) {
		match self {
			Expr::Literal(_) | Expr::OutputRef(_) => {}
			Expr::Column(column) => {
				rte_set.insert(column.column.rte_idx);
			}
			Expr::Comparison(c) => {
				c.left.collect_rte_indexes(rte_set);
				c.right.collect_rte_indexes(rte_set);
			}
			Expr::Logical(l) => {
				l.left.collect_rte_indexes(rte_set);
				l.right.collect_rte_indexes(rte_set);
			}
			Expr::Not(e) => e.collect_rte_indexes(rte_set),
			Expr::Arithmetic(a) => {
				a.left.collect_rte_indexes(rte_set);
				a.right.collect_rte_indexes(rte_set);
			}
			Expr::Aggregate(agg) => {
				if let Some(arg) = &agg.arg {
					arg.collect_rte_indexes(rte_set);
				}
			}
		}
	}

	/// Collect every distinct column referenced anywhere below. The set
	/// orders by `(rte_idx, table_id, column_id)`, so iteration is
	/// deterministic and duplicates collapse.
	pub fn collect_column_refs(&self, columns: &mut BTreeSet<ColumnRef>) {
		match self {
			Expr::Literal(_) | Expr::OutputRef(_) => {}
			Expr::Column(column) => {
				columns.insert(column.column);
			}
			Expr::Comparison(c) => {
				c.left.collect_column_refs(columns);
				c.right.collect_column_refs(columns);
			}
			Expr::Logical(l) => {
				l.left.collect_column_refs(columns);
				l.right.collect_column_refs(columns);
			}
			Expr::Not(e) => e.collect_column_refs(columns),
			Expr::Arithmetic(a) => {
				a.left.collect_column_refs(columns);
				a.right.collect_column_refs(columns);
			}
			Expr::Aggregate(agg) => {
				if let Some(arg) = &agg.arg {
					arg.collect_column_refs(columns);
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use opal_type::{ColumnId, TableId};

	use super::*;
	use crate::expression::ComparisonOp;

	fn col(rte_idx: usize, column_id: u32) -> Expr {
		Expr::column(rte_idx, TableId(7), ColumnId(column_id))
	}

	#[test]
	fn test_group_predicates_classifies_conjuncts() {
		// (#0.1 > 5) AND (#0.2 = #1.1) AND (1 = 1)
		let scan = Expr::comparison(ComparisonOp::Gt, col(0, 1), Expr::int(5));
		let join = Expr::comparison(ComparisonOp::Eq, col(0, 2), col(1, 1));
		let constant = Expr::comparison(ComparisonOp::Eq, Expr::int(1), Expr::int(1));
		let pred = Expr::and(Expr::and(scan.clone(), join.clone()), constant.clone());

		let mut groups = PredicateGroups::default();
		pred.group_predicates(&mut groups);

		assert_eq!(groups.scan_predicates, vec![&scan]);
		assert_eq!(groups.join_predicates, vec![&join]);
		assert_eq!(groups.constant_predicates, vec![&constant]);
	}

	#[test]
	fn test_group_predicates_does_not_split_or() {
		let or = Expr::Logical(crate::expression::LogicalExpr {
			op: LogicalOp::Or,
			left: Box::new(Expr::comparison(ComparisonOp::Gt, col(0, 1), Expr::int(5))),
			right: Box::new(Expr::comparison(ComparisonOp::Lt, col(0, 2), Expr::int(9))),
		});
		let mut groups = PredicateGroups::default();
		or.group_predicates(&mut groups);
		assert_eq!(groups.scan_predicates.len(), 1);
		assert!(groups.join_predicates.is_empty());
		assert!(groups.constant_predicates.is_empty());
	}

	#[test]
	fn test_normalize_simple_predicate() {
		let pred = Expr::comparison(ComparisonOp::Gt, col(0, 1), Expr::int(5));
		let (normalized, rte_idx) = pred.normalize_simple_predicate().unwrap();
		assert_eq!(normalized, pred);
		assert_eq!(rte_idx, 0);
	}

	#[test]
	fn test_normalize_simple_predicate_mirrors_reversed_comparison() {
		// 5 < #0.1 normalizes to #0.1 > 5
		let pred = Expr::comparison(ComparisonOp::Lt, Expr::int(5), col(0, 1));
		let (normalized, rte_idx) = pred.normalize_simple_predicate().unwrap();
		assert_eq!(normalized.to_string(), "(#0.1 > 5)");
		assert_eq!(rte_idx, 0);
	}

	#[test]
	fn test_normalize_rejects_non_simple_shapes() {
		let arithmetic = Expr::comparison(
			ComparisonOp::Gt,
			Expr::Arithmetic(crate::expression::ArithmeticExpr {
				op: crate::expression::ArithmeticOp::Add,
				left: Box::new(col(0, 1)),
				right: Box::new(Expr::int(1)),
			}),
			Expr::int(5),
		);
		assert!(arithmetic.normalize_simple_predicate().is_none());

		let two_columns = Expr::comparison(ComparisonOp::Eq, col(0, 1), col(0, 2));
		assert!(two_columns.normalize_simple_predicate().is_none());
	}

	#[test]
	fn test_collect_column_refs_deduplicates() {
		let pred = Expr::and(
			Expr::comparison(ComparisonOp::Gt, col(0, 1), Expr::int(5)),
			Expr::comparison(ComparisonOp::Lt, col(0, 1), col(0, 2)),
		);
		let mut columns = BTreeSet::new();
		pred.collect_column_refs(&mut columns);
		let collected: Vec<_> = columns.iter().map(|c| (c.rte_idx, c.column_id.0)).collect();
		assert_eq!(collected, vec![(0, 1), (0, 2)]);
	}
}
