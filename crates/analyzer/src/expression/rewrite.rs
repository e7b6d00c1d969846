// Copyright (c) opaldb.org 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Rewriting expressions across plan boundaries: mapping column and
//! aggregate references onto the output columns of a child plan node.

use opal_type::ColumnId;

use super::{AggregateExpr, ArithmeticExpr, ColumnExpr, ColumnRef, ComparisonExpr, Expr, LogicalExpr, OutputRef};
use crate::query::TargetEntry;

/// A rewrite asked for a column or aggregate the target list does not
/// produce. Always an upstream contract violation: scan construction
/// materializes every column a later stage may reference.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RewriteError {
	#[error("column #{rte_idx}.{column_id} not found in child target list")]
	ColumnNotInTargetList {
		rte_idx: usize,
		column_id: ColumnId,
	},

	#[error("aggregate expression not found in target list")]
	AggregateNotInTargetList,

	#[error("HAVING references a column that is not part of the aggregated output")]
	HavingColumnNotGrouped,
}

fn column_position(tlist: &[TargetEntry], column: &ColumnRef) -> Option<usize> {
	tlist.iter().position(|tle| match &tle.expr {
		Expr::Column(c) => c.column == *column,
		_ => false,
	})
}

impl Expr {
	/// Rewrite so that every column reference points at the position of
	/// that column in `tlist`, the output of the plan node below.
	/// Aggregate calls keep their node; only their argument is rewritten.
	pub fn rewrite_with_child_target_list(&self, tlist: &[TargetEntry]) -> Result<Expr, RewriteError> {
		match self {
			Expr::Literal(_) | Expr::OutputRef(_) => Ok(self.clone()),
			Expr::Column(column) => match column_position(tlist, &column.column) {
				Some(position) => Ok(Expr::Column(ColumnExpr {
					column: column.column,
					output_position: Some(position),
				})),
				None => Err(RewriteError::ColumnNotInTargetList {
					rte_idx: column.column.rte_idx,
					column_id: column.column.column_id,
				}),
			},
			Expr::Comparison(c) => Ok(Expr::Comparison(ComparisonExpr {
				op: c.op,
				left: Box::new(c.left.rewrite_with_child_target_list(tlist)?),
				right: Box::new(c.right.rewrite_with_child_target_list(tlist)?),
			})),
			Expr::Logical(l) => Ok(Expr::Logical(LogicalExpr {
				op: l.op,
				left: Box::new(l.left.rewrite_with_child_target_list(tlist)?),
				right: Box::new(l.right.rewrite_with_child_target_list(tlist)?),
			})),
			Expr::Not(e) => Ok(Expr::Not(Box::new(e.rewrite_with_child_target_list(tlist)?))),
			Expr::Arithmetic(a) => Ok(Expr::Arithmetic(ArithmeticExpr {
				op: a.op,
				left: Box::new(a.left.rewrite_with_child_target_list(tlist)?),
				right: Box::new(a.right.rewrite_with_child_target_list(tlist)?),
			})),
			Expr::Aggregate(agg) => {
				let arg = match &agg.arg {
					Some(arg) => Some(Box::new(arg.rewrite_with_child_target_list(tlist)?)),
					None => None,
				};
				Ok(Expr::Aggregate(AggregateExpr {
					kind: agg.kind,
					arg,
					distinct: agg.distinct,
				}))
			}
		}
	}

	/// Final-projection rewrite against the current plan's output. Columns
	/// resolve as in [`Self::rewrite_with_child_target_list`]; an aggregate
	/// must match a target entry as a whole and becomes a positional output
	/// reference. Column equality ignores rewritten positions, so a raw
	/// aggregate still matches its child-rewritten image in `tlist`.
	pub fn rewrite_with_target_list(&self, tlist: &[TargetEntry]) -> Result<Expr, RewriteError> {
		match self {
			Expr::Literal(_) | Expr::OutputRef(_) => Ok(self.clone()),
			Expr::Column(column) => match column_position(tlist, &column.column) {
				Some(position) => Ok(Expr::Column(ColumnExpr {
					column: column.column,
					output_position: Some(position),
				})),
				None => Err(RewriteError::ColumnNotInTargetList {
					rte_idx: column.column.rte_idx,
					column_id: column.column.column_id,
				}),
			},
			Expr::Comparison(c) => Ok(Expr::Comparison(ComparisonExpr {
				op: c.op,
				left: Box::new(c.left.rewrite_with_target_list(tlist)?),
				right: Box::new(c.right.rewrite_with_target_list(tlist)?),
			})),
			Expr::Logical(l) => Ok(Expr::Logical(LogicalExpr {
				op: l.op,
				left: Box::new(l.left.rewrite_with_target_list(tlist)?),
				right: Box::new(l.right.rewrite_with_target_list(tlist)?),
			})),
			Expr::Not(e) => Ok(Expr::Not(Box::new(e.rewrite_with_target_list(tlist)?))),
			Expr::Arithmetic(a) => Ok(Expr::Arithmetic(ArithmeticExpr {
				op: a.op,
				left: Box::new(a.left.rewrite_with_target_list(tlist)?),
				right: Box::new(a.right.rewrite_with_target_list(tlist)?),
			})),
			Expr::Aggregate(_) => match tlist.iter().position(|tle| tle.expr == *self) {
				Some(position) => Ok(Expr::OutputRef(OutputRef {
					position,
				})),
				None => Err(RewriteError::AggregateNotInTargetList),
			},
		}
	}

	/// Rewrite a HAVING conjunct against the aggregated target list.
	/// Aggregates resolve to output positions as in
	/// [`Self::rewrite_with_target_list`]; a bare column must be part of the
	/// aggregated output (a grouped column that is also projected).
	pub fn rewrite_having_clause(&self, tlist: &[TargetEntry]) -> Result<Expr, RewriteError> {
		match self {
			Expr::Literal(_) | Expr::OutputRef(_) => Ok(self.clone()),
			Expr::Column(column) => match column_position(tlist, &column.column) {
				Some(position) => Ok(Expr::Column(ColumnExpr {
					column: column.column,
					output_position: Some(position),
				})),
				None => Err(RewriteError::HavingColumnNotGrouped),
			},
			Expr::Comparison(c) => Ok(Expr::Comparison(ComparisonExpr {
				op: c.op,
				left: Box::new(c.left.rewrite_having_clause(tlist)?),
				right: Box::new(c.right.rewrite_having_clause(tlist)?),
			})),
			Expr::Logical(l) => Ok(Expr::Logical(LogicalExpr {
				op: l.op,
				left: Box::new(l.left.rewrite_having_clause(tlist)?),
				right: Box::new(l.right.rewrite_having_clause(tlist)?),
			})),
			Expr::Not(e) => Ok(Expr::Not(Box::new(e.rewrite_having_clause(tlist)?))),
			Expr::Arithmetic(a) => Ok(Expr::Arithmetic(ArithmeticExpr {
				op: a.op,
				left: Box::new(a.left.rewrite_having_clause(tlist)?),
				right: Box::new(a.right.rewrite_having_clause(tlist)?),
			})),
			Expr::Aggregate(_) => match tlist.iter().position(|tle| tle.expr == *self) {
				Some(position) => Ok(Expr::OutputRef(OutputRef {
					position,
				})),
				None => Err(RewriteError::AggregateNotInTargetList),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use opal_type::{ColumnId, TableId};

	use super::*;
	use crate::expression::{AggregateKind, ComparisonOp};

	fn col(rte_idx: usize, column_id: u32) -> Expr {
		Expr::column(rte_idx, TableId(7), ColumnId(column_id))
	}

	fn sum(arg: Expr) -> Expr {
		Expr::Aggregate(AggregateExpr {
			kind: AggregateKind::Sum,
			arg: Some(Box::new(arg)),
			distinct: false,
		})
	}

	#[test]
	fn test_child_rewrite_maps_columns_to_positions() {
		let tlist = vec![TargetEntry::anonymous(col(0, 2)), TargetEntry::anonymous(col(0, 1))];
		let pred = Expr::comparison(ComparisonOp::Gt, col(0, 1), Expr::int(5));
		let rewritten = pred.rewrite_with_child_target_list(&tlist).unwrap();
		assert_eq!(rewritten.to_string(), "($1 > 5)");
		// the rewrite is a copy; the input predicate is untouched
		assert_eq!(pred.to_string(), "(#0.1 > 5)");
	}

	#[test]
	fn test_child_rewrite_keeps_aggregate_nodes() {
		let tlist = vec![TargetEntry::anonymous(col(0, 2))];
		let rewritten = sum(col(0, 2)).rewrite_with_child_target_list(&tlist).unwrap();
		assert_eq!(rewritten.to_string(), "sum($0)");
	}

	#[test]
	fn test_child_rewrite_fails_on_missing_column() {
		let tlist = vec![TargetEntry::anonymous(col(0, 2))];
		let err = col(0, 9).rewrite_with_child_target_list(&tlist).unwrap_err();
		assert_eq!(
			err,
			RewriteError::ColumnNotInTargetList {
				rte_idx: 0,
				column_id: ColumnId(9)
			}
		);
	}

	#[test]
	fn test_target_rewrite_replaces_whole_aggregate() {
		// the aggregated target list holds the child-rewritten image
		let scan_tlist = vec![TargetEntry::anonymous(col(0, 2))];
		let agg_tlist = vec![TargetEntry::anonymous(sum(col(0, 2)).rewrite_with_child_target_list(&scan_tlist).unwrap())];

		let rewritten = sum(col(0, 2)).rewrite_with_target_list(&agg_tlist).unwrap();
		assert_eq!(rewritten, Expr::OutputRef(OutputRef { position: 0 }));
	}

	#[test]
	fn test_having_rewrite_resolves_aggregates_and_grouped_columns() {
		let agg_tlist = vec![TargetEntry::anonymous(sum(col(0, 1))), TargetEntry::anonymous(col(0, 2))];

		let having = Expr::and(
			Expr::comparison(ComparisonOp::Gt, sum(col(0, 1)), Expr::int(5)),
			Expr::comparison(ComparisonOp::Eq, col(0, 2), Expr::int(1)),
		);
		let rewritten = having.rewrite_having_clause(&agg_tlist).unwrap();
		assert_eq!(rewritten.to_string(), "(($0 > 5) AND ($1 = 1))");
	}

	#[test]
	fn test_having_rewrite_fails_on_ungrouped_column() {
		let agg_tlist = vec![TargetEntry::anonymous(sum(col(0, 1)))];
		let err = col(0, 2).rewrite_having_clause(&agg_tlist).unwrap_err();
		assert_eq!(err, RewriteError::HavingColumnNotGrouped);
	}
}
