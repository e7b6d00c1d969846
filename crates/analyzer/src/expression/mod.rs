// Copyright (c) opaldb.org 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

mod predicate;
mod rewrite;

use std::fmt::{self, Display, Formatter};

use opal_type::{ColumnId, TableId, Value};

pub use predicate::PredicateGroups;
pub use rewrite::RewriteError;

/// A typed, analyzed expression tree. `Clone` is a deep copy: every subtree
/// is exclusively owned and cloning shares nothing with the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	Literal(Value),

	Column(ColumnExpr),

	/// Reference to an output column of the plan node below, by position.
	/// Only produced by rewriting; never emitted by analysis.
	OutputRef(OutputRef),

	Comparison(ComparisonExpr),

	Logical(LogicalExpr),

	Not(Box<Expr>),

	Arithmetic(ArithmeticExpr),

	Aggregate(AggregateExpr),
}

/// Identity of a column reference: which range table entry it reads from and
/// which catalog column. Orders by `(rte_idx, table_id, column_id)`, the
/// deduplication order used when materializing scan outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ColumnRef {
	pub rte_idx: usize,
	pub table_id: TableId,
	pub column_id: ColumnId,
}

/// A column reference, optionally rewritten to point at the output column of
/// a child plan node. Equality compares only the column identity so that a
/// rewritten reference still matches the raw reference it came from.
#[derive(Debug, Clone, Copy, Eq)]
pub struct ColumnExpr {
	pub column: ColumnRef,
	pub output_position: Option<usize>,
}

impl PartialEq for ColumnExpr {
	fn eq(&self, other: &Self) -> bool {
		self.column == other.column
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRef {
	pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
	Eq,
	NotEq,
	Lt,
	LtEq,
	Gt,
	GtEq,
}

impl ComparisonOp {
	/// The operator that yields the same predicate with both sides swapped.
	pub fn mirror(self) -> Self {
		match self {
			ComparisonOp::Eq => ComparisonOp::Eq,
			ComparisonOp::NotEq => ComparisonOp::NotEq,
			ComparisonOp::Lt => ComparisonOp::Gt,
			ComparisonOp::LtEq => ComparisonOp::GtEq,
			ComparisonOp::Gt => ComparisonOp::Lt,
			ComparisonOp::GtEq => ComparisonOp::LtEq,
		}
	}
}

impl Display for ComparisonOp {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			ComparisonOp::Eq => f.write_str("="),
			ComparisonOp::NotEq => f.write_str("<>"),
			ComparisonOp::Lt => f.write_str("<"),
			ComparisonOp::LtEq => f.write_str("<="),
			ComparisonOp::Gt => f.write_str(">"),
			ComparisonOp::GtEq => f.write_str(">="),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonExpr {
	pub op: ComparisonOp,
	pub left: Box<Expr>,
	pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
	And,
	Or,
}

impl Display for LogicalOp {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			LogicalOp::And => f.write_str("AND"),
			LogicalOp::Or => f.write_str("OR"),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpr {
	pub op: LogicalOp,
	pub left: Box<Expr>,
	pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
	Add,
	Subtract,
	Multiply,
	Divide,
	Modulo,
}

impl Display for ArithmeticOp {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			ArithmeticOp::Add => f.write_str("+"),
			ArithmeticOp::Subtract => f.write_str("-"),
			ArithmeticOp::Multiply => f.write_str("*"),
			ArithmeticOp::Divide => f.write_str("/"),
			ArithmeticOp::Modulo => f.write_str("%"),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticExpr {
	pub op: ArithmeticOp,
	pub left: Box<Expr>,
	pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
	Count,
	Sum,
	Min,
	Max,
	Avg,
}

impl Display for AggregateKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			AggregateKind::Count => f.write_str("count"),
			AggregateKind::Sum => f.write_str("sum"),
			AggregateKind::Min => f.write_str("min"),
			AggregateKind::Max => f.write_str("max"),
			AggregateKind::Avg => f.write_str("avg"),
		}
	}
}

/// An aggregate call. `arg` is `None` only for `count(*)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpr {
	pub kind: AggregateKind,
	pub arg: Option<Box<Expr>>,
	pub distinct: bool,
}

impl Expr {
	pub fn column(rte_idx: usize, table_id: TableId, column_id: ColumnId) -> Self {
		Expr::Column(ColumnExpr {
			column: ColumnRef {
				rte_idx,
				table_id,
				column_id,
			},
			output_position: None,
		})
	}

	pub fn int(value: i64) -> Self {
		Expr::Literal(Value::Int(value))
	}

	pub fn comparison(op: ComparisonOp, left: Expr, right: Expr) -> Self {
		Expr::Comparison(ComparisonExpr {
			op,
			left: Box::new(left),
			right: Box::new(right),
		})
	}

	pub fn and(left: Expr, right: Expr) -> Self {
		Expr::Logical(LogicalExpr {
			op: LogicalOp::And,
			left: Box::new(left),
			right: Box::new(right),
		})
	}

	pub fn contains_aggregate(&self) -> bool {
		match self {
			Expr::Literal(_) | Expr::Column(_) | Expr::OutputRef(_) => false,
			Expr::Comparison(c) => c.left.contains_aggregate() || c.right.contains_aggregate(),
			Expr::Logical(l) => l.left.contains_aggregate() || l.right.contains_aggregate(),
			Expr::Not(e) => e.contains_aggregate(),
			Expr::Arithmetic(a) => a.left.contains_aggregate() || a.right.contains_aggregate(),
			Expr::Aggregate(_) => true,
		}
	}
}

impl Display for Expr {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Expr::Literal(value) => Display::fmt(value, f),
			Expr::Column(column) => match column.output_position {
				Some(position) => write!(f, "${}", position),
				None => write!(f, "#{}.{}", column.column.rte_idx, column.column.column_id),
			},
			Expr::OutputRef(output) => write!(f, "${}", output.position),
			Expr::Comparison(ComparisonExpr {
				op,
				left,
				right,
			}) => {
				write!(f, "({} {} {})", left, op, right)
			}
			Expr::Logical(LogicalExpr {
				op,
				left,
				right,
			}) => {
				write!(f, "({} {} {})", left, op, right)
			}
			Expr::Not(expr) => write!(f, "(NOT {})", expr),
			Expr::Arithmetic(ArithmeticExpr {
				op,
				left,
				right,
			}) => {
				write!(f, "({} {} {})", left, op, right)
			}
			Expr::Aggregate(AggregateExpr {
				kind,
				arg,
				distinct,
			}) => match arg {
				Some(arg) if *distinct => write!(f, "{}(distinct {})", kind, arg),
				Some(arg) => write!(f, "{}({})", kind, arg),
				None => write!(f, "{}(*)", kind),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn col(rte_idx: usize, column_id: u32) -> Expr {
		Expr::column(rte_idx, TableId(1), ColumnId(column_id))
	}

	#[test]
	fn test_display() {
		let pred = Expr::comparison(ComparisonOp::Gt, col(0, 1), Expr::int(5));
		assert_eq!(pred.to_string(), "(#0.1 > 5)");

		let agg = Expr::Aggregate(AggregateExpr {
			kind: AggregateKind::Count,
			arg: None,
			distinct: false,
		});
		assert_eq!(agg.to_string(), "count(*)");

		let sum = Expr::Aggregate(AggregateExpr {
			kind: AggregateKind::Sum,
			arg: Some(Box::new(col(0, 2))),
			distinct: true,
		});
		assert_eq!(sum.to_string(), "sum(distinct #0.2)");
	}

	#[test]
	fn test_column_equality_ignores_output_position() {
		let raw = col(0, 1);
		let rewritten = match raw.clone() {
			Expr::Column(mut column) => {
				column.output_position = Some(3);
				Expr::Column(column)
			}
			_ => unreachable!(),
		};
		assert_eq!(raw, rewritten);
		assert_eq!(rewritten.to_string(), "$3");
	}

	#[test]
	fn test_comparison_op_mirror() {
		assert_eq!(ComparisonOp::Lt.mirror(), ComparisonOp::Gt);
		assert_eq!(ComparisonOp::GtEq.mirror(), ComparisonOp::LtEq);
		assert_eq!(ComparisonOp::Eq.mirror(), ComparisonOp::Eq);
	}
}
