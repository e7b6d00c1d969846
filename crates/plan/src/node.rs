// Copyright (c) opaldb.org 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! The plan node hierarchy: a closed tagged union forming a tree with
//! strict single ownership. No expression or subtree is ever shared between
//! two nodes; cross-node reuse always goes through a deep copy.

use opal_analyzer::{Expr, OrderByItem, RangeTableEntry, TargetEntry};
use opal_type::{ColumnId, StatementKind, TableId};

/// State common to every plan node: its output target list, implicitly
/// ANDed qualifying predicates, and an informational cost estimate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanBase {
	pub target_list: Vec<TargetEntry>,
	pub quals: Vec<Expr>,
	pub cost: f64,
}

impl PlanBase {
	pub fn with_target_list(target_list: Vec<TargetEntry>) -> Self {
		Self {
			target_list,
			quals: Vec::new(),
			cost: 0.0,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
	Result(ResultNode),
	Scan(ScanNode),
	ValuesScan(ValuesScanNode),
	Join(JoinNode),
	Aggregate(AggregateNode),
	Append(AppendNode),
	MergeAppend(MergeAppendNode),
	Sort(SortNode),
}

/// Child plan plus predicates with no table dependency, evaluated once.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultNode {
	pub base: PlanBase,
	pub input: Box<Plan>,
	pub const_quals: Vec<Expr>,
}

/// Leaf node reading one table. `simple_quals` holds normalized
/// single-column comparisons kept apart from generic quals so storage can
/// evaluate them directly.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanNode {
	pub base: PlanBase,
	pub table_id: TableId,
	pub col_list: Vec<ColumnId>,
	pub simple_quals: Vec<Expr>,
}

impl ScanNode {
	/// Build a scan for one range table entry: table id copied, column list
	/// populated with every column id in descriptor order. No predicates.
	pub fn from_range_table_entry(rte: &RangeTableEntry) -> Self {
		Self {
			base: PlanBase::default(),
			table_id: rte.table_id,
			col_list: rte.columns.iter().map(|cd| cd.id).collect(),
			simple_quals: Vec::new(),
		}
	}

	pub fn add_predicate(&mut self, pred: Expr) {
		self.base.quals.push(pred);
	}

	pub fn add_simple_predicate(&mut self, pred: Expr) {
		self.simple_quals.push(pred);
	}

	pub fn add_target_entry(&mut self, tle: TargetEntry) {
		self.base.target_list.push(tle);
	}
}

/// Leaf node producing a single row of literal or derived values, used when
/// the query has no FROM-clause contribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesScanNode {
	pub base: PlanBase,
}

/// Two-child join; `outer` is the driving side. The current pipeline never
/// builds one: multi-table planning fails with `NotSupported` first.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinNode {
	pub base: PlanBase,
	pub outer: Box<Plan>,
	pub inner: Box<Plan>,
}

/// Aggregation over a child plan. The base quals hold HAVING conjuncts
/// rewritten against the aggregated output.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateNode {
	pub base: PlanBase,
	pub input: Box<Plan>,
	pub group_by: Vec<Expr>,
}

/// Concatenation of sub-plans. Reserved for UNION and partition support.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendNode {
	pub base: PlanBase,
	pub plans: Vec<Plan>,
}

/// Sorted-merge concatenation of sub-plans. Reserved.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeAppendNode {
	pub base: PlanBase,
	pub plans: Vec<Plan>,
}

/// Sorted output of a child plan. Reserved; ORDER BY planning fails with
/// `NotSupported` today.
#[derive(Debug, Clone, PartialEq)]
pub struct SortNode {
	pub base: PlanBase,
	pub input: Box<Plan>,
	pub order_by: Vec<OrderByItem>,
}

impl Plan {
	pub fn base(&self) -> &PlanBase {
		match self {
			Plan::Result(n) => &n.base,
			Plan::Scan(n) => &n.base,
			Plan::ValuesScan(n) => &n.base,
			Plan::Join(n) => &n.base,
			Plan::Aggregate(n) => &n.base,
			Plan::Append(n) => &n.base,
			Plan::MergeAppend(n) => &n.base,
			Plan::Sort(n) => &n.base,
		}
	}

	pub fn base_mut(&mut self) -> &mut PlanBase {
		match self {
			Plan::Result(n) => &mut n.base,
			Plan::Scan(n) => &mut n.base,
			Plan::ValuesScan(n) => &mut n.base,
			Plan::Join(n) => &mut n.base,
			Plan::Aggregate(n) => &mut n.base,
			Plan::Append(n) => &mut n.base,
			Plan::MergeAppend(n) => &mut n.base,
			Plan::Sort(n) => &mut n.base,
		}
	}

	pub fn target_list(&self) -> &[TargetEntry] {
		&self.base().target_list
	}

	pub fn quals(&self) -> &[Expr] {
		&self.base().quals
	}

	/// Replace the node's output target list. The previous entries are
	/// dropped here; nothing else holds them.
	pub fn set_target_list(&mut self, target_list: Vec<TargetEntry>) {
		self.base_mut().target_list = target_list;
	}
}

/// The wrapper handed to execution: the fully owned plan tree plus the
/// statement kind and, for INSERT, the destination table and column ids.
#[derive(Debug, Clone, PartialEq)]
pub struct RootPlan {
	pub plan: Plan,
	pub stmt: StatementKind,
	pub result_table: Option<TableId>,
	pub result_columns: Vec<ColumnId>,
}

#[cfg(test)]
mod tests {
	use opal_analyzer::ColumnDef;

	use super::*;

	#[test]
	fn test_scan_from_range_table_entry() {
		let rte = RangeTableEntry {
			table_id: TableId(7),
			name: "t".to_string(),
			columns: vec![
				ColumnDef {
					id: ColumnId(1),
					name: "a".to_string(),
				},
				ColumnDef {
					id: ColumnId(2),
					name: "b".to_string(),
				},
			],
		};
		let scan = ScanNode::from_range_table_entry(&rte);
		assert_eq!(scan.table_id, TableId(7));
		assert_eq!(scan.col_list, vec![ColumnId(1), ColumnId(2)]);
		assert!(scan.base.target_list.is_empty());
		assert!(scan.base.quals.is_empty());
		assert!(scan.simple_quals.is_empty());
	}

	#[test]
	fn test_set_target_list_replaces_entries() {
		let mut plan = Plan::ValuesScan(ValuesScanNode {
			base: PlanBase::with_target_list(vec![TargetEntry::anonymous(Expr::int(1))]),
		});
		plan.set_target_list(vec![TargetEntry::anonymous(Expr::int(2)), TargetEntry::anonymous(Expr::int(3))]);
		assert_eq!(plan.target_list().len(), 2);
		assert_eq!(plan.target_list()[0].to_string(), "2");
	}
}
