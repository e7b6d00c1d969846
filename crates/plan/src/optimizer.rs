// Copyright (c) opaldb.org 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! The single-pass plan builder pipeline.

use std::{collections::BTreeSet, mem};

use opal_analyzer::{ColumnExpr, ColumnRef, Expr, OutputRef, PredicateGroups, Query, TargetEntry};
use opal_type::StatementKind;
use tracing::instrument;

use crate::{
	error::{ContractViolation, NotSupported},
	node::{AggregateNode, Plan, PlanBase, ResultNode, RootPlan, ScanNode, ValuesScanNode},
};

/// Plan one analyzed query. Reads the query immutably, deep-copies every
/// expression that enters the plan, and returns the fully owned tree.
#[instrument(level = "trace", skip(query))]
pub fn plan(query: &Query) -> crate::Result<RootPlan> {
	Optimizer::new(query).optimize()
}

/// Per-query builder state. One instance plans exactly one query to
/// completion; there is no shared or global planner state.
pub struct Optimizer<'a> {
	query: &'a Query,
	/// Scans indexed by range table position minus `scan_offset`.
	base_scans: Vec<ScanNode>,
	/// Range table slots occupied by a non-scan entry (the INSERT target).
	scan_offset: usize,
	/// Constant WHERE conjuncts pending attachment to a Result node.
	const_quals: Vec<Expr>,
	cur_plan: Option<Plan>,
}

impl<'a> Optimizer<'a> {
	pub fn new(query: &'a Query) -> Self {
		let scan_offset = match query.stmt {
			StatementKind::Insert => 1,
			_ => 0,
		};
		Self {
			query,
			base_scans: Vec::new(),
			scan_offset,
			const_quals: Vec::new(),
			cur_plan: None,
		}
	}

	/// Run the pipeline and wrap the result in a [`RootPlan`]. Consumes the
	/// builder: a second pass over the same state is never meaningful.
	pub fn optimize(mut self) -> crate::Result<RootPlan> {
		let query = self.query;
		let (result_table, result_columns) = match query.stmt {
			StatementKind::Select => (None, Vec::new()),
			StatementKind::Insert => {
				// the first range table entry is the destination table
				let rte = query.range_table.first().ok_or(ContractViolation::MissingInsertTarget)?;
				(Some(rte.table_id), rte.columns.iter().map(|cd| cd.id).collect())
			}
			stmt @ (StatementKind::Update | StatementKind::Delete) => {
				// the analyzer rejects these before planning
				return Err(ContractViolation::UnplannableStatement {
					stmt,
				}
				.into());
			}
		};
		let plan = self.optimize_query()?;
		Ok(RootPlan {
			plan,
			stmt: query.stmt,
			result_table,
			result_columns,
		})
	}

	fn optimize_query(&mut self) -> crate::Result<Plan> {
		if self.query.next_query.is_some() {
			return Err(NotSupported::Union.into());
		}
		self.optimize_scans()?;
		self.optimize_joins()?;
		self.fold_constant_quals();
		self.optimize_aggregates()?;
		let plan = self.process_target_list()?;
		self.optimize_order_by()?;
		Ok(plan)
	}

	/// Build one scan per range table entry, classify the WHERE predicate
	/// onto the scans, and materialize every column any later stage
	/// references in the owning scan's target list.
	fn optimize_scans(&mut self) -> crate::Result<()> {
		let query = self.query;
		for rte in query.range_table.iter().skip(self.scan_offset) {
			self.base_scans.push(ScanNode::from_range_table_entry(rte));
		}

		let mut groups = PredicateGroups::default();
		if let Some(where_clause) = &query.where_clause {
			where_clause.group_predicates(&mut groups);
		}

		for pred in &groups.scan_predicates {
			match pred.normalize_simple_predicate() {
				Some((simple, rte_idx)) => {
					self.scan_for_rte(rte_idx)?.add_simple_predicate(simple);
				}
				None => {
					let mut rte_set = BTreeSet::new();
					pred.collect_rte_indexes(&mut rte_set);
					let rte_idx = match rte_set.first() {
						Some(&idx) if rte_set.len() == 1 => idx,
						_ => {
							return Err(ContractViolation::AmbiguousPredicateAttribution {
								count: rte_set.len(),
							}
							.into());
						}
					};
					self.scan_for_rte(rte_idx)?.add_predicate((*pred).clone());
				}
			}
		}

		// Columns referenced by the target list, join predicates, GROUP BY
		// or HAVING must come out of some scan. Deduplicated by
		// (rte_idx, table, column); one anonymous entry per distinct column.
		let mut columns: BTreeSet<ColumnRef> = BTreeSet::new();
		for tle in &query.target_list {
			tle.expr.collect_column_refs(&mut columns);
		}
		for pred in &groups.join_predicates {
			pred.collect_column_refs(&mut columns);
		}
		for expr in &query.group_by {
			expr.collect_column_refs(&mut columns);
		}
		if let Some(having) = &query.having {
			having.collect_column_refs(&mut columns);
		}
		for column in columns {
			let tle = TargetEntry::anonymous(Expr::Column(ColumnExpr {
				column,
				output_position: None,
			}));
			self.scan_for_rte(column.rte_idx)?.add_target_entry(tle);
		}

		self.const_quals = groups.constant_predicates.iter().map(|p| (*p).clone()).collect();
		Ok(())
	}

	fn scan_for_rte(&mut self, rte_idx: usize) -> crate::Result<&mut ScanNode> {
		rte_idx.checked_sub(self.scan_offset).and_then(|idx| self.base_scans.get_mut(idx)).ok_or_else(|| {
			ContractViolation::MissingScan {
				rte_idx,
			}
			.into()
		})
	}

	/// Fold the base scans into one current plan. Join ordering and access
	/// method selection would live here; today only the degenerate zero-
	/// and one-scan cases are handled.
	fn optimize_joins(&mut self) -> crate::Result<()> {
		let scan_count = self.base_scans.len();
		match scan_count {
			0 => self.cur_plan = None,
			1 => self.cur_plan = self.base_scans.pop().map(Plan::Scan),
			_ => {
				return Err(NotSupported::Join {
					scan_count,
				}
				.into());
			}
		}
		Ok(())
	}

	/// Attach constant WHERE conjuncts to a Result node wrapping the
	/// current plan. Sits below aggregation: a false constant filter feeds
	/// zero rows into the aggregate rather than discarding its output row.
	/// Without a plan the wrapper is built around the ValuesScan later.
	fn fold_constant_quals(&mut self) {
		if self.const_quals.is_empty() {
			return;
		}
		if let Some(child) = self.cur_plan.take() {
			let target_list = child.target_list().to_vec();
			self.cur_plan = Some(Plan::Result(ResultNode {
				base: PlanBase::with_target_list(target_list),
				input: Box::new(child),
				const_quals: mem::take(&mut self.const_quals),
			}));
		}
	}

	/// Wrap the current plan in an aggregation node when the query
	/// aggregates or filters groups; otherwise leave it untouched.
	fn optimize_aggregates(&mut self) -> crate::Result<()> {
		let query = self.query;
		if !query.has_aggregates() && query.having.is_none() {
			return Ok(());
		}
		let child = match self.cur_plan.take() {
			Some(plan) => plan,
			None => return Err(ContractViolation::AggregateWithoutInput.into()),
		};

		let mut agg_tlist = Vec::with_capacity(query.target_list.len());
		for tle in &query.target_list {
			agg_tlist.push(TargetEntry {
				name: tle.name.clone(),
				expr: tle.expr.rewrite_with_child_target_list(child.target_list())?,
			});
		}

		let mut group_by = Vec::with_capacity(query.group_by.len());
		for expr in &query.group_by {
			group_by.push(expr.rewrite_with_child_target_list(child.target_list())?);
		}

		let mut having_quals = Vec::new();
		if let Some(having) = &query.having {
			let mut groups = PredicateGroups::default();
			having.group_predicates(&mut groups);
			// after decomposition HAVING may only hold single-group conjuncts
			if !groups.join_predicates.is_empty() || !groups.constant_predicates.is_empty() {
				return Err(ContractViolation::CrossGroupHaving.into());
			}
			for pred in &groups.scan_predicates {
				having_quals.push(pred.rewrite_having_clause(&agg_tlist)?);
			}
		}

		self.cur_plan = Some(Plan::Aggregate(AggregateNode {
			base: PlanBase {
				target_list: agg_tlist,
				quals: having_quals,
				cost: 0.0,
			},
			input: Box::new(child),
			group_by,
		}));
		Ok(())
	}

	/// Fix the final output schema: rewrite the statement's target list
	/// against the current plan and install it there, or materialize a
	/// ValuesScan for a constant-only query.
	fn process_target_list(&mut self) -> crate::Result<Plan> {
		let query = self.query;
		match self.cur_plan.take() {
			None => {
				let copied =
					query.target_list.iter().map(|tle| TargetEntry {
						name: tle.name.clone(),
						expr: tle.expr.clone(),
					})
					.collect();
				let values = Plan::ValuesScan(ValuesScanNode {
					base: PlanBase::with_target_list(copied),
				});
				if self.const_quals.is_empty() {
					return Ok(values);
				}
				// pending constant quals: project the values row through
				// a Result node carrying them
				let target_list = query
					.target_list
					.iter()
					.enumerate()
					.map(|(position, tle)| TargetEntry {
						name: tle.name.clone(),
						expr: Expr::OutputRef(OutputRef {
							position,
						}),
					})
					.collect();
				Ok(Plan::Result(ResultNode {
					base: PlanBase::with_target_list(target_list),
					input: Box::new(values),
					const_quals: mem::take(&mut self.const_quals),
				}))
			}
			Some(mut plan) => {
				let mut final_tlist = Vec::with_capacity(query.target_list.len());
				for tle in &query.target_list {
					final_tlist.push(TargetEntry {
						name: tle.name.clone(),
						expr: tle.expr.rewrite_with_target_list(plan.target_list())?,
					});
				}
				plan.set_target_list(final_tlist);
				Ok(plan)
			}
		}
	}

	/// Sort node insertion slot. Nothing is planned today.
	fn optimize_order_by(&self) -> crate::Result<()> {
		if self.query.order_by.is_empty() {
			Ok(())
		} else {
			Err(NotSupported::OrderBy.into())
		}
	}
}
