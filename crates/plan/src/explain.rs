// Copyright (c) opaldb.org 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Textual plan dump for developer inspection and regression fixtures: a
//! parenthesized, newline-delimited tree mirroring the plan shape exactly.
//! Not a stable wire format.

use std::fmt::{Display, Write};

use crate::node::{Plan, PlanBase, RootPlan};

pub fn explain_plan(root: &RootPlan) -> String {
	let mut output = String::new();
	match root.result_table {
		Some(table) => writeln!(
			output,
			"(RootPlan {} table: {} columns: [{}]",
			root.stmt,
			table,
			join_display(&root.result_columns)
		)
		.unwrap(),
		None => writeln!(output, "(RootPlan {}", root.stmt).unwrap(),
	}
	render_plan(&root.plan, 1, &mut output);
	output.push_str(")\n");
	output
}

fn join_display<T: Display>(items: &[T]) -> String {
	items.iter().map(|item| item.to_string()).collect::<Vec<_>>().join(", ")
}

fn write_base(base: &PlanBase, pad: &str, output: &mut String) {
	writeln!(output, "{}  targetlist: [{}]", pad, join_display(&base.target_list)).unwrap();
	writeln!(output, "{}  quals: [{}]", pad, join_display(&base.quals)).unwrap();
}

fn render_plan(plan: &Plan, depth: usize, output: &mut String) {
	let pad = "  ".repeat(depth);
	match plan {
		Plan::Result(node) => {
			writeln!(output, "{}(Result", pad).unwrap();
			write_base(&node.base, &pad, output);
			writeln!(output, "{}  const_quals: [{}]", pad, join_display(&node.const_quals)).unwrap();
			render_plan(&node.input, depth + 1, output);
			writeln!(output, "{})", pad).unwrap();
		}
		Plan::Scan(node) => {
			writeln!(output, "{}(Scan", pad).unwrap();
			write_base(&node.base, &pad, output);
			writeln!(output, "{}  simple_quals: [{}]", pad, join_display(&node.simple_quals)).unwrap();
			writeln!(output, "{}  table: {} columns: [{}]", pad, node.table_id, join_display(&node.col_list))
				.unwrap();
			writeln!(output, "{})", pad).unwrap();
		}
		Plan::ValuesScan(node) => {
			writeln!(output, "{}(ValuesScan", pad).unwrap();
			write_base(&node.base, &pad, output);
			writeln!(output, "{})", pad).unwrap();
		}
		Plan::Join(node) => {
			writeln!(output, "{}(Join", pad).unwrap();
			write_base(&node.base, &pad, output);
			render_plan(&node.outer, depth + 1, output);
			render_plan(&node.inner, depth + 1, output);
			writeln!(output, "{})", pad).unwrap();
		}
		Plan::Aggregate(node) => {
			writeln!(output, "{}(Agg", pad).unwrap();
			write_base(&node.base, &pad, output);
			writeln!(output, "{}  groupby: [{}]", pad, join_display(&node.group_by)).unwrap();
			render_plan(&node.input, depth + 1, output);
			writeln!(output, "{})", pad).unwrap();
		}
		Plan::Append(node) => {
			writeln!(output, "{}(Append", pad).unwrap();
			write_base(&node.base, &pad, output);
			for sub in &node.plans {
				render_plan(sub, depth + 1, output);
			}
			writeln!(output, "{})", pad).unwrap();
		}
		Plan::MergeAppend(node) => {
			writeln!(output, "{}(MergeAppend", pad).unwrap();
			write_base(&node.base, &pad, output);
			for sub in &node.plans {
				render_plan(sub, depth + 1, output);
			}
			writeln!(output, "{})", pad).unwrap();
		}
		Plan::Sort(node) => {
			writeln!(output, "{}(Sort", pad).unwrap();
			write_base(&node.base, &pad, output);
			writeln!(output, "{}  orderby: [{}]", pad, join_display(&node.order_by)).unwrap();
			render_plan(&node.input, depth + 1, output);
			writeln!(output, "{})", pad).unwrap();
		}
	}
}
