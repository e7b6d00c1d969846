// Copyright (c) opaldb.org 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Analyzed statement representation consumed by the plan builder.
//!
//! The planner never inspects SQL text; it reads a [`Query`] (range table,
//! target list, predicates, grouping) and calls the expression operations
//! defined here: predicate decomposition, simple-predicate normalization,
//! column collection, and target-list rewriting.

pub mod expression;
pub mod query;

pub use expression::{
	AggregateExpr, AggregateKind, ArithmeticExpr, ArithmeticOp, ColumnExpr, ColumnRef, ComparisonExpr,
	ComparisonOp, Expr, LogicalExpr, LogicalOp, OutputRef, PredicateGroups, RewriteError,
};
pub use query::{ColumnDef, OrderByItem, Query, RangeTableEntry, TargetEntry};
