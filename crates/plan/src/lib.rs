// Copyright (c) opaldb.org 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! The plan builder: converts one analyzed query into an executable plan
//! tree rooted at a [`RootPlan`].
//!
//! The pipeline runs once per query, synchronously: scan construction,
//! predicate classification and pushdown, join assembly, aggregation
//! planning, final projection, then the `RootPlan` wrapper carrying
//! statement-kind metadata. Every expression entering the tree is deep-copied
//! from the query; every subtree has exactly one owner.

pub mod error;
pub mod explain;
pub mod node;
pub mod optimizer;

pub use error::{ContractViolation, NotSupported, PlanError};
pub use node::{
	AggregateNode, AppendNode, JoinNode, MergeAppendNode, Plan, PlanBase, ResultNode, RootPlan, ScanNode,
	SortNode, ValuesScanNode,
};
pub use optimizer::{Optimizer, plan};

pub type Result<T> = std::result::Result<T, PlanError>;
