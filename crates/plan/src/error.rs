// Copyright (c) opaldb.org 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use opal_analyzer::RewriteError;
use opal_type::StatementKind;

/// A planning failure for features the builder does not implement yet.
/// Recoverable: the caller reports the query as unplannable and moves on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NotSupported {
	#[error("UNION queries are not supported yet")]
	Union,

	#[error("joins are not supported yet ({scan_count} scans)")]
	Join {
		scan_count: usize,
	},

	#[error("ORDER BY is not supported yet")]
	OrderBy,
}

/// A broken upstream invariant reached plan construction. Continuing would
/// silently build a wrong plan, so the pipeline stops here; partially built
/// subtrees are released by normal drops on the error path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractViolation {
	#[error("{stmt} statements must be rejected before planning")]
	UnplannableStatement {
		stmt: StatementKind,
	},

	#[error("HAVING clause contains a conjunct that does not reference exactly one group")]
	CrossGroupHaving,

	#[error("scan predicate references {count} range table entries, expected exactly one")]
	AmbiguousPredicateAttribution {
		count: usize,
	},

	#[error("no scan exists for range table entry {rte_idx}")]
	MissingScan {
		rte_idx: usize,
	},

	#[error("INSERT statement with an empty range table")]
	MissingInsertTarget,

	#[error("aggregate query without any input plan")]
	AggregateWithoutInput,

	#[error(transparent)]
	Rewrite(#[from] RewriteError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
	#[error(transparent)]
	NotSupported(#[from] NotSupported),

	#[error(transparent)]
	ContractViolation(#[from] ContractViolation),
}

impl PlanError {
	pub fn is_not_supported(&self) -> bool {
		matches!(self, PlanError::NotSupported(_))
	}

	pub fn is_contract_violation(&self) -> bool {
		matches!(self, PlanError::ContractViolation(_))
	}
}

impl From<RewriteError> for PlanError {
	fn from(err: RewriteError) -> Self {
		PlanError::ContractViolation(ContractViolation::Rewrite(err))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_not_supported_display() {
		assert_eq!(PlanError::from(NotSupported::Union).to_string(), "UNION queries are not supported yet");
		assert_eq!(
			PlanError::from(NotSupported::Join {
				scan_count: 2
			})
			.to_string(),
			"joins are not supported yet (2 scans)"
		);
		assert_eq!(PlanError::from(NotSupported::OrderBy).to_string(), "ORDER BY is not supported yet");
	}

	#[test]
	fn test_contract_violation_display() {
		assert_eq!(
			PlanError::from(ContractViolation::UnplannableStatement {
				stmt: StatementKind::Update
			})
			.to_string(),
			"UPDATE statements must be rejected before planning"
		);
	}

	#[test]
	fn test_error_classes_are_distinct() {
		let not_supported = PlanError::from(NotSupported::OrderBy);
		assert!(not_supported.is_not_supported());
		assert!(!not_supported.is_contract_violation());

		let violation = PlanError::from(ContractViolation::CrossGroupHaving);
		assert!(violation.is_contract_violation());
		assert!(!violation.is_not_supported());
	}
}
