// Copyright (c) opaldb.org 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Catalog identifier of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableId(pub u64);

impl Display for TableId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		Display::fmt(&self.0, f)
	}
}

/// Catalog identifier of a column within its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnId(pub u32);

impl Display for ColumnId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		Display::fmt(&self.0, f)
	}
}

/// A literal constant as produced by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
	Bool(bool),
	Int(i64),
	Text(String),
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Bool(v) => write!(f, "{}", v),
			Value::Int(v) => write!(f, "{}", v),
			Value::Text(v) => write!(f, "\"{}\"", v),
		}
	}
}

/// Kind of the analyzed statement a plan is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
	Select,
	Insert,
	Update,
	Delete,
}

impl Display for StatementKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			StatementKind::Select => f.write_str("SELECT"),
			StatementKind::Insert => f.write_str("INSERT"),
			StatementKind::Update => f.write_str("UPDATE"),
			StatementKind::Delete => f.write_str("DELETE"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
	Asc,
	Desc,
}

impl Display for SortDirection {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			SortDirection::Asc => f.write_str("asc"),
			SortDirection::Desc => f.write_str("desc"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_value_display() {
		assert_eq!(Value::Int(5).to_string(), "5");
		assert_eq!(Value::Bool(true).to_string(), "true");
		assert_eq!(Value::Text("abc".to_string()).to_string(), "\"abc\"");
	}

	#[test]
	fn test_statement_kind_display() {
		assert_eq!(StatementKind::Select.to_string(), "SELECT");
		assert_eq!(StatementKind::Insert.to_string(), "INSERT");
		assert_eq!(StatementKind::Update.to_string(), "UPDATE");
		assert_eq!(StatementKind::Delete.to_string(), "DELETE");
	}

	#[test]
	fn test_value_serde() {
		let value = Value::Text("abc".to_string());
		let encoded = serde_json::to_string(&value).unwrap();
		assert_eq!(serde_json::from_str::<Value>(&encoded).unwrap(), value);
	}
}
