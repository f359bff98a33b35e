//! Ledger account identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// An account address on the ledger (e.g. `r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59`)
///
/// Treated as an opaque routing identity: two accounts are equal when their
/// addresses are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
	pub fn new(address: impl Into<String>) -> Self {
		Self(address.into())
	}

	/// Get the raw address string
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// An empty address never identifies a real account
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Display for Account {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for Account {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for Account {
	fn from(value: String) -> Self {
		Self(value)
	}
}
