//! Path-find subscription requests and pushed updates

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::candidates::PathCandidate;
use crate::models::{Account, Asset};

/// Parameters of a path-find subscription
///
/// A candidate's send-max is informational and not part of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFindRequest {
	pub source: Account,
	pub destination: Account,
	pub amount: Asset,
}

impl PathFindRequest {
	pub fn to_rpc(&self, id: u64) -> Value {
		json!({
			"id": id,
			"command": "path_find",
			"subcommand": "create",
			"source_account": self.source.as_str(),
			"destination_account": self.destination.as_str(),
			"destination_amount": self.amount.to_rpc(),
		})
	}
}

impl From<&PathCandidate> for PathFindRequest {
	fn from(candidate: &PathCandidate) -> Self {
		Self {
			source: candidate.source.clone(),
			destination: candidate.destination.clone(),
			amount: candidate.deliver_amount.clone(),
		}
	}
}

/// One update pushed on a path-find subscription
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathFindUpdate {
	/// Alternative routes found by the server, absent when it reported none
	#[serde(default)]
	pub alternatives: Option<Vec<Value>>,
}

impl PathFindUpdate {
	pub fn with_alternatives(alternatives: Vec<Value>) -> Self {
		Self {
			alternatives: Some(alternatives),
		}
	}

	/// An update carrying no alternatives
	pub fn exhausted() -> Self {
		Self { alternatives: None }
	}

	/// Read the update out of a pushed message; a missing or non-array
	/// `alternatives` field counts as no alternatives
	pub fn from_message(message: &Value) -> Self {
		Self {
			alternatives: message
				.get("alternatives")
				.and_then(Value::as_array)
				.cloned(),
		}
	}

	pub fn has_alternatives(&self) -> bool {
		self.alternatives
			.as_ref()
			.is_some_and(|alternatives| !alternatives.is_empty())
	}
}
