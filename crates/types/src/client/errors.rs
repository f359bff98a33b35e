//! Error types for ledger client operations

use thiserror::Error;

/// Errors raised by a [`LedgerClient`](super::LedgerClient)
#[derive(Error, Debug)]
pub enum ClientError {
	#[error("Connection error: {0}")]
	Connection(String),

	#[error("Timeout occurred after {timeout_ms}ms")]
	Timeout { timeout_ms: u64 },

	#[error("Server rejected '{command}': {reason}")]
	Rejected { command: String, reason: String },

	#[error("Protocol error: {0}")]
	Protocol(String),

	#[error("Connection closed before '{command}' was confirmed")]
	Closed { command: String },

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_client_error_messages() {
		let error = ClientError::Rejected {
			command: "path_find".to_string(),
			reason: "actMalformed".to_string(),
		};
		assert!(error.to_string().contains("path_find"));
		assert!(error.to_string().contains("actMalformed"));

		let error = ClientError::Timeout { timeout_ms: 500 };
		assert_eq!(error.to_string(), "Timeout occurred after 500ms");
	}
}
