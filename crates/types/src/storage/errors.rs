//! Error types for candidate registry operations

use thiserror::Error;

/// Registry error type
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
	#[error("Candidate registry is empty")]
	Empty,
	#[error("Registry operation failed: {message}")]
	Operation { message: String },
}
