//! Registry traits for pluggable candidate storage

// Re-export the registry traits from types crate
pub use churn_types::storage::{
	CandidateStoreTrait as CandidateStore, RegistryError, RegistryResult, RegistryStats,
};
