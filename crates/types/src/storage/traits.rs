//! Registry trait for pluggable candidate storage

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RegistryResult;
use crate::candidates::{CandidateKey, PathCandidate};

/// Counters describing registry usage since creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
	pub entries: usize,
	pub upserts: u64,
	pub removals: u64,
	pub draws: u64,
}

/// Mapping from a route's canonical key to the latest candidate on it
///
/// Every method is a single atomic operation; callers compose them without
/// holding any lock in between.
#[async_trait]
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait CandidateStoreTrait: Send + Sync {
	/// Insert or overwrite the candidate stored under its key.
	/// Returns true when an earlier candidate was replaced.
	async fn upsert(&self, candidate: PathCandidate) -> RegistryResult<bool>;

	/// Uniformly sample one stored candidate
	async fn draw_random(&self) -> RegistryResult<PathCandidate>;

	/// Remove a route; removing an absent key is a no-op returning false
	async fn remove(&self, key: &CandidateKey) -> RegistryResult<bool>;

	/// Whether the route is currently offered for draws
	async fn contains(&self, key: &CandidateKey) -> RegistryResult<bool>;

	/// Number of stored routes
	async fn len(&self) -> RegistryResult<usize>;

	async fn is_empty(&self) -> RegistryResult<bool>;

	/// Copy of every stored candidate, in no particular order
	async fn snapshot(&self) -> RegistryResult<Vec<PathCandidate>>;

	/// Usage counters
	async fn stats(&self) -> RegistryResult<RegistryStats>;
}
