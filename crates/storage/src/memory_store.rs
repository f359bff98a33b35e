//! In-memory candidate registry using DashMap

use crate::traits::{CandidateStore, RegistryError, RegistryResult, RegistryStats};
use async_trait::async_trait;
use churn_types::{CandidateKey, PathCandidate};
use dashmap::DashMap;
use rand::seq::IteratorRandom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// In-memory registry of path-finding candidates keyed by route
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryCandidateStore {
	candidates: Arc<DashMap<CandidateKey, PathCandidate>>,
	upserts: Arc<AtomicU64>,
	removals: Arc<AtomicU64>,
	draws: Arc<AtomicU64>,
}

impl MemoryCandidateStore {
	/// Create an empty registry
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a registry holding a single seed candidate
	pub fn with_seed(seed: PathCandidate) -> Self {
		let store = Self::new();
		info!("Seeding candidate registry with {}", seed);
		store.insert(seed);
		store
	}

	fn insert(&self, candidate: PathCandidate) -> bool {
		let key = candidate.key();
		self.upserts.fetch_add(1, Ordering::Relaxed);
		self.candidates.insert(key, candidate).is_some()
	}

	/// Get a candidate by key
	pub fn get(&self, key: &CandidateKey) -> Option<PathCandidate> {
		self.candidates.get(key).map(|entry| entry.clone())
	}

	/// Current route keys
	pub fn keys(&self) -> Vec<CandidateKey> {
		self.candidates
			.iter()
			.map(|entry| entry.key().clone())
			.collect()
	}
}

#[async_trait]
impl CandidateStore for MemoryCandidateStore {
	async fn upsert(&self, candidate: PathCandidate) -> RegistryResult<bool> {
		debug!("Upserting candidate {}", candidate);
		Ok(self.insert(candidate))
	}

	async fn draw_random(&self) -> RegistryResult<PathCandidate> {
		self.draws.fetch_add(1, Ordering::Relaxed);
		self.candidates
			.iter()
			.choose(&mut rand::rng())
			.map(|entry| entry.value().clone())
			.ok_or(RegistryError::Empty)
	}

	async fn remove(&self, key: &CandidateKey) -> RegistryResult<bool> {
		let removed = self.candidates.remove(key).is_some();
		if removed {
			self.removals.fetch_add(1, Ordering::Relaxed);
			debug!("Removed candidate route {}", key);
		}
		Ok(removed)
	}

	async fn contains(&self, key: &CandidateKey) -> RegistryResult<bool> {
		Ok(self.candidates.contains_key(key))
	}

	async fn len(&self) -> RegistryResult<usize> {
		Ok(self.candidates.len())
	}

	async fn is_empty(&self) -> RegistryResult<bool> {
		Ok(self.candidates.is_empty())
	}

	async fn snapshot(&self) -> RegistryResult<Vec<PathCandidate>> {
		Ok(self
			.candidates
			.iter()
			.map(|entry| entry.value().clone())
			.collect())
	}

	async fn stats(&self) -> RegistryResult<RegistryStats> {
		Ok(RegistryStats {
			entries: self.candidates.len(),
			upserts: self.upserts.load(Ordering::Relaxed),
			removals: self.removals.load(Ordering::Relaxed),
			draws: self.draws.load(Ordering::Relaxed),
		})
	}
}
