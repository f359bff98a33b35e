//! Worker pool supervisor
//!
//! Keeps a fixed-size pool of path-find workers and churns it: every cycle a
//! random batch is terminated and replaced, workers that exited on their own
//! get their route evicted from the registry and are replaced as well, and
//! the pool is finally topped up to its target size.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use churn_config::{ConfigValidationError, ExhaustionPolicy, Settings};
use churn_types::{CandidateStoreTrait, LedgerClient, PathCandidate, RegistryError};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::worker::{PathfindWorker, WorkerHandle};

/// Errors that stop the supervisor
#[derive(Debug, Error, PartialEq)]
pub enum SupervisorError {
	#[error("Candidate registry is exhausted")]
	Exhausted,

	#[error("Registry error: {0}")]
	Registry(RegistryError),
}

impl From<RegistryError> for SupervisorError {
	fn from(e: RegistryError) -> Self {
		match e {
			RegistryError::Empty => SupervisorError::Exhausted,
			other => SupervisorError::Registry(other),
		}
	}
}

pub type SupervisorResult<T> = Result<T, SupervisorError>;

/// Pool parameters
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
	pub pool_size: usize,
	/// Exclusive upper bound of the per-cycle churn batch
	pub max_churn: usize,
	pub churn_interval: Duration,
	pub idle_wake: Duration,
	pub exhaustion_policy: ExhaustionPolicy,
	/// Candidate put back by the `reseed` policy
	pub seed: PathCandidate,
}

impl SupervisorConfig {
	pub fn from_settings(settings: &Settings) -> Result<Self, ConfigValidationError> {
		Ok(Self {
			pool_size: settings.pool.size,
			max_churn: settings.pool.max_churn,
			churn_interval: settings.pool.churn_interval(),
			idle_wake: settings.worker.idle_wake(),
			exhaustion_policy: settings.pool.exhaustion_policy,
			seed: settings.seed.to_candidate()?,
		})
	}
}

/// What one churn cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
	/// Workers terminated by the supervisor
	pub churned: usize,
	/// Workers found stopped on their own
	pub exited: usize,
	/// Routes removed from the registry for those workers
	pub evicted: usize,
	/// Workers started
	pub launched: usize,
	/// Slots left empty for lack of candidates
	pub skipped: usize,
	/// Pool size at the end of the cycle
	pub live: usize,
}

/// Owns every worker handle; the only component that starts or stops workers
pub struct PoolSupervisor {
	config: SupervisorConfig,
	store: Arc<dyn CandidateStoreTrait>,
	client: Arc<dyn LedgerClient>,
	workers: Vec<WorkerHandle>,
	next_worker_id: u64,
}

impl PoolSupervisor {
	pub fn new(
		config: SupervisorConfig,
		store: Arc<dyn CandidateStoreTrait>,
		client: Arc<dyn LedgerClient>,
	) -> Self {
		let capacity = config.pool_size + config.max_churn;
		Self {
			config,
			store,
			client,
			workers: Vec::with_capacity(capacity),
			next_worker_id: 0,
		}
	}

	pub fn config(&self) -> &SupervisorConfig {
		&self.config
	}

	/// Number of worker handles held
	pub fn live(&self) -> usize {
		self.workers.len()
	}

	pub fn workers(&self) -> &[WorkerHandle] {
		&self.workers
	}

	/// Launch the initial pool, drawing candidates with replacement
	pub async fn start(&mut self) -> SupervisorResult<usize> {
		let launched = self.fill(self.config.pool_size).await?;
		info!(
			"Started {} of {} path-find workers",
			launched, self.config.pool_size
		);
		Ok(launched)
	}

	/// One churn cycle with a batch size drawn from `[0, max_churn)`
	pub async fn run_cycle(&mut self) -> SupervisorResult<CycleReport> {
		let k = random_batch_size(self.config.max_churn);
		self.churn_cycle(k).await
	}

	/// Terminate and replace `k` random workers, then replace exited ones
	///
	/// `k` is clamped to the number of live workers.
	pub async fn churn_cycle(&mut self, k: usize) -> SupervisorResult<CycleReport> {
		let mut report = CycleReport::default();

		// The whole batch is gone before any replacement starts
		let k = k.min(self.workers.len());
		for index in pick_victims(self.workers.len(), k) {
			let worker = self.workers.swap_remove(index);
			debug!("Terminating worker {}", worker.id());
			worker.terminate();
		}
		report.churned = k;
		report.launched += self.fill(k).await?;

		let (exited, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.workers)
			.into_iter()
			.partition(WorkerHandle::is_finished);
		self.workers = running;
		report.exited = exited.len();
		for worker in exited {
			let key = worker.candidate().key();
			debug!(
				"Worker {} exited ({}), evicting route {}",
				worker.id(),
				worker
					.exit_reason()
					.map_or_else(|| "aborted".to_string(), |reason| reason.to_string()),
				key
			);
			if self.store.remove(&key).await? {
				report.evicted += 1;
			}
		}
		report.launched += self.fill(report.exited).await?;

		let missing = self.config.pool_size.saturating_sub(self.workers.len());
		report.launched += self.fill(missing).await?;

		report.live = self.workers.len();
		report.skipped = self.config.pool_size.saturating_sub(report.live);
		Ok(report)
	}

	/// Churn every `churn_interval` until `shutdown` resolves
	///
	/// Workers are terminated on return, including on error.
	pub async fn run_until<F>(&mut self, shutdown: F) -> SupervisorResult<()>
	where
		F: Future<Output = ()>,
	{
		tokio::pin!(shutdown);
		let result = loop {
			tokio::select! {
				_ = &mut shutdown => break Ok(()),
				_ = tokio::time::sleep(self.config.churn_interval) => {
					match self.run_cycle().await {
						Ok(report) => info!(
							churned = report.churned,
							exited = report.exited,
							evicted = report.evicted,
							launched = report.launched,
							live = report.live,
							"Churn cycle complete"
						),
						Err(e) => break Err(e),
					}
				}
			}
		};
		self.shutdown();
		result
	}

	/// Terminate every worker; returns how many were running
	pub fn shutdown(&mut self) -> usize {
		let count = self.workers.len();
		for worker in self.workers.drain(..) {
			worker.terminate();
		}
		if count > 0 {
			info!("Terminated {} path-find workers", count);
		}
		count
	}

	/// Launch up to `count` workers; stops at the first slot left empty
	async fn fill(&mut self, count: usize) -> SupervisorResult<usize> {
		for launched in 0..count {
			match self.draw_candidate().await? {
				Some(candidate) => self.launch(candidate),
				None => return Ok(launched),
			}
		}
		Ok(count)
	}

	/// Draw a candidate, applying the exhaustion policy on an empty registry
	async fn draw_candidate(&self) -> SupervisorResult<Option<PathCandidate>> {
		match self.store.draw_random().await {
			Ok(candidate) => return Ok(Some(candidate)),
			Err(RegistryError::Empty) => {},
			Err(e) => return Err(SupervisorError::Registry(e)),
		}

		match self.config.exhaustion_policy {
			ExhaustionPolicy::Skip => {
				warn!("Candidate registry is empty, leaving worker slot unfilled");
				Ok(None)
			},
			ExhaustionPolicy::Reseed => {
				warn!("Candidate registry is empty, reseeding {}", self.config.seed);
				self.store.upsert(self.config.seed.clone()).await?;
				Ok(Some(self.store.draw_random().await?))
			},
			ExhaustionPolicy::Halt => Err(SupervisorError::Exhausted),
		}
	}

	fn launch(&mut self, candidate: PathCandidate) {
		let id = self.next_worker_id;
		self.next_worker_id += 1;
		debug!("Launching worker {} for {}", id, candidate);
		self.workers.push(PathfindWorker::spawn(
			id,
			candidate,
			Arc::clone(&self.client),
			self.config.idle_wake,
		));
	}
}

/// Batch size for one cycle
fn random_batch_size(max_churn: usize) -> usize {
	if max_churn == 0 {
		return 0;
	}
	rand::rng().random_range(0..max_churn)
}

/// `k` distinct indices below `len`, highest first so they can be
/// `swap_remove`d in order
fn pick_victims(len: usize, k: usize) -> Vec<usize> {
	let mut indices = rand::seq::index::sample(&mut rand::rng(), len, k).into_vec();
	indices.sort_unstable_by(|a, b| b.cmp(a));
	indices
}

#[cfg(test)]
mod tests {
	use super::*;
	use churn_adapters::{MockLedgerClient, PathFindBehavior};
	use churn_storage::MemoryCandidateStore;
	use churn_types::test_utils::CandidateBuilder;
	use churn_types::{MockCandidateStoreTrait, PathFindRequest};
	use std::collections::HashSet;

	fn config(pool_size: usize, policy: ExhaustionPolicy) -> SupervisorConfig {
		SupervisorConfig {
			pool_size,
			max_churn: 16,
			churn_interval: Duration::from_secs(2),
			idle_wake: Duration::from_secs(5),
			exhaustion_policy: policy,
			seed: CandidateBuilder::new().build(),
		}
	}

	fn route(source: &str) -> PathCandidate {
		CandidateBuilder::new().source(source).destination("rDest").build()
	}

	async fn settle() {
		for _ in 0..20 {
			tokio::task::yield_now().await;
		}
	}

	async fn supervisor(
		pool_size: usize,
		policy: ExhaustionPolicy,
		candidates: &[PathCandidate],
	) -> (MemoryCandidateStore, Arc<MockLedgerClient>, PoolSupervisor) {
		let store = MemoryCandidateStore::new();
		for candidate in candidates {
			store.upsert(candidate.clone()).await.unwrap();
		}
		let client = Arc::new(MockLedgerClient::new());
		let supervisor = PoolSupervisor::new(
			config(pool_size, policy),
			Arc::new(store.clone()),
			client.clone(),
		);
		(store, client, supervisor)
	}

	#[test]
	fn test_pick_victims_is_distinct_and_descending() {
		for _ in 0..50 {
			let picked = pick_victims(10, 4);
			assert_eq!(picked.len(), 4);
			assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 4);
			assert!(picked.windows(2).all(|pair| pair[0] > pair[1]));
			assert!(picked.iter().all(|index| *index < 10));
		}
		assert!(pick_victims(3, 0).is_empty());
	}

	#[test]
	fn test_random_batch_size_bounds() {
		for _ in 0..200 {
			assert!(random_batch_size(16) < 16);
		}
		assert_eq!(random_batch_size(1), 0);
		assert_eq!(random_batch_size(0), 0);
	}

	#[tokio::test]
	async fn test_start_fills_pool_with_replacement() {
		let (_store, client, mut supervisor) =
			supervisor(8, ExhaustionPolicy::Skip, &[route("rA")]).await;
		assert_eq!(supervisor.start().await.unwrap(), 8);
		assert_eq!(supervisor.live(), 8);
		settle().await;
		assert_eq!(client.path_find_calls(), 8);
		assert_eq!(client.live_path_finds(), 8);
	}

	#[tokio::test]
	async fn test_churn_keeps_pool_size() {
		let (_store, client, mut supervisor) =
			supervisor(16, ExhaustionPolicy::Skip, &[route("rA"), route("rB")]).await;
		supervisor.start().await.unwrap();
		settle().await;

		for k in [0, 3, 16, 40] {
			let report = supervisor.churn_cycle(k).await.unwrap();
			assert_eq!(report.churned, k.min(16));
			assert_eq!(report.exited, 0);
			assert_eq!(report.live, 16);
			assert_eq!(supervisor.live(), 16);
			settle().await;
			assert_eq!(client.live_path_finds(), 16);
		}
	}

	#[tokio::test]
	async fn test_churn_with_exits_keeps_pool_size() {
		let dying: Vec<PathCandidate> = ["rD1", "rD2", "rD3", "rD4"].map(route).into();
		let (store, client, mut supervisor) =
			supervisor(12, ExhaustionPolicy::Skip, &dying).await;
		for candidate in &dying {
			client.set_route_behavior(&PathFindRequest::from(candidate), PathFindBehavior::Exhaust);
		}

		supervisor.start().await.unwrap();
		settle().await;
		assert!(supervisor.workers().iter().all(WorkerHandle::is_finished));
		store.upsert(route("rAlive")).await.unwrap();

		let mut total_exited = 0;
		for k in [3, 5, 12, 40] {
			for candidate in &dying {
				store.upsert(candidate.clone()).await.unwrap();
			}
			let finished = supervisor.workers().iter().filter(|w| w.is_finished()).count();
			let calls_before = client.path_find_calls();

			let report = supervisor.churn_cycle(k).await.unwrap();
			assert_eq!(report.churned, k.min(12));
			// Every finished worker is either churned or swept, never both
			assert!(report.exited <= finished);
			assert!(report.exited + report.churned >= finished);
			assert_eq!(report.launched, report.churned + report.exited);
			assert_eq!(report.skipped, 0);
			assert_eq!(report.live, 12);
			assert_eq!(supervisor.live(), 12);
			total_exited += report.exited;

			settle().await;
			assert_eq!(client.path_find_calls(), calls_before + report.launched);
			let running = supervisor.workers().iter().filter(|w| !w.is_finished()).count();
			assert_eq!(client.live_path_finds(), running);
		}
		// All twelve initial workers had exited; three were churned first
		assert!(total_exited >= 9);
	}

	#[tokio::test]
	async fn test_worker_ids_are_unique() {
		let (_store, _client, mut supervisor) =
			supervisor(4, ExhaustionPolicy::Skip, &[route("rA")]).await;
		supervisor.start().await.unwrap();
		supervisor.churn_cycle(4).await.unwrap();
		let ids: HashSet<u64> = supervisor.workers().iter().map(WorkerHandle::id).collect();
		assert_eq!(ids.len(), 4);
		assert!(ids.iter().all(|id| *id >= 4));
	}

	#[tokio::test]
	async fn test_exited_worker_route_is_evicted() {
		let dead = route("rDead");
		let (store, client, mut supervisor) =
			supervisor(1, ExhaustionPolicy::Skip, &[dead.clone()]).await;
		client.set_route_behavior(&PathFindRequest::from(&dead), PathFindBehavior::Exhaust);

		supervisor.start().await.unwrap();
		settle().await;
		assert!(supervisor.workers()[0].is_finished());

		let report = supervisor.churn_cycle(0).await.unwrap();
		assert_eq!(report.exited, 1);
		assert_eq!(report.evicted, 1);
		assert_eq!(report.launched, 0);
		assert_eq!(report.skipped, 1);
		assert_eq!(supervisor.live(), 0);
		assert!(store.keys().is_empty());
	}

	#[tokio::test]
	async fn test_evicted_route_is_replaced_from_registry() {
		let dead = route("rDead");
		let alive = route("rAlive");
		let (store, client, mut supervisor) =
			supervisor(1, ExhaustionPolicy::Skip, &[dead.clone()]).await;
		client.set_route_behavior(&PathFindRequest::from(&dead), PathFindBehavior::Exhaust);

		supervisor.start().await.unwrap();
		settle().await;
		store.upsert(alive.clone()).await.unwrap();
		store.remove(&dead.key()).await.unwrap();

		let report = supervisor.churn_cycle(0).await.unwrap();
		assert_eq!(report.exited, 1);
		// Already gone from the registry, eviction is a no-op
		assert_eq!(report.evicted, 0);
		assert_eq!(report.launched, 1);
		assert_eq!(supervisor.workers()[0].candidate(), &alive);
	}

	#[tokio::test]
	async fn test_terminated_workers_are_not_evicted() {
		let candidate = route("rA");
		let (store, _client, mut supervisor) =
			supervisor(4, ExhaustionPolicy::Skip, &[candidate.clone()]).await;
		supervisor.start().await.unwrap();
		settle().await;

		let report = supervisor.churn_cycle(4).await.unwrap();
		assert_eq!(report.churned, 4);
		assert_eq!(report.exited, 0);
		assert_eq!(report.launched, 4);
		assert!(store.get(&candidate.key()).is_some());
	}

	#[tokio::test]
	async fn test_skip_policy_leaves_slots_for_top_up() {
		let (store, _client, mut supervisor) = supervisor(3, ExhaustionPolicy::Skip, &[]).await;
		assert_eq!(supervisor.start().await.unwrap(), 0);

		let report = supervisor.churn_cycle(5).await.unwrap();
		assert_eq!(report.churned, 0);
		assert_eq!(report.skipped, 3);

		store.upsert(route("rLate")).await.unwrap();
		let report = supervisor.churn_cycle(0).await.unwrap();
		assert_eq!(report.launched, 3);
		assert_eq!(report.skipped, 0);
		assert_eq!(supervisor.live(), 3);
	}

	#[tokio::test]
	async fn test_reseed_policy_restores_seed() {
		let (store, _client, mut supervisor) = supervisor(2, ExhaustionPolicy::Reseed, &[]).await;
		assert_eq!(supervisor.start().await.unwrap(), 2);
		let seed = supervisor.config().seed.clone();
		assert!(store.get(&seed.key()).is_some());
		assert!(supervisor.workers().iter().all(|w| w.candidate() == &seed));
	}

	#[tokio::test]
	async fn test_halt_policy_stops() {
		let (_store, _client, mut supervisor) = supervisor(2, ExhaustionPolicy::Halt, &[]).await;
		assert_eq!(supervisor.start().await, Err(SupervisorError::Exhausted));
	}

	#[tokio::test]
	async fn test_registry_failure_surfaces() {
		let mut store = MockCandidateStoreTrait::new();
		store.expect_draw_random().returning(|| {
			Box::pin(async {
				Err(RegistryError::Operation {
					message: "backend down".to_string(),
				})
			})
		});
		let mut supervisor = PoolSupervisor::new(
			config(2, ExhaustionPolicy::Skip),
			Arc::new(store),
			Arc::new(MockLedgerClient::new()),
		);
		assert!(matches!(
			supervisor.start().await,
			Err(SupervisorError::Registry(RegistryError::Operation { .. }))
		));
	}

	#[tokio::test]
	async fn test_shutdown_releases_every_subscription() {
		let (store, client, mut supervisor) =
			supervisor(6, ExhaustionPolicy::Skip, &[route("rA")]).await;
		supervisor.start().await.unwrap();
		settle().await;
		assert_eq!(client.live_path_finds(), 6);

		let before = store.stats().await.unwrap();
		assert_eq!(supervisor.shutdown(), 6);
		settle().await;
		assert_eq!(client.live_path_finds(), 0);
		assert_eq!(supervisor.live(), 0);
		assert_eq!(store.stats().await.unwrap(), before);
	}

	#[tokio::test(start_paused = true)]
	async fn test_run_until_churns_and_stops() {
		let (_store, client, mut supervisor) =
			supervisor(4, ExhaustionPolicy::Skip, &[route("rA")]).await;
		supervisor.start().await.unwrap();

		let shutdown = tokio::time::sleep(Duration::from_secs(21));
		supervisor.run_until(shutdown).await.unwrap();

		assert_eq!(supervisor.live(), 0);
		settle().await;
		assert_eq!(client.live_path_finds(), 0);
		// Ten cycles ran; at least the initial pool subscribed
		assert!(client.path_find_calls() >= 4);
	}

	#[tokio::test(start_paused = true)]
	async fn test_run_until_ends_on_halt() {
		let dead = route("rDead");
		let (_store, client, mut supervisor) =
			supervisor(1, ExhaustionPolicy::Halt, &[dead.clone()]).await;
		client.set_route_behavior(&PathFindRequest::from(&dead), PathFindBehavior::Exhaust);
		supervisor.start().await.unwrap();

		let result = supervisor.run_until(std::future::pending::<()>()).await;
		assert_eq!(result, Err(SupervisorError::Exhausted));
		assert_eq!(supervisor.live(), 0);
	}
}
