//! Path-find Churn Tester
//!
//! Stress tests a ledger node's path-finding subsystem by keeping a large
//! pool of `path_find` subscriptions open and constantly replacing part of
//! it, while a transaction observer feeds real payment routes into the pool.
//!
//! ```rust,no_run
//! use pathfind_churn::ChurnBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! ChurnBuilder::new().with_ws_url("ws://127.0.0.1:6006").run().await
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use churn_adapters::{
	MockLedgerClient, NodeConfigError, NodeConfigFile, PathFindBehavior, ServerTarget,
	TargetError, WsLedgerClient,
};
pub use churn_config::{
	load_config, load_config_from, log_service_info, log_service_shutdown, log_startup_complete,
	ConfigLoadError, ConfigValidationError, ExhaustionPolicy, LogFormat, Settings,
};
pub use churn_service::{
	CycleReport, ExitReason, ObservationOutcome, ObserverStats, PathfindWorker, PoolSupervisor,
	SupervisorConfig, SupervisorError, TransactionObserver, WorkerHandle, WorkerState,
};
pub use churn_storage::{CandidateStore, MemoryCandidateStore};
pub use churn_types::{
	Account, Asset, AssetKey, CandidateKey, ClientError, LedgerClient, PathCandidate,
	RegistryError, RegistryStats,
};

/// Errors that prevent the tester from starting or keep it from running
#[derive(Debug, Error)]
pub enum ChurnError {
	#[error(transparent)]
	Config(#[from] ConfigLoadError),

	#[error("Invalid configuration: {0}")]
	Validation(#[from] ConfigValidationError),

	#[error("Failed to resolve target node: {0}")]
	Target(#[from] TargetError),

	#[error("No target node: pass a process id or a WebSocket URL")]
	NoTarget,

	#[error("Failed to subscribe to the transaction stream: {0}")]
	Subscribe(#[from] ClientError),

	#[error("Candidate registry error: {0}")]
	Registry(#[from] RegistryError),

	#[error("Worker pool stopped: {0}")]
	Supervisor(#[from] SupervisorError),

	#[error("Failed to initialize logging: {0}")]
	Logging(String),
}

/// Where the node under test is found
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
	Pid(u32),
	Url(String),
}

/// Builder wiring registry, client, observer and supervisor together
pub struct ChurnBuilder<S = MemoryCandidateStore>
where
	S: CandidateStore + Clone + 'static,
{
	store: S,
	settings: Option<Settings>,
	client: Option<Arc<dyn LedgerClient>>,
	target: Option<Target>,
}

impl Default for ChurnBuilder<MemoryCandidateStore> {
	fn default() -> Self {
		Self::new()
	}
}

impl ChurnBuilder<MemoryCandidateStore> {
	/// Builder backed by an in-memory registry
	pub fn new() -> Self {
		Self::with_store(MemoryCandidateStore::new())
	}
}

impl<S> ChurnBuilder<S>
where
	S: CandidateStore + Clone + 'static,
{
	/// Builder backed by a custom registry
	pub fn with_store(store: S) -> Self {
		Self {
			store,
			settings: None,
			client: None,
			target: None,
		}
	}

	pub fn with_settings(mut self, settings: Settings) -> Self {
		self.settings = Some(settings);
		self
	}

	/// Connect to the node running as `pid`
	pub fn with_pid(mut self, pid: u32) -> Self {
		self.target = Some(Target::Pid(pid));
		self
	}

	/// Connect to an explicit endpoint, overriding any configured one
	pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
		self.target = Some(Target::Url(url.into()));
		self
	}

	/// Use an already constructed client instead of connecting
	pub fn with_client(mut self, client: Arc<dyn LedgerClient>) -> Self {
		self.client = Some(client);
		self
	}

	pub fn settings(&self) -> Option<&Settings> {
		self.settings.as_ref()
	}

	/// Seed the registry, subscribe to transactions and launch the pool
	pub async fn start(self) -> Result<ChurnRuntime, ChurnError> {
		let settings = self.settings.clone().unwrap_or_default();
		settings.validate()?;

		let (client, endpoint) = match self.client {
			Some(client) => {
				let endpoint = client.id().to_string();
				(client, endpoint)
			},
			None => {
				let url = resolve_endpoint(self.target.as_ref(), &settings)?;
				let client: Arc<dyn LedgerClient> = Arc::new(WsLedgerClient::new(
					url.clone(),
					settings.server.connect_timeout(),
				));
				(client, url)
			},
		};

		let seed = settings.seed.to_candidate()?;
		info!("Seeding candidate registry with {}", seed);
		self.store.upsert(seed).await?;
		let store: Arc<dyn CandidateStore> = Arc::new(self.store);

		let observer = if settings.observer.enabled {
			Some(TransactionObserver::spawn(Arc::clone(&client), Arc::clone(&store)).await?)
		} else {
			info!("Transaction observer disabled, churning the seed candidate only");
			None
		};

		let mut supervisor = PoolSupervisor::new(
			SupervisorConfig::from_settings(&settings)?,
			Arc::clone(&store),
			client,
		);
		if let Err(e) = supervisor.start().await {
			if let Some(observer) = &observer {
				observer.abort();
			}
			return Err(e.into());
		}

		Ok(ChurnRuntime {
			endpoint,
			store,
			supervisor,
			observer,
		})
	}

	/// Run the tester until Ctrl-C
	///
	/// Loads `.env` and the default config file unless settings were given,
	/// then initializes logging before anything else happens.
	pub async fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
		dotenvy::dotenv().ok();

		let settings = match self.settings.take() {
			Some(settings) => settings,
			None => load_config()?,
		};
		init_tracing_from_settings(&settings)?;
		log_service_info();

		let mut runtime = self.with_settings(settings.clone()).start().await?;
		log_startup_complete(runtime.endpoint(), &settings);

		let result = runtime
			.run_until(async {
				if let Err(e) = tokio::signal::ctrl_c().await {
					warn!("Failed to listen for Ctrl-C: {}", e);
					std::future::pending::<()>().await;
				}
				info!("Ctrl-C received, stopping");
			})
			.await;

		log_service_shutdown();
		Ok(result?)
	}
}

/// A started tester
pub struct ChurnRuntime {
	endpoint: String,
	store: Arc<dyn CandidateStore>,
	supervisor: PoolSupervisor,
	observer: Option<JoinHandle<ObserverStats>>,
}

impl ChurnRuntime {
	/// Endpoint or client id the runtime talks to
	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	pub fn store(&self) -> Arc<dyn CandidateStore> {
		Arc::clone(&self.store)
	}

	pub fn supervisor(&mut self) -> &mut PoolSupervisor {
		&mut self.supervisor
	}

	/// Churn until `shutdown` resolves, then stop observer and workers
	///
	/// The observer is stopped before any worker is terminated, so the
	/// registry is not written to once shutdown begins.
	pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), ChurnError>
	where
		F: Future<Output = ()>,
	{
		let mut observer = self.observer.take();
		let result = self
			.supervisor
			.run_until(async {
				shutdown.await;
				stop_observer(&mut observer).await;
			})
			.await;
		stop_observer(&mut observer).await;
		if let Ok(stats) = self.store.stats().await {
			info!(
				entries = stats.entries,
				upserts = stats.upserts,
				removals = stats.removals,
				draws = stats.draws,
				"Candidate registry at shutdown"
			);
		}
		Ok(result?)
	}

	/// Stop everything without waiting
	pub fn shutdown(&mut self) {
		self.abort_observer();
		self.supervisor.shutdown();
	}

	fn abort_observer(&mut self) {
		if let Some(observer) = self.observer.take() {
			observer.abort();
		}
	}
}

impl Drop for ChurnRuntime {
	fn drop(&mut self) {
		self.abort_observer();
	}
}

/// Abort the observer task and wait until it is gone
async fn stop_observer(observer: &mut Option<JoinHandle<ObserverStats>>) {
	let Some(handle) = observer.take() else {
		return;
	};
	handle.abort();
	match handle.await {
		Ok(stats) => info!(
			events = stats.events,
			recorded = stats.recorded,
			ignored = stats.ignored_total(),
			"Transaction observer finished"
		),
		Err(e) if e.is_cancelled() => debug!("Transaction observer stopped"),
		Err(e) => warn!("Transaction observer failed: {}", e),
	}
}

/// Explicit target first, then the configured URL, then nothing
fn resolve_endpoint(target: Option<&Target>, settings: &Settings) -> Result<String, ChurnError> {
	match target {
		Some(Target::Url(url)) => Ok(url.clone()),
		Some(Target::Pid(pid)) => {
			let target = ServerTarget::from_pid(*pid)?;
			info!(
				"Target process {} runs {} with config {}",
				target.pid,
				target.executable.display(),
				target.config_file.display()
			);
			Ok(target.websocket_url()?)
		},
		None => settings
			.server
			.ws_url
			.clone()
			.filter(|url| !url.is_empty())
			.ok_or(ChurnError::NoTarget),
	}
}

/// Initialize tracing with configuration-based settings
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing_from_settings(settings: &Settings) -> Result<(), ChurnError> {
	let log_level = &settings.logging.level;
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	let result = match settings.logging.format {
		LogFormat::Json => {
			let subscriber = tracing_subscriber::fmt().json().with_env_filter(env_filter);

			if settings.logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
		LogFormat::Pretty => {
			let subscriber = tracing_subscriber::fmt()
				.pretty()
				.with_env_filter(env_filter);

			if settings.logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
		LogFormat::Compact => {
			let subscriber = tracing_subscriber::fmt()
				.compact()
				.with_env_filter(env_filter);

			if settings.logging.structured {
				subscriber.with_target(true).with_thread_ids(true).try_init()
			} else {
				subscriber.try_init()
			}
		},
	};
	result.map_err(|e| ChurnError::Logging(e.to_string()))?;

	info!(
		"Logging configuration applied: level={}, format={:?}, structured={}",
		settings.logging.level, settings.logging.format, settings.logging.structured
	);
	Ok(())
}
