//! A single path-find subscription kept open against the node
//!
//! A worker subscribes once, stays active while the node keeps reporting
//! alternatives and exits on its own when the route dries up, the
//! subscription is refused or the stream ends. It never retries; the pool
//! supervisor decides what replaces it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use churn_types::{LedgerClient, PathCandidate, PathFindRequest};
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

/// Why a worker stopped on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
	/// The node refused or failed the subscription
	SubscribeFailed(String),
	/// An update arrived without alternatives
	NoAlternatives,
	/// The subscription stream ended
	StreamClosed,
}

impl fmt::Display for ExitReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ExitReason::SubscribeFailed(reason) => write!(f, "subscribe failed: {}", reason),
			ExitReason::NoAlternatives => write!(f, "no alternatives"),
			ExitReason::StreamClosed => write!(f, "stream closed"),
		}
	}
}

/// Lifecycle of a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
	Subscribing,
	Active,
	Exited(ExitReason),
}

/// Supervisor-side handle to a running worker
#[derive(Debug)]
pub struct WorkerHandle {
	id: u64,
	candidate: PathCandidate,
	task: JoinHandle<()>,
	state: watch::Receiver<WorkerState>,
}

impl WorkerHandle {
	pub fn id(&self) -> u64 {
		self.id
	}

	/// The candidate the worker was launched with
	pub fn candidate(&self) -> &PathCandidate {
		&self.candidate
	}

	pub fn state(&self) -> WorkerState {
		self.state.borrow().clone()
	}

	/// Whether the worker stopped, by itself or otherwise
	pub fn is_finished(&self) -> bool {
		self.task.is_finished() || matches!(*self.state.borrow(), WorkerState::Exited(_))
	}

	pub fn exit_reason(&self) -> Option<ExitReason> {
		match &*self.state.borrow() {
			WorkerState::Exited(reason) => Some(reason.clone()),
			_ => None,
		}
	}

	/// Abort the worker without waiting for it
	///
	/// The task drops its subscription when it is next polled.
	pub fn terminate(self) {
		self.task.abort();
	}

	/// Wait until the worker publishes a state matching `predicate`
	///
	/// Returns `None` if the worker went away first.
	pub async fn wait_for<F>(&mut self, mut predicate: F) -> Option<WorkerState>
	where
		F: FnMut(&WorkerState) -> bool,
	{
		self.state
			.wait_for(|state| predicate(state))
			.await
			.ok()
			.map(|state| state.clone())
	}
}

impl Drop for WorkerHandle {
	fn drop(&mut self) {
		self.task.abort();
	}
}

/// Path-find subscriber for one candidate
pub struct PathfindWorker {
	id: u64,
	request: PathFindRequest,
	client: Arc<dyn LedgerClient>,
	idle_wake: Duration,
	state: watch::Sender<WorkerState>,
}

impl PathfindWorker {
	/// Start a worker task for `candidate`
	pub fn spawn(
		id: u64,
		candidate: PathCandidate,
		client: Arc<dyn LedgerClient>,
		idle_wake: Duration,
	) -> WorkerHandle {
		let (state, receiver) = watch::channel(WorkerState::Subscribing);
		let worker = Self {
			id,
			request: PathFindRequest::from(&candidate),
			client,
			idle_wake,
			state,
		};
		let task = tokio::spawn(worker.run());
		WorkerHandle {
			id,
			candidate,
			task,
			state: receiver,
		}
	}

	async fn run(self) {
		let reason = self.drive().await;
		info!("Worker {} exited: {}", self.id, reason);
		self.state.send_replace(WorkerState::Exited(reason));
	}

	/// Subscription loop; the stream is dropped before this returns
	async fn drive(&self) -> ExitReason {
		debug!(
			"Worker {} subscribing {} -> {} for {}",
			self.id, self.request.source, self.request.destination, self.request.amount
		);
		let mut updates = match self.client.subscribe_path_find(&self.request).await {
			Ok(updates) => updates,
			Err(e) => return ExitReason::SubscribeFailed(e.to_string()),
		};
		self.state.send_replace(WorkerState::Active);

		loop {
			match tokio::time::timeout(self.idle_wake, updates.next()).await {
				Err(_) => trace!("Worker {} idle, subscription still open", self.id),
				Ok(None) => return ExitReason::StreamClosed,
				Ok(Some(update)) if !update.has_alternatives() => {
					return ExitReason::NoAlternatives
				},
				Ok(Some(update)) => debug!(
					"Worker {} received {} alternatives",
					self.id,
					update.alternatives.as_ref().map_or(0, Vec::len)
				),
			}
		}
	}
}
