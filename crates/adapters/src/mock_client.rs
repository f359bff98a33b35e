//! Scripted in-memory ledger client for tests and dry runs
//!
//! Path-find subscriptions follow a configurable [`PathFindBehavior`], either
//! a default one or one set per route. Transaction events are pushed by the
//! test through [`MockLedgerClient::push_transaction`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use churn_types::{
	AssetKey, ClientError, ClientResult, LedgerClient, PathFindRequest, PathFindStream,
	PathFindUpdate, TransactionStream,
};
use futures::channel::mpsc;
use futures::{stream, StreamExt};
use serde_json::Value;

/// How a mocked path-find subscription behaves
#[derive(Debug, Clone, PartialEq)]
pub enum PathFindBehavior {
	/// Confirm and never push anything
	KeepAlive,
	/// Confirm, then push one update without alternatives
	Exhaust,
	/// Confirm, push the given updates, then stay open
	Updates(Vec<PathFindUpdate>),
	/// Confirm, then close the stream immediately
	Close,
	/// Reject the subscription
	FailSubscribe,
}

type RouteId = (String, String, AssetKey);

fn route_id(request: &PathFindRequest) -> RouteId {
	(
		request.source.as_str().to_string(),
		request.destination.as_str().to_string(),
		request.amount.key(),
	)
}

/// Decrements the live subscription count when the stream is dropped
struct SubscriptionGuard(Arc<AtomicUsize>);

impl Drop for SubscriptionGuard {
	fn drop(&mut self) {
		self.0.fetch_sub(1, Ordering::SeqCst);
	}
}

/// Mock client with call tracking
#[derive(Debug)]
pub struct MockLedgerClient {
	default_behavior: Mutex<PathFindBehavior>,
	routes: Mutex<HashMap<RouteId, PathFindBehavior>>,
	path_find_calls: AtomicUsize,
	live_path_finds: Arc<AtomicUsize>,
	requests: Mutex<Vec<PathFindRequest>>,
	transaction_sender: mpsc::UnboundedSender<Value>,
	transaction_receiver: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
	fail_transactions: AtomicBool,
}

impl Default for MockLedgerClient {
	fn default() -> Self {
		Self::new()
	}
}

impl MockLedgerClient {
	/// Create a mock whose subscriptions stay alive
	pub fn new() -> Self {
		Self::with_behavior(PathFindBehavior::KeepAlive)
	}

	/// Create a mock with a default path-find behavior
	pub fn with_behavior(behavior: PathFindBehavior) -> Self {
		let (transaction_sender, transaction_receiver) = mpsc::unbounded();
		Self {
			default_behavior: Mutex::new(behavior),
			routes: Mutex::new(HashMap::new()),
			path_find_calls: AtomicUsize::new(0),
			live_path_finds: Arc::new(AtomicUsize::new(0)),
			requests: Mutex::new(Vec::new()),
			transaction_sender,
			transaction_receiver: Mutex::new(Some(transaction_receiver)),
			fail_transactions: AtomicBool::new(false),
		}
	}

	/// Change the behavior of subscriptions opened from now on
	pub fn set_default_behavior(&self, behavior: PathFindBehavior) {
		*lock(&self.default_behavior) = behavior;
	}

	/// Override the behavior for one route
	pub fn set_route_behavior(&self, request: &PathFindRequest, behavior: PathFindBehavior) {
		lock(&self.routes).insert(route_id(request), behavior);
	}

	/// Make the transaction subscription fail
	pub fn fail_transaction_subscription(&self) {
		self.fail_transactions.store(true, Ordering::SeqCst);
	}

	/// Push an event on the transaction stream
	pub fn push_transaction(&self, event: Value) {
		// The receiver may already be gone; tests then simply observe nothing
		let _ = self.transaction_sender.unbounded_send(event);
	}

	/// End the transaction stream
	pub fn close_transactions(&self) {
		self.transaction_sender.close_channel();
	}

	/// Whether the transaction stream has ended or its subscriber is gone
	pub fn transactions_closed(&self) -> bool {
		self.transaction_sender.is_closed()
	}

	/// Number of path-find subscriptions attempted
	pub fn path_find_calls(&self) -> usize {
		self.path_find_calls.load(Ordering::SeqCst)
	}

	/// Number of path-find streams currently held by callers
	pub fn live_path_finds(&self) -> usize {
		self.live_path_finds.load(Ordering::SeqCst)
	}

	/// Every path-find request received, in order
	pub fn requests(&self) -> Vec<PathFindRequest> {
		lock(&self.requests).clone()
	}

	fn behavior_for(&self, request: &PathFindRequest) -> PathFindBehavior {
		lock(&self.routes)
			.get(&route_id(request))
			.cloned()
			.unwrap_or_else(|| lock(&self.default_behavior).clone())
	}
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
	fn id(&self) -> &str {
		"mock"
	}

	async fn subscribe_path_find(&self, request: &PathFindRequest) -> ClientResult<PathFindStream> {
		self.path_find_calls.fetch_add(1, Ordering::SeqCst);
		lock(&self.requests).push(request.clone());

		let updates: PathFindStream = match self.behavior_for(request) {
			PathFindBehavior::FailSubscribe => {
				return Err(ClientError::Rejected {
					command: "path_find".to_string(),
					reason: "mock rejection".to_string(),
				})
			},
			PathFindBehavior::Close => stream::empty().boxed(),
			PathFindBehavior::KeepAlive => stream::pending().boxed(),
			PathFindBehavior::Exhaust => stream::iter(vec![PathFindUpdate::exhausted()])
				.chain(stream::pending())
				.boxed(),
			PathFindBehavior::Updates(updates) => {
				stream::iter(updates).chain(stream::pending()).boxed()
			},
		};

		self.live_path_finds.fetch_add(1, Ordering::SeqCst);
		let guard = SubscriptionGuard(Arc::clone(&self.live_path_finds));
		Ok(updates
			.map(move |update| {
				let _held = &guard;
				update
			})
			.boxed())
	}

	async fn subscribe_transactions(&self) -> ClientResult<TransactionStream> {
		if self.fail_transactions.load(Ordering::SeqCst) {
			return Err(ClientError::Connection("mock failure".to_string()));
		}
		lock(&self.transaction_receiver)
			.take()
			.map(|receiver| receiver.boxed())
			.ok_or_else(|| ClientError::Rejected {
				command: "subscribe".to_string(),
				reason: "mock transaction stream already taken".to_string(),
			})
	}
}
