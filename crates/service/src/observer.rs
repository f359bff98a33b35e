//! Transaction observer feeding the candidate registry
//!
//! Every successful, not fully native payment on the `transactions` stream
//! becomes a candidate probing the same route with a slightly smaller
//! delivery and a slightly larger send-max budget.

use std::collections::BTreeMap;
use std::sync::Arc;

use churn_types::{
	CandidateKey, CandidateStoreTrait, ClientResult, Disqualification, LedgerClient,
	ObservedPayment, RegistryError, TransactionStream,
};
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Events between two debug-level counter summaries
const STATS_LOG_INTERVAL: u64 = 1_000;

/// Result of handling one transaction event
#[derive(Debug, Clone, PartialEq)]
pub enum ObservationOutcome {
	/// A candidate was stored under `key`
	Recorded { key: CandidateKey, replaced: bool },
	/// The event does not describe a usable payment
	Ignored(Disqualification),
	/// The registry refused the candidate
	StoreFailed(RegistryError),
}

/// Counters over all events seen by an observer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObserverStats {
	pub events: u64,
	pub recorded: u64,
	pub replaced: u64,
	pub store_failures: u64,
	/// Ignored events per disqualification label
	pub ignored: BTreeMap<&'static str, u64>,
}

impl ObserverStats {
	pub fn ignored_total(&self) -> u64 {
		self.ignored.values().sum()
	}

	fn record(&mut self, outcome: &ObservationOutcome) {
		self.events += 1;
		match outcome {
			ObservationOutcome::Recorded { replaced, .. } => {
				self.recorded += 1;
				if *replaced {
					self.replaced += 1;
				}
			},
			ObservationOutcome::Ignored(reason) => {
				*self.ignored.entry(reason.label()).or_default() += 1;
			},
			ObservationOutcome::StoreFailed(_) => self.store_failures += 1,
		}
	}
}

/// Consumes transaction events and upserts derived candidates
pub struct TransactionObserver {
	store: Arc<dyn CandidateStoreTrait>,
	stats: ObserverStats,
}

impl TransactionObserver {
	pub fn new(store: Arc<dyn CandidateStoreTrait>) -> Self {
		Self {
			store,
			stats: ObserverStats::default(),
		}
	}

	pub fn stats(&self) -> &ObserverStats {
		&self.stats
	}

	/// Handle one raw stream event; never fails
	pub async fn on_transaction_event(&mut self, event: &Value) -> ObservationOutcome {
		let outcome = match ObservedPayment::parse(event).and_then(|p| p.to_candidate()) {
			Ok(candidate) => {
				let key = candidate.key();
				match self.store.upsert(candidate).await {
					Ok(replaced) => {
						debug!("Recorded candidate for route {}", key);
						ObservationOutcome::Recorded { key, replaced }
					},
					Err(e) => {
						warn!("Failed to record candidate for route {}: {}", key, e);
						ObservationOutcome::StoreFailed(e)
					},
				}
			},
			Err(reason) => {
				debug!("Ignoring transaction event: {}", reason);
				ObservationOutcome::Ignored(reason)
			},
		};

		self.stats.record(&outcome);
		if self.stats.events % STATS_LOG_INTERVAL == 0 {
			debug!(
				events = self.stats.events,
				recorded = self.stats.recorded,
				ignored = ?self.stats.ignored,
				"Transaction observer progress"
			);
		}
		outcome
	}

	/// Consume `events` until the stream ends
	pub async fn run(mut self, mut events: TransactionStream) -> ObserverStats {
		while let Some(event) = events.next().await {
			self.on_transaction_event(&event).await;
		}
		warn!(
			"Transaction stream ended after {} events ({} recorded, {} ignored)",
			self.stats.events,
			self.stats.recorded,
			self.stats.ignored_total()
		);
		self.stats
	}

	/// Subscribe to the transaction stream and observe it in the background
	///
	/// Only the initial subscription can fail; a later end of the stream
	/// finishes the task.
	pub async fn spawn(
		client: Arc<dyn LedgerClient>,
		store: Arc<dyn CandidateStoreTrait>,
	) -> ClientResult<JoinHandle<ObserverStats>> {
		let events = client.subscribe_transactions().await?;
		info!("Observing transactions through {}", client.id());
		Ok(tokio::spawn(Self::new(store).run(events)))
	}
}
