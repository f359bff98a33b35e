//! Core client trait for the node's subscription interface

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use std::fmt::Debug;

use super::ClientResult;
use crate::events::{PathFindRequest, PathFindUpdate};

/// Updates pushed on one path-find subscription
///
/// Dropping the stream releases the subscription.
pub type PathFindStream = BoxStream<'static, PathFindUpdate>;

/// Raw events pushed on the `transactions` stream
pub type TransactionStream = BoxStream<'static, Value>;

/// Interface to the node whose path-finding is under test
///
/// Each call opens an independent subscription; implementations must not
/// share subscription state between callers.
#[async_trait]
pub trait LedgerClient: Send + Sync + Debug {
	/// Name used in logs
	fn id(&self) -> &str;

	/// Open a path-find subscription
	///
	/// Resolves once the server has confirmed the subscription.
	async fn subscribe_path_find(&self, request: &PathFindRequest) -> ClientResult<PathFindStream>;

	/// Subscribe to validated transactions
	async fn subscribe_transactions(&self) -> ClientResult<TransactionStream>;
}
