//! WebSocket client for the node's JSON-RPC subscription interface
//!
//! Every subscription gets its own connection, so dropping the returned
//! stream closes exactly that subscription and nothing else.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use churn_types::{
	ClientError, ClientResult, LedgerClient, PathFindRequest, PathFindStream, PathFindUpdate,
	TransactionStream,
};
use futures::{future, SinkExt, Stream, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Push message type carrying path-find updates
const PATH_FIND_MESSAGE: &str = "path_find";

/// Push message type carrying validated transactions
const TRANSACTION_MESSAGE: &str = "transaction";

/// Ledger client speaking the node's WebSocket API
#[derive(Debug, Clone)]
pub struct WsLedgerClient {
	id: String,
	url: String,
	connect_timeout: Duration,
	next_request_id: Arc<AtomicU64>,
}

impl WsLedgerClient {
	pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
		let url = url.into();
		Self {
			id: format!("ws:{}", url),
			url,
			connect_timeout,
			next_request_id: Arc::new(AtomicU64::new(1)),
		}
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	fn request_id(&self) -> u64 {
		self.next_request_id.fetch_add(1, Ordering::Relaxed)
	}

	/// Connect, send `request` and wait for the matching response
	///
	/// The whole exchange is bounded by the connect timeout.
	async fn open(&self, command: &str, id: u64, request: Value) -> ClientResult<WsStream> {
		let timeout_ms = self.connect_timeout.as_millis() as u64;
		tokio::time::timeout(self.connect_timeout, self.handshake(command, id, request))
			.await
			.map_err(|_| ClientError::Timeout { timeout_ms })?
	}

	async fn handshake(&self, command: &str, id: u64, request: Value) -> ClientResult<WsStream> {
		let (mut ws, _) = connect_async(self.url.as_str())
			.await
			.map_err(|e| ClientError::Connection(format!("{}: {}", self.url, e)))?;

		ws.send(Message::Text(request.to_string()))
			.await
			.map_err(|e| ClientError::Connection(e.to_string()))?;

		while let Some(message) = ws.next().await {
			let message = message.map_err(|e| ClientError::Connection(e.to_string()))?;
			let text = match message {
				Message::Text(text) => text,
				Message::Close(_) => break,
				_ => continue,
			};
			let value: Value = serde_json::from_str(&text)?;
			if value.get("id").and_then(Value::as_u64) != Some(id) {
				debug!("Skipping message received before '{}' response", command);
				continue;
			}
			return match value.get("status").and_then(Value::as_str) {
				Some("success") => Ok(ws),
				None => Err(ClientError::Protocol(format!(
					"'{}' response without status: {}",
					command, value
				))),
				Some(_) => Err(ClientError::Rejected {
					command: command.to_string(),
					reason: rejection_reason(&value),
				}),
			};
		}

		Err(ClientError::Closed {
			command: command.to_string(),
		})
	}
}

#[async_trait]
impl LedgerClient for WsLedgerClient {
	fn id(&self) -> &str {
		&self.id
	}

	async fn subscribe_path_find(&self, request: &PathFindRequest) -> ClientResult<PathFindStream> {
		let id = self.request_id();
		let ws = self.open("path_find", id, request.to_rpc(id)).await?;
		debug!(
			"Path-find subscription {} confirmed for {} -> {}",
			id, request.source, request.destination
		);
		Ok(pushed_messages(ws, PATH_FIND_MESSAGE)
			.map(|message| PathFindUpdate::from_message(&message))
			.boxed())
	}

	async fn subscribe_transactions(&self) -> ClientResult<TransactionStream> {
		let id = self.request_id();
		let request = json!({
			"id": id,
			"command": "subscribe",
			"streams": ["transactions"],
		});
		let ws = self.open("subscribe", id, request).await?;
		debug!("Transaction stream subscription {} confirmed", id);
		Ok(pushed_messages(ws, TRANSACTION_MESSAGE).boxed())
	}
}

/// JSON pushes of the given `type`; ends when the connection closes or fails
fn pushed_messages(ws: WsStream, kind: &'static str) -> impl Stream<Item = Value> + Send {
	ws.take_while(|message| {
		future::ready(match message {
			Ok(message) => !message.is_close(),
			Err(e) => {
				warn!("Subscription connection failed: {}", e);
				false
			},
		})
	})
	.filter_map(move |message| {
		future::ready(match message {
			Ok(Message::Text(text)) => serde_json::from_str::<Value>(&text)
				.ok()
				.filter(|value| value.get("type").and_then(Value::as_str) == Some(kind)),
			_ => None,
		})
	})
}

fn rejection_reason(response: &Value) -> String {
	let error = response
		.get("error")
		.and_then(Value::as_str)
		.unwrap_or("unknown error");
	match response.get("error_message").and_then(Value::as_str) {
		Some(message) => format!("{} ({})", error, message),
		None => error.to_string(),
	}
}
