//! Churn Adapters
//!
//! Implementations of [`LedgerClient`](churn_types::LedgerClient) and the
//! lookup of a running node's WebSocket endpoint.

pub mod mock_client;
pub mod node_config;
pub mod target;
pub mod ws_client;

pub use mock_client::{MockLedgerClient, PathFindBehavior};
pub use node_config::{ConfigSection, NodeConfigError, NodeConfigFile};
pub use target::{ServerTarget, TargetError};
pub use ws_client::WsLedgerClient;
