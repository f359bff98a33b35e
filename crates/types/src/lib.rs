//! Churn Types
//!
//! Shared models and traits for the path-find churn tester: ledger value
//! types, candidates and their registry keys, stream events, and the seams
//! to the node (`LedgerClient`) and to candidate storage
//! (`CandidateStoreTrait`).

pub mod candidates;
pub mod client;
pub mod events;
pub mod models;
pub mod storage;
pub mod test_utils;

// Re-export serde_json for convenience
pub use serde_json;

pub use candidates::{CandidateKey, PathCandidate, DELIVER_SCALE, SEND_MAX_SCALE};

pub use client::{ClientError, ClientResult, LedgerClient, PathFindStream, TransactionStream};

pub use events::{Disqualification, ObservedPayment, PathFindRequest, PathFindUpdate};

pub use models::{parse_decimal, Account, AmountError, Asset, AssetKey, NATIVE_CURRENCY};

pub use storage::{CandidateStoreTrait, RegistryError, RegistryResult, RegistryStats};

#[cfg(any(test, feature = "mock"))]
pub use storage::MockCandidateStoreTrait;
