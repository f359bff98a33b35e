//! Churn Storage
//!
//! Candidate registry implementations for the path-find churn tester.

pub mod memory_store;
pub mod traits;

pub use memory_store::MemoryCandidateStore;
pub use traits::CandidateStore;
