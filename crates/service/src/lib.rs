//! Churn Service
//!
//! The moving parts of the stress tester: the transaction observer growing
//! the candidate registry, path-find workers, and the supervisor churning
//! the worker pool.

pub mod observer;
pub mod supervisor;
pub mod worker;

pub use observer::{ObservationOutcome, ObserverStats, TransactionObserver};
pub use supervisor::{
	CycleReport, PoolSupervisor, SupervisorConfig, SupervisorError, SupervisorResult,
};
pub use worker::{ExitReason, PathfindWorker, WorkerHandle, WorkerState};
