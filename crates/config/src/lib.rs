//! Churn Configuration
//!
//! Configuration management and startup utilities for the path-find churn tester.

pub mod loader;
pub mod settings;
pub mod startup_logger;

pub use loader::{load_config, load_config_from, ConfigLoadError};
pub use settings::{
	ConfigValidationError, ExhaustionPolicy, LogFormat, LoggingSettings, ObserverSettings,
	PoolSettings, SeedSettings, ServerSettings, Settings, WorkerSettings,
};
pub use startup_logger::{log_service_info, log_service_shutdown, log_startup_complete};
