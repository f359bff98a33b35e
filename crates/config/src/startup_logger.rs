//! Service startup logging for the path-find churn tester
//!
//! Logs service, environment and target information at startup and shutdown.

use std::env;
use tracing::info;

use crate::Settings;

/// Logs service information at startup
pub fn log_service_info() {
	// Use the root package name, not the current crate
	let service_name = "pathfind-churn";
	let service_version = env!("CARGO_PKG_VERSION");

	info!("=== Path-find Churn Tester Starting ===");
	info!("Service: {} v{}", service_name, service_version);
	info!("Platform: {} ({})", env::consts::OS, env::consts::ARCH);

	if let Ok(cwd) = env::current_dir() {
		info!("Working Directory: {}", cwd.display());
	}

	if let Ok(rust_log) = env::var("RUST_LOG") {
		info!("Log Level: {}", rust_log);
	}

	info!(
		"Started at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs service shutdown information
pub fn log_service_shutdown() {
	info!("Path-find Churn Tester Shutting Down");
	info!(
		"Shutdown at: {}",
		chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
	);
}

/// Logs the effective run configuration once every subsystem is up
pub fn log_startup_complete(endpoint: &str, settings: &Settings) {
	info!("Path-find Churn Tester Started Successfully");
	info!("Target endpoint: {}", endpoint);
	info!(
		"Pool: {} workers, churn every {}ms (max {} per cycle), exhaustion policy {:?}",
		settings.pool.size,
		settings.pool.churn_interval_ms,
		settings.pool.max_churn,
		settings.pool.exhaustion_policy
	);
	info!(
		"Transaction observer: {}",
		if settings.observer.enabled {
			"enabled"
		} else {
			"disabled"
		}
	);
}
