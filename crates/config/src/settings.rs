//! Configuration settings structures

use churn_types::{parse_decimal, Account, Asset, PathCandidate, NATIVE_CURRENCY};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Main application settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
	pub server: ServerSettings,
	pub pool: PoolSettings,
	pub worker: WorkerSettings,
	pub observer: ObserverSettings,
	pub seed: SeedSettings,
	pub logging: LoggingSettings,
}

/// Connection to the node under test
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
	/// WebSocket endpoint; resolved from the node's config file when absent
	pub ws_url: Option<String>,
	/// Timeout for establishing a connection and confirming a subscription
	pub connect_timeout_ms: u64,
}

/// Worker pool and churn cadence
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PoolSettings {
	/// Number of concurrently running path-find workers
	pub size: usize,
	/// Time between churn cycles
	pub churn_interval_ms: u64,
	/// Exclusive upper bound of workers terminated per cycle
	pub max_churn: usize,
	/// What to do when a replacement is needed and the registry is empty
	pub exhaustion_policy: ExhaustionPolicy,
}

/// Behavior when the candidate registry has been drained
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
	/// Log and leave the slot empty; the next cycle tries to refill it
	#[default]
	Skip,
	/// Put the seed candidate back and draw again
	Reseed,
	/// Stop the supervisor with an error
	Halt,
}

/// Per-worker settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct WorkerSettings {
	/// Wake-up period while no update arrives on a subscription
	pub idle_wake_ms: u64,
}

/// Transaction observer settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ObserverSettings {
	pub enabled: bool,
}

/// The static candidate the registry starts with
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SeedSettings {
	pub source: String,
	/// Defaults to `source`
	pub destination: Option<String>,
	pub currency: String,
	/// Absent for the native currency
	pub issuer: Option<String>,
	pub deliver_value: String,
	pub send_max_value: String,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
	pub level: String,
	pub format: LogFormat,
	pub structured: bool,
}

/// Log format options
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	Json,
	Pretty,
	Compact,
}

/// Validation errors for loaded settings
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
	#[error("pool.size must be greater than zero")]
	EmptyPool,

	#[error("pool.max_churn must be greater than zero")]
	ZeroMaxChurn,

	#[error("{field} must be greater than zero")]
	ZeroInterval { field: &'static str },

	#[error("Invalid seed candidate: {reason}")]
	InvalidSeed { reason: String },
}

impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			ws_url: None,
			connect_timeout_ms: 10_000,
		}
	}
}

impl Default for PoolSettings {
	fn default() -> Self {
		Self {
			size: 256,
			churn_interval_ms: 2_000,
			max_churn: 16,
			exhaustion_policy: ExhaustionPolicy::Skip,
		}
	}
}

impl Default for WorkerSettings {
	fn default() -> Self {
		Self {
			idle_wake_ms: 5_000,
		}
	}
}

impl Default for ObserverSettings {
	fn default() -> Self {
		Self { enabled: true }
	}
}

impl Default for SeedSettings {
	fn default() -> Self {
		Self {
			source: "r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59".to_string(),
			destination: None,
			currency: "USD".to_string(),
			issuer: Some("rvYAfWj5gh67oV6fW32ZzP3Aw4Eubs59B".to_string()),
			deliver_value: "0.001".to_string(),
			send_max_value: "1".to_string(),
		}
	}
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Compact,
			structured: false,
		}
	}
}

impl PoolSettings {
	pub fn churn_interval(&self) -> Duration {
		Duration::from_millis(self.churn_interval_ms)
	}
}

impl WorkerSettings {
	pub fn idle_wake(&self) -> Duration {
		Duration::from_millis(self.idle_wake_ms)
	}
}

impl ServerSettings {
	pub fn connect_timeout(&self) -> Duration {
		Duration::from_millis(self.connect_timeout_ms)
	}
}

impl SeedSettings {
	/// Build the seed candidate; deliver and send-max use the same asset
	pub fn to_candidate(&self) -> Result<PathCandidate, ConfigValidationError> {
		let invalid = |reason: String| ConfigValidationError::InvalidSeed { reason };

		if self.source.is_empty() {
			return Err(invalid("source account is empty".to_string()));
		}
		let source = Account::new(self.source.as_str());
		let destination = match &self.destination {
			Some(destination) if !destination.is_empty() => Account::new(destination.as_str()),
			_ => source.clone(),
		};

		let deliver_value =
			parse_decimal(&self.deliver_value).map_err(|e| invalid(e.to_string()))?;
		let send_max_value =
			parse_decimal(&self.send_max_value).map_err(|e| invalid(e.to_string()))?;

		let deliver = match self.issuer.as_deref() {
			Some(issuer) if !issuer.is_empty() => {
				Asset::issued(self.currency.as_str(), Account::new(issuer), deliver_value)
			},
			_ if self.currency.is_empty() || self.currency == NATIVE_CURRENCY => {
				Asset::native(deliver_value)
			},
			_ => {
				return Err(invalid(format!(
					"currency '{}' requires an issuer",
					self.currency
				)))
			},
		};
		let send_max = deliver.with_value(send_max_value);

		Ok(PathCandidate::new(source, destination, deliver, send_max))
	}
}

impl Settings {
	/// Check settings for values the supervisor cannot run with
	pub fn validate(&self) -> Result<(), ConfigValidationError> {
		if self.pool.size == 0 {
			return Err(ConfigValidationError::EmptyPool);
		}
		if self.pool.max_churn == 0 {
			return Err(ConfigValidationError::ZeroMaxChurn);
		}
		if self.pool.churn_interval_ms == 0 {
			return Err(ConfigValidationError::ZeroInterval {
				field: "pool.churn_interval_ms",
			});
		}
		if self.worker.idle_wake_ms == 0 {
			return Err(ConfigValidationError::ZeroInterval {
				field: "worker.idle_wake_ms",
			});
		}
		if self.server.connect_timeout_ms == 0 {
			return Err(ConfigValidationError::ZeroInterval {
				field: "server.connect_timeout_ms",
			});
		}
		self.seed.to_candidate()?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use churn_types::AssetKey;

	#[test]
	fn test_defaults_are_valid() {
		let settings = Settings::default();
		assert_eq!(settings.pool.size, 256);
		assert_eq!(settings.pool.max_churn, 16);
		assert_eq!(settings.pool.churn_interval(), Duration::from_secs(2));
		assert_eq!(settings.worker.idle_wake(), Duration::from_secs(5));
		assert_eq!(settings.pool.exhaustion_policy, ExhaustionPolicy::Skip);
		assert!(settings.validate().is_ok());
	}

	#[test]
	fn test_default_seed_is_self_payment() {
		let seed = SeedSettings::default().to_candidate().unwrap();
		assert_eq!(seed.source, seed.destination);
		assert_eq!(seed.deliver_amount.key(), seed.send_max_amount.key());
		assert_eq!(seed.deliver_amount.value.to_string(), "0.001");
		assert_eq!(seed.send_max_amount.value.to_string(), "1");
	}

	#[test]
	fn test_native_seed() {
		let seed = SeedSettings {
			currency: "XRP".to_string(),
			issuer: None,
			..SeedSettings::default()
		}
		.to_candidate()
		.unwrap();
		assert!(seed.deliver_amount.is_native() && seed.send_max_amount.is_native());
		assert_eq!(
			seed.deliver_amount.key(),
			AssetKey {
				currency: "XRP".to_string(),
				issuer: None
			}
		);
	}

	#[test]
	fn test_invalid_settings() {
		let mut settings = Settings::default();
		settings.pool.size = 0;
		assert_eq!(settings.validate(), Err(ConfigValidationError::EmptyPool));

		let mut settings = Settings::default();
		settings.pool.max_churn = 0;
		assert_eq!(settings.validate(), Err(ConfigValidationError::ZeroMaxChurn));

		let mut settings = Settings::default();
		settings.worker.idle_wake_ms = 0;
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::ZeroInterval { .. })
		));

		let mut settings = Settings::default();
		settings.seed.deliver_value = "lots".to_string();
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::InvalidSeed { .. })
		));

		let mut settings = Settings::default();
		settings.seed.issuer = None;
		assert!(matches!(
			settings.validate(),
			Err(ConfigValidationError::InvalidSeed { .. })
		));
	}

	#[test]
	fn test_partial_deserialization_uses_defaults() {
		let settings: Settings = serde_json::from_str(
			r#"{ "pool": { "size": 4, "exhaustion_policy": "reseed" }, "logging": { "format": "json" } }"#,
		)
		.unwrap();
		assert_eq!(settings.pool.size, 4);
		assert_eq!(settings.pool.max_churn, 16);
		assert_eq!(settings.pool.exhaustion_policy, ExhaustionPolicy::Reseed);
		assert_eq!(settings.logging.format, LogFormat::Json);
		assert_eq!(settings.logging.level, "info");
		assert!(settings.observer.enabled);
	}
}
