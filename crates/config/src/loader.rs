//! Configuration loading utilities

use crate::{ConfigValidationError, Settings};
use config::{Config, ConfigError, File};
use std::path::Path;
use thiserror::Error;

/// Default config file location, extension resolved by the `config` crate
pub const DEFAULT_CONFIG_PATH: &str = "config/config";

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum ConfigLoadError {
	#[error("Failed to read configuration: {0}")]
	Source(#[from] ConfigError),

	#[error("Invalid configuration: {0}")]
	Validation(#[from] ConfigValidationError),
}

/// Load configuration from the default config file, falling back to defaults
/// for anything the file leaves out
pub fn load_config() -> Result<Settings, ConfigLoadError> {
	load(File::with_name(DEFAULT_CONFIG_PATH).required(false))
}

/// Load configuration from an explicit file, which must exist
pub fn load_config_from(path: &Path) -> Result<Settings, ConfigLoadError> {
	load(File::from(path).required(true))
}

fn load<S>(source: S) -> Result<Settings, ConfigLoadError>
where
	S: config::Source + Send + Sync + 'static,
{
	let s = Config::builder().add_source(source).build()?;
	let settings: Settings = s.try_deserialize()?;
	settings.validate()?;
	Ok(settings)
}
