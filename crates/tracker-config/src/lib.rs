//! Configuration module for the order tracker.
//!
//! This module provides structures and utilities for managing tracker
//! configuration. It supports loading configuration from TOML files and
//! validates that the selected storage backend is actually configured.
//! Every section is optional; a missing file yields a default
//! configuration (file storage under `./data`, no HTTP API).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracker_types::{Settings, SettingsPatch};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the order tracker.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for the HTTP lookup API.
	pub api: Option<ApiConfig>,
	/// First-run seed for the stored settings object.
	pub defaults: DefaultsConfig,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

impl Default for StorageConfig {
	fn default() -> Self {
		let mut implementations = HashMap::new();
		implementations.insert("file".to_string(), toml::Value::Table(toml::map::Map::new()));
		Self {
			primary: "file".to_string(),
			implementations,
		}
	}
}

/// Configuration for the HTTP lookup API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server should be started.
	#[serde(default = "default_api_enabled")]
	pub enabled: bool,
	/// Host to bind to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			enabled: default_api_enabled(),
			host: default_api_host(),
			port: default_api_port(),
		}
	}
}

fn default_api_enabled() -> bool {
	true
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	8080
}

/// Seed values for the settings object, applied only when no settings
/// have been stored yet. Later edits go through the settings command and
/// are persisted; this section never overrides them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DefaultsConfig {
	pub brand: Option<String>,
	pub prefix: Option<String>,
	pub admin_pin: Option<String>,
}

impl DefaultsConfig {
	/// Builds the first-run settings from this seed, falling back to the
	/// built-in defaults for fields the seed leaves out.
	pub fn seed_settings(&self) -> Settings {
		Settings::default().with_patch(SettingsPatch {
			brand: self.brand.clone(),
			prefix: self.prefix.clone(),
			admin_pin: self.admin_pin.clone(),
		})
	}
}

impl Config {
	/// Parses a configuration from TOML text and validates it.
	pub fn from_str(content: &str) -> Result<Self, ConfigError> {
		let config: Config = toml::from_str(content)?;
		config.validate()?;
		Ok(config)
	}

	/// Loads a configuration from a TOML file.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		Self::from_str(&content)
	}

	/// Loads a configuration from a TOML file without blocking.
	pub async fn from_file_async<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path).await?;
		Self::from_str(&content)
	}

	/// Checks internal consistency: the primary storage backend must have
	/// a configuration table.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"storage.primary must not be empty".to_string(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"storage.primary '{}' has no [storage.implementations.{}] section",
				self.storage.primary, self.storage.primary
			)));
		}
		Ok(())
	}

	/// Returns the configuration table of the primary storage backend.
	pub fn primary_storage_config(&self) -> &toml::Value {
		// validate() guarantees the entry exists for parsed configs; the
		// Default impl seeds it as well.
		self.storage
			.implementations
			.get(&self.storage.primary)
			.expect("primary storage implementation is configured")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn test_default_config_uses_file_storage() {
		let config = Config::default();
		assert_eq!(config.storage.primary, "file");
		assert!(config.api.is_none());
		assert!(config
			.storage
			.implementations
			.contains_key(&config.storage.primary));
	}

	#[test]
	fn test_parse_full_config() {
		let config = Config::from_str(
			r#"
[storage]
primary = "file"

[storage.implementations.file]
storage_path = "/tmp/tracker"

[api]
host = "0.0.0.0"
port = 9090

[defaults]
brand = "MYSHOP"
prefix = "msx"
admin_pin = "1357"
"#,
		)
		.unwrap();

		assert_eq!(config.storage.primary, "file");
		let api = config.api.unwrap();
		assert!(api.enabled);
		assert_eq!(api.host, "0.0.0.0");
		assert_eq!(api.port, 9090);

		let settings = config.defaults.seed_settings();
		assert_eq!(settings.brand, "MYSHOP");
		// The prefix seed is normalized like any other prefix write.
		assert_eq!(settings.prefix, "MSX");
		assert_eq!(settings.admin_pin, "1357");
	}

	#[test]
	fn test_empty_config_is_default() {
		let config = Config::from_str("").unwrap();
		assert_eq!(config.storage.primary, "file");
		assert!(config.defaults.brand.is_none());
		assert_eq!(config.defaults.seed_settings(), Settings::default());
	}

	#[test]
	fn test_unconfigured_primary_is_rejected() {
		let result = Config::from_str(
			r#"
[storage]
primary = "redis"

[storage.implementations.file]
"#,
		);
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_from_file() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("tracker.toml");
		std::fs::write(
			&path,
			r#"
[storage]
primary = "memory"

[storage.implementations.memory]
"#,
		)
		.unwrap();

		let config = Config::from_file(&path).unwrap();
		assert_eq!(config.storage.primary, "memory");
	}

	#[tokio::test]
	async fn test_from_file_async_missing_is_io_error() {
		let result = Config::from_file_async("definitely-not-here.toml").await;
		assert!(matches!(result, Err(ConfigError::Io(_))));
	}
}
