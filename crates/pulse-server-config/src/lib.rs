// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Pulse server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`PULSE_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use pulse_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}:{}", config.http.host, config.http.port);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub realtime: RealtimeConfig,
	pub cors: CorsConfig,
	pub health: HealthConfig,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub admin: AdminConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`PULSE_SERVER_*`)
/// 2. Config file (`/etc/pulse/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![Box::new(EnvSource)])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge sources in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		http: layer.http.unwrap_or_default().finalize(),
		realtime: layer.realtime.unwrap_or_default().finalize(),
		cors: layer.cors.unwrap_or_default().finalize(),
		health: layer.health.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
		admin: layer.admin.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		host = %config.http.host,
		port = config.http.port,
		environment = %config.http.environment,
		ws_path = %config.realtime.path,
		persistent = config.database.url.is_some(),
		admin_configured = config.admin.is_configured(),
		"Server configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
pub fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.http.is_production() && config.cors.allows_any_origin() {
		return Err(ConfigError::Validation(
			"PULSE_SERVER_CORS_ALLOWED_ORIGINS contains '*' while PULSE_SERVER_ENV=production. \
			 List the allowed origins explicitly."
				.to_string(),
		));
	}

	if !config.realtime.path.starts_with('/') {
		return Err(ConfigError::InvalidValue {
			key: "realtime.path".to_string(),
			message: format!("must start with '/', got '{}'", config.realtime.path),
		});
	}

	if config.realtime.outbound_capacity == 0 {
		return Err(ConfigError::InvalidValue {
			key: "realtime.outbound_capacity".to_string(),
			message: "must be greater than zero".to_string(),
		});
	}

	if config.realtime.max_connections == 0 {
		return Err(ConfigError::InvalidValue {
			key: "realtime.max_connections".to_string(),
			message: "must be greater than zero".to_string(),
		});
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	struct FixedSource(Precedence, fn() -> ServerConfigLayer);

	impl ConfigSource for FixedSource {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.0
		}

		fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
			Ok((self.1)())
		}
	}

	fn port_layer(port: u16) -> ServerConfigLayer {
		ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(port),
				..Default::default()
			}),
			..Default::default()
		}
	}

	#[test]
	fn test_higher_precedence_wins_regardless_of_order() {
		let config = load_from_sources(vec![
			Box::new(FixedSource(Precedence::Environment, || port_layer(7000))),
			Box::new(FixedSource(Precedence::ConfigFile, || port_layer(6000))),
			Box::new(DefaultsSource),
		])
		.unwrap();
		assert_eq!(config.http.port, 7000);
	}

	#[test]
	fn test_file_overrides_defaults() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[health]
max_consecutive_failures = 5

[logging]
level = "debug"
"#
		)
		.unwrap();

		let config = load_from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
		])
		.unwrap();
		assert_eq!(config.health.max_consecutive_failures, 5);
		assert_eq!(config.health.grace_period_secs, 300);
		assert_eq!(config.logging.level, "debug");
	}

	#[test]
	fn test_production_wildcard_cors_rejected() {
		let config = ServerConfig {
			http: HttpConfig {
				environment: "production".to_string(),
				..Default::default()
			},
			cors: CorsConfig {
				allowed_origins: vec!["*".to_string()],
			},
			..Default::default()
		};
		let result = validate_config(&config);
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_development_wildcard_cors_ok() {
		let config = ServerConfig {
			cors: CorsConfig {
				allowed_origins: vec!["*".to_string()],
			},
			..Default::default()
		};
		assert!(validate_config(&config).is_ok());
	}

	#[test]
	fn test_ws_path_must_be_absolute() {
		let config = ServerConfig {
			realtime: RealtimeConfig {
				path: "ws".to_string(),
				..Default::default()
			},
			..Default::default()
		};
		assert!(validate_config(&config).is_err());
	}

	#[test]
	fn test_socket_addr() {
		let config = ServerConfig {
			http: HttpConfig {
				host: "127.0.0.1".to_string(),
				port: 9000,
				..Default::default()
			},
			..Default::default()
		};
		assert_eq!(config.socket_addr(), "127.0.0.1:9000");
	}
}
