// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use secrecy::SecretString;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AdminConfigLayer, CorsConfigLayer, DatabaseConfigLayer, HealthConfigLayer, HttpConfigLayer,
	LogFormat, LoggingConfigLayer, RealtimeConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/pulse/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: PULSE_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			realtime: Some(load_realtime_from_env()?),
			cors: Some(load_cors_from_env()),
			health: Some(load_health_from_env()?),
			database: Some(load_database_from_env()),
			logging: Some(load_logging_from_env()?),
			admin: Some(load_admin_from_env()),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_u16(name: &str) -> Result<Option<u16>, ConfigError> {
	env_parse(name, "u16")
}

fn env_u32(name: &str) -> Result<Option<u32>, ConfigError> {
	env_parse(name, "u32")
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	env_parse(name, "u64")
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	env_parse(name, "usize")
}

fn env_list(name: &str) -> Option<Vec<String>> {
	env_var(name).map(|s| {
		s.split(',')
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	})
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("PULSE_SERVER_HOST"),
		port: env_u16("PULSE_SERVER_PORT")?,
		environment: env_var("PULSE_SERVER_ENV"),
	})
}

fn load_realtime_from_env() -> Result<RealtimeConfigLayer, ConfigError> {
	Ok(RealtimeConfigLayer {
		path: env_var("PULSE_SERVER_WS_PATH"),
		outbound_capacity: env_usize("PULSE_SERVER_WS_OUTBOUND_CAPACITY")?,
		max_connections: env_usize("PULSE_SERVER_WS_MAX_CONNECTIONS")?,
		ping_interval_secs: env_u64("PULSE_SERVER_WS_PING_INTERVAL_SECS")?,
	})
}

fn load_cors_from_env() -> CorsConfigLayer {
	CorsConfigLayer {
		allowed_origins: env_list("PULSE_SERVER_CORS_ALLOWED_ORIGINS"),
	}
}

fn load_health_from_env() -> Result<HealthConfigLayer, ConfigError> {
	Ok(HealthConfigLayer {
		grace_period_secs: env_u64("PULSE_SERVER_HEALTH_GRACE_PERIOD_SECS")?,
		max_consecutive_failures: env_u32("PULSE_SERVER_HEALTH_MAX_CONSECUTIVE_FAILURES")?,
		active_window_secs: env_u64("PULSE_SERVER_HEALTH_ACTIVE_WINDOW_SECS")?,
	})
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("PULSE_SERVER_DATABASE_URL"),
	}
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("PULSE_SERVER_LOG_FORMAT") {
		Some(v) => match v.to_lowercase().as_str() {
			"json" => Some(LogFormat::Json),
			"text" => Some(LogFormat::Text),
			_ => {
				return Err(ConfigError::InvalidValue {
					key: "PULSE_SERVER_LOG_FORMAT".to_string(),
					message: format!("expected 'text' or 'json', got '{v}'"),
				})
			}
		},
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("PULSE_SERVER_LOG_LEVEL"),
		format,
	})
}

fn load_admin_from_env() -> AdminConfigLayer {
	AdminConfigLayer {
		token: env_var("PULSE_SERVER_ADMIN_TOKEN").map(SecretString::from),
	}
}
