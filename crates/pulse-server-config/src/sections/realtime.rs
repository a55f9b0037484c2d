// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! WebSocket transport and event broker configuration.

use serde::Deserialize;

const DEFAULT_PATH: &str = "/ws";
const DEFAULT_OUTBOUND_CAPACITY: usize = 256;
const DEFAULT_MAX_CONNECTIONS: usize = 10_000;
const DEFAULT_PING_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct RealtimeConfig {
	pub path: String,
	pub outbound_capacity: usize,
	pub max_connections: usize,
	/// Zero disables server pings.
	pub ping_interval_secs: u64,
}

impl Default for RealtimeConfig {
	fn default() -> Self {
		RealtimeConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RealtimeConfigLayer {
	#[serde(default)]
	pub path: Option<String>,
	#[serde(default)]
	pub outbound_capacity: Option<usize>,
	#[serde(default)]
	pub max_connections: Option<usize>,
	#[serde(default)]
	pub ping_interval_secs: Option<u64>,
}

impl RealtimeConfigLayer {
	pub fn merge(&mut self, other: RealtimeConfigLayer) {
		if other.path.is_some() {
			self.path = other.path;
		}
		if other.outbound_capacity.is_some() {
			self.outbound_capacity = other.outbound_capacity;
		}
		if other.max_connections.is_some() {
			self.max_connections = other.max_connections;
		}
		if other.ping_interval_secs.is_some() {
			self.ping_interval_secs = other.ping_interval_secs;
		}
	}

	pub fn finalize(self) -> RealtimeConfig {
		RealtimeConfig {
			path: self.path.unwrap_or_else(|| DEFAULT_PATH.to_string()),
			outbound_capacity: self.outbound_capacity.unwrap_or(DEFAULT_OUTBOUND_CAPACITY),
			max_connections: self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
			ping_interval_secs: self.ping_interval_secs.unwrap_or(DEFAULT_PING_INTERVAL_SECS),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = RealtimeConfig::default();
		assert_eq!(config.path, "/ws");
		assert_eq!(config.outbound_capacity, 256);
		assert_eq!(config.max_connections, 10_000);
		assert_eq!(config.ping_interval_secs, 30);
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = RealtimeConfigLayer {
			path: Some("/ws".to_string()),
			ping_interval_secs: Some(30),
			..Default::default()
		};
		base.merge(RealtimeConfigLayer {
			ping_interval_secs: Some(0),
			..Default::default()
		});
		let config = base.finalize();
		assert_eq!(config.path, "/ws");
		assert_eq!(config.ping_interval_secs, 0);
	}
}
