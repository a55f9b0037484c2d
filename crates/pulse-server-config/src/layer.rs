// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration as produced by a single source.

use serde::Deserialize;

use crate::sections::{
	AdminConfigLayer, CorsConfigLayer, DatabaseConfigLayer, HealthConfigLayer, HttpConfigLayer,
	LoggingConfigLayer, RealtimeConfigLayer,
};

/// One source's view of the configuration. Sections a source does not set
/// are `None` and leave lower-precedence values untouched when merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub realtime: Option<RealtimeConfigLayer>,
	#[serde(default)]
	pub cors: Option<CorsConfigLayer>,
	#[serde(default)]
	pub health: Option<HealthConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub admin: Option<AdminConfigLayer>,
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(existing), Some(incoming)) => merge(existing, incoming),
		(None, Some(incoming)) => *base = Some(incoming),
		(_, None) => {}
	}
}

impl ServerConfigLayer {
	/// Overlay `other` on top of `self`; values set in `other` win.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.realtime, other.realtime, RealtimeConfigLayer::merge);
		merge_section(&mut self.cors, other.cors, CorsConfigLayer::merge);
		merge_section(&mut self.health, other.health, HealthConfigLayer::merge);
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_section(&mut self.admin, other.admin, AdminConfigLayer::merge);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_fills_missing_sections() {
		let mut base = ServerConfigLayer::default();
		let overlay = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(9000),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(overlay);
		assert_eq!(base.http.unwrap().port, Some(9000));
	}

	#[test]
	fn test_merge_keeps_unset_fields() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: Some("127.0.0.1".to_string()),
				port: Some(8080),
				..Default::default()
			}),
			..Default::default()
		};
		let overlay = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(9000),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(overlay);
		let http = base.http.unwrap();
		assert_eq!(http.host.as_deref(), Some("127.0.0.1"));
		assert_eq!(http.port, Some(9000));
	}

	#[test]
	fn test_deserialize_partial_toml() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
[health]
grace_period_secs = 600

[realtime]
path = "/events"
"#,
		)
		.unwrap();
		assert_eq!(layer.health.unwrap().grace_period_secs, Some(600));
		assert_eq!(layer.realtime.unwrap().path.as_deref(), Some("/events"));
		assert!(layer.http.is_none());
	}
}
