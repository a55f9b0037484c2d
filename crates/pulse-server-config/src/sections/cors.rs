// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cross-origin configuration.

use serde::Deserialize;

/// Allowed origins. Only enforced in production; other environments are
/// permissive.
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
	pub allowed_origins: Vec<String>,
}

impl CorsConfig {
	pub fn allows_any_origin(&self) -> bool {
		self.allowed_origins.iter().any(|o| o == "*")
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfigLayer {
	#[serde(default)]
	pub allowed_origins: Option<Vec<String>>,
}

impl CorsConfigLayer {
	pub fn merge(&mut self, other: CorsConfigLayer) {
		if other.allowed_origins.is_some() {
			self.allowed_origins = other.allowed_origins;
		}
	}

	pub fn finalize(self) -> CorsConfig {
		CorsConfig {
			allowed_origins: self
				.allowed_origins
				.unwrap_or_default()
				.into_iter()
				.map(|o| o.trim().trim_end_matches('/').to_string())
				.filter(|o| !o.is_empty())
				.collect(),
		}
	}
}
