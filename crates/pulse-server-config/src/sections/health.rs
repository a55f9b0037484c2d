// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job health classification thresholds.

use serde::Deserialize;

const DEFAULT_GRACE_PERIOD_SECS: u64 = 300;
const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;
const DEFAULT_ACTIVE_WINDOW_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthConfig {
	pub grace_period_secs: u64,
	pub max_consecutive_failures: u32,
	pub active_window_secs: u64,
}

impl Default for HealthConfig {
	fn default() -> Self {
		HealthConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthConfigLayer {
	#[serde(default)]
	pub grace_period_secs: Option<u64>,
	#[serde(default)]
	pub max_consecutive_failures: Option<u32>,
	#[serde(default)]
	pub active_window_secs: Option<u64>,
}

impl HealthConfigLayer {
	pub fn merge(&mut self, other: HealthConfigLayer) {
		if other.grace_period_secs.is_some() {
			self.grace_period_secs = other.grace_period_secs;
		}
		if other.max_consecutive_failures.is_some() {
			self.max_consecutive_failures = other.max_consecutive_failures;
		}
		if other.active_window_secs.is_some() {
			self.active_window_secs = other.active_window_secs;
		}
	}

	pub fn finalize(self) -> HealthConfig {
		HealthConfig {
			grace_period_secs: self.grace_period_secs.unwrap_or(DEFAULT_GRACE_PERIOD_SECS),
			max_consecutive_failures: self
				.max_consecutive_failures
				.unwrap_or(DEFAULT_MAX_CONSECUTIVE_FAILURES),
			active_window_secs: self.active_window_secs.unwrap_or(DEFAULT_ACTIVE_WINDOW_SECS),
		}
	}
}
