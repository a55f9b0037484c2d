// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ErrorResponse {
	pub success: bool,
	pub error: String,
}

impl ErrorResponse {
	pub fn new(error: impl Into<String>) -> Self {
		Self {
			success: false,
			error: error.into(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LivenessResponse {
	pub status: String,
	pub timestamp: DateTime<Utc>,
	pub version: String,
}

impl LivenessResponse {
	pub fn ok(version: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
		Self {
			status: "ok".to_string(),
			timestamp,
			version: version.into(),
		}
	}
}
