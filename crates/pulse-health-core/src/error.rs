// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for job health operations.

use thiserror::Error;

/// Result type for job health operations.
pub type Result<T> = std::result::Result<T, HealthError>;

/// Errors that can occur in job health operations.
#[derive(Debug, Error)]
pub enum HealthError {
	/// The job has never reported and was never registered.
	#[error("Job '{0}' not found")]
	NotFound(String),

	#[error("job name must not be empty")]
	InvalidJobName,

	#[error("storage error: {0}")]
	Storage(String),

	#[error("internal error: {0}")]
	Internal(String),
}

impl HealthError {
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound(_))
	}
}
