// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use pulse_health_core::HealthError;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Internal: {0}")]
	Internal(String),
}

impl From<RepositoryError> for HealthError {
	fn from(err: RepositoryError) -> Self {
		HealthError::Storage(err.to_string())
	}
}
