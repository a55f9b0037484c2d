// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error type for HTTP handlers.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use pulse_health_core::HealthError;
use pulse_server_api::ErrorResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
	#[error("{0}")]
	NotFound(String),

	#[error("Unauthorized")]
	Unauthorized,

	#[error("{0}")]
	BadRequest(String),

	#[error("{0}")]
	Internal(String),
}

impl ServerError {
	pub fn status_code(&self) -> StatusCode {
		match self {
			ServerError::NotFound(_) => StatusCode::NOT_FOUND,
			ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
			ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<HealthError> for ServerError {
	fn from(err: HealthError) -> Self {
		match err {
			HealthError::NotFound(_) => ServerError::NotFound(err.to_string()),
			HealthError::InvalidJobName => ServerError::BadRequest(err.to_string()),
			HealthError::Storage(_) | HealthError::Internal(_) => {
				tracing::error!(error = %err, "Job health operation failed");
				ServerError::Internal("Internal server error".to_string())
			}
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		(status, Json(ErrorResponse::new(self.to_string()))).into_response()
	}
}
