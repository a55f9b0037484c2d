// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Liveness HTTP handler.

use axum::Json;
use chrono::Utc;
use pulse_server_api::LivenessResponse;

#[utoipa::path(
	get,
	path = "/health",
	responses(
		(status = 200, description = "Server is running", body = LivenessResponse)
	),
	tag = "health"
)]
/// GET /health - Liveness check.
pub async fn liveness() -> Json<LivenessResponse> {
	Json(LivenessResponse::ok(env!("CARGO_PKG_VERSION"), Utc::now()))
}
