// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job health HTTP handlers.
//!
//! `/health/cron` is public and returns the redacted view. The admin handlers
//! sit behind [`crate::auth::require_admin`].

use axum::{
	extract::{rejection::JsonRejection, Path, State},
	Json,
};
use chrono::Utc;
use pulse_server_api::{
	admin_view, job_detail as job_detail_view, public_view, AdminHealthResponse, ErrorResponse,
	JobDetailResponse, PublicHealthResponse, ReportRunRequest,
};
use tracing::{info, instrument};

use crate::{api::AppState, error::ServerError};

#[utoipa::path(
	get,
	path = "/health/cron",
	responses(
		(status = 200, description = "Public job health summary", body = PublicHealthResponse),
		(status = 500, description = "Internal server error", body = ErrorResponse)
	),
	tag = "cron-health"
)]
#[instrument(skip(state))]
pub async fn public_summary(State(state): State<AppState>) -> Json<PublicHealthResponse> {
	let summary = state.registry.get_health_summary().await;
	Json(public_view(&summary))
}

#[utoipa::path(
	get,
	path = "/api/admin/cron-health",
	responses(
		(status = 200, description = "Full job health summary", body = AdminHealthResponse),
		(status = 401, description = "Missing or invalid admin token", body = ErrorResponse),
		(status = 500, description = "Internal server error", body = ErrorResponse)
	),
	security(("admin_token" = [])),
	tag = "cron-health"
)]
#[instrument(skip(state))]
pub async fn admin_summary(State(state): State<AppState>) -> Json<AdminHealthResponse> {
	let summary = state.registry.get_health_summary().await;
	Json(admin_view(&summary))
}

#[utoipa::path(
	get,
	path = "/api/admin/cron-health/{jobName}",
	params(
		("jobName" = String, Path, description = "Job name")
	),
	responses(
		(status = 200, description = "Job health detail", body = JobDetailResponse),
		(status = 401, description = "Missing or invalid admin token", body = ErrorResponse),
		(status = 404, description = "Job not found", body = ErrorResponse)
	),
	security(("admin_token" = [])),
	tag = "cron-health"
)]
#[instrument(skip(state))]
pub async fn job_detail(
	State(state): State<AppState>,
	Path(job_name): Path<String>,
) -> Result<Json<JobDetailResponse>, ServerError> {
	let health = state.registry.get_job_health(&job_name).await?;
	Ok(Json(job_detail_view(&health)))
}

#[utoipa::path(
	post,
	path = "/api/admin/cron-health/{jobName}/runs",
	params(
		("jobName" = String, Path, description = "Job name")
	),
	request_body = ReportRunRequest,
	responses(
		(status = 200, description = "Run recorded; returns updated job health", body = JobDetailResponse),
		(status = 400, description = "Invalid report", body = ErrorResponse),
		(status = 401, description = "Missing or invalid admin token", body = ErrorResponse),
		(status = 500, description = "Report could not be stored", body = ErrorResponse)
	),
	security(("admin_token" = [])),
	tag = "cron-health"
)]
#[instrument(skip(state, body))]
pub async fn report_run(
	State(state): State<AppState>,
	Path(job_name): Path<String>,
	body: Result<Json<ReportRunRequest>, JsonRejection>,
) -> Result<Json<JobDetailResponse>, ServerError> {
	let Json(request) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;

	let report = request.into_report(job_name.clone(), Utc::now());
	let record = state.registry.report_run(report).await?;
	info!(
		job_name = %record.job_name,
		status = %record.last_status,
		consecutive_failures = record.consecutive_failures,
		"Recorded job run"
	);

	let health = state.registry.get_job_health(&job_name).await?;
	Ok(Json(job_detail_view(&health)))
}
