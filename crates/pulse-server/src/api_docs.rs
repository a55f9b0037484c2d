// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI document for the Pulse HTTP API.

use pulse_server_api::{
	AdminHealthResponse, AdminJob, ErrorResponse, FailureReasonApi, JobDetailResponse,
	JobStatusApi, LastStatusApi, LivenessResponse, PublicHealthResponse, PublicJob, PublicStats,
	ReportRunRequest, ReportStatusApi,
};
use utoipa::{
	openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
	Modify, OpenApi,
};

use crate::{routes, websocket};

#[derive(OpenApi)]
#[openapi(
	info(
		title = "Pulse Server API",
		description = "Job health reporting and real-time event transport"
	),
	paths(
		routes::health::liveness,
		routes::cron_health::public_summary,
		routes::cron_health::admin_summary,
		routes::cron_health::job_detail,
		routes::cron_health::report_run,
		websocket::handler::ws_upgrade_handler,
	),
	components(schemas(
		AdminHealthResponse,
		AdminJob,
		ErrorResponse,
		FailureReasonApi,
		JobDetailResponse,
		JobStatusApi,
		LastStatusApi,
		LivenessResponse,
		PublicHealthResponse,
		PublicJob,
		PublicStats,
		ReportRunRequest,
		ReportStatusApi,
	)),
	modifiers(&AdminTokenSecurity),
	tags(
		(name = "health", description = "Liveness"),
		(name = "cron-health", description = "Background job health"),
		(name = "realtime", description = "WebSocket event transport")
	)
)]
pub struct ApiDoc;

struct AdminTokenSecurity;

impl Modify for AdminTokenSecurity {
	fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
		let components = openapi.components.get_or_insert_with(Default::default);
		components.add_security_scheme(
			"admin_token",
			SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
		);
	}
}
