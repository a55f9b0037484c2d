// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP tests for the job health endpoints.

use axum::{
	body::{to_bytes, Body},
	http::{header, Request, StatusCode},
	Router,
};
use chrono::{Duration, Utc};
use pulse_health_core::RunReport;
use pulse_server::{create_app_state, create_router, AppState, ServerConfig};
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "test-admin-token";

async fn setup(token: Option<&str>) -> (AppState, Router) {
	let mut config = ServerConfig::default();
	config.admin.token = token.map(SecretString::from);
	let state = create_app_state(&config, None).await.unwrap();
	let app = create_router(state.clone());
	(state, app)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
	let mut builder = Request::builder().uri(uri);
	if let Some(token) = token {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}
	builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
	let mut builder = Request::builder()
		.method("POST")
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/json");
	if let Some(token) = token {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}
	builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
	let response = app.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
	let body = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).unwrap()
	};
	(status, body)
}

#[tokio::test]
async fn unknown_job_returns_not_found_body() {
	let (_, app) = setup(Some(ADMIN_TOKEN)).await;

	let (status, body) = send(&app, get("/api/admin/cron-health/ghost-job", Some(ADMIN_TOKEN))).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(
		body,
		json!({"success": false, "error": "Job 'ghost-job' not found"})
	);
}

#[tokio::test]
async fn public_view_has_counts_and_redacted_jobs() {
	let (state, app) = setup(Some(ADMIN_TOKEN)).await;
	let now = Utc::now();
	state
		.registry
		.report_run(RunReport::success("cleanup", now).with_next_run(now + Duration::hours(1)))
		.await
		.unwrap();
	state
		.registry
		.report_run(RunReport::failure("backup", now).with_error("disk full"))
		.await
		.unwrap();

	let (status, body) = send(&app, get("/health/cron", None)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["success"], json!(true));
	assert_eq!(body["stats"]["totalJobs"], json!(2));
	assert_eq!(body["stats"]["healthyJobs"], json!(1));
	assert_eq!(body["stats"]["failingJobs"], json!(1));

	let jobs = body["jobs"].as_array().unwrap();
	assert_eq!(jobs.len(), 2);
	for job in jobs {
		assert!(job.get("consecutiveFailures").is_none());
		assert!(job.get("lastError").is_none());
	}
	assert!(!body.to_string().contains("disk full"));
}

#[tokio::test]
async fn empty_registry_reports_zero_jobs() {
	let (_, app) = setup(None).await;

	let (status, body) = send(&app, get("/health/cron", None)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(
		body["stats"],
		json!({"totalJobs": 0, "activeJobs": 0, "healthyJobs": 0, "failingJobs": 0})
	);
	assert_eq!(body["jobs"], json!([]));
}

#[tokio::test]
async fn admin_routes_require_bearer_token() {
	let (_, app) = setup(Some(ADMIN_TOKEN)).await;

	let (status, body) = send(&app, get("/api/admin/cron-health", None)).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body, json!({"success": false, "error": "Unauthorized"}));

	let (status, _) = send(&app, get("/api/admin/cron-health", Some("wrong"))).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);

	let (status, body) = send(&app, get("/api/admin/cron-health", Some(ADMIN_TOKEN))).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["success"], json!(true));
	assert_eq!(body["totalJobs"], json!(0));
}

#[tokio::test]
async fn admin_routes_closed_without_configured_token() {
	let (_, app) = setup(None).await;

	let (status, _) = send(&app, get("/api/admin/cron-health", Some(ADMIN_TOKEN))).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reported_failures_accumulate_and_success_resets() {
	let (_, app) = setup(Some(ADMIN_TOKEN)).await;
	let uri = "/api/admin/cron-health/nightly-sync/runs";

	for _ in 0..3 {
		let (status, _) = send(
			&app,
			post_json(uri, Some(ADMIN_TOKEN), json!({"status": "failure", "error": "timeout"})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
	}

	let (status, body) = send(&app, get("/api/admin/cron-health/nightly-sync", Some(ADMIN_TOKEN))).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["success"], json!(true));
	assert_eq!(body["job"]["status"], json!("failing"));
	assert_eq!(body["job"]["lastStatus"], json!("failure"));
	assert_eq!(body["job"]["consecutiveFailures"], json!(3));
	assert_eq!(body["job"]["lastError"], json!("timeout"));

	let next = (Utc::now() + Duration::hours(24)).to_rfc3339();
	let (status, body) = send(
		&app,
		post_json(
			uri,
			Some(ADMIN_TOKEN),
			json!({"status": "success", "nextScheduledRun": next}),
		),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["job"]["status"], json!("healthy"));
	assert_eq!(body["job"]["consecutiveFailures"], json!(0));
	assert_eq!(body["job"]["active"], json!(true));
}

#[tokio::test]
async fn malformed_report_is_bad_request() {
	let (state, app) = setup(Some(ADMIN_TOKEN)).await;

	let (status, body) = send(
		&app,
		post_json(
			"/api/admin/cron-health/backup/runs",
			Some(ADMIN_TOKEN),
			json!({"status": "sideways"}),
		),
	)
	.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["success"], json!(false));
	assert!(state.registry.job_names().await.is_empty());
}

#[tokio::test]
async fn report_endpoint_requires_admin() {
	let (state, app) = setup(Some(ADMIN_TOKEN)).await;

	let (status, _) = send(
		&app,
		post_json(
			"/api/admin/cron-health/backup/runs",
			None,
			json!({"status": "success"}),
		),
	)
	.await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert!(state.registry.job_names().await.is_empty());
}

#[tokio::test]
async fn liveness_reports_ok() {
	let (_, app) = setup(None).await;

	let (status, body) = send(&app, get("/health", None)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], json!("ok"));
	assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn openapi_document_is_served() {
	let (_, app) = setup(None).await;

	let (status, body) = send(&app, get("/api/openapi.json", None)).await;

	assert_eq!(status, StatusCode::OK);
	assert!(body["paths"].get("/health/cron").is_some());
}
