// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router.

use std::sync::Arc;

use axum::{
	middleware::from_fn_with_state,
	routing::{get, post},
	Router,
};
use chrono::Duration;
use pulse_health_core::{HealthError, HealthThresholds};
use pulse_server_config::{HealthConfig, RealtimeConfig, ServerConfig};
use pulse_server_events::{register_room_handlers, BrokerConfig, EventBroker};
use pulse_server_health::{JobHealthRegistry, JobRecordRepository};

use crate::{
	auth::{require_admin, AdminAuthorizer, BearerTokenAuthorizer},
	routes, websocket,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
	pub registry: Arc<JobHealthRegistry>,
	pub broker: EventBroker,
	pub authorizer: Arc<dyn AdminAuthorizer>,
	pub realtime: Arc<RealtimeConfig>,
}

pub fn health_thresholds(config: &HealthConfig) -> HealthThresholds {
	HealthThresholds {
		grace_period: seconds(config.grace_period_secs),
		max_consecutive_failures: config.max_consecutive_failures,
		active_window: seconds(config.active_window_secs),
	}
}

fn seconds(secs: u64) -> Duration {
	i64::try_from(secs)
		.ok()
		.and_then(Duration::try_seconds)
		.unwrap_or(Duration::MAX)
}

pub fn broker_config(config: &RealtimeConfig) -> BrokerConfig {
	BrokerConfig {
		outbound_capacity: config.outbound_capacity,
		max_connections: config.max_connections,
	}
}

/// Build the shared state: the job health registry (hydrated from
/// `repository` when given), the event broker with the room handlers bound,
/// and the admin authorizer.
pub async fn create_app_state(
	config: &ServerConfig,
	repository: Option<Arc<dyn JobRecordRepository>>,
) -> Result<AppState, HealthError> {
	let thresholds = health_thresholds(&config.health);
	let registry = match repository {
		Some(repository) => JobHealthRegistry::with_repository(thresholds, repository),
		None => JobHealthRegistry::new(thresholds),
	};

	let loaded = registry.load().await?;
	tracing::info!(
		loaded_jobs = loaded,
		persistent = registry.is_persistent(),
		"Job health registry ready"
	);

	let broker = EventBroker::new(broker_config(&config.realtime));
	register_room_handlers(&broker).await;

	Ok(AppState {
		registry: Arc::new(registry),
		broker,
		authorizer: Arc::new(BearerTokenAuthorizer::new(config.admin.token.clone())),
		realtime: Arc::new(config.realtime.clone()),
	})
}

fn admin_routes(state: AppState) -> Router<AppState> {
	Router::new()
		.route("/cron-health", get(routes::cron_health::admin_summary))
		.route("/cron-health/{job_name}", get(routes::cron_health::job_detail))
		.route(
			"/cron-health/{job_name}/runs",
			post(routes::cron_health::report_run),
		)
		.route_layer(from_fn_with_state(state, require_admin))
}

pub fn create_router(state: AppState) -> Router {
	let ws_path = state.realtime.path.clone();

	Router::new()
		.route("/health", get(routes::health::liveness))
		.route("/health/cron", get(routes::cron_health::public_summary))
		.route("/api/openapi.json", get(routes::docs::openapi_json))
		.route(&ws_path, get(websocket::ws_upgrade_handler))
		.nest("/api/admin", admin_routes(state.clone()))
		.with_state(state)
}
