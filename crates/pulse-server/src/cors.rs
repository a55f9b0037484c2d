// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! CORS policy for the HTTP router.

use axum::http::{header, HeaderValue, Method};
use pulse_server_config::{CorsConfig, HttpConfig};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Permissive outside production; in production only the configured origins
/// are allowed.
pub fn cors_layer(http: &HttpConfig, cors: &CorsConfig) -> CorsLayer {
	if !http.is_production() {
		return CorsLayer::new()
			.allow_origin(Any)
			.allow_methods(Any)
			.allow_headers(Any);
	}

	let origins: Vec<HeaderValue> = cors
		.allowed_origins
		.iter()
		.filter_map(|origin| match HeaderValue::from_str(origin) {
			Ok(value) => Some(value),
			Err(e) => {
				warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
				None
			}
		})
		.collect();

	CorsLayer::new()
		.allow_origin(AllowOrigin::list(origins))
		.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
		.allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::{body::Body, http::Request, routing::get, Router};
	use tower::ServiceExt;

	fn app(http: HttpConfig, cors: CorsConfig) -> Router {
		Router::new()
			.route("/health/cron", get(|| async { "ok" }))
			.layer(cors_layer(&http, &cors))
	}

	fn production() -> HttpConfig {
		HttpConfig {
			environment: "production".to_string(),
			..Default::default()
		}
	}

	async fn allow_origin_for(app: Router, origin: &str) -> Option<String> {
		let response = app
			.oneshot(
				Request::builder()
					.uri("/health/cron")
					.header(header::ORIGIN, origin)
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		response
			.headers()
			.get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
			.map(|v| v.to_str().unwrap().to_string())
	}

	#[tokio::test]
	async fn development_allows_any_origin() {
		let app = app(HttpConfig::default(), CorsConfig::default());
		let allowed = allow_origin_for(app, "http://localhost:5173").await;
		assert_eq!(allowed.as_deref(), Some("*"));
	}

	#[tokio::test]
	async fn production_allows_listed_origin_only() {
		let cors = CorsConfig {
			allowed_origins: vec!["https://status.example.com".to_string()],
		};

		let allowed = allow_origin_for(app(production(), cors.clone()), "https://status.example.com").await;
		assert_eq!(allowed.as_deref(), Some("https://status.example.com"));

		let denied = allow_origin_for(app(production(), cors), "https://evil.example.com").await;
		assert!(denied.is_none());
	}
}
