// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admin authorization for the `/api/admin` routes.

use async_trait::async_trait;
use axum::{
	extract::{Request, State},
	http::{header::AUTHORIZATION, HeaderMap},
	middleware::Next,
	response::{IntoResponse, Response},
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::{api::AppState, error::ServerError};

/// Decides whether a request may use the admin API.
#[async_trait]
pub trait AdminAuthorizer: Send + Sync {
	async fn authorize(&self, headers: &HeaderMap) -> bool;
}

/// Accepts `Authorization: Bearer <token>` matching a shared admin token.
/// Rejects everything when no token is configured.
pub struct BearerTokenAuthorizer {
	token: Option<SecretString>,
}

impl BearerTokenAuthorizer {
	pub fn new(token: Option<SecretString>) -> Self {
		Self { token }
	}
}

#[async_trait]
impl AdminAuthorizer for BearerTokenAuthorizer {
	async fn authorize(&self, headers: &HeaderMap) -> bool {
		let Some(expected) = &self.token else {
			return false;
		};

		bearer_token(headers).is_some_and(|presented| {
			let expected_bytes = expected.expose_secret().as_bytes();
			expected_bytes.ct_eq(presented.as_bytes()).into()
		})
	}
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
	let (scheme, token) = value.split_once(' ')?;
	if !scheme.eq_ignore_ascii_case("bearer") {
		return None;
	}
	let token = token.trim();
	(!token.is_empty()).then_some(token)
}

/// Middleware that rejects requests the configured [`AdminAuthorizer`] denies.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
	if state.authorizer.authorize(request.headers()).await {
		return next.run(request).await;
	}

	warn!(
		method = %request.method(),
		path = %request.uri().path(),
		"Rejected unauthorized admin request"
	);
	ServerError::Unauthorized.into_response()
}
