// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pulse server.
//!
//! Serves job health over HTTP (a public summary and an admin API) and carries
//! real-time events between clients over WebSocket.

pub mod api;
pub mod api_docs;
pub mod auth;
pub mod cors;
pub mod error;
pub mod routes;
pub mod websocket;

pub use api::{create_app_state, create_router, AppState};
pub use api_docs::ApiDoc;
pub use auth::{AdminAuthorizer, BearerTokenAuthorizer};
pub use error::ServerError;
pub use pulse_server_config::ServerConfig;
