// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod admin;
mod cors;
mod database;
mod health;
mod http;
mod logging;
mod realtime;

pub use admin::{AdminConfig, AdminConfigLayer};
pub use cors::{CorsConfig, CorsConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use health::{HealthConfig, HealthConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use realtime::{RealtimeConfig, RealtimeConfigLayer};
