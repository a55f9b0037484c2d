// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job health registry for Pulse server.
//!
//! Background job runners report each run outcome here; HTTP handlers query
//! per-job health and the aggregate summary. Records live in memory and are
//! optionally written through to SQLite so they survive restarts.

pub mod error;
pub mod pool;
pub mod registry;
pub mod repository;

pub use error::RepositoryError;
pub use pool::{create_pool, run_migrations};
pub use registry::JobHealthRegistry;
pub use repository::{JobRecordRepository, SqliteJobRecordRepository};

pub use pulse_health_core::{
	HealthError, HealthState, HealthSummary, HealthThresholds, JobHealth, JobRunRecord, Result,
	RunOutcome, RunReport, RunStatus,
};
