// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Pulse job health tracking.
//!
//! This crate holds the pieces shared by the registry, the HTTP façade and any
//! job runner that reports outcomes:
//! - [`JobRunRecord`]: the single current record kept per job name
//! - [`RunReport`]: what a runner submits after each execution
//! - [`classify`]: the healthy/failing and active rules, evaluated at query time

pub mod error;
pub mod health;
pub mod record;

pub use error::{HealthError, Result};
pub use health::{
	classify, failure_reasons, is_active, FailureReason, HealthState, HealthSummary,
	HealthThresholds, JobHealth,
};
pub use record::{JobRunRecord, RunOutcome, RunReport, RunStatus};
