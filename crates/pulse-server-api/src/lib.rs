// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request and response types for the Pulse HTTP API.

pub mod common;
pub mod cron_health;

pub use common::{ErrorResponse, LivenessResponse};
pub use cron_health::{
	admin_view, job_detail, public_view, AdminHealthResponse, AdminJob, FailureReasonApi,
	JobDetailResponse, JobStatusApi, LastStatusApi, PublicHealthResponse, PublicJob, PublicStats,
	ReportRunRequest, ReportStatusApi,
};
