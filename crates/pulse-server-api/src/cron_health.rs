// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Public and admin views over the job health summary.
//!
//! The public view is built field by field into its own type so nothing
//! beyond name, status and run times can reach unauthenticated callers.

use chrono::{DateTime, Utc};
use pulse_health_core::{
	FailureReason, HealthState, HealthSummary, JobHealth, RunOutcome, RunReport, RunStatus,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum JobStatusApi {
	Healthy,
	Failing,
}

impl From<HealthState> for JobStatusApi {
	fn from(state: HealthState) -> Self {
		match state {
			HealthState::Healthy => JobStatusApi::Healthy,
			HealthState::Failing => JobStatusApi::Failing,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum LastStatusApi {
	Success,
	Failure,
	NeverRun,
}

impl From<RunStatus> for LastStatusApi {
	fn from(status: RunStatus) -> Self {
		match status {
			RunStatus::Success => LastStatusApi::Success,
			RunStatus::Failure => LastStatusApi::Failure,
			RunStatus::NeverRun => LastStatusApi::NeverRun,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum FailureReasonApi {
	LastRunFailed,
	MissedSchedule,
	ConsecutiveFailures,
	MalformedRecord,
}

impl From<FailureReason> for FailureReasonApi {
	fn from(reason: FailureReason) -> Self {
		match reason {
			FailureReason::LastRunFailed => FailureReasonApi::LastRunFailed,
			FailureReason::MissedSchedule => FailureReasonApi::MissedSchedule,
			FailureReason::ConsecutiveFailures => FailureReasonApi::ConsecutiveFailures,
			FailureReason::MalformedRecord => FailureReasonApi::MalformedRecord,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PublicStats {
	pub total_jobs: usize,
	pub active_jobs: usize,
	pub healthy_jobs: usize,
	pub failing_jobs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PublicJob {
	pub name: String,
	pub status: JobStatusApi,
	pub next_run: Option<DateTime<Utc>>,
	pub last_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PublicHealthResponse {
	pub success: bool,
	pub timestamp: DateTime<Utc>,
	pub stats: PublicStats,
	pub jobs: Vec<PublicJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AdminJob {
	pub name: String,
	pub status: JobStatusApi,
	pub active: bool,
	pub last_status: LastStatusApi,
	pub last_run: Option<DateTime<Utc>>,
	pub next_run: Option<DateTime<Utc>>,
	pub consecutive_failures: u32,
	pub last_error: Option<String>,
	pub reasons: Vec<FailureReasonApi>,
	pub updated_at: DateTime<Utc>,
}

impl From<&JobHealth> for AdminJob {
	fn from(health: &JobHealth) -> Self {
		let record = &health.record;
		Self {
			name: record.job_name.clone(),
			status: health.state.into(),
			active: health.active,
			last_status: record.last_status.into(),
			last_run: record.last_run_at,
			next_run: record.next_run_at,
			consecutive_failures: record.consecutive_failures,
			last_error: record.last_error.clone(),
			reasons: health.reasons.iter().copied().map(Into::into).collect(),
			updated_at: record.updated_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AdminHealthResponse {
	pub success: bool,
	pub timestamp: DateTime<Utc>,
	pub total_jobs: usize,
	pub active_jobs: usize,
	pub healthy_jobs: usize,
	pub failing_jobs: usize,
	pub jobs: Vec<AdminJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct JobDetailResponse {
	pub success: bool,
	pub job: AdminJob,
}

/// Outcome reported by a job runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ReportStatusApi {
	Success,
	Failure,
}

/// Body of `POST /api/admin/cron-health/{jobName}/runs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ReportRunRequest {
	pub status: ReportStatusApi,
	/// Defaults to the time the report is received.
	#[serde(default)]
	pub timestamp: Option<DateTime<Utc>>,
	#[serde(default)]
	pub next_scheduled_run: Option<DateTime<Utc>>,
	#[serde(default)]
	pub error: Option<String>,
}

impl ReportRunRequest {
	pub fn into_report(self, job_name: impl Into<String>, received_at: DateTime<Utc>) -> RunReport {
		let outcome = match self.status {
			ReportStatusApi::Success => RunOutcome::Success,
			ReportStatusApi::Failure => RunOutcome::Failure,
		};
		RunReport {
			job_name: job_name.into(),
			outcome,
			finished_at: self.timestamp.unwrap_or(received_at),
			next_run_at: self.next_scheduled_run,
			error: self.error,
		}
	}
}

pub fn public_view(summary: &HealthSummary) -> PublicHealthResponse {
	PublicHealthResponse {
		success: true,
		timestamp: summary.evaluated_at,
		stats: PublicStats {
			total_jobs: summary.total_jobs,
			active_jobs: summary.active_jobs,
			healthy_jobs: summary.healthy_jobs,
			failing_jobs: summary.failing_jobs,
		},
		jobs: summary
			.jobs
			.iter()
			.map(|health| PublicJob {
				name: health.record.job_name.clone(),
				status: health.state.into(),
				next_run: health.record.next_run_at,
				last_run: health.record.last_run_at,
			})
			.collect(),
	}
}

pub fn admin_view(summary: &HealthSummary) -> AdminHealthResponse {
	AdminHealthResponse {
		success: true,
		timestamp: summary.evaluated_at,
		total_jobs: summary.total_jobs,
		active_jobs: summary.active_jobs,
		healthy_jobs: summary.healthy_jobs,
		failing_jobs: summary.failing_jobs,
		jobs: summary.jobs.iter().map(AdminJob::from).collect(),
	}
}

pub fn job_detail(health: &JobHealth) -> JobDetailResponse {
	JobDetailResponse {
		success: true,
		job: AdminJob::from(health),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, TimeZone};
	use pulse_health_core::{classify, HealthThresholds, JobRunRecord};
	use serde_json::{json, Value};

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
	}

	fn summary() -> HealthSummary {
		let thresholds = HealthThresholds::default();
		let ok = JobRunRecord::from_first_report(
			&RunReport::success("cleanup", now() - Duration::minutes(5))
				.with_next_run(now() + Duration::hours(1)),
			now(),
		);
		let broken = JobRunRecord::from_first_report(
			&RunReport::failure("backup", now() - Duration::minutes(1))
				.with_error("disk full: /var/backups/secret"),
			now(),
		);
		HealthSummary::from_jobs(
			vec![classify(&ok, &thresholds, now()), classify(&broken, &thresholds, now())],
			now(),
		)
	}

	#[test]
	fn public_view_exposes_only_safe_fields() {
		let value = serde_json::to_value(public_view(&summary())).unwrap();

		assert_eq!(value["success"], json!(true));
		assert_eq!(
			value["stats"],
			json!({"totalJobs": 2, "activeJobs": 2, "healthyJobs": 1, "failingJobs": 1})
		);

		let jobs = value["jobs"].as_array().unwrap();
		assert_eq!(jobs.len(), 2);
		for job in jobs {
			let mut keys: Vec<&str> = job.as_object().unwrap().keys().map(String::as_str).collect();
			keys.sort();
			assert_eq!(keys, vec!["lastRun", "name", "nextRun", "status"]);
		}
		assert!(!value.to_string().contains("disk full"));
	}

	#[test]
	fn public_status_is_health_classification() {
		let value = serde_json::to_value(public_view(&summary())).unwrap();
		assert_eq!(value["jobs"][0]["name"], json!("backup"));
		assert_eq!(value["jobs"][0]["status"], json!("failing"));
		assert_eq!(value["jobs"][1]["status"], json!("healthy"));
	}

	#[test]
	fn admin_view_includes_diagnostics() {
		let value = serde_json::to_value(admin_view(&summary())).unwrap();

		assert_eq!(value["totalJobs"], json!(2));
		assert_eq!(value["failingJobs"], json!(1));

		let backup = &value["jobs"][0];
		assert_eq!(backup["lastStatus"], json!("failure"));
		assert_eq!(backup["consecutiveFailures"], json!(1));
		assert_eq!(backup["lastError"], json!("disk full: /var/backups/secret"));
		assert_eq!(backup["reasons"], json!(["last_run_failed"]));
		assert!(backup.get("updatedAt").is_some());
	}

	#[test]
	fn job_detail_wraps_admin_job() {
		let summary = summary();
		let value = serde_json::to_value(job_detail(&summary.jobs[1])).unwrap();
		assert_eq!(value["success"], json!(true));
		assert_eq!(value["job"]["name"], json!("cleanup"));
		assert_eq!(value["job"]["lastError"], Value::Null);
	}

	#[test]
	fn report_request_defaults_timestamp_to_receipt_time() {
		let request: ReportRunRequest =
			serde_json::from_value(json!({"status": "failure", "error": "timeout"})).unwrap();
		let report = request.into_report("sync", now());

		assert_eq!(report.outcome, RunOutcome::Failure);
		assert_eq!(report.finished_at, now());
		assert_eq!(report.next_run_at, None);
		assert_eq!(report.error.as_deref(), Some("timeout"));
	}

	#[test]
	fn report_request_accepts_next_scheduled_run() {
		let request: ReportRunRequest = serde_json::from_value(json!({
			"status": "success",
			"timestamp": "2025-03-01T11:00:00Z",
			"nextScheduledRun": "2025-03-02T02:00:00Z"
		}))
		.unwrap();
		let report = request.into_report("backup", now());

		assert_eq!(report.finished_at, now() - Duration::hours(1));
		assert_eq!(
			report.next_run_at,
			Some(Utc.with_ymd_and_hms(2025, 3, 2, 2, 0, 0).unwrap())
		);
	}

	#[test]
	fn report_request_rejects_unknown_status() {
		let result: Result<ReportRunRequest, _> = serde_json::from_value(json!({"status": "maybe"}));
		assert!(result.is_err());
	}
}
