// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health classification for job run records.
//!
//! Classification is recomputed on every query from the stored record and
//! the evaluation time, so results are always consistent with the latest
//! report. A job is either healthy or failing, never both.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

use crate::record::{JobRunRecord, RunStatus};

/// Grace period before an overdue job counts as a missed run.
pub const DEFAULT_GRACE_PERIOD_SECS: i64 = 5 * 60;

/// A streak longer than this marks a job failing regardless of last status.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// How long an unscheduled job counts as active after its last run.
pub const DEFAULT_ACTIVE_WINDOW_SECS: i64 = 60 * 60;

/// Thresholds used by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthThresholds {
	pub grace_period: Duration,
	pub max_consecutive_failures: u32,
	pub active_window: Duration,
}

impl Default for HealthThresholds {
	fn default() -> Self {
		Self {
			grace_period: Duration::seconds(DEFAULT_GRACE_PERIOD_SECS),
			max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
			active_window: Duration::seconds(DEFAULT_ACTIVE_WINDOW_SECS),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
	Healthy,
	Failing,
}

impl HealthState {
	pub fn as_str(&self) -> &'static str {
		match self {
			HealthState::Healthy => "healthy",
			HealthState::Failing => "failing",
		}
	}
}

impl fmt::Display for HealthState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Why a job was classified as failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
	LastRunFailed,
	/// The scheduled run is overdue by more than the grace period.
	MissedSchedule,
	/// The failure streak exceeds the configured maximum.
	ConsecutiveFailures,
	MalformedRecord,
}

/// A record together with its classification at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobHealth {
	pub record: JobRunRecord,
	pub state: HealthState,
	pub active: bool,
	pub reasons: Vec<FailureReason>,
}

impl JobHealth {
	pub fn is_healthy(&self) -> bool {
		self.state == HealthState::Healthy
	}
}

/// Counts and per-job listing derived from every known record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSummary {
	pub total_jobs: usize,
	pub active_jobs: usize,
	pub healthy_jobs: usize,
	pub failing_jobs: usize,
	pub jobs: Vec<JobHealth>,
	pub evaluated_at: DateTime<Utc>,
}

impl HealthSummary {
	pub fn from_jobs(mut jobs: Vec<JobHealth>, evaluated_at: DateTime<Utc>) -> Self {
		jobs.sort_by(|a, b| a.record.job_name.cmp(&b.record.job_name));

		let active_jobs = jobs.iter().filter(|j| j.active).count();
		let healthy_jobs = jobs.iter().filter(|j| j.is_healthy()).count();

		Self {
			total_jobs: jobs.len(),
			active_jobs,
			healthy_jobs,
			failing_jobs: jobs.len() - healthy_jobs,
			jobs,
			evaluated_at,
		}
	}
}

/// Active: scheduled in the future, or unscheduled but finished a run within
/// the active window.
pub fn is_active(record: &JobRunRecord, thresholds: &HealthThresholds, now: DateTime<Utc>) -> bool {
	match record.next_run_at {
		Some(next) => next > now,
		None => {
			record.last_status != RunStatus::NeverRun
				&& record
					.last_run_at
					.is_some_and(|last| now - last <= thresholds.active_window)
		}
	}
}

/// Every rule the record violates; empty means healthy.
pub fn failure_reasons(
	record: &JobRunRecord,
	thresholds: &HealthThresholds,
	now: DateTime<Utc>,
) -> Vec<FailureReason> {
	let mut reasons = Vec::new();

	if record.last_status == RunStatus::Failure {
		reasons.push(FailureReason::LastRunFailed);
	}
	if record
		.next_run_at
		.is_some_and(|next| now - next > thresholds.grace_period)
	{
		reasons.push(FailureReason::MissedSchedule);
	}
	if record.consecutive_failures > thresholds.max_consecutive_failures {
		reasons.push(FailureReason::ConsecutiveFailures);
	}
	if record.is_malformed() {
		reasons.push(FailureReason::MalformedRecord);
	}

	reasons
}

pub fn classify(record: &JobRunRecord, thresholds: &HealthThresholds, now: DateTime<Utc>) -> JobHealth {
	let reasons = failure_reasons(record, thresholds, now);
	let state = if reasons.is_empty() {
		HealthState::Healthy
	} else {
		HealthState::Failing
	};

	JobHealth {
		record: record.clone(),
		state,
		active: is_active(record, thresholds, now),
		reasons,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::record::RunReport;
	use chrono::TimeZone;
	use proptest::prelude::*;

	fn t0() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 3, 1, 2, 0, 0).unwrap()
	}

	fn thresholds() -> HealthThresholds {
		HealthThresholds::default()
	}

	#[test]
	fn successful_job_with_future_run_is_healthy_and_active() {
		let record = JobRunRecord::from_first_report(
			&RunReport::success("sync", t0()).with_next_run(t0() + Duration::hours(1)),
			t0(),
		);
		let health = classify(&record, &thresholds(), t0() + Duration::minutes(10));
		assert_eq!(health.state, HealthState::Healthy);
		assert!(health.active);
		assert!(health.reasons.is_empty());
	}

	#[test]
	fn newly_registered_job_is_healthy_and_inactive() {
		let record = JobRunRecord::registered("new-job", None, t0());
		let health = classify(&record, &thresholds(), t0());
		assert_eq!(health.state, HealthState::Healthy);
		assert!(!health.active);
	}

	#[test]
	fn registered_job_past_its_first_run_is_failing() {
		let record = JobRunRecord::registered("new-job", Some(t0()), t0());
		let health = classify(&record, &thresholds(), t0() + Duration::hours(1));
		assert_eq!(health.state, HealthState::Failing);
		assert_eq!(health.reasons, vec![FailureReason::MissedSchedule]);
	}

	#[test]
	fn last_run_failure_is_failing() {
		let record = JobRunRecord::from_first_report(
			&RunReport::failure("sync", t0()).with_next_run(t0() + Duration::hours(1)),
			t0(),
		);
		let health = classify(&record, &thresholds(), t0());
		assert_eq!(health.state, HealthState::Failing);
		assert!(health.active);
		assert_eq!(health.reasons, vec![FailureReason::LastRunFailed]);
	}

	#[test]
	fn overdue_within_grace_is_still_healthy() {
		let record = JobRunRecord::from_first_report(
			&RunReport::success("sync", t0()).with_next_run(t0() + Duration::hours(1)),
			t0(),
		);
		let now = t0() + Duration::hours(1) + Duration::minutes(4);
		let health = classify(&record, &thresholds(), now);
		assert_eq!(health.state, HealthState::Healthy);
		assert!(!health.active);
	}

	#[test]
	fn overdue_past_grace_is_missed() {
		let record = JobRunRecord::from_first_report(
			&RunReport::success("sync", t0()).with_next_run(t0() + Duration::hours(1)),
			t0(),
		);
		let now = t0() + Duration::hours(1) + Duration::minutes(6);
		let health = classify(&record, &thresholds(), now);
		assert_eq!(health.state, HealthState::Failing);
		assert_eq!(health.reasons, vec![FailureReason::MissedSchedule]);
	}

	#[test]
	fn unscheduled_job_is_active_within_window() {
		let record = JobRunRecord::from_first_report(&RunReport::success("adhoc", t0()), t0());
		assert!(is_active(&record, &thresholds(), t0() + Duration::minutes(30)));
		assert!(!is_active(&record, &thresholds(), t0() + Duration::hours(2)));
	}

	#[test]
	fn daily_backup_missed_after_two_failures() {
		let day = Duration::days(1);
		let record = JobRunRecord::from_first_report(&RunReport::failure("daily-backup", t0()), t0());
		let record = record.apply(
			&RunReport::failure("daily-backup", t0() + day).with_next_run(t0() + day * 2),
			t0() + day,
		);

		let health = classify(&record, &thresholds(), t0() + day * 3);
		assert_eq!(health.state, HealthState::Failing);
		assert_eq!(health.record.consecutive_failures, 2);
		assert_eq!(
			health.reasons,
			vec![FailureReason::LastRunFailed, FailureReason::MissedSchedule]
		);
	}

	#[test]
	fn streak_above_threshold_is_reported() {
		let mut record = JobRunRecord::from_first_report(&RunReport::failure("flaky", t0()), t0());
		for _ in 0..3 {
			record = record.apply(&RunReport::failure("flaky", t0()), t0());
		}
		let health = classify(&record, &thresholds(), t0());
		assert!(health.reasons.contains(&FailureReason::ConsecutiveFailures));
	}

	#[test]
	fn malformed_record_is_failing_not_excluded() {
		let mut record = JobRunRecord::registered("broken", None, t0());
		record.last_status = RunStatus::Success;

		let summary = HealthSummary::from_jobs(vec![classify(&record, &thresholds(), t0())], t0());
		assert_eq!(summary.total_jobs, 1);
		assert_eq!(summary.failing_jobs, 1);
		assert_eq!(summary.jobs[0].reasons, vec![FailureReason::MalformedRecord]);
	}

	#[test]
	fn summary_counts_and_sorts() {
		let now = t0();
		let jobs = vec![
			classify(
				&JobRunRecord::from_first_report(
					&RunReport::success("b-job", now).with_next_run(now + Duration::hours(1)),
					now,
				),
				&thresholds(),
				now,
			),
			classify(
				&JobRunRecord::from_first_report(&RunReport::failure("a-job", now), now),
				&thresholds(),
				now,
			),
		];
		let summary = HealthSummary::from_jobs(jobs, now);
		assert_eq!(summary.total_jobs, 2);
		assert_eq!(summary.healthy_jobs, 1);
		assert_eq!(summary.failing_jobs, 1);
		assert_eq!(summary.active_jobs, 2);
		assert_eq!(summary.jobs[0].record.job_name, "a-job");
	}

	fn arb_status() -> impl Strategy<Value = RunStatus> {
		prop_oneof![
			Just(RunStatus::Success),
			Just(RunStatus::Failure),
			Just(RunStatus::NeverRun),
		]
	}

	proptest! {
		#[test]
		fn every_job_lands_in_exactly_one_bucket(
			records in prop::collection::vec(
				(
					arb_status(),
					prop::option::of(-10_000i64..10_000),
					prop::option::of(-10_000i64..10_000),
					0u32..8,
				),
				0..30,
			)
		) {
			let now = t0();
			let jobs: Vec<JobHealth> = records
				.into_iter()
				.enumerate()
				.map(|(i, (status, last, next, streak))| {
					let record = JobRunRecord {
						job_name: format!("job-{i}"),
						last_run_at: last.map(|m| now + Duration::minutes(m)),
						last_status: status,
						next_run_at: next.map(|m| now + Duration::minutes(m)),
						consecutive_failures: streak,
						last_error: None,
						updated_at: now,
					};
					classify(&record, &thresholds(), now)
				})
				.collect();

			let summary = HealthSummary::from_jobs(jobs, now);
			prop_assert_eq!(summary.healthy_jobs + summary.failing_jobs, summary.total_jobs);
			for job in &summary.jobs {
				prop_assert_eq!(job.is_healthy(), job.reasons.is_empty());
			}
		}
	}
}
