// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job run records and the reports that update them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of the most recent run of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
	Success,
	Failure,
	/// Registered but no run has been reported yet.
	NeverRun,
}

impl RunStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			RunStatus::Success => "success",
			RunStatus::Failure => "failure",
			RunStatus::NeverRun => "never_run",
		}
	}
}

impl fmt::Display for RunStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for RunStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"success" => Ok(RunStatus::Success),
			"failure" => Ok(RunStatus::Failure),
			"never_run" => Ok(RunStatus::NeverRun),
			_ => Err(format!("unknown run status: {s}")),
		}
	}
}

/// Outcome a job runner can report. A runner cannot report "never run".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
	Success,
	Failure,
}

impl From<RunOutcome> for RunStatus {
	fn from(outcome: RunOutcome) -> Self {
		match outcome {
			RunOutcome::Success => RunStatus::Success,
			RunOutcome::Failure => RunStatus::Failure,
		}
	}
}

/// A single run outcome submitted by a job runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
	pub job_name: String,
	pub outcome: RunOutcome,
	pub finished_at: DateTime<Utc>,
	pub next_run_at: Option<DateTime<Utc>>,
	pub error: Option<String>,
}

impl RunReport {
	pub fn new(job_name: impl Into<String>, outcome: RunOutcome, finished_at: DateTime<Utc>) -> Self {
		Self {
			job_name: job_name.into(),
			outcome,
			finished_at,
			next_run_at: None,
			error: None,
		}
	}

	pub fn success(job_name: impl Into<String>, finished_at: DateTime<Utc>) -> Self {
		Self::new(job_name, RunOutcome::Success, finished_at)
	}

	pub fn failure(job_name: impl Into<String>, finished_at: DateTime<Utc>) -> Self {
		Self::new(job_name, RunOutcome::Failure, finished_at)
	}

	pub fn with_next_run(mut self, next_run_at: DateTime<Utc>) -> Self {
		self.next_run_at = Some(next_run_at);
		self
	}

	pub fn with_error(mut self, error: impl Into<String>) -> Self {
		self.error = Some(error.into());
		self
	}
}

/// The current record for one job. Exactly one exists per job name and each
/// report overwrites it; no run history is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRunRecord {
	pub job_name: String,
	pub last_run_at: Option<DateTime<Utc>>,
	pub last_status: RunStatus,
	pub next_run_at: Option<DateTime<Utc>>,
	pub consecutive_failures: u32,
	/// Error text from the last failed run. Admin-only diagnostic.
	pub last_error: Option<String>,
	pub updated_at: DateTime<Utc>,
}

impl JobRunRecord {
	/// A freshly registered job that has not run yet.
	pub fn registered(
		job_name: impl Into<String>,
		next_run_at: Option<DateTime<Utc>>,
		now: DateTime<Utc>,
	) -> Self {
		Self {
			job_name: job_name.into(),
			last_run_at: None,
			last_status: RunStatus::NeverRun,
			next_run_at,
			consecutive_failures: 0,
			last_error: None,
			updated_at: now,
		}
	}

	/// Build the record that results from applying `report` to this one.
	///
	/// Last write wins for status, run time and next run. The failure streak
	/// grows on failure and resets on success.
	pub fn apply(&self, report: &RunReport, now: DateTime<Utc>) -> Self {
		let (consecutive_failures, last_error) = match report.outcome {
			RunOutcome::Success => (0, None),
			RunOutcome::Failure => (
				self.consecutive_failures.saturating_add(1),
				report.error.clone(),
			),
		};

		Self {
			job_name: self.job_name.clone(),
			last_run_at: Some(report.finished_at),
			last_status: report.outcome.into(),
			next_run_at: report.next_run_at,
			consecutive_failures,
			last_error,
			updated_at: now,
		}
	}

	/// Record for a job whose first contact is a run report.
	pub fn from_first_report(report: &RunReport, now: DateTime<Utc>) -> Self {
		Self::registered(report.job_name.clone(), None, now).apply(report, now)
	}

	/// Whether the fields contradict each other.
	pub fn is_malformed(&self) -> bool {
		match self.last_status {
			RunStatus::NeverRun => self.last_run_at.is_some() || self.consecutive_failures > 0,
			RunStatus::Success => self.last_run_at.is_none() || self.consecutive_failures > 0,
			RunStatus::Failure => self.last_run_at.is_none() || self.consecutive_failures == 0,
		}
	}
}
