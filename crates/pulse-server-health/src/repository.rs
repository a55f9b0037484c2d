// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistence for job run records.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use tracing::{instrument, warn};

use pulse_health_core::{JobRunRecord, RunStatus};

use crate::error::RepositoryError;

type Result<T> = std::result::Result<T, RepositoryError>;

/// Storage backend for job run records.
#[async_trait]
pub trait JobRecordRepository: Send + Sync {
	async fn upsert(&self, record: &JobRunRecord) -> Result<()>;
	async fn list(&self) -> Result<Vec<JobRunRecord>>;
}

/// SQLite implementation of the job record repository.
#[derive(Clone)]
pub struct SqliteJobRecordRepository {
	pool: SqlitePool,
}

impl SqliteJobRecordRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl JobRecordRepository for SqliteJobRecordRepository {
	#[instrument(skip(self, record), fields(job_name = %record.job_name))]
	async fn upsert(&self, record: &JobRunRecord) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO job_health_records (
				job_name, last_run_at, last_status, next_run_at,
				consecutive_failures, last_error, updated_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT(job_name) DO UPDATE SET
				last_run_at = excluded.last_run_at,
				last_status = excluded.last_status,
				next_run_at = excluded.next_run_at,
				consecutive_failures = excluded.consecutive_failures,
				last_error = excluded.last_error,
				updated_at = excluded.updated_at
			"#,
		)
		.bind(&record.job_name)
		.bind(record.last_run_at.map(format_timestamp))
		.bind(record.last_status.as_str())
		.bind(record.next_run_at.map(format_timestamp))
		.bind(record.consecutive_failures as i64)
		.bind(&record.last_error)
		.bind(format_timestamp(record.updated_at))
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self))]
	async fn list(&self) -> Result<Vec<JobRunRecord>> {
		let rows = sqlx::query_as::<_, JobRecordRow>(
			r#"
			SELECT job_name, last_run_at, last_status, next_run_at,
				   consecutive_failures, last_error, updated_at
			FROM job_health_records
			ORDER BY job_name
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows.into_iter().map(JobRecordRow::into_record).collect())
	}
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(sqlx::FromRow)]
struct JobRecordRow {
	job_name: String,
	last_run_at: Option<String>,
	last_status: String,
	next_run_at: Option<String>,
	consecutive_failures: i64,
	last_error: Option<String>,
	updated_at: String,
}

impl JobRecordRow {
	/// Decode a row. Undecodable fields do not drop the job: the record comes
	/// back as a failure with the decode problems in `last_error`, so it shows
	/// up as failing rather than disappearing from the summary.
	fn into_record(self) -> JobRunRecord {
		let mut problems = Vec::new();

		let status = match self.last_status.parse::<RunStatus>() {
			Ok(status) => Some(status),
			Err(e) => {
				problems.push(e);
				None
			}
		};
		let last_run_at = decode_optional(self.last_run_at, "last_run_at", &mut problems);
		let next_run_at = decode_optional(self.next_run_at, "next_run_at", &mut problems);
		let updated_at = decode_timestamp(&self.updated_at, "updated_at", &mut problems)
			.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
		let streak = u32::try_from(self.consecutive_failures).unwrap_or_else(|_| {
			problems.push(format!(
				"invalid consecutive_failures: {}",
				self.consecutive_failures
			));
			0
		});

		if problems.is_empty() {
			return JobRunRecord {
				job_name: self.job_name,
				last_run_at,
				last_status: status.unwrap_or(RunStatus::Failure),
				next_run_at,
				consecutive_failures: streak,
				last_error: self.last_error,
				updated_at,
			};
		}

		warn!(
			job_name = %self.job_name,
			problems = %problems.join("; "),
			"Stored job health record could not be fully decoded"
		);

		// Any damaged field makes the whole record a failure.
		JobRunRecord {
			job_name: self.job_name,
			last_run_at,
			last_status: RunStatus::Failure,
			next_run_at,
			consecutive_failures: streak.max(1),
			last_error: Some(format!("unreadable stored record: {}", problems.join("; "))),
			updated_at,
		}
	}
}

fn decode_timestamp(raw: &str, field: &str, problems: &mut Vec<String>) -> Option<DateTime<Utc>> {
	match DateTime::parse_from_rfc3339(raw) {
		Ok(dt) => Some(dt.with_timezone(&Utc)),
		Err(_) => {
			problems.push(format!("invalid {field}: {raw}"));
			None
		}
	}
}

fn decode_optional(
	raw: Option<String>,
	field: &str,
	problems: &mut Vec<String>,
) -> Option<DateTime<Utc>> {
	raw.and_then(|s| decode_timestamp(&s, field, problems))
}
