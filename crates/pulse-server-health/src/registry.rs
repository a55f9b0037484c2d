// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory job health registry with optional write-through persistence.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use pulse_health_core::{
	classify, HealthError, HealthSummary, HealthThresholds, JobHealth, JobRunRecord, Result,
	RunOutcome, RunReport,
};

use crate::repository::JobRecordRepository;

/// One job's record. `None` until the first report or registration commits.
type RecordSlot = Arc<Mutex<Option<JobRunRecord>>>;

/// Tracks the current run record of every known job.
///
/// Reports for the same job are serialized through that job's slot lock, so
/// concurrent runners can never lose an update. Reports for different jobs
/// only contend on the map lock when a new job name is first seen.
pub struct JobHealthRegistry {
	records: RwLock<HashMap<String, RecordSlot>>,
	thresholds: HealthThresholds,
	repository: Option<Arc<dyn JobRecordRepository>>,
}

impl JobHealthRegistry {
	pub fn new(thresholds: HealthThresholds) -> Self {
		Self {
			records: RwLock::new(HashMap::new()),
			thresholds,
			repository: None,
		}
	}

	/// Create a registry that writes every change through to `repository`.
	pub fn with_repository(
		thresholds: HealthThresholds,
		repository: Arc<dyn JobRecordRepository>,
	) -> Self {
		Self {
			records: RwLock::new(HashMap::new()),
			thresholds,
			repository: Some(repository),
		}
	}

	pub fn thresholds(&self) -> &HealthThresholds {
		&self.thresholds
	}

	pub fn is_persistent(&self) -> bool {
		self.repository.is_some()
	}

	/// Hydrate the registry from the repository. Returns the number of records
	/// loaded; a registry without a repository loads nothing.
	#[instrument(skip(self))]
	pub async fn load(&self) -> Result<usize> {
		let Some(repository) = &self.repository else {
			return Ok(0);
		};

		let stored = repository.list().await?;
		let count = stored.len();

		let mut records = self.records.write().await;
		for record in stored {
			records.insert(
				record.job_name.clone(),
				Arc::new(Mutex::new(Some(record))),
			);
		}

		info!(job_count = count, "Loaded job health records");
		Ok(count)
	}

	/// Record the outcome of one job run.
	///
	/// Failure extends the job's failure streak, success resets it. The stored
	/// record is replaced; earlier runs are not kept.
	#[instrument(skip(self, report), fields(job_name = %report.job_name, outcome = ?report.outcome))]
	pub async fn report_run(&self, report: RunReport) -> Result<JobRunRecord> {
		validate_job_name(&report.job_name)?;

		let slot = self.slot(&report.job_name).await;
		let mut current = slot.lock().await;

		let now = Utc::now();
		let next = match current.as_ref() {
			Some(record) => record.apply(&report, now),
			None => JobRunRecord::from_first_report(&report, now),
		};

		if let Err(e) = self.persist(&next).await {
			drop(current);
			self.discard_empty_slot(&report.job_name, slot).await;
			return Err(e);
		}
		*current = Some(next.clone());

		match report.outcome {
			RunOutcome::Success => debug!(job_name = %next.job_name, "Job run succeeded"),
			RunOutcome::Failure => warn!(
				job_name = %next.job_name,
				consecutive_failures = next.consecutive_failures,
				error = next.last_error.as_deref().unwrap_or(""),
				"Job run failed"
			),
		}

		Ok(next)
	}

	/// Make a job known before its first run.
	///
	/// An unknown job gets a never-run record. A known job keeps its run
	/// history and only has its next scheduled run updated.
	#[instrument(skip(self))]
	pub async fn register_job(
		&self,
		job_name: &str,
		next_run_at: Option<DateTime<Utc>>,
	) -> Result<JobRunRecord> {
		validate_job_name(job_name)?;

		let slot = self.slot(job_name).await;
		let mut current = slot.lock().await;

		let now = Utc::now();
		let next = match current.as_ref() {
			Some(record) => JobRunRecord {
				next_run_at,
				updated_at: now,
				..record.clone()
			},
			None => JobRunRecord::registered(job_name, next_run_at, now),
		};

		if let Err(e) = self.persist(&next).await {
			drop(current);
			self.discard_empty_slot(job_name, slot).await;
			return Err(e);
		}
		*current = Some(next.clone());

		debug!(job_name, "Job registered");
		Ok(next)
	}

	pub async fn get_job_health(&self, job_name: &str) -> Result<JobHealth> {
		self.get_job_health_at(job_name, Utc::now()).await
	}

	/// Classify one job as of `now`. Unknown jobs yield `NotFound`.
	pub async fn get_job_health_at(&self, job_name: &str, now: DateTime<Utc>) -> Result<JobHealth> {
		let slot = {
			let records = self.records.read().await;
			records.get(job_name).cloned()
		};

		let record = match slot {
			Some(slot) => slot.lock().await.clone(),
			None => None,
		};

		record
			.map(|record| classify(&record, &self.thresholds, now))
			.ok_or_else(|| HealthError::NotFound(job_name.to_string()))
	}

	pub async fn get_health_summary(&self) -> HealthSummary {
		self.get_health_summary_at(Utc::now()).await
	}

	/// Classify every known job as of `now`.
	pub async fn get_health_summary_at(&self, now: DateTime<Utc>) -> HealthSummary {
		let slots: Vec<RecordSlot> = {
			let records = self.records.read().await;
			records.values().cloned().collect()
		};

		let mut jobs = Vec::with_capacity(slots.len());
		for slot in slots {
			if let Some(record) = slot.lock().await.as_ref() {
				jobs.push(classify(record, &self.thresholds, now));
			}
		}

		HealthSummary::from_jobs(jobs, now)
	}

	/// Names of every job with a committed record, sorted.
	pub async fn job_names(&self) -> Vec<String> {
		let slots: Vec<(String, RecordSlot)> = {
			let records = self.records.read().await;
			records
				.iter()
				.map(|(name, slot)| (name.clone(), Arc::clone(slot)))
				.collect()
		};

		let mut names = Vec::with_capacity(slots.len());
		for (name, slot) in slots {
			if slot.lock().await.is_some() {
				names.push(name);
			}
		}
		names.sort();
		names
	}

	async fn slot(&self, job_name: &str) -> RecordSlot {
		{
			let records = self.records.read().await;
			if let Some(slot) = records.get(job_name) {
				return Arc::clone(slot);
			}
		}

		let mut records = self.records.write().await;
		Arc::clone(
			records
				.entry(job_name.to_string())
				.or_insert_with(|| Arc::new(Mutex::new(None))),
		)
	}

	/// Remove a slot that never got a record, unless another caller holds it.
	async fn discard_empty_slot(&self, job_name: &str, slot: RecordSlot) {
		let mut records = self.records.write().await;
		let Some(existing) = records.get(job_name) else {
			return;
		};
		// The map and `slot` are the only owners; nobody else can be waiting on it.
		let unshared = Arc::ptr_eq(existing, &slot) && Arc::strong_count(&slot) == 2;
		if unshared && slot.try_lock().is_ok_and(|record| record.is_none()) {
			records.remove(job_name);
		}
	}

	async fn persist(&self, record: &JobRunRecord) -> Result<()> {
		if let Some(repository) = &self.repository {
			repository.upsert(record).await.map_err(|e| {
				warn!(job_name = %record.job_name, error = %e, "Failed to persist job health record");
				HealthError::from(e)
			})?;
		}
		Ok(())
	}
}

impl Default for JobHealthRegistry {
	fn default() -> Self {
		Self::new(HealthThresholds::default())
	}
}

fn validate_job_name(job_name: &str) -> Result<()> {
	if job_name.trim().is_empty() {
		return Err(HealthError::InvalidJobName);
	}
	Ok(())
}
