//! Job lifecycle engine.
//!
//! Jobs are advanced lazily: every status poll recomputes the record from
//! the clock (simulated jobs) or from the processing API (remote jobs) and
//! persists it when something changed. No background task drives them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use zclip_models::{
    map_style, ExecutionMode, JobId, JobRecord, JobRequest, JobStatus, JobStatusSnapshot,
};
use zclip_store::JobRecordStore;

use crate::backend::{backend_from_config, ProcessingBackend};
use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, ProcessingMode};
use crate::error::{JobError, JobResult};
use crate::gateway::RemoteStatus;
use crate::metrics;
use crate::progress::{simulated_progress, SimulatedProgress};

/// Owner of all job records.
#[derive(Clone)]
pub struct JobEngine {
    config: EngineConfig,
    store: Arc<dyn JobRecordStore>,
    backend: Arc<dyn ProcessingBackend>,
    clock: Arc<dyn Clock>,
}

impl JobEngine {
    /// Create an engine with an explicit backend.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn JobRecordStore>,
        backend: Arc<dyn ProcessingBackend>,
    ) -> Self {
        Self {
            config: config.normalized(),
            store,
            backend,
            clock: Arc::new(SystemClock),
        }
    }

    /// Create an engine with the backend selected by `config.mode`.
    pub fn from_config(config: EngineConfig, store: Arc<dyn JobRecordStore>) -> JobResult<Self> {
        let backend = backend_from_config(&config)?;
        Ok(Self::new(config, store, backend))
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mode(&self) -> ProcessingMode {
        self.backend.mode()
    }

    pub fn store(&self) -> &Arc<dyn JobRecordStore> {
        &self.store
    }

    /// Create and persist a new job.
    pub async fn create_job(&self, request: JobRequest) -> JobResult<JobId> {
        if request.main_input_ref.trim().is_empty() {
            return Err(JobError::invalid_input("main input reference is required"));
        }

        let now = self.clock.now();
        let job_id = JobId::generate(&request.main_input_ref, now);
        let style_params = map_style(&request.style_name);
        let mut record = JobRecord::new(
            job_id.clone(),
            request,
            style_params,
            now,
            self.config.nominal_duration(),
        );

        match self.backend.submit(&record).await {
            Ok(ExecutionMode::Simulated) => {
                record.start_processing(now);
            }
            Ok(remote) => {
                record.execution = remote;
            }
            Err(JobError::GatewayUnavailable(reason)) => {
                warn!(
                    job_id = %job_id,
                    reason = %reason,
                    "Processing API unavailable, falling back to simulated processing"
                );
                metrics::record_gateway_fallback();
                record.fallback_reason = Some(reason);
                record.start_processing(now);
            }
            Err(e) => return Err(e),
        }

        self.store.put(&record).await?;

        let mode = match &record.execution {
            ExecutionMode::Simulated => "simulated",
            ExecutionMode::Remote { .. } => "remote",
        };
        metrics::record_job_created(mode);
        info!(
            job_id = %job_id,
            mode,
            style = %record.style_name,
            "Created processing job"
        );

        Ok(job_id)
    }

    /// Recompute a job and return its snapshot.
    pub async fn get_status(&self, job_id: &JobId) -> JobResult<JobStatusSnapshot> {
        let now = self.clock.now();
        let record = self.load(job_id).await?;
        let record = self.refresh(record, now, true).await?;
        Ok(record.snapshot(now))
    }

    /// Cancel a job.
    ///
    /// Returns `Ok(true)` when the job is (or already was) canceled. Jobs that
    /// completed or failed cannot be canceled.
    pub async fn cancel(&self, job_id: &JobId) -> JobResult<bool> {
        let now = self.clock.now();
        let record = self.load(job_id).await?;
        let mut record = self.refresh(record, now, false).await?;

        match record.status {
            JobStatus::Canceled => return Ok(true),
            JobStatus::Completed | JobStatus::Error => {
                return Err(JobError::invalid_state(format!(
                    "job {} is already {}",
                    job_id, record.status
                )));
            }
            JobStatus::Submitted | JobStatus::Processing => {}
        }

        if let Some(external_job_id) = record.external_job_id() {
            if let Err(e) = self.backend.cancel(external_job_id).await {
                warn!(
                    job_id = %job_id,
                    external_job_id,
                    error = %e,
                    "Processing API cancel failed, canceling locally"
                );
            }
        }

        record.cancel(now);
        self.persist(&mut record, now).await?;
        metrics::record_terminal_transition(JobStatus::Canceled);
        info!(job_id = %job_id, progress = record.progress, "Canceled processing job");

        Ok(true)
    }

    /// Output location of a completed job.
    pub async fn get_result_location(&self, job_id: &JobId) -> JobResult<String> {
        let now = self.clock.now();
        let record = self.load(job_id).await?;
        let record = self.refresh(record, now, true).await?;

        match (record.status, record.result_ref) {
            (JobStatus::Completed, Some(result_ref)) => Ok(result_ref),
            (status, _) => Err(JobError::not_ready(format!(
                "job {} is {}",
                job_id, status
            ))),
        }
    }

    async fn load(&self, job_id: &JobId) -> JobResult<JobRecord> {
        self.store
            .get(job_id)
            .await?
            .ok_or_else(|| JobError::not_found(job_id.as_str()))
    }

    /// Advance a non-terminal record to `now` and persist it if it changed.
    /// Remote jobs are only polled when `poll_remote` is set.
    async fn refresh(
        &self,
        mut record: JobRecord,
        now: DateTime<Utc>,
        poll_remote: bool,
    ) -> JobResult<JobRecord> {
        if record.is_terminal() {
            return Ok(record);
        }

        let before = record.clone();

        match record.external_job_id().map(str::to_owned) {
            None => self.advance_simulated(&mut record, now),
            Some(_) if !poll_remote => return Ok(record),
            Some(external_job_id) => match self.backend.poll(&external_job_id).await {
                Ok(mut remote) => {
                    match self.resolve_download_location(&external_job_id, &mut remote).await {
                        Ok(()) => self.merge_remote(&mut record, &remote, now),
                        Err(e) => {
                            warn!(
                                job_id = %record.job_id,
                                external_job_id = %external_job_id,
                                error = %e,
                                "Processing API download lookup failed"
                            );
                            record.fail(format!("download lookup failed: {}", e), now);
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        job_id = %record.job_id,
                        external_job_id = %external_job_id,
                        error = %e,
                        "Processing API status poll failed"
                    );
                    record.fail(format!("status poll failed: {}", e), now);
                }
            },
        }

        if record != before {
            self.persist(&mut record, now).await?;
            if record.status != before.status {
                metrics::record_terminal_transition(record.status);
                debug!(
                    job_id = %record.job_id,
                    from = %before.status,
                    to = %record.status,
                    "Job status changed"
                );
            }
        }

        Ok(record)
    }

    fn advance_simulated(&self, record: &mut JobRecord, now: DateTime<Utc>) {
        record.start_processing(now);

        match simulated_progress(
            record.elapsed(now),
            record.nominal_duration(),
            self.config.progress_cap,
        ) {
            SimulatedProgress::Running(progress) => record.set_progress(progress, now),
            SimulatedProgress::Finished => {
                let result_ref = self.config.result_ref_for(&record.job_id);
                record.complete(result_ref, now);
                info!(job_id = %record.job_id, "Simulated job completed");
            }
        }
    }

    /// A completed status without an output location is followed up with
    /// the provider's download endpoint.
    async fn resolve_download_location(
        &self,
        external_job_id: &str,
        remote: &mut RemoteStatus,
    ) -> JobResult<()> {
        let missing = remote
            .download_url
            .as_deref()
            .map_or(true, |url| url.trim().is_empty());
        if remote.job_status() == JobStatus::Completed && missing {
            remote.download_url = self.backend.result_location(external_job_id).await?;
        }
        Ok(())
    }

    fn merge_remote(&self, record: &mut JobRecord, remote: &RemoteStatus, now: DateTime<Utc>) {
        match remote.job_status() {
            JobStatus::Completed => {
                let download_url = remote
                    .download_url
                    .clone()
                    .filter(|url| !url.trim().is_empty());
                match download_url {
                    Some(result_ref) => {
                        record.complete(result_ref, now);
                        info!(job_id = %record.job_id, "Remote job completed");
                    }
                    None => {
                        record.fail("processing API did not provide a download location", now);
                    }
                }
            }
            JobStatus::Error => {
                let message = remote.error.clone().unwrap_or_else(|| {
                    format!("processing API reported status '{}'", remote.status)
                });
                record.fail(message, now);
            }
            JobStatus::Canceled => {
                record.cancel(now);
            }
            JobStatus::Submitted | JobStatus::Processing => {
                record.start_processing(now);
                record.set_progress(
                    remote.progress_percent().min(self.config.progress_cap),
                    now,
                );
            }
        }
    }

    /// Write a record. On failure, try to leave the job marked as failed
    /// before surfacing the storage error.
    async fn persist(&self, record: &mut JobRecord, now: DateTime<Utc>) -> JobResult<()> {
        let err = match self.store.put(record).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        error!(
            job_id = %record.job_id,
            store = self.store.name(),
            error = %err,
            "Failed to persist job record"
        );

        if record.fail(format!("failed to persist job record: {}", err), now) {
            if let Err(e) = self.store.put(record).await {
                warn!(job_id = %record.job_id, error = %e, "Failed to persist job error state");
            }
        }

        Err(err.into())
    }
}
