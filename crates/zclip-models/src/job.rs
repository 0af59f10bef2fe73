//! Processing job records.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::job_status::JobStatusSnapshot;
use crate::style::StyleParams;

/// Process-wide sequence appended to generated job IDs.
static JOB_SEQ: AtomicU64 = AtomicU64::new(0);

/// Highest progress value a job can report before it completes.
pub const MAX_PENDING_PROGRESS: u8 = 99;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new job ID seeded by the creation time and the main input.
    ///
    /// Format: `task_<unix_millis>_<sha256(main_input)[..4] hex>_<seq>`.
    /// The trailing sequence keeps IDs unique within a process even when the
    /// same input is submitted twice in the same millisecond.
    pub fn generate(main_input_ref: &str, now: DateTime<Utc>) -> Self {
        let digest = Sha256::digest(main_input_ref.as_bytes());
        let seed: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
        let seq = JOB_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("task_{}_{}_{}", now.timestamp_millis(), seed, seq))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the ID only contains characters that are safe in storage keys
    /// and URL paths (ASCII alphanumerics, `-` and `_`, at most 128 chars).
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= 128
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted but not yet picked up
    #[default]
    Submitted,
    /// Actively being processed
    Processing,
    /// Output is ready
    Completed,
    /// Canceled on request
    Canceled,
    /// Failed; see `last_error`
    Error,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Submitted => "submitted",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Canceled => "canceled",
            JobStatus::Error => "error",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Canceled | JobStatus::Error
        )
    }

    /// Whether moving from `self` to `next` respects the forward-only
    /// state machine. Staying in the same state is always allowed.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match next {
            JobStatus::Submitted => false,
            JobStatus::Processing => *self == JobStatus::Submitted,
            JobStatus::Completed | JobStatus::Canceled | JobStatus::Error => true,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a job advances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Progress is derived from elapsed wall-clock time
    #[default]
    Simulated,
    /// Progress is reported by the remote processing API
    Remote { external_job_id: String },
}

/// Parameters of a processing request, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobRequest {
    /// Primary input (path or URL)
    pub main_input_ref: String,
    /// Optional style donor input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_input_ref: Option<String>,
    /// Human-readable style template name
    pub style_name: String,
    /// Free-text directive, opaque to the engine
    #[serde(default)]
    pub instructions: String,
}

impl JobRequest {
    pub fn new(main_input_ref: impl Into<String>, style_name: impl Into<String>) -> Self {
        Self {
            main_input_ref: main_input_ref.into(),
            reference_input_ref: None,
            style_name: style_name.into(),
            instructions: String::new(),
        }
    }

    pub fn with_reference(mut self, reference_input_ref: impl Into<String>) -> Self {
        self.reference_input_ref = Some(reference_input_ref.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }
}

/// A processing job as persisted in the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobRecord {
    /// Unique job ID
    pub job_id: JobId,

    /// Primary input (path or URL)
    pub main_input_ref: String,

    /// Optional style donor input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_input_ref: Option<String>,

    /// Style template name as requested
    pub style_name: String,

    /// Parameters the template mapped to at creation
    pub style_params: StyleParams,

    /// User directive
    #[serde(default)]
    pub instructions: String,

    /// Current status
    #[serde(default)]
    pub status: JobStatus,

    /// Progress (0-100)
    #[serde(default)]
    pub progress: u8,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// `created_at` plus the nominal job duration
    pub estimated_completion_at: DateTime<Utc>,

    /// How the job advances
    #[serde(default)]
    pub execution: ExecutionMode,

    /// Why a gateway job fell back to simulated processing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,

    /// Output location, set once completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_ref: Option<String>,

    /// Error message, set once failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl JobRecord {
    /// Create a freshly submitted job.
    pub fn new(
        job_id: JobId,
        request: JobRequest,
        style_params: StyleParams,
        now: DateTime<Utc>,
        nominal_duration: Duration,
    ) -> Self {
        Self {
            job_id,
            main_input_ref: request.main_input_ref,
            reference_input_ref: request.reference_input_ref,
            style_name: request.style_name,
            style_params,
            instructions: request.instructions,
            status: JobStatus::Submitted,
            progress: 0,
            created_at: now,
            updated_at: now,
            estimated_completion_at: now + nominal_duration,
            execution: ExecutionMode::Simulated,
            fallback_reason: None,
            result_ref: None,
            last_error: None,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// External job ID when the job runs on the remote processing API.
    pub fn external_job_id(&self) -> Option<&str> {
        match &self.execution {
            ExecutionMode::Remote { external_job_id } => Some(external_job_id),
            ExecutionMode::Simulated => None,
        }
    }

    /// Time since creation, never negative.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).max(Duration::zero())
    }

    /// Nominal duration fixed at creation.
    pub fn nominal_duration(&self) -> Duration {
        self.estimated_completion_at - self.created_at
    }

    /// Move to `next` if the state machine allows it and the status
    /// actually changes.
    fn transition_to(&mut self, next: JobStatus, now: DateTime<Utc>) -> bool {
        if self.status == next || !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = now;
        true
    }

    /// Move `submitted` to `processing`. Returns whether the status changed.
    pub fn start_processing(&mut self, now: DateTime<Utc>) -> bool {
        self.transition_to(JobStatus::Processing, now)
    }

    /// Raise progress. Never lowers it and never reaches 100, which is
    /// reserved for [`JobRecord::complete`]. Ignored once terminal.
    pub fn set_progress(&mut self, progress: u8, now: DateTime<Utc>) {
        if self.is_terminal() {
            return;
        }
        let progress = progress.min(MAX_PENDING_PROGRESS);
        if progress > self.progress {
            self.progress = progress;
            self.updated_at = now;
        }
    }

    /// Mark the job completed with its output location.
    pub fn complete(&mut self, result_ref: impl Into<String>, now: DateTime<Utc>) -> bool {
        if !self.transition_to(JobStatus::Completed, now) {
            return false;
        }
        self.progress = 100;
        self.result_ref = Some(result_ref.into());
        true
    }

    /// Mark the job canceled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> bool {
        self.transition_to(JobStatus::Canceled, now)
    }

    /// Mark the job failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) -> bool {
        if !self.transition_to(JobStatus::Error, now) {
            return false;
        }
        self.last_error = Some(error.into());
        true
    }

    /// Seconds until the estimated completion, while the job is still running.
    pub fn eta_remaining_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        if self.is_terminal() {
            return None;
        }
        Some((self.estimated_completion_at - now).num_seconds().max(0) as u64)
    }

    /// Read-only view handed out to callers.
    pub fn snapshot(&self, now: DateTime<Utc>) -> JobStatusSnapshot {
        JobStatusSnapshot {
            job_id: self.job_id.clone(),
            status: self.status,
            progress: self.progress,
            eta_remaining_secs: self.eta_remaining_secs(now),
            result_ref: self.result_ref.clone(),
            error: self.last_error.clone(),
            fallback: self.fallback_reason.is_some(),
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::map_style;

    fn record(now: DateTime<Utc>) -> JobRecord {
        JobRecord::new(
            JobId::generate("video.mp4", now),
            JobRequest::new("video.mp4", "Alex Hormozi").with_instructions("make it punchy"),
            map_style("Alex Hormozi"),
            now,
            Duration::seconds(30),
        )
    }

    #[test]
    fn test_generated_ids_are_unique_and_well_formed() {
        let now = Utc::now();
        let a = JobId::generate("video.mp4", now);
        let b = JobId::generate("video.mp4", now);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("task_"));
        assert!(a.is_well_formed());
        assert!(b.is_well_formed());
    }

    #[test]
    fn test_malformed_ids() {
        assert!(!JobId::from("").is_well_formed());
        assert!(!JobId::from("../etc/passwd").is_well_formed());
        assert!(!JobId::from("has space").is_well_formed());
        assert!(!JobId::from("a".repeat(129)).is_well_formed());
        assert!(JobId::from("unknown-id").is_well_formed());
    }

    #[test]
    fn test_status_transitions_are_forward_only() {
        use JobStatus::*;
        assert!(Submitted.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Submitted.can_transition_to(Canceled));
        assert!(Processing.can_transition_to(Error));
        assert!(!Processing.can_transition_to(Submitted));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Canceled.can_transition_to(Completed));
        assert!(!Error.can_transition_to(Canceled));
        assert!(Completed.can_transition_to(Completed));
    }

    #[test]
    fn test_record_moves_follow_state_machine() {
        let now = Utc::now();
        let mut job = record(now);

        assert!(job.start_processing(now));
        assert!(!job.start_processing(now));

        assert!(job.cancel(now));
        assert!(!job.cancel(now));
        assert!(!job.complete("/media/processed/x_final.mp4", now));
        assert!(!job.fail("late", now));
        assert_eq!(job.status, JobStatus::Canceled);
        assert!(job.result_ref.is_none());
        assert!(job.last_error.is_none());
    }

    #[test]
    fn test_new_record() {
        let now = Utc::now();
        let job = record(now);
        assert_eq!(job.status, JobStatus::Submitted);
        assert_eq!(job.progress, 0);
        assert_eq!(job.nominal_duration(), Duration::seconds(30));
        assert_eq!(job.eta_remaining_secs(now), Some(30));
        assert!(job.result_ref.is_none());
        assert!(job.external_job_id().is_none());
    }

    #[test]
    fn test_progress_is_monotone_and_below_100() {
        let now = Utc::now();
        let mut job = record(now);
        job.start_processing(now);

        job.set_progress(40, now);
        job.set_progress(20, now);
        assert_eq!(job.progress, 40);

        job.set_progress(100, now);
        assert_eq!(job.progress, MAX_PENDING_PROGRESS);
        assert_eq!(job.status, JobStatus::Processing);
    }

    #[test]
    fn test_complete_sets_result_and_is_terminal() {
        let now = Utc::now();
        let mut job = record(now);
        job.start_processing(now);

        assert!(job.complete("/media/processed/x_final.mp4", now));
        assert_eq!(job.progress, 100);
        assert_eq!(job.result_ref.as_deref(), Some("/media/processed/x_final.mp4"));
        assert!(job.is_terminal());
        assert_eq!(job.eta_remaining_secs(now), None);

        // Terminal states stick
        assert!(!job.cancel(now));
        assert!(!job.fail("late", now));
        assert!(!job.start_processing(now));
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn test_fail_records_error() {
        let now = Utc::now();
        let mut job = record(now);
        assert!(job.fail("gateway down", now));
        let snapshot = job.snapshot(now);
        assert_eq!(snapshot.status, JobStatus::Error);
        assert_eq!(snapshot.error.as_deref(), Some("gateway down"));
        assert!(snapshot.result_ref.is_none());
    }

    #[test]
    fn test_record_serializes_with_snake_case_status() {
        let now = Utc::now();
        let mut job = record(now);
        job.execution = ExecutionMode::Remote {
            external_job_id: "ext-1".into(),
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["status"], "submitted");
        assert_eq!(value["execution"]["mode"], "remote");
        assert_eq!(value["execution"]["external_job_id"], "ext-1");

        let back: JobRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, job);
    }
}
