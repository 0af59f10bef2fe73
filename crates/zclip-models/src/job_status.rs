//! Job status snapshots for polling.
//!
//! Callers never see a [`JobRecord`](crate::JobRecord) directly; each poll
//! hands out a snapshot computed at the time of the request.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::{JobId, JobStatus};

/// Point-in-time view of a job, returned by status polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobStatusSnapshot {
    /// Job identifier
    pub job_id: JobId,
    /// Current status
    pub status: JobStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Seconds until the estimated completion (non-terminal jobs only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_remaining_secs: Option<u64>,
    /// Output location (completed jobs only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_ref: Option<String>,
    /// Error message (failed jobs only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the job fell back to simulated processing
    #[serde(default)]
    pub fallback: bool,
    /// When the job was last updated
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_omits_absent_fields() {
        let snapshot = JobStatusSnapshot {
            job_id: JobId::from("task_1_abcd_0"),
            status: JobStatus::Processing,
            progress: 10,
            eta_remaining_secs: Some(27),
            result_ref: None,
            error: None,
            fallback: false,
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["status"], "processing");
        assert_eq!(value["eta_remaining_secs"], 27);
        assert!(value.get("result_ref").is_none());
        assert!(value.get("error").is_none());
    }
}
