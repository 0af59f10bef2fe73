//! Engine configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::JobError;

/// Default nominal job duration in simulated mode.
pub const DEFAULT_JOB_DURATION_SECS: u64 = 30;

/// Default progress ceiling while a job has not completed.
pub const DEFAULT_PROGRESS_CAP: u8 = 95;

/// How jobs are executed, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Progress derived from elapsed time
    #[default]
    Simulated,
    /// Jobs delegated to the remote processing API
    Gateway,
}

impl ProcessingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Simulated => "simulated",
            ProcessingMode::Gateway => "gateway",
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProcessingMode {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simulated" | "mock" => Ok(ProcessingMode::Simulated),
            "gateway" | "remote" | "real" => Ok(ProcessingMode::Gateway),
            other => Err(JobError::invalid_input(format!(
                "unknown processing mode: {}",
                other
            ))),
        }
    }
}

/// Remote processing API settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the processing API
    pub base_url: String,
    /// Bearer token
    pub api_key: String,
    /// Webhook the API may call on completion
    pub callback_url: Option<String>,
    /// Public base URL under which local media paths are reachable
    pub media_base_url: Option<String>,
    /// Timeout for job submission
    pub submit_timeout: Duration,
    /// Timeout for status polls and cancel requests
    pub poll_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.runwayml.com/v1".to_string(),
            api_key: String::new(),
            callback_url: None,
            media_base_url: None,
            submit_timeout: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(10),
        }
    }
}

impl GatewayConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("VIDEO_API_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("VIDEO_API_KEY").unwrap_or_default(),
            callback_url: std::env::var("VIDEO_API_CALLBACK_URL").ok(),
            media_base_url: std::env::var("VIDEO_API_MEDIA_BASE_URL").ok(),
            submit_timeout: Duration::from_secs(
                std::env::var("VIDEO_API_SUBMIT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            poll_timeout: Duration::from_secs(
                std::env::var("VIDEO_API_POLL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}

/// Job lifecycle engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Execution mode
    pub mode: ProcessingMode,
    /// Nominal job duration (`D`)
    pub job_duration: Duration,
    /// Highest progress reported before completion
    pub progress_cap: u8,
    /// Prefix of deterministic result locations
    pub result_prefix: String,
    /// Remote API settings (gateway mode only)
    pub gateway: GatewayConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Simulated,
            job_duration: Duration::from_secs(DEFAULT_JOB_DURATION_SECS),
            progress_cap: DEFAULT_PROGRESS_CAP,
            result_prefix: "/media/processed".to_string(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    ///
    /// `PROCESSING_MODE` wins; otherwise `MOCK_VIDEO_PROCESSING=false`
    /// selects gateway mode.
    pub fn from_env() -> Self {
        let mode = match std::env::var("PROCESSING_MODE") {
            Ok(value) => value.parse().unwrap_or_default(),
            Err(_) => {
                let mock = std::env::var("MOCK_VIDEO_PROCESSING")
                    .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0"))
                    .unwrap_or(true);
                if mock {
                    ProcessingMode::Simulated
                } else {
                    ProcessingMode::Gateway
                }
            }
        };

        Self {
            mode,
            job_duration: Duration::from_secs(
                std::env::var("SIMULATED_JOB_DURATION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_JOB_DURATION_SECS),
            ),
            progress_cap: std::env::var("PROGRESS_CAP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PROGRESS_CAP),
            result_prefix: std::env::var("RESULT_URL_PREFIX")
                .unwrap_or_else(|_| "/media/processed".to_string()),
            gateway: GatewayConfig::from_env(),
        }
        .normalized()
    }

    /// Clamp values into their valid ranges.
    pub fn normalized(mut self) -> Self {
        self.progress_cap = self.progress_cap.min(zclip_models::MAX_PENDING_PROGRESS);
        if self.job_duration.is_zero() {
            self.job_duration = Duration::from_secs(1);
        }
        self.result_prefix = self.result_prefix.trim_end_matches('/').to_string();
        self
    }

    /// Nominal duration as a chrono duration.
    pub fn nominal_duration(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.job_duration.as_millis() as i64)
    }

    /// Deterministic output location for a job.
    pub fn result_ref_for(&self, job_id: &zclip_models::JobId) -> String {
        format!("{}/{}_final.mp4", self.result_prefix, job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("Simulated".parse::<ProcessingMode>().unwrap(), ProcessingMode::Simulated);
        assert_eq!("gateway".parse::<ProcessingMode>().unwrap(), ProcessingMode::Gateway);
        assert!("queue".parse::<ProcessingMode>().is_err());
    }

    #[test]
    fn test_normalized_clamps() {
        let config = EngineConfig {
            progress_cap: 100,
            job_duration: Duration::ZERO,
            result_prefix: "/media/processed/".into(),
            ..EngineConfig::default()
        }
        .normalized();

        assert_eq!(config.progress_cap, 99);
        assert_eq!(config.job_duration, Duration::from_secs(1));
        assert_eq!(
            config.result_ref_for(&zclip_models::JobId::from("task_1")),
            "/media/processed/task_1_final.mp4"
        );
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.mode, ProcessingMode::Simulated);
        assert_eq!(config.nominal_duration(), chrono::Duration::seconds(30));
        assert_eq!(config.progress_cap, 95);
        assert_eq!(config.gateway.poll_timeout, Duration::from_secs(10));
    }
}
