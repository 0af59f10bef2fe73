//! API configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default upload limit (2 GiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024 * 1024;

/// Which record store backs the job engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStoreKind {
    /// Process-local, lost on restart
    #[default]
    Memory,
    /// One JSON document per job under `job_store_dir`
    File,
}

impl FromStr for JobStoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(JobStoreKind::Memory),
            "file" | "fs" => Ok(JobStoreKind::File),
            other => Err(format!("unknown job store: {}", other)),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Serve Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    /// Root directory for uploaded media
    pub media_root: PathBuf,
    /// Job record store backend
    pub job_store: JobStoreKind,
    /// Root directory of the file job store
    pub job_store_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            request_timeout: Duration::from_secs(30),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            environment: "development".to_string(),
            metrics_enabled: true,
            media_root: PathBuf::from("media"),
            job_store: JobStoreKind::Memory,
            job_store_dir: PathBuf::from("media"),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let media_root =
            PathBuf::from(std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()));

        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            job_store: std::env::var("JOB_STORE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            job_store_dir: std::env::var("JOB_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| media_root.clone()),
            media_root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_store_kind_parse() {
        assert_eq!("memory".parse::<JobStoreKind>().unwrap(), JobStoreKind::Memory);
        assert_eq!("FILE".parse::<JobStoreKind>().unwrap(), JobStoreKind::File);
        assert!("redis".parse::<JobStoreKind>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_body_size, 2 * 1024 * 1024 * 1024);
        assert_eq!(config.job_store, JobStoreKind::Memory);
    }
}
