//! HTTP client for the remote video processing API.

use std::path::Path;
use std::time::Instant;

use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zclip_models::{JobStatus, StyleParams};

use crate::config::GatewayConfig;
use crate::error::{JobError, JobResult};
use crate::metrics;

/// Status document returned by `GET {base}/status/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteStatus {
    /// Provider status string, translated by [`RemoteStatus::job_status`]
    #[serde(default)]
    pub status: String,
    /// Reported progress, 0-100
    #[serde(default)]
    pub progress: Option<f64>,
    /// Output location once finished
    #[serde(default, alias = "output_url")]
    pub download_url: Option<String>,
    /// Provider error message
    #[serde(default, alias = "message")]
    pub error: Option<String>,
}

impl RemoteStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Self::default()
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Translate the provider status into the local state machine.
    /// Unrecognized values count as still processing.
    pub fn job_status(&self) -> JobStatus {
        match self.status.trim().to_lowercase().as_str() {
            "queued" | "pending" | "submitted" => JobStatus::Submitted,
            "processing" | "running" | "in_progress" => JobStatus::Processing,
            "completed" | "succeeded" | "done" => JobStatus::Completed,
            "canceled" | "cancelled" => JobStatus::Canceled,
            "failed" | "error" => JobStatus::Error,
            _ => JobStatus::Processing,
        }
    }

    /// Reported progress as a whole percentage.
    pub fn progress_percent(&self) -> u8 {
        self.progress
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 100.0).floor() as u8)
            .unwrap_or(0)
    }
}

#[derive(Debug, Serialize)]
struct SubmitPayload<'a> {
    input_video: String,
    output_format: &'a str,
    quality: &'a str,
    style_preset: &'a StyleParams,
    user_instructions: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_video: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style_transfer: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    #[serde(default, alias = "url")]
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default, alias = "id")]
    task_id: Option<String>,
}

/// Client for the remote processing API.
#[derive(Clone)]
pub struct RemoteGateway {
    config: GatewayConfig,
    client: Client,
}

impl RemoteGateway {
    /// Create a new gateway client.
    pub fn new(config: GatewayConfig) -> JobResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("zclip/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JobError::gateway_unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Submit a job. Returns the provider's task ID.
    pub async fn submit(
        &self,
        main_input_ref: &str,
        reference_input_ref: Option<&str>,
        style: &StyleParams,
        instructions: &str,
    ) -> JobResult<String> {
        let payload = SubmitPayload {
            input_video: self.prepare_input_url(main_input_ref),
            output_format: "mp4",
            quality: "high",
            style_preset: style,
            user_instructions: instructions,
            callback_url: self.config.callback_url.as_deref(),
            reference_video: reference_input_ref.map(|r| self.prepare_input_url(r)),
            style_transfer: reference_input_ref.map(|_| true),
        };

        let url = self.endpoint("process");
        info!(url = %url, style = %style.style, "Submitting job to processing API");

        let request = self
            .client
            .post(&url)
            .json(&payload)
            .timeout(self.config.submit_timeout);
        let response = self.send("submit", request).await?;

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| JobError::gateway_unavailable(format!("invalid submit response: {}", e)))?;

        match body.task_id {
            Some(task_id) if !task_id.trim().is_empty() => Ok(task_id),
            _ => Err(JobError::gateway_unavailable(
                "submit response did not contain a task_id",
            )),
        }
    }

    /// Fetch the current status of a remote job.
    pub async fn poll(&self, external_job_id: &str) -> JobResult<RemoteStatus> {
        let url = self.endpoint(&format!("status/{}", external_job_id));
        debug!(url = %url, "Polling processing API");

        let request = self.client.get(&url).timeout(self.config.poll_timeout);
        let response = self.send("poll", request).await?;

        response
            .json()
            .await
            .map_err(|e| JobError::gateway_unavailable(format!("invalid status response: {}", e)))
    }

    /// Look up the output location of a finished remote job.
    ///
    /// `Ok(None)` means the provider answered without a usable location.
    pub async fn download_url(&self, external_job_id: &str) -> JobResult<Option<String>> {
        let url = self.endpoint(&format!("download/{}", external_job_id));
        debug!(url = %url, "Fetching download location");

        let request = self.client.get(&url).timeout(self.config.poll_timeout);
        let response = self.send("download", request).await?;

        let body: DownloadResponse = response
            .json()
            .await
            .map_err(|e| JobError::gateway_unavailable(format!("invalid download response: {}", e)))?;

        Ok(body.download_url.filter(|u| !u.trim().is_empty()))
    }

    /// Ask the provider to stop a remote job.
    pub async fn cancel(&self, external_job_id: &str) -> JobResult<()> {
        let url = self.endpoint(&format!("cancel/{}", external_job_id));
        info!(url = %url, "Canceling job on processing API");

        let request = self.client.post(&url).timeout(self.config.poll_timeout);
        self.send("cancel", request).await?;
        Ok(())
    }

    /// Turn a stored media reference into something the provider can fetch.
    pub fn prepare_input_url(&self, input_ref: &str) -> String {
        if input_ref.starts_with("http://") || input_ref.starts_with("https://") {
            return input_ref.to_string();
        }

        if let Some(base) = &self.config.media_base_url {
            return format!(
                "{}/{}",
                base.trim_end_matches('/'),
                input_ref.trim_start_matches('/')
            );
        }

        let path = Path::new(input_ref);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };

        url::Url::from_file_path(&absolute)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("file://{}", input_ref))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> JobResult<Response> {
        let start = Instant::now();
        let result = request.bearer_auth(&self.config.api_key).send().await;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                metrics::record_gateway_request(operation, false, latency_ms);
                warn!(operation, error = %e, "Processing API request failed");
                return Err(e.into());
            }
        };

        let status = response.status();
        metrics::record_gateway_request(operation, status.is_success(), latency_ms);

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(operation, status = %status, "Processing API returned an error");
            return Err(JobError::gateway_unavailable(format!(
                "processing API returned {}: {}",
                status, text
            )));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zclip_models::map_style;

    fn gateway(server: &MockServer) -> RemoteGateway {
        RemoteGateway::new(GatewayConfig {
            base_url: server.uri(),
            api_key: "test-key".into(),
            media_base_url: Some("https://cdn.example.com/media/".into()),
            submit_timeout: Duration::from_secs(2),
            poll_timeout: Duration::from_millis(200),
            ..GatewayConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_status_translation() {
        let cases = [
            ("queued", JobStatus::Submitted),
            ("PENDING", JobStatus::Submitted),
            ("running", JobStatus::Processing),
            ("in_progress", JobStatus::Processing),
            ("succeeded", JobStatus::Completed),
            ("done", JobStatus::Completed),
            ("cancelled", JobStatus::Canceled),
            ("failed", JobStatus::Error),
            ("rendering", JobStatus::Processing),
            ("", JobStatus::Processing),
        ];
        for (raw, expected) in cases {
            assert_eq!(RemoteStatus::new(raw).job_status(), expected, "status {:?}", raw);
        }
    }

    #[test]
    fn test_progress_percent_clamps() {
        assert_eq!(RemoteStatus::new("running").progress_percent(), 0);
        assert_eq!(RemoteStatus::new("running").with_progress(42.7).progress_percent(), 42);
        assert_eq!(RemoteStatus::new("running").with_progress(250.0).progress_percent(), 100);
        assert_eq!(RemoteStatus::new("running").with_progress(-3.0).progress_percent(), 0);
        assert_eq!(RemoteStatus::new("running").with_progress(f64::NAN).progress_percent(), 0);
    }

    #[test]
    fn test_prepare_input_url() {
        let with_base = RemoteGateway::new(GatewayConfig {
            media_base_url: Some("https://cdn.example.com/media/".into()),
            ..GatewayConfig::default()
        })
        .unwrap();
        assert_eq!(
            with_base.prepare_input_url("https://youtu.be/abc"),
            "https://youtu.be/abc"
        );
        assert_eq!(
            with_base.prepare_input_url("/uploads/main/clip.mp4"),
            "https://cdn.example.com/media/uploads/main/clip.mp4"
        );

        let without_base = RemoteGateway::new(GatewayConfig::default()).unwrap();
        assert_eq!(
            without_base.prepare_input_url("/srv/media/clip.mp4"),
            "file:///srv/media/clip.mp4"
        );
        assert!(without_base
            .prepare_input_url("uploads/clip.mp4")
            .starts_with("file://"));
    }

    #[tokio::test]
    async fn test_submit_sends_payload_and_returns_task_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "input_video": "https://cdn.example.com/media/uploads/main/a.mp4",
                "output_format": "mp4",
                "quality": "high",
                "style_preset": { "style": "fast_cuts", "pace": "high" },
                "user_instructions": "make it punchy",
                "reference_video": "https://cdn.example.com/media/uploads/reference/b.mp4",
                "style_transfer": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "task_id": "ext-123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let task_id = gateway(&server)
            .submit(
                "uploads/main/a.mp4",
                Some("uploads/reference/b.mp4"),
                &map_style("Alex Hormozi"),
                "make it punchy",
            )
            .await
            .unwrap();

        assert_eq!(task_id, "ext-123");
    }

    #[tokio::test]
    async fn test_submit_non_success_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .submit("a.mp4", None, &map_style("default"), "")
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::GatewayUnavailable(ref msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_submit_without_task_id_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/process"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .submit("a.mp4", None, &map_style("default"), "")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "gateway_unavailable");
    }

    #[tokio::test]
    async fn test_poll_decodes_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/ext-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "completed",
                "progress": 100,
                "download_url": "https://cdn.example.com/out.mp4"
            })))
            .mount(&server)
            .await;

        let status = gateway(&server).poll("ext-1").await.unwrap();
        assert_eq!(status.job_status(), JobStatus::Completed);
        assert_eq!(status.progress_percent(), 100);
        assert_eq!(status.download_url.as_deref(), Some("https://cdn.example.com/out.mp4"));
    }

    #[tokio::test]
    async fn test_poll_timeout_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "running"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = gateway(&server).poll("slow").await.unwrap_err();
        assert!(matches!(err, JobError::GatewayUnavailable(_)));
    }

    #[tokio::test]
    async fn test_cancel_posts_to_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cancel/ext-9"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        gateway(&server).cancel("ext-9").await.unwrap();
    }

    #[tokio::test]
    async fn test_download_url_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download/ext-7"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "download_url": "https://cdn.example.com/ext-7.mp4"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = gateway(&server).download_url("ext-7").await.unwrap();
        assert_eq!(url.as_deref(), Some("https://cdn.example.com/ext-7.mp4"));
    }

    #[tokio::test]
    async fn test_download_url_blank_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download/ext-8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "download_url": "  "
            })))
            .mount(&server)
            .await;

        assert_eq!(gateway(&server).download_url("ext-8").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_download_url_missing_job_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let err = gateway(&server).download_url("gone").await.unwrap_err();
        assert!(matches!(err, JobError::GatewayUnavailable(ref msg) if msg.contains("404")));
    }
}
