//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "zclip_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "zclip_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "zclip_http_requests_in_flight";

    // Chat metrics
    pub const CHAT_MESSAGES_TOTAL: &str = "zclip_chat_messages_total";
    pub const CHAT_FALLBACKS_TOTAL: &str = "zclip_chat_fallbacks_total";

    // Upload metrics
    pub const UPLOADS_TOTAL: &str = "zclip_uploads_total";
    pub const UPLOAD_BYTES_TOTAL: &str = "zclip_upload_bytes_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "zclip_rate_limit_hits_total";
}

static JOB_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/api/(status|jobs)/[^/]+").expect("valid regex"));
static STYLE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/api/styles/[^/]+").expect("valid regex"));

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a chat message.
pub fn record_chat_message(state: &str) {
    let labels = [("state", state.to_string())];
    counter!(names::CHAT_MESSAGES_TOTAL, &labels).increment(1);
}

/// Record a chat reply served from the canned set.
pub fn record_chat_fallback() {
    counter!(names::CHAT_FALLBACKS_TOTAL).increment(1);
}

/// Record a stored upload.
pub fn record_upload(kind: &str, bytes: u64) {
    let labels = [("type", kind.to_string())];
    counter!(names::UPLOADS_TOTAL, &labels).increment(1);
    counter!(names::UPLOAD_BYTES_TOTAL, &labels).increment(bytes);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (replace job IDs and style names).
fn sanitize_path(path: &str) -> String {
    let path = JOB_PATH.replace(path, "/api/$1/:job_id");
    let path = STYLE_PATH.replace(&path, "/api/styles/:name");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/status/task_1700000000000_ab12cd34_7"),
            "/api/status/:job_id"
        );
        assert_eq!(
            sanitize_path("/api/jobs/task_1_ab_0/cancel"),
            "/api/jobs/:job_id/cancel"
        );
        assert_eq!(sanitize_path("/api/styles/gary_vee"), "/api/styles/:name");
        assert_eq!(sanitize_path("/api/process"), "/api/process");
    }
}
