//! Processing backends.
//!
//! A backend decides how a job is executed. It is selected once at startup
//! from [`EngineConfig`] and shared by every request.

use std::sync::Arc;

use async_trait::async_trait;
use zclip_models::{ExecutionMode, JobRecord};

use crate::config::{EngineConfig, ProcessingMode};
use crate::error::{JobError, JobResult};
use crate::gateway::{RemoteGateway, RemoteStatus};

/// Execution capability behind the job engine.
#[async_trait]
pub trait ProcessingBackend: Send + Sync {
    /// Mode this backend implements.
    fn mode(&self) -> ProcessingMode;

    /// Start executing a freshly created job.
    async fn submit(&self, record: &JobRecord) -> JobResult<ExecutionMode>;

    /// Status of a remote job.
    async fn poll(&self, external_job_id: &str) -> JobResult<RemoteStatus>;

    /// Stop a remote job.
    async fn cancel(&self, external_job_id: &str) -> JobResult<()>;

    /// Output location of a finished remote job, when the status
    /// document did not carry one.
    async fn result_location(&self, external_job_id: &str) -> JobResult<Option<String>>;
}

/// Time-driven backend. Nothing runs anywhere; the engine derives progress
/// from elapsed time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedBackend;

#[async_trait]
impl ProcessingBackend for SimulatedBackend {
    fn mode(&self) -> ProcessingMode {
        ProcessingMode::Simulated
    }

    async fn submit(&self, _record: &JobRecord) -> JobResult<ExecutionMode> {
        Ok(ExecutionMode::Simulated)
    }

    async fn poll(&self, external_job_id: &str) -> JobResult<RemoteStatus> {
        Err(JobError::invalid_state(format!(
            "simulated backend has no remote job {}",
            external_job_id
        )))
    }

    async fn cancel(&self, _external_job_id: &str) -> JobResult<()> {
        Ok(())
    }

    async fn result_location(&self, _external_job_id: &str) -> JobResult<Option<String>> {
        Ok(None)
    }
}

/// Backend that delegates jobs to the remote processing API.
#[derive(Clone)]
pub struct GatewayBackend {
    gateway: RemoteGateway,
}

impl GatewayBackend {
    pub fn new(gateway: RemoteGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ProcessingBackend for GatewayBackend {
    fn mode(&self) -> ProcessingMode {
        ProcessingMode::Gateway
    }

    async fn submit(&self, record: &JobRecord) -> JobResult<ExecutionMode> {
        let external_job_id = self
            .gateway
            .submit(
                &record.main_input_ref,
                record.reference_input_ref.as_deref(),
                &record.style_params,
                &record.instructions,
            )
            .await?;

        Ok(ExecutionMode::Remote { external_job_id })
    }

    async fn poll(&self, external_job_id: &str) -> JobResult<RemoteStatus> {
        self.gateway.poll(external_job_id).await
    }

    async fn cancel(&self, external_job_id: &str) -> JobResult<()> {
        self.gateway.cancel(external_job_id).await
    }

    async fn result_location(&self, external_job_id: &str) -> JobResult<Option<String>> {
        self.gateway.download_url(external_job_id).await
    }
}

/// Build the backend selected by configuration.
pub fn backend_from_config(config: &EngineConfig) -> JobResult<Arc<dyn ProcessingBackend>> {
    match config.mode {
        ProcessingMode::Simulated => Ok(Arc::new(SimulatedBackend)),
        ProcessingMode::Gateway => {
            let gateway = RemoteGateway::new(config.gateway.clone())?;
            Ok(Arc::new(GatewayBackend::new(gateway)))
        }
    }
}
