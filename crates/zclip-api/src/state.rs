//! Application state.

use std::sync::Arc;

use tracing::info;
use zclip_engine::{EngineConfig, JobEngine};
use zclip_store::{FileJobStore, InMemoryJobStore, JobRecordStore, LocalMediaStorage, MediaStorage};

use crate::config::{ApiConfig, JobStoreKind};
use crate::services::{AssistantConfig, AssistantService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub engine: Arc<JobEngine>,
    pub media: Arc<dyn MediaStorage>,
    pub assistant: Arc<AssistantService>,
}

impl AppState {
    /// Create application state from the environment.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn JobRecordStore> = match config.job_store {
            JobStoreKind::Memory => Arc::new(InMemoryJobStore::new()),
            JobStoreKind::File => Arc::new(FileJobStore::new(&config.job_store_dir)),
        };
        store.health_check().await?;

        let engine_config = EngineConfig::from_env();
        info!(
            mode = %engine_config.mode,
            store = store.name(),
            job_duration_secs = engine_config.job_duration.as_secs(),
            "Job engine configured"
        );
        let engine = JobEngine::from_config(engine_config, store)?;

        tokio::fs::create_dir_all(&config.media_root).await?;
        let media = Arc::new(LocalMediaStorage::new(&config.media_root));

        let assistant = AssistantService::new(AssistantConfig::from_env())?;

        Ok(Self::from_parts(config, engine, media, assistant))
    }

    /// Assemble state from already-built components.
    pub fn from_parts(
        config: ApiConfig,
        engine: JobEngine,
        media: Arc<dyn MediaStorage>,
        assistant: AssistantService,
    ) -> Self {
        Self {
            config,
            engine: Arc::new(engine),
            media,
            assistant: Arc::new(assistant),
        }
    }
}
