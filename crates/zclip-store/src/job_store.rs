//! Job record stores.
//!
//! The lifecycle engine depends only on the [`JobRecordStore`] get/put
//! contract. Writers for distinct job IDs never interfere; concurrent writers
//! for the same job ID are not coordinated (last writer wins).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use zclip_models::{JobId, JobRecord};

use crate::error::{StorageError, StorageResult};

/// Subdirectory holding one JSON document per job.
const TASKS_DIR: &str = "processing_tasks";

/// Key-addressable persistence for job records.
#[async_trait]
pub trait JobRecordStore: Send + Sync {
    /// Short backend name for logs and readiness output.
    fn name(&self) -> &'static str;

    /// Store the record under its job ID, replacing any previous version.
    async fn put(&self, record: &JobRecord) -> StorageResult<()>;

    /// Load the record for a job ID.
    async fn get(&self, job_id: &JobId) -> StorageResult<Option<JobRecord>>;

    /// Check that the backing medium is usable.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Process-local record store.
#[derive(Clone, Default)]
pub struct InMemoryJobStore {
    records: Arc<RwLock<HashMap<JobId, JobRecord>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl JobRecordStore for InMemoryJobStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, record: &JobRecord) -> StorageResult<()> {
        self.records
            .write()
            .await
            .insert(record.job_id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, job_id: &JobId) -> StorageResult<Option<JobRecord>> {
        Ok(self.records.read().await.get(job_id).cloned())
    }
}

/// Record store keeping one JSON document per job on disk.
///
/// Layout: `<root>/processing_tasks/<job_id>.json`.
#[derive(Debug, Clone)]
pub struct FileJobStore {
    root: PathBuf,
}

impl FileJobStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the job documents.
    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join(TASKS_DIR)
    }

    fn record_path(&self, job_id: &JobId) -> StorageResult<PathBuf> {
        if !job_id.is_well_formed() {
            return Err(StorageError::invalid_key(job_id.as_str()));
        }
        Ok(self.tasks_dir().join(format!("{}.json", job_id)))
    }

    /// Write through a per-call temp file so overlapping writers for the
    /// same job never share one.
    async fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
        let tmp = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));

        let result = match tokio::fs::write(&tmp, bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, path)
                .await
                .map_err(|e| StorageError::write_failed(format!("{}: {}", path.display(), e))),
            Err(e) => Err(StorageError::write_failed(format!("{}: {}", tmp.display(), e))),
        };

        if result.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        result
    }
}

#[async_trait]
impl JobRecordStore for FileJobStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn put(&self, record: &JobRecord) -> StorageResult<()> {
        let path = self.record_path(&record.job_id)?;
        tokio::fs::create_dir_all(self.tasks_dir()).await?;

        let bytes = serde_json::to_vec_pretty(record)?;
        Self::write_atomic(&path, &bytes).await?;

        debug!(job_id = %record.job_id, path = %path.display(), "Stored job record");
        Ok(())
    }

    async fn get(&self, job_id: &JobId) -> StorageResult<Option<JobRecord>> {
        // A malformed ID can never have been stored.
        let Ok(path) = self.record_path(job_id) else {
            return Ok(None);
        };

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                warn!(job_id = %job_id, "Failed to read job record: {}", e);
                return Err(StorageError::read_failed(format!("{}: {}", path.display(), e)));
            }
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn health_check(&self) -> StorageResult<()> {
        tokio::fs::create_dir_all(self.tasks_dir()).await?;
        let metadata = tokio::fs::metadata(self.tasks_dir()).await?;
        if metadata.permissions().readonly() {
            return Err(StorageError::config_error(format!(
                "{} is read-only",
                self.tasks_dir().display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use zclip_models::{map_style, JobRequest, JobStatus};

    fn record(main: &str) -> JobRecord {
        let now = Utc::now();
        JobRecord::new(
            JobId::generate(main, now),
            JobRequest::new(main, "Gary Vee"),
            map_style("Gary Vee"),
            now,
            Duration::seconds(30),
        )
    }

    #[tokio::test]
    async fn test_in_memory_put_get_overwrite() {
        let store = InMemoryJobStore::new();
        let mut job = record("a.mp4");

        store.put(&job).await.unwrap();
        job.start_processing(Utc::now());
        store.put(&job).await.unwrap();

        let loaded = store.get(&job.job_id).await.unwrap().unwrap();
        assert_eq!(loaded.status, JobStatus::Processing);
        assert_eq!(store.len().await, 1);
        assert!(store.get(&JobId::from("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_concurrent_distinct_writers() {
        let store = InMemoryJobStore::new();
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.put(&record(&format!("{}.mp4", i))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.len().await, 16);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::new(dir.path());
        let job = record("clip.mp4");

        store.put(&job).await.unwrap();
        assert!(store
            .tasks_dir()
            .join(format!("{}.json", job.job_id))
            .exists());

        let loaded = store.get(&job.job_id).await.unwrap().unwrap();
        assert_eq!(loaded, job);
    }

    #[tokio::test]
    async fn test_file_store_overlapping_writes_same_job() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileJobStore::new(dir.path()));
        let job = record("clip.mp4");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                let job = job.clone();
                tokio::spawn(async move { store.put(&job).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.get(&job.job_id).await.unwrap().unwrap(), job);

        // No temp files left behind
        let mut entries = tokio::fs::read_dir(store.tasks_dir()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec![format!("{}.json", job.job_id)]);
    }

    #[tokio::test]
    async fn test_file_store_unknown_and_malformed_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::new(dir.path());

        assert!(store.get(&JobId::from("unknown-id")).await.unwrap().is_none());
        assert!(store.get(&JobId::from("../escape")).await.unwrap().is_none());

        let mut job = record("x.mp4");
        job.job_id = JobId::from("../escape");
        let err = store.put(&job).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_file_store_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::new(dir.path());
        tokio::fs::create_dir_all(store.tasks_dir()).await.unwrap();
        tokio::fs::write(store.tasks_dir().join("broken.json"), b"{not json")
            .await
            .unwrap();

        let err = store.get(&JobId::from("broken")).await.unwrap_err();
        assert!(matches!(err, StorageError::Json(_)));
    }

    #[tokio::test]
    async fn test_file_store_health_check_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::new(dir.path().join("nested"));
        store.health_check().await.unwrap();
        assert!(store.tasks_dir().is_dir());
    }
}
