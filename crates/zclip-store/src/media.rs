//! Uploaded media storage.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Suffixed names tried before giving up on a taken path.
const MAX_NAME_ATTEMPTS: usize = 8;

/// File storage for uploaded footage.
///
/// Paths are relative, `/`-separated keys such as `uploads/main/clip.mp4`.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store bytes under `path`. Never overwrites: when the path is taken a
    /// unique suffix is added. Returns the path actually used.
    async fn save(&self, path: &str, bytes: Vec<u8>) -> StorageResult<String>;

    /// Read the bytes stored under `path`.
    async fn open(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Whether something is stored under `path`.
    async fn exists(&self, path: &str) -> StorageResult<bool>;
}

/// Media storage on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative key below the root, rejecting anything that could
    /// escape it.
    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains('\\') {
            return Err(StorageError::invalid_key(key));
        }
        let relative = Path::new(key);
        let all_normal = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !all_normal {
            return Err(StorageError::invalid_key(key));
        }
        Ok(self.root.join(relative))
    }
}

/// Append a short random suffix before the extension of `key`.
fn with_unique_suffix(key: &str) -> String {
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    let (dir, file) = match key.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, key),
    };
    let file = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", file, suffix),
    };
    match dir {
        Some(dir) => format!("{}/{}", dir, file),
        None => file,
    }
}

/// Reduce a client-supplied file name to a safe single path segment.
pub fn sanitize_file_name(name: &str) -> String {
    // Browsers on Windows may send the full client path
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn save(&self, path: &str, bytes: Vec<u8>) -> StorageResult<String> {
        let mut key = path.to_string();
        let mut target = self.resolve(&key)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Claim the name atomically; a taken name gets a fresh suffix
        let mut attempts = 0;
        let mut file = loop {
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .await;
            match opened {
                Ok(file) => break file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempts < MAX_NAME_ATTEMPTS => {
                    attempts += 1;
                    key = with_unique_suffix(path);
                    target = self.resolve(&key)?;
                }
                Err(e) => return Err(StorageError::write_failed(format!("{}: {}", key, e))),
            }
        };

        let size = bytes.len();
        let written = async {
            file.write_all(&bytes).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            drop(file);
            let _ = tokio::fs::remove_file(&target).await;
            return Err(StorageError::write_failed(format!("{}: {}", key, e)));
        }

        info!("Stored {} bytes at {}", size, key);
        Ok(key)
    }

    async fn open(&self, path: &str) -> StorageResult<Vec<u8>> {
        let target = self.resolve(path)?;
        debug!("Reading {}", target.display());
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::not_found(path))
            }
            Err(e) => Err(StorageError::read_failed(format!("{}: {}", path, e))),
        }
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&target).await?)
    }
}
