//! Job record and media file storage.
//!
//! This crate provides:
//! - The `JobRecordStore` contract used by the job lifecycle engine
//! - In-memory and JSON-file record stores
//! - Local filesystem storage for uploaded media

pub mod error;
pub mod job_store;
pub mod media;

pub use error::{StorageError, StorageResult};
pub use job_store::{FileJobStore, InMemoryJobStore, JobRecordStore};
pub use media::{sanitize_file_name, LocalMediaStorage, MediaStorage};
