//! Shared data models for the ZuckClip backend.
//!
//! This crate provides Serde-serializable types for:
//! - Processing job records and their status model
//! - Status snapshots handed out to callers
//! - Style templates and their processing parameters
//! - Chat assistant messages

pub mod chat;
pub mod job;
pub mod job_status;
pub mod style;

// Re-export common types
pub use chat::{ChatRole, ChatTurn, ConversationState};
pub use job::{ExecutionMode, JobId, JobRecord, JobRequest, JobStatus, MAX_PENDING_PROGRESS};
pub use job_status::JobStatusSnapshot;
pub use style::{map_style, StyleParams, StyleParseError, StyleTemplate};
