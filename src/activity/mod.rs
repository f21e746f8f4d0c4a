//! Activity tracking for the summarization pipeline.
//!
//! Exposes what the pipeline processed and dropped, both for the operator
//! (`stream-summary status`) and for embedding applications.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, ActivityLog, ActivityStats,
    SharedActivityLog,
};
