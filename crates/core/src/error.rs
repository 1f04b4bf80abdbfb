//! Unified error types for the parking pipeline.
//!
//! The taxonomy separates validation failures (non-retryable), transient
//! transport faults, per-event store failures, and terminal query outcomes.
//! Query errors are returned as values so orchestration code can decide
//! whether a failed job blocks a dependent step.

use std::time::Duration;

use thiserror::Error;

use crate::job::QueryState;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the parking pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Event timestamp does not match `YYYY-MM-DDTHH:MM:SSZ`. Hard
    /// validation error; surfaced to the caller, never silently dropped.
    #[error("malformed timestamp {value:?}: expected YYYY-MM-DDTHH:MM:SSZ")]
    MalformedTimestamp { value: String },

    /// Transient transport fault. The caller may retry produce/consume;
    /// already-accepted messages keep their order.
    #[error("transport error: {0}")]
    Transport(String),

    /// A single object write failed. Reported per event and never aborts
    /// sibling writes in the same batch.
    #[error("store write failed for {key}: {message}")]
    StoreWrite { key: String, message: String },

    /// A query job reached FAILED or CANCELLED. Carries the engine-provided
    /// reason when present. Never retried automatically.
    #[error("query {job_id} {state}: {}", .reason.as_deref().unwrap_or("no reason provided"))]
    Query {
        job_id: String,
        state: QueryState,
        reason: Option<String>,
    },

    /// Polling gave up before a terminal state was observed. The remote job
    /// keeps running; no cancel request is issued implicitly.
    #[error("query {job_id} timed out after {elapsed:?} (last state {last_state})")]
    QueryTimeout {
        job_id: String,
        elapsed: Duration,
        last_state: QueryState,
    },

    /// Create of an already-existing catalog entity. Success-equivalent for
    /// idempotent provisioning.
    #[error("catalog entity already exists: {0}")]
    CatalogConflict(String),

    /// Catalog entity not found (e.g. delete of a missing table).
    #[error("catalog entity not found: {0}")]
    CatalogNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn store_write(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::StoreWrite {
            key: key.into(),
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the caller may retry the operation that produced this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::StoreWrite { .. })
    }
}
