//! Query engine collaborator interface.

use async_trait::async_trait;
use pipeline_core::{QueryState, Result};
use serde::{Deserialize, Serialize};

/// Execution context passed with every submitted statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryContext {
    /// Database the statement runs against
    pub database: String,
    /// Where the engine writes result objects
    pub output_location: String,
    /// Engine workgroup
    pub workgroup: String,
}

impl Default for QueryContext {
    fn default() -> Self {
        Self {
            database: "parking_analytics".to_string(),
            output_location: "athena-results/".to_string(),
            workgroup: "primary".to_string(),
        }
    }
}

/// Status reported by the engine for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub state: QueryState,
    /// Engine-provided reason, present on FAILED/CANCELLED when available
    pub reason: Option<String>,
}

impl JobStatus {
    pub fn running() -> Self {
        Self {
            state: QueryState::Running,
            reason: None,
        }
    }

    pub fn succeeded() -> Self {
        Self {
            state: QueryState::Succeeded,
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            state: QueryState::Failed,
            reason: Some(reason.into()),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            state: QueryState::Cancelled,
            reason: None,
        }
    }
}

/// External engine that executes statements asynchronously.
///
/// `start_query` assigns an opaque job id; the job then transitions exactly
/// once to a terminal state which `get_status` eventually reports.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn start_query(&self, statement: &str, ctx: &QueryContext) -> Result<String>;

    async fn get_status(&self, job_id: &str) -> Result<JobStatus>;

    /// Raw result rows including the header row. Maintenance statements may
    /// return no rows at all.
    async fn get_results(&self, job_id: &str) -> Result<Vec<Vec<String>>>;

    /// Requests cancellation. Only ever called at the caller's explicit
    /// request; the runner never cancels implicitly.
    async fn stop_query(&self, job_id: &str) -> Result<()>;
}
