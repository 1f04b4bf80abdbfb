//! Query job lifecycle types.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an asynchronous query job.
///
/// Submission is transient; a job is `Running` immediately after submit and
/// transitions exactly once to one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for QueryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A query job as tracked by the runner.
///
/// The id is assigned by the external engine on submission; once a terminal
/// state is reached the job is read-only and never resubmitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryJob {
    pub id: String,
    pub state: QueryState,
    pub statement: String,
    pub result_location: String,
}
