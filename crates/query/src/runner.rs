//! Query job runner: submit → poll → terminal state.

use std::sync::Arc;
use std::time::Duration;

use telemetry::metrics;
use tracing::{debug, info, warn};

use pipeline_core::{Error, QueryJob, QueryState, Result};

use crate::clock::{Clock, TokioClock};
use crate::engine::{QueryContext, QueryEngine};

/// Poll loop configuration. The interval is configurable, not hardcoded;
/// the timeout bounds the whole wait.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Tabular result of a succeeded job.
///
/// An empty result (zero rows or header-only) is valid and distinct from a
/// failed fetch; maintenance statements produce no rows at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub job_id: String,
    /// Column labels from the header row; empty for row-less results
    pub columns: Vec<String>,
    /// Data rows, header excluded
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    /// Splits raw engine rows into header and data.
    pub fn from_raw(job_id: impl Into<String>, mut raw: Vec<Vec<String>>) -> Self {
        if raw.is_empty() {
            return Self {
                job_id: job_id.into(),
                columns: Vec::new(),
                rows: Vec::new(),
            };
        }
        let columns = raw.remove(0);
        Self {
            job_id: job_id.into(),
            columns,
            rows: raw,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Drives a submitted statement through the poll loop to a terminal state.
///
/// Holds no shared state across calls; each call owns its own job id and
/// poll budget. Dropping the returned future stops polling without touching
/// the remote job.
pub struct QueryRunner {
    engine: Arc<dyn QueryEngine>,
    clock: Arc<dyn Clock>,
    config: RunnerConfig,
    ctx: QueryContext,
}

impl QueryRunner {
    pub fn new(engine: Arc<dyn QueryEngine>, ctx: QueryContext) -> Self {
        Self::with_clock(engine, ctx, Arc::new(TokioClock), RunnerConfig::default())
    }

    pub fn with_config(
        engine: Arc<dyn QueryEngine>,
        ctx: QueryContext,
        config: RunnerConfig,
    ) -> Self {
        Self::with_clock(engine, ctx, Arc::new(TokioClock), config)
    }

    pub fn with_clock(
        engine: Arc<dyn QueryEngine>,
        ctx: QueryContext,
        clock: Arc<dyn Clock>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            engine,
            clock,
            config,
            ctx,
        }
    }

    /// Submits `statement` and waits for a terminal state.
    ///
    /// - SUCCEEDED: returns the tabular result (possibly empty-but-valid).
    /// - FAILED/CANCELLED: returns [`Error::Query`] with the engine reason;
    ///   never retried here, retry is the caller's decision.
    /// - No terminal state within the timeout: returns
    ///   [`Error::QueryTimeout`]; the remote job is left untouched.
    pub async fn submit_and_wait(&self, statement: &str) -> Result<QueryResult> {
        let id = self.engine.start_query(statement, &self.ctx).await?;
        metrics().queries_started.inc();

        // Submission puts the job in RUNNING; the state field below tracks
        // every status the engine reports until a terminal one.
        let mut job = QueryJob {
            id,
            state: QueryState::Running,
            statement: statement.to_string(),
            result_location: self.ctx.output_location.clone(),
        };

        info!(job_id = %job.id, database = %self.ctx.database, "Started query execution");

        let started = self.clock.now();

        loop {
            let status = self.engine.get_status(&job.id).await?;
            metrics().query_polls.inc();
            job.state = status.state;

            match status.state {
                QueryState::Succeeded => {
                    let elapsed = self.clock.now() - started;
                    metrics().queries_succeeded.inc();
                    metrics().query_wait_ms.observe(elapsed.as_millis() as u64);

                    let raw = self.engine.get_results(&job.id).await?;
                    let result = QueryResult::from_raw(&job.id, raw);
                    info!(
                        job_id = %job.id,
                        rows = result.rows.len(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Query succeeded"
                    );
                    return Ok(result);
                }
                QueryState::Failed | QueryState::Cancelled => {
                    metrics().queries_failed.inc();
                    warn!(
                        job_id = %job.id,
                        state = %status.state,
                        reason = status.reason.as_deref().unwrap_or("none"),
                        "Query reached terminal failure state"
                    );
                    return Err(Error::Query {
                        job_id: job.id,
                        state: status.state,
                        reason: status.reason,
                    });
                }
                QueryState::Running => {
                    debug!(job_id = %job.id, "Query still running");
                }
            }

            let elapsed = self.clock.now() - started;
            if elapsed >= self.config.timeout {
                metrics().queries_timed_out.inc();
                return Err(Error::QueryTimeout {
                    job_id: job.id,
                    elapsed,
                    last_state: job.state,
                });
            }

            // Never sleep past the timeout budget; a 1s timeout with a 2s
            // interval still gives up after ~1s.
            let wait = self.config.poll_interval.min(self.config.timeout - elapsed);
            self.clock.sleep(wait).await;
        }
    }

    /// Explicitly requests cancellation of a running job.
    pub async fn cancel(&self, job_id: &str) -> Result<()> {
        self.engine.stop_query(job_id).await
    }

    pub fn context(&self) -> &QueryContext {
        &self.ctx
    }
}
