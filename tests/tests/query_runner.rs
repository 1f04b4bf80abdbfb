//! Query runner poll-loop behavior against a scripted engine.

use std::sync::Arc;
use std::time::Duration;

use integration_tests::mocks::{FakeClock, ScriptedEngine};
use pipeline_core::{Error, QueryState};
use query::{JobStatus, QueryContext, QueryRunner, RunnerConfig};

fn runner_with(engine: Arc<ScriptedEngine>, clock: Arc<FakeClock>, config: RunnerConfig) -> QueryRunner {
    QueryRunner::with_clock(engine, QueryContext::default(), clock, config)
}

fn fast_config() -> RunnerConfig {
    RunnerConfig {
        poll_interval: Duration::from_secs(2),
        timeout: Duration::from_secs(300),
    }
}

#[tokio::test]
async fn polls_until_succeeded_and_strips_the_header() {
    let engine = Arc::new(
        ScriptedEngine::new(vec![
            JobStatus::running(),
            JobStatus::running(),
            JobStatus::succeeded(),
        ])
        .with_results(vec![
            vec!["spot_id".into(), "status".into()],
            vec!["A1".into(), "occupied".into()],
        ]),
    );
    let clock = Arc::new(FakeClock::new());
    let runner = runner_with(engine.clone(), clock, fast_config());

    let result = runner
        .submit_and_wait("SELECT spot_id, status FROM parking_events")
        .await
        .unwrap();

    assert_eq!(engine.poll_count(), 3);
    assert_eq!(result.columns, vec!["spot_id", "status"]);
    assert_eq!(result.rows, vec![vec!["A1", "occupied"]]);
    assert_eq!(
        engine.started_statements(),
        vec!["SELECT spot_id, status FROM parking_events"]
    );
}

#[tokio::test]
async fn failed_job_surfaces_the_engine_reason() {
    let engine = Arc::new(ScriptedEngine::new(vec![
        JobStatus::running(),
        JobStatus::failed("Internal Error"),
    ]));
    let clock = Arc::new(FakeClock::new());
    let runner = runner_with(engine.clone(), clock, fast_config());

    let err = runner.submit_and_wait("SELECT 1").await.unwrap_err();
    match err {
        Error::Query { state, reason, .. } => {
            assert_eq!(state, QueryState::Failed);
            assert_eq!(reason.as_deref(), Some("Internal Error"));
        }
        other => panic!("expected Query error, got {other}"),
    }

    // Terminal failure ends the loop; no further polls, no auto-retry.
    assert_eq!(engine.poll_count(), 2);
    assert_eq!(engine.started_statements().len(), 1);
}

#[tokio::test]
async fn cancelled_job_is_a_query_error_not_a_timeout() {
    let engine = Arc::new(ScriptedEngine::new(vec![JobStatus::cancelled()]));
    let clock = Arc::new(FakeClock::new());
    let runner = runner_with(engine, clock, fast_config());

    let err = runner.submit_and_wait("SELECT 1").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Query {
            state: QueryState::Cancelled,
            ..
        }
    ));
}

#[tokio::test]
async fn times_out_even_when_the_interval_exceeds_the_budget() {
    let engine = Arc::new(ScriptedEngine::never_finishing());
    let clock = Arc::new(FakeClock::new());
    let runner = runner_with(
        engine.clone(),
        clock.clone(),
        RunnerConfig {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(1),
        },
    );

    let err = runner.submit_and_wait("SELECT 1").await.unwrap_err();
    match err {
        Error::QueryTimeout {
            job_id,
            elapsed,
            last_state,
        } => {
            // The error names the engine-assigned job and its last
            // observed state.
            assert_eq!(job_id, "job-1");
            assert_eq!(elapsed, Duration::from_secs(1));
            assert_eq!(last_state, QueryState::Running);
        }
        other => panic!("expected QueryTimeout, got {other}"),
    }

    // The final sleep was clamped to the remaining budget, not the full
    // interval.
    assert_eq!(clock.elapsed(), Duration::from_secs(1));
    // Timing out never cancels the remote job.
    assert!(engine.stopped_jobs().is_empty());
}

#[tokio::test]
async fn timeout_message_names_the_last_observed_state() {
    let engine = Arc::new(ScriptedEngine::never_finishing());
    let clock = Arc::new(FakeClock::new());
    let runner = runner_with(
        engine,
        clock,
        RunnerConfig {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(20),
        },
    );

    let err = runner.submit_and_wait("SELECT 1").await.unwrap_err();
    assert!(err.to_string().contains("RUNNING"));
}

#[tokio::test]
async fn header_only_result_is_empty_but_valid() {
    let engine = Arc::new(ScriptedEngine::succeeding(vec![vec!["count".into()]]));
    let clock = Arc::new(FakeClock::new());
    let runner = runner_with(engine, clock, fast_config());

    let result = runner
        .submit_and_wait("SELECT count(*) FROM parking_events WHERE 1=0")
        .await
        .unwrap();
    assert_eq!(result.columns, vec!["count"]);
    assert!(result.is_empty());
}

#[tokio::test]
async fn maintenance_statement_yields_no_rows() {
    let engine = Arc::new(ScriptedEngine::succeeding(Vec::new()));
    let clock = Arc::new(FakeClock::new());
    let runner = runner_with(engine.clone(), clock, fast_config());

    query::repair_partitions(&runner, "parking_analytics", "parking_events")
        .await
        .unwrap();

    assert_eq!(
        engine.started_statements(),
        vec!["MSCK REPAIR TABLE parking_analytics.parking_events"]
    );
}

#[tokio::test]
async fn cancel_is_explicit_only() {
    let engine = Arc::new(ScriptedEngine::never_finishing());
    let clock = Arc::new(FakeClock::new());
    let runner = runner_with(engine.clone(), clock, fast_config());

    runner.cancel("job-9").await.unwrap();
    assert_eq!(engine.stopped_jobs(), vec!["job-9"]);
}
