//! Injectable clock for the poll loop.
//!
//! The runner never calls `tokio::time` directly; tests drive the loop
//! deterministically with a fake clock.

use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Time source and sleeper used by the query runner.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
