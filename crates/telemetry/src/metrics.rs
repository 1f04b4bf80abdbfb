//! Internal metrics collection.
//!
//! Counters and histograms are updated by the pipeline stages and flushed
//! to the log by the scheduler at a fixed interval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the parking pipeline.
#[derive(Debug, Default)]
pub struct Metrics {
    // Transport metrics
    pub events_produced: Counter,
    pub events_consumed: Counter,
    pub transport_errors: Counter,

    // Enrichment metrics
    pub events_enriched: Counter,
    pub enrichment_failures: Counter,

    // Store writer metrics
    pub objects_written: Counter,
    pub store_write_errors: Counter,

    // Query runner metrics
    pub queries_started: Counter,
    pub query_polls: Counter,
    pub queries_succeeded: Counter,
    pub queries_failed: Counter,
    pub queries_timed_out: Counter,

    // Latency histograms
    pub produce_latency_ms: Histogram,
    pub write_latency_ms: Histogram,
    pub query_wait_ms: Histogram,

    // Gauges
    pub queue_depth: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub events_produced: u64,
    pub events_consumed: u64,
    pub transport_errors: u64,
    pub events_enriched: u64,
    pub enrichment_failures: u64,
    pub objects_written: u64,
    pub store_write_errors: u64,
    pub queries_started: u64,
    pub query_polls: u64,
    pub queries_succeeded: u64,
    pub queries_failed: u64,
    pub queries_timed_out: u64,
    pub produce_latency_mean_ms: f64,
    pub write_latency_mean_ms: f64,
    pub query_wait_mean_ms: f64,
    pub queue_depth: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            events_produced: self.events_produced.get(),
            events_consumed: self.events_consumed.get(),
            transport_errors: self.transport_errors.get(),
            events_enriched: self.events_enriched.get(),
            enrichment_failures: self.enrichment_failures.get(),
            objects_written: self.objects_written.get(),
            store_write_errors: self.store_write_errors.get(),
            queries_started: self.queries_started.get(),
            query_polls: self.query_polls.get(),
            queries_succeeded: self.queries_succeeded.get(),
            queries_failed: self.queries_failed.get(),
            queries_timed_out: self.queries_timed_out.get(),
            produce_latency_mean_ms: self.produce_latency_ms.mean(),
            write_latency_mean_ms: self.write_latency_ms.mean(),
            query_wait_mean_ms: self.query_wait_ms.mean(),
            queue_depth: self.queue_depth.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
