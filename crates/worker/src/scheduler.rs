//! Background task scheduler.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use query::{repair_partitions, QueryRunner};
use store::ObjectStore;
use telemetry::metrics;
use transport::EventTransport;

use crate::pipeline::PipelineWorker;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Partition repair interval
    pub repair_interval: Duration,
    /// Metrics snapshot interval
    pub metrics_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            repair_interval: Duration::from_secs(3600), // 1 hour
            metrics_interval: Duration::from_secs(60),  // 1 minute
        }
    }
}

/// Catalog table kept up to date by the repair worker.
pub struct MaintenanceTarget {
    pub runner: Arc<QueryRunner>,
    pub database: String,
    pub table: String,
}

/// Spawns the pipeline loop plus periodic maintenance tasks.
pub struct Scheduler<T, S> {
    config: SchedulerConfig,
    pipeline: Arc<PipelineWorker<T, S>>,
    maintenance: Option<MaintenanceTarget>,
}

impl<T, S> Scheduler<T, S>
where
    T: EventTransport + 'static,
    S: ObjectStore + 'static,
{
    pub fn new(config: SchedulerConfig, pipeline: Arc<PipelineWorker<T, S>>) -> Self {
        Self {
            config,
            pipeline,
            maintenance: None,
        }
    }

    /// Adds a periodic partition-repair task for the given table.
    pub fn with_maintenance(
        config: SchedulerConfig,
        pipeline: Arc<PipelineWorker<T, S>>,
        maintenance: MaintenanceTarget,
    ) -> Self {
        Self {
            config,
            pipeline,
            maintenance: Some(maintenance),
        }
    }

    /// Starts all background tasks.
    pub fn start(self: Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = Vec::new();

        // Pipeline worker (transport → store)
        let pipeline = self.pipeline.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = pipeline.run().await {
                error!("Pipeline worker fatal error: {}", e);
            }
        }));
        info!("Pipeline worker started");

        // Partition repair worker
        if self.maintenance.is_some() {
            let scheduler = self.clone();
            handles.push(tokio::spawn(async move {
                scheduler.run_repair_worker().await;
            }));
            info!("Partition repair worker started");
        }

        // Metrics snapshot worker
        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_metrics_flush().await;
        }));

        info!("Background workers started");
        handles
    }

    async fn run_repair_worker(&self) {
        let Some(ref target) = self.maintenance else {
            return;
        };
        let mut ticker = interval(self.config.repair_interval);

        loop {
            ticker.tick().await;

            if let Err(e) = repair_partitions(&target.runner, &target.database, &target.table).await
            {
                error!("Partition repair error: {}", e);
            }
        }
    }

    async fn run_metrics_flush(&self) {
        let mut ticker = interval(self.config.metrics_interval);

        loop {
            ticker.tick().await;

            let snapshot = metrics().snapshot();
            info!(
                events_produced = snapshot.events_produced,
                events_consumed = snapshot.events_consumed,
                events_enriched = snapshot.events_enriched,
                objects_written = snapshot.objects_written,
                store_write_errors = snapshot.store_write_errors,
                queries_started = snapshot.queries_started,
                queue_depth = snapshot.queue_depth,
                "Metrics snapshot"
            );
        }
    }
}
