//! Pipeline worker draining the transport into the partitioned store.
//!
//! The core loop: drain queue → enrich → write batch. Enrichment failures
//! are reported per event; store write failures never abort sibling writes.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use pipeline_core::Error;
use store::{ObjectStore, PartitionedWriter, WriteRecord, WriteReport};
use transport::EventTransport;

use crate::enrichment::Enricher;

/// Pipeline worker configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How often the run loop drains the queue
    pub drain_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            drain_interval: Duration::from_secs(5),
        }
    }
}

/// A message that could not be enriched, with its queue position.
#[derive(Debug)]
pub struct EnrichmentFailure {
    pub spot_id: String,
    pub offset: i64,
    pub error: Error,
}

/// Outcome of one drain cycle.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Messages taken off the queue
    pub consumed: usize,
    /// Per-message enrichment failures (the rest proceeded to storage)
    pub enrichment_failures: Vec<EnrichmentFailure>,
    /// Store writer report for the enriched messages
    pub report: WriteReport,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.enrichment_failures.is_empty() && self.report.is_complete()
    }
}

/// Worker that consumes events from the transport and writes them to the
/// partitioned store.
pub struct PipelineWorker<T, S> {
    transport: Arc<T>,
    writer: Arc<PartitionedWriter<S>>,
    enricher: Enricher,
    config: PipelineConfig,
}

impl<T, S> PipelineWorker<T, S>
where
    T: EventTransport,
    S: ObjectStore,
{
    pub fn new(transport: Arc<T>, writer: Arc<PartitionedWriter<S>>) -> Self {
        Self::with_config(transport, writer, PipelineConfig::default())
    }

    pub fn with_config(
        transport: Arc<T>,
        writer: Arc<PartitionedWriter<S>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            transport,
            writer,
            enricher: Enricher::new(),
            config,
        }
    }

    /// Drains the queue once and writes everything enrichable.
    pub async fn process_batch(&self) -> pipeline_core::Result<BatchOutcome> {
        let messages = self.transport.consume_all().await?;
        if messages.is_empty() {
            return Ok(BatchOutcome {
                consumed: 0,
                enrichment_failures: Vec::new(),
                report: WriteReport::default(),
            });
        }

        let consumed = messages.len();
        let mut records = Vec::with_capacity(consumed);
        let mut enrichment_failures = Vec::new();

        for message in &messages {
            match self.enricher.enrich(&message.payload) {
                Ok(enriched) => records.push(WriteRecord::from_message(message, enriched)),
                Err(error) => enrichment_failures.push(EnrichmentFailure {
                    spot_id: message.payload.spot_id.clone(),
                    offset: message.offset,
                    error,
                }),
            }
        }

        let report = self.writer.write_batch(&records).await;

        debug!(
            consumed = consumed,
            written = report.total_written(),
            enrichment_failures = enrichment_failures.len(),
            "Processed batch"
        );

        Ok(BatchOutcome {
            consumed,
            enrichment_failures,
            report,
        })
    }

    /// Main run loop: drain at the configured interval.
    pub async fn run(&self) -> pipeline_core::Result<()> {
        info!(
            drain_interval_ms = self.config.drain_interval.as_millis() as u64,
            prefix = %self.writer.prefix(),
            "Pipeline worker starting"
        );

        let mut ticker = tokio::time::interval(self.config.drain_interval);

        loop {
            ticker.tick().await;

            match self.process_batch().await {
                Ok(outcome) if outcome.consumed > 0 => {
                    if !outcome.is_clean() {
                        error!(
                            enrichment_failures = outcome.enrichment_failures.len(),
                            write_failures = outcome.report.failures.len(),
                            "Batch completed with per-event failures"
                        );
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    // Transient transport fault; retry on the next tick.
                    error!(error = %e, "Batch processing error");
                }
            }
        }
    }
}
