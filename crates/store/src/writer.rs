//! Partitioned store writer.
//!
//! Groups enriched events by partition key and issues one idempotent write
//! per event. Keys are deterministic from event identity, so redelivery
//! overwrites the same object instead of duplicating it (at-least-once
//! upstream delivery becomes effectively-once storage).

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use telemetry::metrics;
use tracing::{debug, error, info};

use pipeline_core::{EnrichedEvent, Error, PartitionKey, QueueMessage};

use crate::object::ObjectStore;

/// Default key prefix for stored events.
pub const DEFAULT_PREFIX: &str = "parking-data";

/// Transport coordinates of a consumed message.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceCoords {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// An enriched event ready to be written, with its transport coordinates
/// when it arrived through the queue.
#[derive(Debug, Clone)]
pub struct WriteRecord {
    pub enriched: EnrichedEvent,
    pub source: Option<SourceCoords>,
}

impl WriteRecord {
    /// Record for an event consumed from the transport.
    pub fn from_message(message: &QueueMessage, enriched: EnrichedEvent) -> Self {
        Self {
            enriched,
            source: Some(SourceCoords {
                topic: message.topic.clone(),
                partition: message.partition,
                offset: message.offset,
            }),
        }
    }

    /// Record for a direct (non-transport) write path.
    pub fn direct(enriched: EnrichedEvent) -> Self {
        Self {
            enriched,
            source: None,
        }
    }
}

/// A single event whose write failed. Siblings in the batch are unaffected.
#[derive(Debug)]
pub struct WriteFailure {
    pub key: String,
    pub error: Error,
}

/// Outcome of a batch write: per-partition counts plus per-event failures.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: BTreeMap<PartitionKey, usize>,
    pub failures: Vec<WriteFailure>,
}

impl WriteReport {
    pub fn total_written(&self) -> usize {
        self.written.values().sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes enriched events to the object store under partitioned keys.
pub struct PartitionedWriter<S> {
    store: Arc<S>,
    prefix: String,
}

impl<S: ObjectStore> PartitionedWriter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_prefix(store, DEFAULT_PREFIX)
    }

    pub fn with_prefix(store: Arc<S>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Derives the storage key for a record.
    ///
    /// The transport-coordinate form is canonical; the fallback is derived
    /// from spot id + timestamp so direct writes stay idempotent too.
    pub fn object_key(&self, record: &WriteRecord) -> String {
        let path = record.enriched.partition_key().storage_path();
        match &record.source {
            Some(coords) => format!(
                "{}/{}/{}-{}-{}.json",
                self.prefix, path, coords.topic, coords.partition, coords.offset
            ),
            None => {
                let compact: String = record
                    .enriched
                    .event
                    .timestamp
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect();
                format!(
                    "{}/{}/{}-{}.json",
                    self.prefix, path, record.enriched.event.spot_id, compact
                )
            }
        }
    }

    /// Writes a batch, one object per event.
    ///
    /// The stored body is the original event JSON only; enrichment fields
    /// stay a query-time concern. A failed put is recorded per event and
    /// never aborts sibling writes.
    pub async fn write_batch(&self, records: &[WriteRecord]) -> WriteReport {
        // Group by partition key, first-seen order within each group.
        let mut groups: Vec<(PartitionKey, Vec<&WriteRecord>)> = Vec::new();
        for record in records {
            let key = record.enriched.partition_key();
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, group)) => group.push(record),
                None => groups.push((key, vec![record])),
            }
        }

        let mut report = WriteReport::default();

        for (partition, group) in groups {
            debug!(partition = %partition, count = group.len(), "Writing partition group");

            for record in group {
                let key = self.object_key(record);
                let start = std::time::Instant::now();

                match self.put_event(&key, record).await {
                    Ok(()) => {
                        metrics().objects_written.inc();
                        metrics()
                            .write_latency_ms
                            .observe(start.elapsed().as_millis() as u64);
                        *report.written.entry(partition).or_insert(0) += 1;
                    }
                    Err(e) => {
                        metrics().store_write_errors.inc();
                        error!(key = %key, error = %e, "Store write failed");
                        report.failures.push(WriteFailure { key, error: e });
                    }
                }
            }
        }

        info!(
            written = report.total_written(),
            failed = report.failures.len(),
            partitions = report.written.len(),
            "Wrote event batch"
        );

        report
    }

    async fn put_event(&self, key: &str, record: &WriteRecord) -> pipeline_core::Result<()> {
        let body = serde_json::to_vec(&record.enriched.event)?;
        self.store
            .put(key, Bytes::from(body), "application/json")
            .await
            .map_err(|e| Error::store_write(key, e.to_string()))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
