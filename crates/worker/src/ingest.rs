//! Out-of-process enrichment invocation boundary.
//!
//! Mirrors the record-batch contract used when enrichment runs on a
//! serverless platform: a batch of transport records comes in, one keyed
//! object per record goes out. Any processing error propagates to the
//! caller so the invoking platform can apply its own retry policy; this
//! boundary performs no internal retry, and idempotent storage keys make
//! redelivery safe.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use pipeline_core::{EnrichedEvent, Event, QueueMessage, Result};
use store::{ObjectStore, PartitionedWriter, WriteRecord};

/// One transport record as handed to the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// JSON-encoded [`Event`]
    pub value: String,
}

/// Invocation input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub records: Vec<IngestRecord>,
}

/// Invocation output body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestBody {
    pub message: String,
    pub timestamp: String,
}

/// Invocation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub status_code: u16,
    pub body: IngestBody,
}

/// Processes a record batch: parse, validate, partition, store.
///
/// Fails fast on the first invalid record or write failure; records
/// already written stay written (their keys are deterministic, so a retry
/// of the whole batch overwrites rather than duplicates).
pub async fn handle_records<S: ObjectStore>(
    writer: &PartitionedWriter<S>,
    request: IngestRequest,
) -> Result<IngestResponse> {
    let count = request.records.len();
    info!(count = count, "Processing records");

    for record in &request.records {
        let event: Event = serde_json::from_str(&record.value)?;
        event.ensure_valid()?;
        let enriched = EnrichedEvent::derive(event, Utc::now())?;

        let message = QueueMessage {
            topic: record.topic.clone(),
            partition: record.partition,
            offset: record.offset,
            payload: enriched.event.clone(),
        };
        let write = WriteRecord::from_message(&message, enriched);

        let report = writer.write_batch(std::slice::from_ref(&write)).await;
        if let Some(failure) = report.failures.into_iter().next() {
            return Err(failure.error);
        }
        info!(key = %writer.object_key(&write), "Stored event");
    }

    Ok(IngestResponse {
        status_code: 200,
        body: IngestBody {
            message: format!("Successfully processed {count} records"),
            timestamp: Utc::now().to_rfc3339(),
        },
    })
}
