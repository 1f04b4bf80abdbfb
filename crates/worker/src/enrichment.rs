//! Event enrichment stage.
//!
//! Adds the processing timestamp and the calendar fields that form the
//! partition key. Calendar fields are derived from the original event
//! timestamp, so enrichment is idempotent on the partition-relevant output;
//! only `processed_at` differs across calls.

use chrono::Utc;
use telemetry::metrics;
use tracing::warn;

use pipeline_core::{EnrichedEvent, Event, Result};

/// Enrichment stage for sensor events.
#[derive(Debug, Default, Clone, Copy)]
pub struct Enricher;

impl Enricher {
    pub fn new() -> Self {
        Self
    }

    /// Enriches a single event.
    ///
    /// An invalid event (empty spot id) fails with `Validation`; a timestamp
    /// that does not match the wire format fails with `MalformedTimestamp`.
    /// Neither produces partial output; the error is surfaced to the caller,
    /// never dropped.
    pub fn enrich(&self, event: &Event) -> Result<EnrichedEvent> {
        let derived = event
            .ensure_valid()
            .and_then(|()| EnrichedEvent::derive(event.clone(), Utc::now()));
        match derived {
            Ok(enriched) => {
                metrics().events_enriched.inc();
                Ok(enriched)
            }
            Err(e) => {
                metrics().enrichment_failures.inc();
                warn!(spot_id = %event.spot_id, error = %e, "Enrichment failed");
                Err(e)
            }
        }
    }

    /// Enriches a batch, reporting each item's outcome individually.
    pub fn enrich_batch(&self, events: &[Event]) -> Vec<Result<EnrichedEvent>> {
        events.iter().map(|e| self.enrich(e)).collect()
    }
}
