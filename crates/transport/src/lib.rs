//! Ordered, offset-addressed event transport.
//!
//! Two implementations share one interface so the pipeline is
//! implementation-agnostic: [`MemoryQueue`] for tests and demos, and
//! [`KafkaQueue`] for a real broker.

pub mod config;
pub mod kafka;
pub mod memory;

pub use config::*;
pub use kafka::*;
pub use memory::*;

use async_trait::async_trait;
use pipeline_core::{Event, QueueMessage, Result};

/// Producer/consumer queue with ordered delivery and per-partition offsets.
///
/// Offsets within a (topic, partition) pair are strictly increasing and
/// gap-free in delivery order. `consume_all` drains the queue: a second
/// immediate call returns an empty sequence (at-most-once, single-reader
/// delivery; no broadcast, no redelivery).
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Appends an event and returns its (partition, offset) assignment.
    async fn produce(&self, topic: &str, event: Event) -> Result<(i32, i64)>;

    /// Removes and returns every currently buffered message in FIFO order.
    async fn consume_all(&self) -> Result<Vec<QueueMessage>>;
}
