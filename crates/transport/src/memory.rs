//! In-memory transport queue for tests and demos.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use telemetry::metrics;
use tracing::debug;

use pipeline_core::{Event, QueueMessage, Result};

use crate::EventTransport;

/// Single partition per topic. Multi-partition is a straightforward
/// generalization (a map from partition id to its own buffer) that this
/// pipeline does not need.
const PARTITION: i32 = 0;

#[derive(Default)]
struct Inner {
    buffer: VecDeque<QueueMessage>,
    /// Next offset per topic; monotonic across drains so redelivered keys
    /// never collide with new ones.
    next_offsets: HashMap<String, i64>,
}

/// In-memory ordered queue with per-topic offset assignment.
///
/// `produce` and `consume_all` serialize on one mutex, so concurrent
/// producers observe a consistent offset sequence.
#[derive(Default)]
pub struct MemoryQueue {
    inner: Mutex<Inner>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages currently buffered.
    pub fn depth(&self) -> usize {
        self.inner.lock().buffer.len()
    }
}

#[async_trait]
impl EventTransport for MemoryQueue {
    async fn produce(&self, topic: &str, event: Event) -> Result<(i32, i64)> {
        let mut inner = self.inner.lock();
        let offset_slot = inner.next_offsets.entry(topic.to_string()).or_insert(0);
        let offset = *offset_slot;
        *offset_slot += 1;

        inner.buffer.push_back(QueueMessage {
            topic: topic.to_string(),
            partition: PARTITION,
            offset,
            payload: event,
        });

        metrics().events_produced.inc();
        metrics().queue_depth.set(inner.buffer.len() as u64);

        debug!(topic = %topic, partition = PARTITION, offset = offset, "Produced event");
        Ok((PARTITION, offset))
    }

    async fn consume_all(&self) -> Result<Vec<QueueMessage>> {
        let mut inner = self.inner.lock();
        let drained: Vec<QueueMessage> = inner.buffer.drain(..).collect();

        metrics().events_consumed.inc_by(drained.len() as u64);
        metrics().queue_depth.set(0);

        debug!(count = drained.len(), "Drained queue");
        Ok(drained)
    }
}
