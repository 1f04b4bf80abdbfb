//! Kafka-backed transport using rskafka.
//!
//! Binds the queue interface to a real broker with:
//! - a cached partition client (single ordered partition)
//! - manual offset tracking so `consume_all` drains up to the watermark
//! - optional TLS + SASL for managed clusters

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rskafka::client::{
    partition::{Compression, OffsetAt, UnknownTopicHandling},
    ClientBuilder, Credentials, SaslConfig,
};
use rskafka::record::Record;
use telemetry::metrics;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use pipeline_core::{Error, Event, QueueMessage, Result};

use crate::{config::TransportConfig, EventTransport};

/// Creates a TLS configuration for managed Kafka clusters.
fn create_tls_config() -> Arc<rustls::ClientConfig> {
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}

/// Networked transport bound to one (topic, partition 0) pair.
pub struct KafkaQueue {
    config: TransportConfig,
    /// Partition client (currently only partition 0)
    partition_client: RwLock<Option<Arc<rskafka::client::partition::PartitionClient>>>,
    /// Next offset to read
    current_offset: AtomicI64,
    /// Whether the read offset has been initialized
    initialized: AtomicBool,
}

impl KafkaQueue {
    pub fn new(config: TransportConfig) -> Self {
        info!(
            brokers = %config.broker_string(),
            topic = %config.topic,
            "Creating Kafka transport"
        );

        Self {
            config,
            partition_client: RwLock::new(None),
            current_offset: AtomicI64::new(0),
            initialized: AtomicBool::new(false),
        }
    }

    /// Connects lazily and caches the partition client.
    async fn ensure_connected(&self) -> Result<Arc<rskafka::client::partition::PartitionClient>> {
        {
            let client = self.partition_client.read().await;
            if let Some(ref c) = *client {
                return Ok(c.clone());
            }
        }

        let connection = self.config.broker_string();
        let mut builder = ClientBuilder::new(vec![connection]);

        if let (Some(username), Some(password)) =
            (&self.config.sasl_username, &self.config.sasl_password)
        {
            builder = builder
                .tls_config(create_tls_config())
                .sasl_config(SaslConfig::ScramSha256(Credentials::new(
                    username.clone(),
                    password.clone(),
                )));
        }

        let client = builder
            .build()
            .await
            .map_err(|e| Error::transport(format!("failed to connect to broker: {e}")))?;

        let partition_client = client
            .partition_client(self.config.topic.clone(), 0, UnknownTopicHandling::Error)
            .await
            .map_err(|e| Error::transport(format!("failed to get partition client: {e}")))?;

        let partition_client = Arc::new(partition_client);

        // First connection: start reading from the earliest retained offset
        // so everything produced through this queue is observable.
        if !self.initialized.load(Ordering::SeqCst) {
            let offset = partition_client
                .get_offset(OffsetAt::Earliest)
                .await
                .map_err(|e| Error::transport(format!("failed to get offset: {e}")))?;

            self.current_offset.store(offset, Ordering::SeqCst);
            self.initialized.store(true, Ordering::SeqCst);

            info!(
                topic = %self.config.topic,
                partition = 0,
                offset = offset,
                "Transport initialized at offset"
            );
        }

        {
            let mut client_guard = self.partition_client.write().await;
            *client_guard = Some(partition_client.clone());
        }

        Ok(partition_client)
    }

    /// Drops the cached client so the next call reconnects.
    pub async fn reset_connection(&self) {
        let mut client = self.partition_client.write().await;
        *client = None;
        info!("Transport connection reset");
    }

    /// Checks broker reachability.
    pub async fn health_check(&self) -> bool {
        self.ensure_connected().await.is_ok()
    }
}

#[async_trait]
impl EventTransport for KafkaQueue {
    async fn produce(&self, topic: &str, event: Event) -> Result<(i32, i64)> {
        if topic != self.config.topic {
            return Err(Error::transport(format!(
                "queue is bound to topic {:?}, got {:?}",
                self.config.topic, topic
            )));
        }

        let client = self.ensure_connected().await?;
        let start = std::time::Instant::now();

        let payload = serde_json::to_vec(&event)?;
        let record = Record {
            key: Some(event.spot_id.clone().into_bytes()),
            value: Some(payload),
            headers: BTreeMap::new(),
            timestamp: Utc::now(),
        };

        let offsets = client
            .produce(vec![record], Compression::NoCompression)
            .await
            .map_err(|e| {
                metrics().transport_errors.inc();
                Error::transport(format!("failed to produce: {e}"))
            })?;

        let offset = offsets
            .first()
            .copied()
            .ok_or_else(|| Error::transport("broker returned no offset"))?;

        metrics().events_produced.inc();
        metrics()
            .produce_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        debug!(
            topic = %topic,
            partition = 0,
            offset = offset,
            spot_id = %event.spot_id,
            "Produced event"
        );

        Ok((0, offset))
    }

    async fn consume_all(&self) -> Result<Vec<QueueMessage>> {
        let client = self.ensure_connected().await?;

        let mut messages = Vec::new();
        let mut current = self.current_offset.load(Ordering::SeqCst);

        loop {
            let (records, watermark) = client
                .fetch_records(
                    current,
                    1..self.config.fetch_max_bytes,
                    self.config.fetch_timeout_ms as i32,
                )
                .await
                .map_err(|e| {
                    metrics().transport_errors.inc();
                    Error::transport(format!("failed to fetch records: {e}"))
                })?;

            if records.is_empty() {
                break;
            }

            for record in records {
                current = current.max(record.offset + 1);

                let Some(value) = record.record.value else {
                    continue;
                };
                match serde_json::from_slice::<Event>(&value) {
                    Ok(event) => messages.push(QueueMessage {
                        topic: self.config.topic.clone(),
                        partition: 0,
                        offset: record.offset,
                        payload: event,
                    }),
                    Err(e) => {
                        warn!(
                            offset = record.offset,
                            error = %e,
                            "Skipping undecodable record"
                        );
                    }
                }
            }

            if current >= watermark {
                break;
            }
        }

        self.current_offset.store(current, Ordering::SeqCst);
        metrics().events_consumed.inc_by(messages.len() as u64);

        debug!(
            count = messages.len(),
            next_offset = current,
            "Drained broker partition"
        );

        Ok(messages)
    }
}
