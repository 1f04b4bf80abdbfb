//! Parking sensor event pipeline
//!
//! End-to-end flow: sensor events → transport queue → enrichment →
//! partitioned object storage, with an asynchronous query runner for
//! analytics and partition maintenance.
//!
//! Two modes:
//! - `demo` (default): one-shot simulated flow against the in-memory
//!   transport and store
//! - `daemon`: background pipeline loop draining the configured transport

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;

use pipeline_core::{Event, SpotStatus};
use store::{MemoryStore, ObjectStore, PartitionedWriter};
use telemetry::init_tracing_from_env;
use transport::{EventTransport, KafkaQueue, MemoryQueue, TransportConfig};
use worker::{PipelineWorker, Scheduler, SchedulerConfig};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    /// "demo" or "daemon"
    #[serde(default = "default_mode")]
    mode: String,

    /// Use the Kafka transport instead of the in-memory queue
    #[serde(default)]
    use_broker: bool,

    /// Storage key prefix for event objects
    #[serde(default = "default_store_prefix")]
    store_prefix: String,

    /// Number of simulated parking spots (demo mode)
    #[serde(default = "default_num_spots")]
    num_spots: u32,

    #[serde(default)]
    transport: TransportConfig,
}

fn default_mode() -> String {
    "demo".to_string()
}

fn default_store_prefix() -> String {
    "parking-data".to_string()
}

fn default_num_spots() -> u32 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            use_broker: false,
            store_prefix: default_store_prefix(),
            num_spots: default_num_spots(),
            transport: TransportConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider BEFORE any TLS operations
    // rustls 0.23+ requires explicit crypto provider selection
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting parking pipeline v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(mode = %config.mode, use_broker = config.use_broker, "Loaded configuration");

    let store = Arc::new(MemoryStore::new());
    let writer = Arc::new(PartitionedWriter::with_prefix(
        store.clone(),
        config.store_prefix.clone(),
    ));

    match config.mode.as_str() {
        "daemon" => {
            if config.use_broker {
                let transport = Arc::new(KafkaQueue::new(config.transport.clone()));
                run_daemon(transport, writer).await
            } else {
                let transport = Arc::new(MemoryQueue::new());
                run_daemon(transport, writer).await
            }
        }
        _ => run_demo(&config, store, writer).await,
    }
}

/// One-shot simulated flow: generate → produce → consume → enrich → store
/// → inspect.
async fn run_demo(
    config: &Config,
    store: Arc<MemoryStore>,
    writer: Arc<PartitionedWriter<MemoryStore>>,
) -> Result<()> {
    let topic = config.transport.topic.clone();
    let queue = Arc::new(MemoryQueue::new());

    info!("Step 1/4: Generating parking events");
    let events = generate_events(config.num_spots);
    for event in &events {
        info!(spot_id = %event.spot_id, status = event.status.as_str(), "Generated event");
    }

    info!("Step 2/4: Sending events to the transport queue");
    for event in events {
        let (partition, offset) = queue
            .produce(&topic, event)
            .await
            .context("Failed to produce event")?;
        info!(topic = %topic, partition = partition, offset = offset, "Event queued");
    }

    info!("Step 3/4: Draining the queue and writing partitioned objects");
    let worker = PipelineWorker::new(queue, writer.clone());
    let outcome = worker
        .process_batch()
        .await
        .context("Failed to process batch")?;

    for (partition, count) in &outcome.report.written {
        info!(partition = %partition, count = count, "Stored partition group");
    }

    info!("Step 4/4: Inspecting stored events");
    let keys = store
        .list(writer.prefix())
        .await
        .context("Failed to list store")?;

    let mut stored = Vec::with_capacity(keys.len());
    for key in &keys {
        let body = store.get(key).await.context("Failed to read object")?;
        let event: Event = serde_json::from_slice(&body).context("Stored object is not an event")?;
        stored.push((key.clone(), event));
    }
    stored.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));

    info!("Most recent events:");
    for (key, event) in stored.iter().take(5) {
        info!(
            spot_id = %event.spot_id,
            status = event.status.as_str(),
            timestamp = %event.timestamp,
            key = %key,
            "Stored event"
        );
    }

    info!(
        consumed = outcome.consumed,
        written = outcome.report.total_written(),
        partitions = outcome.report.written.len(),
        "Demo completed successfully"
    );
    Ok(())
}

/// Background pipeline loop with graceful shutdown.
async fn run_daemon<T: EventTransport + 'static>(
    transport: Arc<T>,
    writer: Arc<PartitionedWriter<MemoryStore>>,
) -> Result<()> {
    let pipeline = Arc::new(PipelineWorker::new(transport, writer));
    let scheduler = Arc::new(Scheduler::new(SchedulerConfig::default(), pipeline));
    let handles = scheduler.start();

    shutdown_signal().await;

    info!("Shutting down...");
    for handle in handles {
        handle.abort();
    }
    info!("Shutdown complete");
    Ok(())
}

/// Simulated sensor readings for spots A1..An.
fn generate_events(num_spots: u32) -> Vec<Event> {
    let now = chrono::Utc::now();
    (1..=num_spots)
        .map(|i| {
            let status = if i % 2 == 0 {
                SpotStatus::Occupied
            } else {
                SpotStatus::Vacant
            };
            Event::new(format!("A{i}"), status, now)
        })
        .collect()
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("PIPELINE")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Manual overrides for nested transport config from environment
    // The config crate's nested parsing doesn't work reliably with
    // underscored field names
    if let Ok(brokers) = std::env::var("PIPELINE_TRANSPORT_BROKERS") {
        config.transport.brokers = brokers.split(',').map(|s| s.trim().to_string()).collect();
    }
    if let Ok(topic) = std::env::var("PIPELINE_TRANSPORT_TOPIC") {
        config.transport.topic = topic;
    }
    if let Ok(username) = std::env::var("PIPELINE_TRANSPORT_SASL_USERNAME") {
        config.transport.sasl_username = Some(username);
    }
    if let Ok(password) = std::env::var("PIPELINE_TRANSPORT_SASL_PASSWORD") {
        config.transport.sasl_password = Some(password);
    }

    Ok(config)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
