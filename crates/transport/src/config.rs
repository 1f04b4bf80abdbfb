//! Transport configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the Kafka-backed transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Broker addresses
    #[serde(default = "default_brokers")]
    pub brokers: Vec<String>,
    /// Topic carrying sensor events
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Fetch timeout in milliseconds
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Maximum bytes per fetch
    #[serde(default = "default_fetch_max_bytes")]
    pub fetch_max_bytes: i32,
    /// SASL username (for managed clusters)
    #[serde(default)]
    pub sasl_username: Option<String>,
    /// SASL password (for managed clusters)
    #[serde(default)]
    pub sasl_password: Option<String>,
}

fn default_brokers() -> Vec<String> {
    vec!["localhost:9092".to_string()]
}

fn default_topic() -> String {
    "parking-events".to_string()
}

fn default_fetch_timeout_ms() -> u64 {
    1000
}

fn default_fetch_max_bytes() -> i32 {
    4 * 1024 * 1024
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            topic: default_topic(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            fetch_max_bytes: default_fetch_max_bytes(),
            sasl_username: None,
            sasl_password: None,
        }
    }
}

impl TransportConfig {
    /// Returns the broker list as a comma-separated string.
    pub fn broker_string(&self) -> String {
        self.brokers.join(",")
    }
}
