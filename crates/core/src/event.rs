//! Event type definitions for the parking pipeline.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result};

/// Wire format for event timestamps: `2024-03-20T10:00:00Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Occupancy state reported by a parking sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotStatus {
    Occupied,
    Vacant,
}

impl SpotStatus {
    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Occupied => "occupied",
            Self::Vacant => "vacant",
        }
    }
}

/// A single parking sensor status event.
///
/// Immutable once created; the timestamp is kept in its wire form so that
/// stored objects round-trip byte-for-byte. Use [`Event::parsed_timestamp`]
/// to get calendar fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Event {
    /// Sensor/spot identifier, e.g. "A1"
    #[validate(length(min = 1, max = 64))]
    pub spot_id: String,
    /// Occupancy state
    pub status: SpotStatus,
    /// UTC instant with second precision, `YYYY-MM-DDTHH:MM:SSZ`
    pub timestamp: String,
}

impl Event {
    /// Creates an event, formatting the timestamp in the wire format.
    pub fn new(spot_id: impl Into<String>, status: SpotStatus, at: DateTime<Utc>) -> Self {
        Self {
            spot_id: spot_id.into(),
            status,
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Validates field constraints (non-empty spot id, length bounds).
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate()
            .map_err(|e| Error::validation(e.to_string()))
    }

    /// Parses the event timestamp strictly against the wire format.
    ///
    /// Any deviation (offset suffixes, fractional seconds, missing `Z`)
    /// fails with [`Error::MalformedTimestamp`].
    pub fn parsed_timestamp(&self) -> Result<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|_| Error::MalformedTimestamp {
                value: self.timestamp.clone(),
            })
    }

    /// Derives the partition key from the original event timestamp.
    pub fn partition_key(&self) -> Result<PartitionKey> {
        Ok(PartitionKey::from_timestamp(&self.parsed_timestamp()?))
    }
}

/// A message as delivered by the transport queue.
///
/// Offsets within a (topic, partition) pair are strictly increasing and
/// gap-free in delivery order. A message is consumed exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub payload: Event,
}

/// The (year, month, day, hour) tuple derived from an event timestamp.
///
/// Two renderings exist and must not be conflated: the zero-padded storage
/// path (`month=03`) and the unpadded SQL partition column values (`3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl PartitionKey {
    /// Extracts the key from a parsed UTC timestamp.
    pub fn from_timestamp(ts: &DateTime<Utc>) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
            day: ts.day(),
            hour: ts.hour(),
        }
    }

    /// Storage path segment: `year=2024/month=03/day=20/hour=10`.
    pub fn storage_path(&self) -> String {
        format!(
            "year={}/month={:02}/day={:02}/hour={:02}",
            self.year, self.month, self.day, self.hour
        )
    }

    /// Unpadded values for SQL partition columns, in (year, month, day, hour)
    /// order. Not interchangeable with [`PartitionKey::storage_path`].
    pub fn column_values(&self) -> [String; 4] {
        [
            self.year.to_string(),
            self.month.to_string(),
            self.day.to_string(),
            self.hour.to_string(),
        ]
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.storage_path())
    }
}

/// An event plus processing metadata and its derived partition fields.
///
/// The calendar fields come from the original event timestamp, never from
/// `processed_at`, so the partition key is stable under processing delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    #[serde(flatten)]
    pub event: Event,
    /// When the enrichment stage saw the event
    pub processed_at: DateTime<Utc>,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl EnrichedEvent {
    /// Builds the enriched record; fails on a malformed event timestamp
    /// without producing partial output.
    pub fn derive(event: Event, processed_at: DateTime<Utc>) -> Result<Self> {
        let key = event.partition_key()?;
        Ok(Self {
            event,
            processed_at,
            year: key.year,
            month: key.month,
            day: key.day,
            hour: key.hour,
        })
    }

    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey {
            year: self.year,
            month: self.month,
            day: self.day,
            hour: self.hour,
        }
    }
}
