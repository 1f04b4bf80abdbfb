//! Record-batch ingest boundary contract.

use std::sync::Arc;

use integration_tests::fixtures;
use integration_tests::mocks::FlakyStore;
use pipeline_core::Error;
use store::{MemoryStore, ObjectStore, PartitionedWriter};
use worker::{handle_records, IngestRecord, IngestRequest};

fn record(offset: i64, value: String) -> IngestRecord {
    IngestRecord {
        topic: "parking-events".to_string(),
        partition: 0,
        offset,
        value,
    }
}

#[tokio::test]
async fn batch_of_records_lands_keyed_by_queue_coordinates() {
    let store = Arc::new(MemoryStore::new());
    let writer = PartitionedWriter::new(store.clone());

    let request = IngestRequest {
        records: vec![
            record(7, fixtures::raw_event_json("A1", "occupied", "2024-03-20T10:00:00Z")),
            record(8, fixtures::raw_event_json("A2", "vacant", "2024-03-20T10:05:00Z")),
        ],
    };

    let response = handle_records(&writer, request).await.unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body.message, "Successfully processed 2 records");

    let keys = store
        .list("parking-data/year=2024/month=03/day=20/hour=10/")
        .await
        .unwrap();
    assert_eq!(
        keys,
        vec![
            "parking-data/year=2024/month=03/day=20/hour=10/parking-events-0-7.json",
            "parking-data/year=2024/month=03/day=20/hour=10/parking-events-0-8.json",
        ]
    );
}

#[tokio::test]
async fn stored_body_is_the_raw_event_unchanged() {
    let store = Arc::new(MemoryStore::new());
    let writer = PartitionedWriter::new(store.clone());

    let raw = fixtures::raw_event_json("A1", "occupied", "2024-03-20T10:00:00Z");
    let request = IngestRequest {
        records: vec![record(0, raw.clone())],
    };
    handle_records(&writer, request).await.unwrap();

    let keys = store.list("parking-data/").await.unwrap();
    let body = store.get(&keys[0]).await.unwrap();
    assert_eq!(std::str::from_utf8(&body).unwrap(), raw);
}

#[tokio::test]
async fn malformed_timestamp_propagates_to_the_invoker() {
    let store = Arc::new(MemoryStore::new());
    let writer = PartitionedWriter::new(store.clone());

    let request = IngestRequest {
        records: vec![record(0, fixtures::raw_event_json("A1", "occupied", "next tuesday"))],
    };

    let err = handle_records(&writer, request).await.unwrap_err();
    assert!(matches!(err, Error::MalformedTimestamp { .. }));
    assert!(store.is_empty());
}

#[tokio::test]
async fn empty_spot_id_propagates_and_stores_nothing() {
    let store = Arc::new(MemoryStore::new());
    let writer = PartitionedWriter::new(store.clone());

    let request = IngestRequest {
        records: vec![record(0, fixtures::raw_event_json("", "occupied", "2024-03-20T10:00:00Z"))],
    };

    let err = handle_records(&writer, request).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(store.list("parking-data/").await.unwrap().is_empty());
}

#[tokio::test]
async fn undecodable_value_propagates_to_the_invoker() {
    let store = Arc::new(MemoryStore::new());
    let writer = PartitionedWriter::new(store.clone());

    let request = IngestRequest {
        records: vec![record(0, "not json".to_string())],
    };

    let err = handle_records(&writer, request).await.unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}

#[tokio::test]
async fn write_failure_propagates_but_earlier_records_stay_written() {
    let inner = Arc::new(MemoryStore::new());
    let store = Arc::new(FlakyStore::new(inner.clone(), "parking-events-0-1.json"));
    let writer = PartitionedWriter::new(store);

    let request = IngestRequest {
        records: vec![
            record(0, fixtures::raw_event_json("A1", "occupied", "2024-03-20T10:00:00Z")),
            record(1, fixtures::raw_event_json("A2", "vacant", "2024-03-20T10:00:00Z")),
        ],
    };

    let err = handle_records(&writer, request).await.unwrap_err();
    assert!(matches!(err, Error::StoreWrite { .. }));

    // The first record was already stored; a whole-batch retry would
    // overwrite it under the same key rather than duplicate it.
    assert_eq!(inner.len(), 1);
}

#[tokio::test]
async fn request_wire_format_round_trips() {
    let json = r#"{
        "records": [
            {"topic": "parking-events", "partition": 0, "offset": 3,
             "value": "{\"spot_id\":\"A1\",\"status\":\"occupied\",\"timestamp\":\"2024-03-20T10:00:00Z\"}"}
        ]
    }"#;

    let request: IngestRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.records.len(), 1);
    assert_eq!(request.records[0].offset, 3);

    let store = Arc::new(MemoryStore::new());
    let writer = PartitionedWriter::new(store);
    let response = handle_records(&writer, request).await.unwrap();

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["statusCode"], 200);
    assert!(value["body"]["message"]
        .as_str()
        .unwrap()
        .contains("1 records"));
}
