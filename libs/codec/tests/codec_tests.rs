//! Decoder and feed integration tests
//!
//! Exercises the crate through its public surface the way the producer
//! service does: raw documents in, feed bytes out.

use codec::{decode_feed, decode_position, encode_feed, DecodeError};
use proptest::prelude::*;
use serde_json::{json, Value};
use types::FeedSnapshot;

fn raw(id: &str, latitude: Value, timestamp: Value) -> Value {
    json!({
        "_id": {"$oid": "5165a1b9e4b0b1a6c6f0a1b2"},
        "entity": {
            "id": id,
            "vehicle": {
                "timestamp": timestamp,
                "position": {
                    "latitude": latitude,
                    "longitude": "-75.16",
                    "bearing": 270,
                    "speed": "0"
                }
            }
        }
    })
}

#[test]
fn test_batch_with_one_malformed_document() {
    let mut malformed = raw("bus2", json!(39.9), json!(1000));
    malformed["entity"]["vehicle"]["position"]
        .as_object_mut()
        .unwrap()
        .remove("latitude");

    let batch = vec![
        raw("bus1", json!(39.95), json!(1000)),
        malformed,
        raw("bus3", json!("40.01"), json!("1200")),
    ];

    let (decoded, failures): (Vec<_>, Vec<_>) = batch.iter().map(decode_position).partition(Result::is_ok);

    assert_eq!(decoded.len(), 2);
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        Err(DecodeError::MissingField { ref path }) if path == "entity.vehicle.position.latitude"
    ));
}

#[test]
fn test_documents_to_feed_bytes() {
    let records = vec![
        decode_position(&raw("bus1", json!(39.95), json!(1_365_614_681_000u64))).unwrap(),
        decode_position(&raw("bus2", json!(39.90), json!({"$numberLong": "1365614690500"}))).unwrap(),
    ];
    let snapshot = FeedSnapshot::new(records, 1_365_614_700_000);

    let message = decode_feed(&encode_feed(&snapshot)).unwrap();

    assert_eq!(message.entity.len(), 2);
    let timestamps: Vec<Option<u64>> = message
        .entity
        .iter()
        .map(|entity| entity.vehicle.as_ref().and_then(|v| v.timestamp))
        .collect();
    assert_eq!(timestamps, vec![Some(1_365_614_681), Some(1_365_614_690)]);
}

#[test]
fn test_overflowing_coordinates_never_reach_the_feed() {
    let batch = vec![
        raw("bus1", json!("1e300"), json!(1000)),
        raw("bus2", json!({"$numberDouble": "-1e39"}), json!(1000)),
        raw("bus3", json!(39.95), json!(1000)),
    ];
    let records: Vec<_> = batch.iter().filter_map(|doc| decode_position(doc).ok()).collect();
    assert_eq!(records.len(), 1);

    let message = decode_feed(&encode_feed(&FeedSnapshot::new(records, 2_000))).unwrap();
    for entity in &message.entity {
        let position = entity.vehicle.as_ref().and_then(|v| v.position.as_ref()).unwrap();
        assert!(position.latitude.is_finite());
        assert!(position.longitude.is_finite());
    }
}

proptest! {
    #[test]
    fn prop_string_and_native_numbers_decode_alike(latitude in -90.0f64..90.0, timestamp in 0u64..4_000_000_000_000) {
        let native = decode_position(&raw("bus", json!(latitude), json!(timestamp))).unwrap();
        let textual = decode_position(&raw("bus", json!(latitude.to_string()), json!(timestamp.to_string()))).unwrap();

        prop_assert_eq!(native, textual);
    }

    #[test]
    fn prop_non_numeric_text_never_decodes(junk in "[a-z]{1,12}") {
        let result = decode_position(&raw("bus", json!(junk), json!(1000)));
        let is_not_numeric = matches!(result, Err(DecodeError::NotNumeric { .. }));
        prop_assert!(is_not_numeric);
    }
}
