//! Snapshot to GTFS-realtime conversion
//!
//! Store timestamps arrive in milliseconds; GTFS-realtime carries seconds,
//! so both the header and vehicle timestamps are truncated on the way out.

use prost::Message;
use types::{FeedSnapshot, PositionRecord};

use crate::error::FeedError;
use crate::gtfs_realtime::{
    FeedEntity, FeedHeader, FeedMessage, Incrementality, Position, VehicleDescriptor,
    VehiclePosition,
};

/// GTFS-realtime version written into every feed header
pub const GTFS_REALTIME_VERSION: &str = "1.0";

/// Build the full-dataset feed message for a snapshot
pub fn build_feed_message(snapshot: &FeedSnapshot) -> FeedMessage {
    FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: GTFS_REALTIME_VERSION.to_string(),
            incrementality: Some(Incrementality::FullDataset as i32),
            timestamp: Some(snapshot.created_at_ms() / 1000),
        },
        entity: snapshot.records().iter().map(build_feed_entity).collect(),
    }
}

/// One feed entity; the vehicle identifier doubles as the entity id
pub fn build_feed_entity(record: &PositionRecord) -> FeedEntity {
    FeedEntity {
        id: record.identifier().to_string(),
        is_deleted: None,
        vehicle: Some(VehiclePosition {
            position: Some(Position {
                latitude: record.latitude(),
                longitude: record.longitude(),
                bearing: Some(record.bearing()),
                odometer: None,
                speed: Some(record.speed()),
            }),
            timestamp: Some(record.timestamp_secs()),
            vehicle: Some(VehicleDescriptor {
                id: Some(record.identifier().to_string()),
                label: None,
                license_plate: None,
            }),
        }),
    }
}

/// Protobuf bytes for a snapshot
pub fn encode_feed(snapshot: &FeedSnapshot) -> Vec<u8> {
    build_feed_message(snapshot).encode_to_vec()
}

/// Parse feed bytes back into a message
pub fn decode_feed(bytes: &[u8]) -> Result<FeedMessage, FeedError> {
    Ok(FeedMessage::decode(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> FeedSnapshot {
        FeedSnapshot::new(
            vec![
                PositionRecord::new("bus2", 39.9, -75.1, 45.0, 7.5, 500_999).unwrap(),
                PositionRecord::new("bus1", 39.95, -75.16, 90.0, 4.5, 1_365_614_681_000).unwrap(),
            ],
            1_365_614_700_250,
        )
    }

    #[test]
    fn test_header_fields() {
        let message = build_feed_message(&snapshot());

        assert_eq!(message.header.gtfs_realtime_version, "1.0");
        assert_eq!(message.header.incrementality, Some(Incrementality::FullDataset as i32));
        assert_eq!(message.header.timestamp, Some(1_365_614_700));
    }

    #[test]
    fn test_entities_follow_snapshot_order() {
        let message = build_feed_message(&snapshot());
        let ids: Vec<&str> = message.entity.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["bus1", "bus2"]);

        let vehicle = message.entity[1].vehicle.as_ref().unwrap();
        assert_eq!(vehicle.timestamp, Some(500));
        assert_eq!(vehicle.vehicle.as_ref().unwrap().id.as_deref(), Some("bus2"));

        let position = vehicle.position.as_ref().unwrap();
        assert_eq!(position.latitude, 39.9f32);
        assert_eq!(position.bearing, Some(45.0));
        assert_eq!(position.speed, Some(7.5));
    }

    #[test]
    fn test_encoded_bytes_decode() {
        let bytes = encode_feed(&snapshot());
        let decoded = decode_feed(&bytes).unwrap();
        assert_eq!(decoded, build_feed_message(&snapshot()));
    }

    #[test]
    fn test_empty_snapshot_still_has_header() {
        let bytes = encode_feed(&FeedSnapshot::empty());
        let decoded = decode_feed(&bytes).unwrap();
        assert!(decoded.entity.is_empty());
        assert_eq!(decoded.header.gtfs_realtime_version, GTFS_REALTIME_VERSION);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(decode_feed(&[0xff, 0xff, 0xff]).is_err());
    }
}
