//! Single vehicle position record

use serde::Serialize;
use thiserror::Error;

/// Construction errors for [`PositionRecord`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    #[error("vehicle identifier must not be empty")]
    EmptyIdentifier,
}

/// One vehicle's reported position
///
/// Coordinates use `f32`, the precision the GTFS-realtime `Position` message
/// carries on the wire. `timestamp_ms` is milliseconds since the Unix epoch
/// as reported by the vehicle, and is only comparable between records of
/// the same identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionRecord {
    identifier: String,
    latitude: f32,
    longitude: f32,
    bearing: f32,
    speed: f32,
    timestamp_ms: u64,
}

impl PositionRecord {
    /// Create a record, rejecting an empty identifier
    pub fn new(
        identifier: impl Into<String>,
        latitude: f32,
        longitude: f32,
        bearing: f32,
        speed: f32,
        timestamp_ms: u64,
    ) -> Result<Self, RecordError> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(RecordError::EmptyIdentifier);
        }

        Ok(Self {
            identifier,
            latitude,
            longitude,
            bearing,
            speed,
            timestamp_ms,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn latitude(&self) -> f32 {
        self.latitude
    }

    pub fn longitude(&self) -> f32 {
        self.longitude
    }

    /// Heading in degrees clockwise from true north
    pub fn bearing(&self) -> f32 {
        self.bearing
    }

    /// Speed in metres per second
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Report timestamp truncated to whole seconds
    pub fn timestamp_secs(&self) -> u64 {
        self.timestamp_ms / 1000
    }

    /// Age of this record relative to `now_ms`, zero if the record is from the future
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_identifier() {
        let err = PositionRecord::new("", 1.0, 2.0, 0.0, 0.0, 1000).unwrap_err();
        assert_eq!(err, RecordError::EmptyIdentifier);
    }

    #[test]
    fn test_timestamp_secs_truncates() {
        let record = PositionRecord::new("bus1", 39.95, -75.16, 90.0, 4.5, 1_365_614_681_999).unwrap();
        assert_eq!(record.timestamp_secs(), 1_365_614_681);
    }

    #[test]
    fn test_age_saturates_for_future_records() {
        let record = PositionRecord::new("bus1", 0.0, 0.0, 0.0, 0.0, 5_000).unwrap();
        assert_eq!(record.age_ms(7_500), 2_500);
        assert_eq!(record.age_ms(1_000), 0);
    }
}
