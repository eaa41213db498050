//! Store document decoder
//!
//! Turns one raw store document into a [`PositionRecord`]. Documents are
//! expected to nest as
//!
//! ```text
//! {
//!   "entity": {
//!     "id": "5512",
//!     "vehicle": {
//!       "timestamp": 1365614681000,
//!       "position": { "latitude": 39.95, "longitude": -75.16, "bearing": 90, "speed": 4.2 }
//!     }
//!   }
//! }
//! ```
//!
//! Store drivers are inconsistent about numeric types, so every numeric
//! field accepts a JSON number, a decimal string, or a MongoDB extended-JSON
//! wrapper such as `{"$numberLong": "1365614681000"}`.

use serde_json::{Map, Value};
use types::PositionRecord;

use crate::error::{DecodeError, DecodeResult};

/// Raw document as returned by a store query
pub type Document = Value;

const ENTITY: &str = "entity";
const ENTITY_ID: &str = "entity.id";
const VEHICLE: &str = "entity.vehicle";
const TIMESTAMP: &str = "entity.vehicle.timestamp";
const POSITION: &str = "entity.vehicle.position";
const LATITUDE: &str = "entity.vehicle.position.latitude";
const LONGITUDE: &str = "entity.vehicle.position.longitude";
const BEARING: &str = "entity.vehicle.position.bearing";
const SPEED: &str = "entity.vehicle.position.speed";

/// Extended-JSON numeric wrappers produced by MongoDB tooling
const EXTENDED_NUMERIC_KEYS: [&str; 4] = ["$numberLong", "$numberInt", "$numberDouble", "$numberDecimal"];

/// Decode one store document into a position record
pub fn decode_position(raw: &Document) -> DecodeResult<PositionRecord> {
    let entity = object_field(document_root(raw)?, "entity", ENTITY)?;
    let identifier = identifier_of(entity)?;

    let vehicle = object_field(entity, "vehicle", VEHICLE)?;
    let timestamp_ms = coerce_timestamp(required(vehicle, "timestamp", TIMESTAMP)?, TIMESTAMP)?;

    let position = object_field(vehicle, "position", POSITION)?;
    let latitude = coerce_f32(required(position, "latitude", LATITUDE)?, LATITUDE)?;
    let longitude = coerce_f32(required(position, "longitude", LONGITUDE)?, LONGITUDE)?;
    let bearing = coerce_f32(required(position, "bearing", BEARING)?, BEARING)?;
    let speed = coerce_f32(required(position, "speed", SPEED)?, SPEED)?;

    PositionRecord::new(identifier, latitude, longitude, bearing, speed, timestamp_ms)
        .map_err(|_| DecodeError::EmptyIdentifier)
}

/// Extract `entity.id` without decoding the rest of the document
///
/// Store adapters use this to filter documents by vehicle.
pub fn document_identifier(raw: &Document) -> DecodeResult<&str> {
    let entity = object_field(document_root(raw)?, "entity", ENTITY)?;
    identifier_of(entity)
}

/// Extract `entity.vehicle.timestamp` in milliseconds without decoding the rest
pub fn document_timestamp_ms(raw: &Document) -> DecodeResult<u64> {
    let entity = object_field(document_root(raw)?, "entity", ENTITY)?;
    let vehicle = object_field(entity, "vehicle", VEHICLE)?;
    coerce_timestamp(required(vehicle, "timestamp", TIMESTAMP)?, TIMESTAMP)
}

fn identifier_of(entity: &Map<String, Value>) -> DecodeResult<&str> {
    match required(entity, "id", ENTITY_ID)? {
        Value::String(id) if id.is_empty() => Err(DecodeError::EmptyIdentifier),
        Value::String(id) => Ok(id.as_str()),
        _ => Err(DecodeError::wrong_shape(ENTITY_ID, "string")),
    }
}

fn document_root(raw: &Value) -> DecodeResult<&Map<String, Value>> {
    raw.as_object()
        .ok_or_else(|| DecodeError::wrong_shape("<document>", "object"))
}

/// Look up `key` in `parent` and require it to be an object
fn object_field<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> DecodeResult<&'a Map<String, Value>> {
    match required(parent, key, path)? {
        Value::Object(map) => Ok(map),
        _ => Err(DecodeError::wrong_shape(path, "object")),
    }
}

/// Look up `key`, treating an explicit null the same as absence
fn required<'a>(map: &'a Map<String, Value>, key: &str, path: &str) -> DecodeResult<&'a Value> {
    match map.get(key) {
        None | Some(Value::Null) => Err(DecodeError::missing(path)),
        Some(value) => Ok(value),
    }
}

/// Textual form of a numeric field: plain string or extended-JSON wrapper
fn numeric_text<'a>(value: &'a Value, path: &str) -> DecodeResult<&'a str> {
    match value {
        Value::String(text) => Ok(text.trim()),
        Value::Object(map) if map.len() == 1 => {
            let (key, inner) = map.iter().next().ok_or_else(|| DecodeError::wrong_shape(path, "number"))?;
            if !EXTENDED_NUMERIC_KEYS.contains(&key.as_str()) {
                return Err(DecodeError::wrong_shape(path, "number"));
            }
            match inner {
                Value::String(text) => Ok(text.trim()),
                _ => Err(DecodeError::wrong_shape(path, "number")),
            }
        }
        _ => Err(DecodeError::wrong_shape(path, "number")),
    }
}

fn coerce_f64(value: &Value, path: &str) -> DecodeResult<f64> {
    let number = match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| DecodeError::not_numeric(path, number))?,
        Value::Object(map) if map.len() == 1 => {
            // Relaxed extended JSON may also carry a bare number inside the wrapper
            match map.iter().next() {
                Some((key, Value::Number(number))) if EXTENDED_NUMERIC_KEYS.contains(&key.as_str()) => number
                    .as_f64()
                    .ok_or_else(|| DecodeError::not_numeric(path, number))?,
                _ => parse_decimal(numeric_text(value, path)?, path)?,
            }
        }
        _ => parse_decimal(numeric_text(value, path)?, path)?,
    };

    if !number.is_finite() {
        return Err(DecodeError::not_numeric(path, number));
    }
    Ok(number)
}

/// Position fields travel as `f32`; values that overflow it are rejected
fn coerce_f32(value: &Value, path: &str) -> DecodeResult<f32> {
    let wide = coerce_f64(value, path)?;
    let narrow = wide as f32;
    if !narrow.is_finite() {
        return Err(DecodeError::out_of_range(path, wide));
    }
    Ok(narrow)
}

fn parse_decimal(text: &str, path: &str) -> DecodeResult<f64> {
    text.parse::<f64>()
        .map_err(|_| DecodeError::not_numeric(path, text))
}

/// Millisecond timestamps: integers are taken exactly, fractions truncate
fn coerce_timestamp(value: &Value, path: &str) -> DecodeResult<u64> {
    if let Value::Number(number) = value {
        if let Some(exact) = number.as_u64() {
            return Ok(exact);
        }
        if let Some(signed) = number.as_i64() {
            return Err(DecodeError::out_of_range(path, signed));
        }
    } else if let Ok(text) = numeric_text(value, path) {
        if let Ok(exact) = text.parse::<u64>() {
            return Ok(exact);
        }
    }

    let number = coerce_f64(value, path)?;
    if number < 0.0 || number >= u64::MAX as f64 {
        return Err(DecodeError::out_of_range(path, number));
    }
    Ok(number.trunc() as u64)
}
