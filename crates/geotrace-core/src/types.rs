//! Event record and visualization point types.
//!
//! Records travel as JSON objects with the fixed field names below. Values
//! are kept in whatever JSON type the producer used (the CSV replayer emits
//! every field as a string), so numeric fields are parsed leniently from
//! either a JSON number or a numeric string.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RecordError, RecordResult};

/// Field holding the opaque source identifier.
pub const FIELD_IP: &str = "ip address";
/// Field holding the latitude in decimal degrees.
pub const FIELD_LATITUDE: &str = "Latitude";
/// Field holding the longitude in decimal degrees.
pub const FIELD_LONGITUDE: &str = "Longitude";
/// Field holding seconds since the Unix epoch.
pub const FIELD_TIMESTAMP: &str = "Timestamp";

/// Columns every record source must provide.
pub const REQUIRED_FIELDS: [&str; 4] = [FIELD_TIMESTAMP, FIELD_IP, FIELD_LATITUDE, FIELD_LONGITUDE];

/// One ingested event, stored verbatim as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventRecord(Value);

impl EventRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Build a record from the four well-known fields, all as strings.
    pub fn from_fields(ip: &str, latitude: &str, longitude: &str, timestamp: &str) -> Self {
        Self(serde_json::json!({
            FIELD_IP: ip,
            FIELD_LATITUDE: latitude,
            FIELD_LONGITUDE: longitude,
            FIELD_TIMESTAMP: timestamp,
        }))
    }

    /// Look up a top-level field. Returns `None` for non-object records.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.as_object().and_then(|obj| obj.get(field))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Parse the `Timestamp` field as whole seconds.
    pub fn timestamp(&self) -> RecordResult<i64> {
        if !self.0.is_object() {
            return Err(RecordError::NotAnObject);
        }
        parse_int(FIELD_TIMESTAMP, self.get(FIELD_TIMESTAMP))
    }

    /// Project this record into a typed visualization point.
    pub fn to_point(&self) -> RecordResult<VisualizationPoint> {
        if !self.0.is_object() {
            return Err(RecordError::NotAnObject);
        }
        let ip = match self.get(FIELD_IP) {
            None | Some(Value::Null) => return Err(RecordError::MissingField(FIELD_IP)),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        Ok(VisualizationPoint {
            ip,
            latitude: parse_float(FIELD_LATITUDE, self.get(FIELD_LATITUDE))?,
            longitude: parse_float(FIELD_LONGITUDE, self.get(FIELD_LONGITUDE))?,
            timestamp: parse_int(FIELD_TIMESTAMP, self.get(FIELD_TIMESTAMP))?,
        })
    }
}

impl From<Value> for EventRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Typed projection of an [`EventRecord`] consumed by the view layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationPoint {
    pub ip: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
}

fn invalid(field: &'static str, value: &Value) -> RecordError {
    RecordError::InvalidNumber {
        field,
        value: value.to_string(),
    }
}

fn parse_float(field: &'static str, value: Option<&Value>) -> RecordResult<f64> {
    let value = match value {
        None | Some(Value::Null) => return Err(RecordError::MissingField(field)),
        Some(v) => v,
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    // NaN and infinities have no JSON number encoding.
    match parsed {
        Some(f) if f.is_finite() => Ok(f),
        _ => Err(invalid(field, value)),
    }
}

fn parse_int(field: &'static str, value: Option<&Value>) -> RecordResult<i64> {
    let value = match value {
        None | Some(Value::Null) => return Err(RecordError::MissingField(field)),
        Some(v) => v,
    };
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| invalid(field, value))
}
