//! Decoded field values, and their semantic formatting.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    options::Options,
    profile::{FieldProfile, Profile, UnitFamily},
};

/// Seconds between the Unix epoch and the FIT epoch (1989-12-31T00:00:00Z).
pub const FIT_EPOCH_OFFSET: i64 = 631_065_600;

/// Degrees per semicircle.
pub const SEMICIRCLE_DEGREES: f64 = 180.0 / 2_147_483_648.0;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
}

/// Named field values of a decoded message.
pub type Fields = BTreeMap<String, Value>;

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Integer(x) => Some(x),
            _ => None,
        }
    }

    /// The value as a float, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Integer(x) => Some(x as f64),
            Self::Float(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match *self {
            Self::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    /// Apply `f` to a scalar, or to each element of an array.
    fn map(self, f: &impl Fn(Value) -> Value) -> Value {
        match self {
            Self::Array(items) => Self::Array(items.into_iter().map(|v| v.map(f)).collect()),
            scalar => f(scalar),
        }
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}

/// The calendar time of a FIT timestamp, in seconds since the FIT epoch.
pub fn fit_timestamp(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(FIT_EPOCH_OFFSET.checked_add(seconds)?, 0)
}

fn is_numeric(kind: &str) -> bool {
    matches!(
        kind,
        "uint8"
            | "uint8z"
            | "uint16"
            | "uint16z"
            | "uint32"
            | "uint32z"
            | "uint64"
            | "uint64z"
            | "sint8"
            | "sint16"
            | "sint32"
            | "sint64"
            | "float32"
            | "float64"
    )
}

fn scaled(value: Value, scale: f64, offset: f64) -> Value {
    match value.as_f64() {
        Some(x) => Value::Float(x / scale + offset),
        None => value,
    }
}

/// Format a raw value according to its field's semantic type.
///
/// - `date_time` and `local_date_time` become calendar timestamps.
/// - Fields measured in `semicircles` become degrees.
/// - Numeric fields with a scale become `raw / scale + offset`.
/// - Enumerated fields become their symbolic label, or stay raw when the
///   value has none.
///
/// Anything else passes through unchanged.
pub fn format_by_type(value: Value, field: &FieldProfile, profile: &Profile) -> Value {
    let kind = field.kind.as_str();
    let scale = field.scale.filter(|s| *s != 0.0);
    let offset = field.offset.unwrap_or_default();

    if matches!(kind, "date_time" | "local_date_time") {
        return value.map(&|v| match v {
            Value::Integer(s) => fit_timestamp(s).map_or(v, Value::Timestamp),
            v => v,
        });
    }

    if field.units.as_deref() == Some("semicircles") {
        return value.map(&|v| match v.as_f64() {
            Some(x) => Value::Float(x * SEMICIRCLE_DEGREES),
            None => v,
        });
    }

    if is_numeric(kind) {
        return match scale {
            Some(scale) => value.map(&|v| scaled(v, scale, offset)),
            None => value,
        };
    }

    if let Some(labels) = profile.enum_by_type(kind) {
        return value.map(&|v| {
            let label = v
                .as_i64()
                .and_then(|x| u32::try_from(x).ok())
                .and_then(|x| labels.label(x));

            match (label, scale) {
                (Some(label), _) => Value::Text(label.to_owned()),
                (None, Some(scale)) => scaled(v, scale, offset),
                (None, None) => v,
            }
        });
    }

    value
}

/// Convert a formatted value into the unit configured for its family.
pub fn convert_units(value: Value, family: UnitFamily, options: &Options) -> Value {
    let conversion = options.conversion(family);

    if conversion.is_identity() {
        return value;
    }

    value.map(&|v| match v {
        Value::Integer(_) | Value::Float(_) => {
            Value::Float(conversion.apply(v.as_f64().unwrap_or_default()))
        }
        v => v,
    })
}
