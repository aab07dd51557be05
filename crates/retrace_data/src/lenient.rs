//! Forgiving field decoders for log lines.
//!
//! A damaged field never rejects the surrounding record: numbers that are
//! missing, `null`, non-numeric or out of range decode to zero, and optional
//! fields decode to `None` when they cannot be understood.

use crate::{EntitySnapshot, RenderKind, Rgba};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Numeric target of a lenient decode.
pub trait FromJsonNumber: Sized + Default {
    fn from_f64(v: f64) -> Self;
}

impl FromJsonNumber for f32 {
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl FromJsonNumber for f64 {
    fn from_f64(v: f64) -> Self {
        v
    }
}

impl FromJsonNumber for u32 {
    fn from_f64(v: f64) -> Self {
        if v.is_finite() && v >= 0.0 && v <= u32::MAX as f64 {
            v as u32
        } else {
            0
        }
    }
}

impl FromJsonNumber for u64 {
    fn from_f64(v: f64) -> Self {
        if v.is_finite() && v >= 0.0 && v <= u64::MAX as f64 {
            v as u64
        } else {
            0
        }
    }
}

/// Converts an arbitrary JSON value into a number, or zero.
pub fn number_from_value<T: FromJsonNumber>(value: &Value) -> T {
    match value {
        Value::Number(n) => n.as_f64().map(T::from_f64).unwrap_or_default(),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(T::from_f64)
            .unwrap_or_default(),
        _ => T::default(),
    }
}

pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromJsonNumber,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_value(&value))
}

/// Present-but-malformed decodes to `Some(0)`; `null` decodes to `None`.
pub fn optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromJsonNumber,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(number_from_value(&other)),
    })
}

/// Only whole, non-negative numbers are accepted as identifiers.
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64())
}

pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

/// Any present `rt` marks the snapshot as carrying appearance; an unknown
/// kind falls back to the default shape.
pub fn render_kind<'de, D>(deserializer: D) -> Result<Option<RenderKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(RenderKind::from_name(&s).unwrap_or_default()),
        _ => Some(RenderKind::default()),
    })
}

/// Colors are accepted only as four-element arrays.
pub fn color<'de, D>(deserializer: D) -> Result<Option<Rgba>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(parts) if parts.len() == 4 => Some(Rgba::new(
            number_from_value(&parts[0]),
            number_from_value(&parts[1]),
            number_from_value(&parts[2]),
            number_from_value(&parts[3]),
        )),
        _ => None,
    })
}

/// Non-object entries are dropped; a non-array field yields no snapshots.
pub fn snapshots<'de, D>(deserializer: D) -> Result<Vec<EntitySnapshot>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}
