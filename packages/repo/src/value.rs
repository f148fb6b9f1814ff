//! The PropertyValue type - the closed property-shape vocabulary.
//!
//! Every node property holds exactly one of these shapes: six scalars,
//! their six homogeneous array forms, a binary payload, or one of the
//! three reference shapes.

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Decimal;

/// The type tag of a property, as reported by introspection.
///
/// `Undefined` is the answer for "no such property"; it is never the type
/// of a stored value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    String,
    Bool,
    Long,
    Double,
    Decimal,
    Timestamp,
    StringArray,
    BoolArray,
    LongArray,
    DoubleArray,
    DecimalArray,
    TimestampArray,
    Binary,
    Reference,
    WeakReference,
    Path,
    Undefined,
}

impl PropertyType {
    /// Whether a stored value of this type may appear in `set_properties`.
    ///
    /// Only the six scalar shapes are writable through the bulk property
    /// setter; binaries and references go through their own channels.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            PropertyType::String
                | PropertyType::Bool
                | PropertyType::Long
                | PropertyType::Double
                | PropertyType::Decimal
                | PropertyType::Timestamp
        )
    }

    /// Whether this is one of the six homogeneous array shapes.
    pub fn is_array(self) -> bool {
        matches!(
            self,
            PropertyType::StringArray
                | PropertyType::BoolArray
                | PropertyType::LongArray
                | PropertyType::DoubleArray
                | PropertyType::DecimalArray
                | PropertyType::TimestampArray
        )
    }

    /// Whether this is one of the reference shapes.
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            PropertyType::Reference | PropertyType::WeakReference | PropertyType::Path
        )
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PropertyType::String => "string",
            PropertyType::Bool => "bool",
            PropertyType::Long => "long",
            PropertyType::Double => "double",
            PropertyType::Decimal => "decimal",
            PropertyType::Timestamp => "timestamp",
            PropertyType::StringArray => "string[]",
            PropertyType::BoolArray => "bool[]",
            PropertyType::LongArray => "long[]",
            PropertyType::DoubleArray => "double[]",
            PropertyType::DecimalArray => "decimal[]",
            PropertyType::TimestampArray => "timestamp[]",
            PropertyType::Binary => "binary",
            PropertyType::Reference => "reference",
            PropertyType::WeakReference => "weak-reference",
            PropertyType::Path => "path",
            PropertyType::Undefined => "undefined",
        };
        write!(f, "{}", name)
    }
}

/// A stored property value.
///
/// # Design Notes
///
/// - Arrays are homogeneous by construction: one variant per element type,
///   so a heterogeneous array is unrepresentable.
/// - `Binary` holds `Bytes`, so snapshots clone cheaply.
/// - Reference shapes carry the target's identity (`Reference`,
///   `WeakReference`) or an absolute path string (`Path`); resolution is
///   the upper layers' job.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    String(String),
    Bool(bool),
    Long(i64),
    Double(f64),
    Decimal(Decimal),
    Timestamp(DateTime<Utc>),
    Strings(Vec<String>),
    Bools(Vec<bool>),
    Longs(Vec<i64>),
    Doubles(Vec<f64>),
    Decimals(Vec<Decimal>),
    Timestamps(Vec<DateTime<Utc>>),
    Binary(Bytes),
    Reference(Uuid),
    WeakReference(Uuid),
    Path(String),
}

impl PropertyValue {
    /// The type tag of this value.
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::String(_) => PropertyType::String,
            PropertyValue::Bool(_) => PropertyType::Bool,
            PropertyValue::Long(_) => PropertyType::Long,
            PropertyValue::Double(_) => PropertyType::Double,
            PropertyValue::Decimal(_) => PropertyType::Decimal,
            PropertyValue::Timestamp(_) => PropertyType::Timestamp,
            PropertyValue::Strings(_) => PropertyType::StringArray,
            PropertyValue::Bools(_) => PropertyType::BoolArray,
            PropertyValue::Longs(_) => PropertyType::LongArray,
            PropertyValue::Doubles(_) => PropertyType::DoubleArray,
            PropertyValue::Decimals(_) => PropertyType::DecimalArray,
            PropertyValue::Timestamps(_) => PropertyType::TimestampArray,
            PropertyValue::Binary(_) => PropertyType::Binary,
            PropertyValue::Reference(_) => PropertyType::Reference,
            PropertyValue::WeakReference(_) => PropertyType::WeakReference,
            PropertyValue::Path(_) => PropertyType::Path,
        }
    }

    /// Project this value to its display string.
    ///
    /// Returns `None` for binaries, which have no string form. Timestamps
    /// render as RFC 3339; arrays join their elements with `", "`;
    /// references render the target identity/path text.
    pub fn to_display_string(&self) -> Option<String> {
        fn join<T, F: Fn(&T) -> String>(items: &[T], f: F) -> String {
            items.iter().map(f).collect::<Vec<_>>().join(", ")
        }

        let s = match self {
            PropertyValue::String(v) => v.clone(),
            PropertyValue::Bool(v) => v.to_string(),
            PropertyValue::Long(v) => v.to_string(),
            PropertyValue::Double(v) => v.to_string(),
            PropertyValue::Decimal(v) => v.to_string(),
            PropertyValue::Timestamp(v) => v.to_rfc3339_opts(SecondsFormat::Secs, true),
            PropertyValue::Strings(v) => join(v, |s| s.clone()),
            PropertyValue::Bools(v) => join(v, bool::to_string),
            PropertyValue::Longs(v) => join(v, i64::to_string),
            PropertyValue::Doubles(v) => join(v, f64::to_string),
            PropertyValue::Decimals(v) => join(v, Decimal::to_string),
            PropertyValue::Timestamps(v) => {
                join(v, |t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            PropertyValue::Binary(_) => return None,
            PropertyValue::Reference(v) | PropertyValue::WeakReference(v) => v.to_string(),
            PropertyValue::Path(v) => v.clone(),
        };
        Some(s)
    }

    /// The binary payload, if this is a binary value.
    pub fn as_binary(&self) -> Option<&Bytes> {
        match self {
            PropertyValue::Binary(b) => Some(b),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Long(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Double(v)
    }
}
