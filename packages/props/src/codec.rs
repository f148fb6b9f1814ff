//! The property codec - conversions between Rust types and stored shapes.
//!
//! The Rust type of a caller's default value is what selects the shape a
//! typed read attempts. `PropertyScalar` is the seam that makes that work:
//! one implementation per supported scalar type and per array form.

use chrono::{DateTime, Utc};

use cask_repo::{Decimal, PropertyType, PropertyValue};

/// A Rust type that maps onto one stored property shape.
///
/// Implemented for exactly the six scalar types (`String`, `bool`, `i64`,
/// `f64`, [`Decimal`], `DateTime<Utc>`) and `Vec<_>` of each. Extraction
/// is shape-checked: a mismatched stored shape yields `None`, so typed
/// reads fall back to the caller's default instead of failing.
///
/// Numeric widening is the one deliberate accommodation: `f64` and
/// [`Decimal`] reads also accept a stored `Long` (and their array forms
/// accept `Longs`), since a long is representable in either without a
/// shape the caller would notice.
pub trait PropertyScalar: Sized {
    /// The stored shape this Rust type selects.
    fn property_type() -> PropertyType;

    /// Shape-checked extraction from a stored value.
    fn from_value(value: &PropertyValue) -> Option<Self>;

    /// Convert into the stored form.
    fn into_value(self) -> PropertyValue;
}

impl PropertyScalar for String {
    fn property_type() -> PropertyType {
        PropertyType::String
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::String(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::String(self)
    }
}

impl PropertyScalar for bool {
    fn property_type() -> PropertyType {
        PropertyType::Bool
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Bool(self)
    }
}

impl PropertyScalar for i64 {
    fn property_type() -> PropertyType {
        PropertyType::Long
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Long(self)
    }
}

impl PropertyScalar for f64 {
    fn property_type() -> PropertyType {
        PropertyType::Double
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Double(v) => Some(*v),
            PropertyValue::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Double(self)
    }
}

impl PropertyScalar for Decimal {
    fn property_type() -> PropertyType {
        PropertyType::Decimal
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Decimal(v) => Some(v.clone()),
            PropertyValue::Long(v) => Some(Decimal::from(*v)),
            _ => None,
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Decimal(self)
    }
}

impl PropertyScalar for DateTime<Utc> {
    fn property_type() -> PropertyType {
        PropertyType::Timestamp
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Timestamp(self)
    }
}

impl PropertyScalar for Vec<String> {
    fn property_type() -> PropertyType {
        PropertyType::StringArray
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Strings(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Strings(self)
    }
}

impl PropertyScalar for Vec<bool> {
    fn property_type() -> PropertyType {
        PropertyType::BoolArray
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Bools(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Bools(self)
    }
}

impl PropertyScalar for Vec<i64> {
    fn property_type() -> PropertyType {
        PropertyType::LongArray
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Longs(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Longs(self)
    }
}

impl PropertyScalar for Vec<f64> {
    fn property_type() -> PropertyType {
        PropertyType::DoubleArray
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Doubles(v) => Some(v.clone()),
            PropertyValue::Longs(v) => Some(v.iter().map(|&l| l as f64).collect()),
            _ => None,
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Doubles(self)
    }
}

impl PropertyScalar for Vec<Decimal> {
    fn property_type() -> PropertyType {
        PropertyType::DecimalArray
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Decimals(v) => Some(v.clone()),
            PropertyValue::Longs(v) => Some(v.iter().map(|&l| Decimal::from(l)).collect()),
            _ => None,
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Decimals(self)
    }
}

impl PropertyScalar for Vec<DateTime<Utc>> {
    fn property_type() -> PropertyType {
        PropertyType::TimestampArray
    }

    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Timestamps(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Timestamps(self)
    }
}
