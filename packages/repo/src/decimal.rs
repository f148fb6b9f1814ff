//! Decimal type - arbitrary-precision decimals in canonical string form.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors from decimal parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    /// The input is not a decimal number.
    #[error("invalid decimal '{input}': {message}")]
    Invalid { input: String, message: String },
}

/// An arbitrary-precision decimal kept in canonical string form.
///
/// Property values of type `Decimal` must survive round-trips without
/// losing precision, which rules out `f64`. The value is stored as a
/// normalized string: optional `-`, integer digits without leading zeros,
/// optional fraction without trailing zeros.
///
/// # Examples
///
/// ```rust
/// use cask_repo::Decimal;
///
/// let d: Decimal = "3.1400".parse().unwrap();
/// assert_eq!(d.to_string(), "3.14");
/// assert_eq!(d, "3.14".parse().unwrap());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Decimal {
    negative: bool,
    /// Integer digits, no leading zeros ("0" for a zero integer part).
    integer: String,
    /// Fraction digits, no trailing zeros (empty when none).
    fraction: String,
}

impl Decimal {
    /// The decimal zero.
    pub fn zero() -> Self {
        Decimal {
            negative: false,
            integer: "0".to_string(),
            fraction: String::new(),
        }
    }

    /// Parse and normalize a decimal string.
    pub fn parse(input: &str) -> Result<Self, DecimalError> {
        let invalid = |message: &str| DecimalError::Invalid {
            input: input.to_string(),
            message: message.to_string(),
        };

        let (negative, rest) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input.strip_prefix('+').unwrap_or(input)),
        };
        if rest.is_empty() {
            return Err(invalid("no digits"));
        }

        let (int_part, frac_part) = match rest.split_once('.') {
            Some((i, f)) => (i, f),
            None => (rest, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("no digits"));
        }
        if !int_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("non-digit in integer part"));
        }
        if !frac_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("non-digit in fraction part"));
        }

        let integer = int_part.trim_start_matches('0');
        let integer = if integer.is_empty() { "0" } else { integer };
        let fraction = frac_part.trim_end_matches('0');

        let is_zero = integer == "0" && fraction.is_empty();
        Ok(Decimal {
            negative: negative && !is_zero,
            integer: integer.to_string(),
            fraction: fraction.to_string(),
        })
    }

    /// Whether this decimal is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.integer == "0" && self.fraction.is_empty()
    }

    /// Whether this decimal is negative.
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Compare magnitudes, ignoring sign.
    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        match self.integer.len().cmp(&other.integer.len()) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.integer.cmp(&other.integer) {
            Ordering::Equal => {}
            ord => return ord,
        }
        // Same integer part: compare fractions digit by digit, shorter
        // fraction padded with zeros.
        let len = self.fraction.len().max(other.fraction.len());
        let a = self.fraction.as_bytes();
        let b = other.fraction.as_bytes();
        for i in 0..len {
            let da = a.get(i).copied().unwrap_or(b'0');
            let db = b.get(i).copied().unwrap_or(b'0');
            match da.cmp(&db) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::parse(s)
    }
}

impl From<i64> for Decimal {
    fn from(v: i64) -> Self {
        Decimal::parse(&v.to_string()).expect("i64 is a valid decimal")
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "{}", self.integer)?;
        if !self.fraction.is_empty() {
            write!(f, ".{}", self.fraction)?;
        }
        Ok(())
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Decimal::parse(&s).map_err(serde::de::Error::custom)
    }
}
