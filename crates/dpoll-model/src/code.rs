//! Numeric codes used as value-label keys and design values.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A raw numeric value as stored by statistical packages.
///
/// Codes are totally ordered and hashable so they can key value-label maps,
/// identify respondents, and name time points or groups. `-0.0` and `0.0`
/// compare equal. A `Code` never holds NaN.
#[derive(Debug, Clone, Copy)]
pub struct Code(f64);

impl Code {
    /// Wrap a raw value; returns `None` for NaN or infinities.
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() {
            // Normalize negative zero so Eq and Hash agree.
            Some(Self(if value == 0.0 { 0.0 } else { value }))
        } else {
            None
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<i32> for Code {
    fn from(value: i32) -> Self {
        Self(f64::from(value))
    }
}

impl PartialEq for Code {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Code {}

impl PartialOrd for Code {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Code {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Code {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_numeric(self.0))
    }
}

impl FromStr for Code {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<f64>()
            .map_err(|_| format!("invalid numeric code: {s}"))?;
        Code::new(value).ok_or_else(|| format!("code must be finite: {s}"))
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Code {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Code::new(value).ok_or_else(|| serde::de::Error::custom("code must be finite"))
    }
}

/// Formats a floating-point number as a string without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
