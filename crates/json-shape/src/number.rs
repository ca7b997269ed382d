//! Numeric values as held by a backing store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A JSON number.
///
/// Stores keep integers and floats apart so that an `i64` written through
/// one accessor reads back exactly through another.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
}

impl Number {
    /// Create an integer number.
    #[inline]
    pub fn int(v: i64) -> Self {
        Number::Int(v)
    }

    /// Create a floating-point number.
    #[inline]
    pub fn float(v: f64) -> Self {
        Number::Float(v)
    }

    /// Convert to f64.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    /// Convert to i64 (truncates floats).
    #[inline]
    pub fn as_i64(&self) -> i64 {
        match self {
            Number::Int(i) => *i,
            Number::Float(f) => *f as i64,
        }
    }

    /// Check if this is an integer.
    #[inline]
    pub fn is_int(&self) -> bool {
        matches!(self, Number::Int(_))
    }

    /// Check if this is a float.
    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Convert to a `serde_json::Number`.
    ///
    /// Returns `None` for NaN and infinities, which JSON cannot represent.
    pub fn to_json(&self) -> Option<serde_json::Number> {
        match self {
            Number::Int(i) => Some(serde_json::Number::from(*i)),
            Number::Float(f) => serde_json::Number::from_f64(*f),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<&serde_json::Number> for Number {
    fn from(n: &serde_json::Number) -> Self {
        match n.as_i64() {
            Some(i) => Number::Int(i),
            None => Number::Float(n.as_f64().unwrap_or(f64::NAN)),
        }
    }
}

impl From<i8> for Number {
    fn from(v: i8) -> Self {
        Number::Int(v as i64)
    }
}

impl From<i16> for Number {
    fn from(v: i16) -> Self {
        Number::Int(v as i64)
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number::Int(v as i64)
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int(v)
    }
}

impl From<f32> for Number {
    fn from(v: f32) -> Self {
        Number::Float(v as f64)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}
