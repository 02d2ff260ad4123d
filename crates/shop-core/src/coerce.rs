//! # Numeric Coercion
//!
//! Inbound shop data is produced by scripts that are loose about types: a
//! price may arrive as `100`, `100.0`, `"100"` or not at all, and the same
//! field may be spelled `basePrice` in one payload and `base_price` in the
//! next. This module is the one place where that looseness is resolved.
//!
//! ## The Coalescing Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  first_number(obj, ["overridePrice", "override_price", "basePrice"], 0) │
//! │                                                                         │
//! │  1. Walk the keys in order                                             │
//! │  2. The first key that is present and not null wins                    │
//! │  3. Its value is coerced with number_or(value, fallback)               │
//! │                                                                         │
//! │  A present-but-garbage value does NOT fall through to later keys; it  │
//! │  resolves to the fallback. The result is always a finite number.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Strings use JavaScript-style truthiness instead: the first non-empty
//! value wins (see [`first_string`]).

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Reads a JSON value as a finite number.
///
/// Numbers pass through, numeric strings are parsed (an empty string is 0),
/// `true`/`false` map to `1`/`0`; everything else is `None`.
pub fn finite_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Coerces a JSON value to a finite number, or returns `fallback`.
pub fn number_or(value: &Value, fallback: f64) -> f64 {
    finite_number(value).unwrap_or(fallback)
}

/// JavaScript-style truthiness, used for flags such as `unlocked`.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0 && !n.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Returns the value of the first key that is present and not null.
pub fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// The coalescing rule for numbers. See the module docs.
pub fn first_number(obj: &Map<String, Value>, keys: &[&str], fallback: f64) -> f64 {
    first_present(obj, keys)
        .map(|value| number_or(value, fallback))
        .unwrap_or(fallback)
}

/// Like [`first_number`] but `None` when no key is present or the winning
/// value is not a finite number.
pub fn first_number_opt(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    first_present(obj, keys).and_then(finite_number)
}

/// Returns the first non-empty string (or number, rendered) among `keys`.
pub fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|key| obj.get(*key)).find_map(|value| match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Reads a nested object, e.g. `point.coords`.
pub fn object<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    obj.get(key).and_then(Value::as_object)
}

/// Converts a coerced number to a non-negative level, minimum 1.
pub fn level(value: f64) -> u32 {
    if value >= 1.0 {
        value.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

// =============================================================================
// Serde Adapters
// =============================================================================

/// `#[serde(deserialize_with)]` adapters for typed snapshot fields.
///
/// Each adapter accepts any JSON value and applies [`number_or`] with the
/// fallback named in its function name.
pub mod de {
    use super::*;
    use serde::de::{DeserializeOwned, Error};

    fn coerce<'de, D: Deserializer<'de>>(deserializer: D, fallback: f64) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(number_or(&value, fallback))
    }

    /// Integer, fallback 0. Fractions truncate toward zero.
    pub fn int_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        coerce(deserializer, 0.0).map(|n| n.trunc() as i64)
    }

    /// Float, fallback 0.
    pub fn float_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        coerce(deserializer, 0.0)
    }

    /// Level, fallback and minimum 1.
    pub fn level_or_one<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        coerce(deserializer, 1.0).map(level)
    }

    /// JavaScript truthiness, fallback false.
    pub fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Value::deserialize(deserializer).map(|value| super::truthy(&value))
    }

    /// Absent or `null` becomes `T::default()`.
    pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
    }

    /// Keyed tables. `null` and `[]` (an empty table as the host encodes
    /// it) become `T::default()`.
    pub fn map_or_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(T::default()),
            Value::Array(items) if items.is_empty() => Ok(T::default()),
            value => T::deserialize(value).map_err(Error::custom),
        }
    }

    /// Like [`map_or_empty`], but `null` stays `None`.
    pub fn opt_map_or_empty<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::Array(items) if items.is_empty() => Ok(Some(T::default())),
            value => T::deserialize(value).map(Some).map_err(Error::custom),
        }
    }

    /// Optional float; anything that is not a finite number is `None`.
    pub fn opt_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Value::deserialize(deserializer).map(|value| finite_number(&value))
    }

    /// Optional duration in milliseconds. Fractions truncate, negatives are
    /// `None`.
    pub fn opt_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        Value::deserialize(deserializer).map(|value| {
            finite_number(&value)
                .filter(|millis| *millis >= 0.0)
                .map(|millis| millis.trunc() as u64)
        })
    }
}
