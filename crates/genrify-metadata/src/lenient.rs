// SPDX-License-Identifier: GPL-3.0-or-later

//! Deserializers for fields that sources send either as numbers or strings.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts `12`, `"12"` or `null`; anything unparsable becomes 0.
pub(crate) fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Accepts `1991`, `"1991"`, `"1991-05-01"`, `""` or `null`.
pub(crate) fn year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Value::Number(n) => n.as_i64().map(|y| y as i32),
        Value::String(s) => parse_year(&s),
        _ => None,
    }))
}

/// Accepts a string, a number, or `null`.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

/// First four characters of a date string as a year.
pub(crate) fn parse_year(value: &str) -> Option<i32> {
    let value = value.trim();
    value.get(..4).and_then(|prefix| prefix.parse().ok())
}
