//! Wire timestamps.
//!
//! Accepts full RFC 3339 (`2024-01-01T09:00:00Z`, any offset, optional
//! fraction) and the seconds-less form `2024-01-01T09:00Z`. Values are
//! normalised to UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, de::Error as _};

pub fn parse(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  DateTime::parse_from_rfc3339(s)
    .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%#z"))
    .ok()
    .map(|dt| dt.with_timezone(&Utc))
}

/// `#[serde(deserialize_with = "timestamp::required")]`
pub fn required<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp {raw:?}")))
}

/// `#[serde(default, deserialize_with = "timestamp::optional")]`
pub fn optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  match Option::<String>::deserialize(deserializer)? {
    None => Ok(None),
    Some(raw) => parse(&raw)
      .map(Some)
      .ok_or_else(|| D::Error::custom(format!("invalid timestamp {raw:?}"))),
  }
}
