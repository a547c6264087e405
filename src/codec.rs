//! Registered wire conversions
//!
//! DbFlare transports timestamps as ISO-8601-like strings and binary columns
//! as base64 strings. These serde adapter modules are meant for
//! `#[serde(with = "...")]` on record fields:
//!
//! ```rust
//! use chrono::{DateTime, FixedOffset};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Attachment {
//!     name: String,
//!     #[serde(with = "dbflare_client::codec::lenient_datetime")]
//!     created: Option<DateTime<FixedOffset>>,
//!     #[serde(with = "dbflare_client::codec::base64_bytes")]
//!     content: Vec<u8>,
//! }
//! ```
//!
//! Timestamp parsing is deliberately lenient: a blank or unparseable value
//! deserializes to `None` instead of failing the whole record, with a
//! `tracing::warn!` so bad server data stays visible.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

/// The timestamp layout DbFlare emits (`2016-11-15T09:30:00.1234+0800`)
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Parse a DbFlare timestamp string, trying the service's own layout first
/// and falling back to RFC 3339 and offset-less variants.
pub fn parse_datetime(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    // Offset-less timestamps are taken as UTC
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc().fixed_offset());
    }
    None
}

/// Format a timestamp the way DbFlare expects it
pub fn format_datetime(value: &DateTime<FixedOffset>) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

/// Current time in the wire offset representation
pub fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

/// Serde adapter for `Option<DateTime<FixedOffset>>` fields with lenient
/// parsing: blank or malformed timestamps become `None`.
pub mod lenient_datetime {
    use super::{format_datetime, parse_datetime};
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::warn;

    pub fn serialize<S>(
        value: &Option<DateTime<FixedOffset>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&format_datetime(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.and_then(|s| {
            if s.trim().is_empty() {
                return None;
            }
            let parsed = parse_datetime(&s);
            if parsed.is_none() {
                warn!(value = %s, "dropping unparseable timestamp");
            }
            parsed
        }))
    }
}

/// Serde adapter for `Vec<u8>` fields carried as base64 strings
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        STANDARD.decode(raw).map_err(serde::de::Error::custom)
    }
}
