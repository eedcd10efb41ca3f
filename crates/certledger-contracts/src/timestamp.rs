//! Canonical timestamp text.
//!
//! Every timestamp certledger emits, whether hashed into a record, stored in
//! a table, or returned as JSON, uses one form: UTC ISO-8601 with exactly
//! three fractional digits and a `Z` suffix, e.g. `2024-01-01T00:00:00.000Z`.
//! A client can therefore feed the `timestamp` it received straight back into
//! the record hash.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Render `timestamp` in the canonical form.
pub fn format(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse any RFC 3339 timestamp into UTC.
pub fn parse(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|t| t.with_timezone(&Utc))
}

/// `#[serde(with = "timestamp::millis")]` for `DateTime<Utc>` fields.
pub mod millis {
    use super::*;

    pub fn serialize<S: Serializer>(timestamp: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(*timestamp))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(d)?;
        parse(&text).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "timestamp::option_millis")]` for `Option<DateTime<Utc>>` fields.
pub mod option_millis {
    use super::*;

    pub fn serialize<S: Serializer>(
        timestamp: &Option<DateTime<Utc>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match timestamp {
            Some(t) => s.serialize_some(&format(*t)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|text| parse(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};

    use super::*;

    #[test]
    fn whole_seconds_keep_three_fractional_digits() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format(t), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn parse_accepts_offsets_and_returns_utc() {
        let t = parse("2024-01-01T02:00:00.250+02:00").unwrap();
        assert_eq!(format(t), "2024-01-01T00:00:00.250Z");
        assert_eq!(t.nanosecond(), 250_000_000);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("yesterday").is_err());
    }
}
