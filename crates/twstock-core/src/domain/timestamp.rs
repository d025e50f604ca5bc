use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::ValidationError;

/// Instant normalized to UTC, serialized as RFC3339 with a `Z` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcTimestamp(OffsetDateTime);

impl UtcTimestamp {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Accepts any RFC3339 offset and normalizes it to UTC.
    pub fn from_offset_datetime(value: OffsetDateTime) -> Self {
        Self(value.to_offset(UtcOffset::UTC))
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::parse(input, &Rfc3339).map_err(|_| {
            ValidationError::TimestampNotUtc {
                value: input.to_owned(),
            }
        })?;

        if parsed.offset() != UtcOffset::UTC {
            return Err(ValidationError::TimestampNotUtc {
                value: input.to_owned(),
            });
        }

        Ok(Self(parsed))
    }

    pub const fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    /// The same instant viewed from another offset (e.g. the exchange's).
    pub fn in_offset(self, offset: UtcOffset) -> OffsetDateTime {
        self.0.to_offset(offset)
    }

    pub fn format_rfc3339(self) -> String {
        // RFC3339 only fails for years outside 0..=9999, which `now()` cannot produce.
        self.0
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.0.unix_timestamp().to_string())
    }
}

impl Display for UtcTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utc_timestamp() {
        let parsed = UtcTimestamp::parse("2024-01-05T06:30:00Z").expect("must parse");
        assert_eq!(parsed.format_rfc3339(), "2024-01-05T06:30:00Z");
    }

    #[test]
    fn rejects_non_utc_timestamp() {
        let err = UtcTimestamp::parse("2024-01-05T14:30:00+08:00").expect_err("must fail");
        assert!(matches!(err, ValidationError::TimestampNotUtc { .. }));
    }

    #[test]
    fn shifts_into_exchange_offset() {
        let parsed = UtcTimestamp::parse("2024-01-05T20:00:00Z").expect("must parse");
        let offset = UtcOffset::from_hms(8, 0, 0).expect("valid offset");
        let local = parsed.in_offset(offset);
        assert_eq!(local.hour(), 4);
        assert_eq!(local.day(), 6);
    }
}
