use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, Month, Weekday};

use crate::ValidationError;

/// Calendar date in the exchange's local time zone, rendered as `YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradingDate(Date);

impl TradingDate {
    pub const fn from_date(date: Date) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u8, day: u8) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidTradingDate {
            value: format!("{year:04}{month:02}{day:02}"),
        };
        let month = Month::try_from(month).map_err(|_| invalid())?;
        Date::from_calendar_date(year, month, day)
            .map(Self)
            .map_err(|_| invalid())
    }

    /// Parse the compact `YYYYMMDD` form used by the exchange feed.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let invalid = || ValidationError::InvalidTradingDate {
            value: input.to_owned(),
        };

        if trimmed.len() != 8 || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(invalid());
        }

        let year = trimmed[0..4].parse::<i32>().map_err(|_| invalid())?;
        let month = trimmed[4..6].parse::<u8>().map_err(|_| invalid())?;
        let day = trimmed[6..8].parse::<u8>().map_err(|_| invalid())?;

        Self::from_ymd(year, month, day).map_err(|_| invalid())
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }

    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    pub fn is_weekend(self) -> bool {
        matches!(self.weekday(), Weekday::Saturday | Weekday::Sunday)
    }

    /// Nearest calendar day strictly before `self` that is not a Saturday or Sunday.
    ///
    /// Returns `None` only at the lower bound of the supported date range.
    pub fn previous_weekday(self) -> Option<Self> {
        let mut candidate = self.0.previous_day()?;
        while matches!(candidate.weekday(), Weekday::Saturday | Weekday::Sunday) {
            candidate = candidate.previous_day()?;
        }
        Some(Self(candidate))
    }

    /// `YYYYMMDD`, the form the feed endpoint expects.
    pub fn compact(self) -> String {
        format!(
            "{:04}{:02}{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }

    /// `YYYY-MM-DD`, used in human-facing messages.
    pub fn iso(self) -> String {
        format!(
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl Display for TradingDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.compact())
    }
}

impl From<Date> for TradingDate {
    fn from(value: Date) -> Self {
        Self(value)
    }
}

impl Serialize for TradingDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.compact())
    }
}

impl<'de> Deserialize<'de> for TradingDate {
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
    fn parses_and_renders_compact_form() {
        let parsed = TradingDate::parse("20240105").expect("must parse");
        assert_eq!(parsed.compact(), "20240105");
        assert_eq!(parsed.iso(), "2024-01-05");
        assert_eq!(parsed.weekday(), Weekday::Friday);
    }

    #[test]
    fn rejects_malformed_dates() {
        for value in ["2024015", "2024-01-05", "20241301", "20240230", "abcdefgh"] {
            let err = TradingDate::parse(value).expect_err("must fail");
            assert!(matches!(err, ValidationError::InvalidTradingDate { .. }));
        }
    }

    #[test]
    fn previous_weekday_skips_saturday_and_sunday() {
        let monday = TradingDate::parse("20240108").expect("valid");
        let previous = monday.previous_weekday().expect("in range");
        assert_eq!(previous.compact(), "20240105");

        let sunday = TradingDate::parse("20240107").expect("valid");
        assert_eq!(sunday.previous_weekday().expect("in range").compact(), "20240105");

        let wednesday = TradingDate::parse("20240110").expect("valid");
        assert_eq!(wednesday.previous_weekday().expect("in range").compact(), "20240109");
    }

    #[test]
    fn serializes_as_compact_string() {
        let date = TradingDate::parse("20231229").expect("valid");
        let json = serde_json::to_string(&date).expect("serializes");
        assert_eq!(json, "\"20231229\"");

        let back: TradingDate = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, date);
    }
}
