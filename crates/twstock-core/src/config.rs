//! Runtime configuration for feed acquisition.
//!
//! Defaults target the Taiwan Stock Exchange `MI_INDEX` report. Every value
//! can be overridden from the environment:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `TWSTOCK_BASE_URL` | [`DEFAULT_BASE_URL`] |
//! | `TWSTOCK_FEED_TYPE` | [`DEFAULT_FEED_TYPE`] |
//! | `TWSTOCK_UTC_OFFSET_HOURS` | `8` |
//! | `TWSTOCK_CUTOFF_HOUR` | `14` |
//! | `TWSTOCK_MAX_ATTEMPTS` | `10` |
//! | `TWSTOCK_TIMEOUT_MS` | `10000` |
//!
//! Recommendation thresholds live in [`crate::recommend::RecommendationFilter`]
//! and read `TWSTOCK_MIN_PRICE_CHANGE_PCT` and
//! `TWSTOCK_MIN_TRADE_COUNT_CHANGE_PCT`.

use std::env;

use time::UtcOffset;

use crate::ValidationError;

pub const DEFAULT_BASE_URL: &str = "https://www.twse.com.tw/exchangeReport/MI_INDEX";
pub const DEFAULT_FEED_TYPE: &str = "ALLBUT0999";
pub const DEFAULT_UTC_OFFSET_HOURS: i8 = 8;
/// Local hour from which the exchange has published the day's session.
pub const DEFAULT_CUTOFF_HOUR: u8 = 14;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Feed endpoint and trading calendar settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub base_url: String,
    pub feed_type: String,
    pub utc_offset_hours: i8,
    pub cutoff_hour: u8,
    /// Total fetch attempts per fallback walk, including the first.
    pub max_attempts: u32,
    pub timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            feed_type: String::from(DEFAULT_FEED_TYPE),
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            cutoff_hour: DEFAULT_CUTOFF_HOUR,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl FeedConfig {
    /// Load configuration from `TWSTOCK_*` variables, falling back to defaults
    /// for unset or unparsable values.
    pub fn from_env() -> Result<Self, ValidationError> {
        let defaults = Self::default();
        let config = Self {
            base_url: env::var("TWSTOCK_BASE_URL").unwrap_or(defaults.base_url),
            feed_type: env::var("TWSTOCK_FEED_TYPE").unwrap_or(defaults.feed_type),
            utc_offset_hours: parse_env("TWSTOCK_UTC_OFFSET_HOURS")
                .unwrap_or(defaults.utc_offset_hours),
            cutoff_hour: parse_env("TWSTOCK_CUTOFF_HOUR").unwrap_or(defaults.cutoff_hour),
            max_attempts: parse_env("TWSTOCK_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts),
            timeout_ms: parse_env("TWSTOCK_TIMEOUT_MS").unwrap_or(defaults.timeout_ms),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_cutoff_hour(mut self, cutoff_hour: u8) -> Self {
        self.cutoff_hour = cutoff_hour;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::EmptyBaseUrl);
        }
        if self.feed_type.trim().is_empty() {
            return Err(ValidationError::EmptyFeedType);
        }
        if self.cutoff_hour > 23 {
            return Err(ValidationError::InvalidCutoffHour {
                value: self.cutoff_hour,
            });
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::ZeroFallbackAttempts);
        }
        self.exchange_offset()?;
        Ok(())
    }

    pub fn exchange_offset(&self) -> Result<UtcOffset, ValidationError> {
        UtcOffset::from_hms(self.utc_offset_hours, 0, 0).map_err(|_| {
            ValidationError::InvalidUtcOffset {
                value: self.utc_offset_hours,
            }
        })
    }
}

pub(crate) fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = FeedConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cutoff_hour, 14);
        assert_eq!(config.max_attempts, 10);
        assert_eq!(
            config.exchange_offset().expect("valid"),
            UtcOffset::from_hms(8, 0, 0).expect("valid")
        );
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = FeedConfig::default()
            .with_cutoff_hour(24)
            .validate()
            .expect_err("must fail");
        assert_eq!(err, ValidationError::InvalidCutoffHour { value: 24 });

        let err = FeedConfig::default()
            .with_max_attempts(0)
            .validate()
            .expect_err("must fail");
        assert_eq!(err, ValidationError::ZeroFallbackAttempts);

        let config = FeedConfig {
            utc_offset_hours: 30,
            ..FeedConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidUtcOffset { value: 30 })
        ));
    }

    #[test]
    fn rejects_blank_endpoint() {
        let err = FeedConfig::default()
            .with_base_url("  ")
            .validate()
            .expect_err("must fail");
        assert_eq!(err, ValidationError::EmptyBaseUrl);
    }
}
