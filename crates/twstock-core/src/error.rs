use thiserror::Error;

use crate::domain::TradingDate;

/// Validation and contract errors exposed by `twstock-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("security code cannot be empty")]
    EmptySecurityCode,
    #[error("security code length {len} must be between {min} and {max} digits")]
    SecurityCodeLength { len: usize, min: usize, max: usize },
    #[error("security code contains non-digit character '{ch}' at index {index}")]
    SecurityCodeInvalidChar { ch: char, index: usize },

    #[error("trading date must be YYYYMMDD: '{value}'")]
    InvalidTradingDate { value: String },
    #[error("no weekday exists before {value}")]
    DateOutOfRange { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("publish cutoff hour must be within 0..=23, got {value}")]
    InvalidCutoffHour { value: u8 },
    #[error("exchange utc offset of {value} hours is out of range")]
    InvalidUtcOffset { value: i8 },
    #[error("fallback attempts must be greater than zero")]
    ZeroFallbackAttempts,
    #[error("feed base url cannot be empty")]
    EmptyBaseUrl,
    #[error("feed type cannot be empty")]
    EmptyFeedType,

    #[error("feed schema column '{column}' at offset {offset} exceeds minimum row width {min_width}")]
    SchemaColumnOutOfRange {
        column: &'static str,
        offset: usize,
        min_width: usize,
    },

    #[error("threshold '{field}' must be finite")]
    NonFiniteThreshold { field: &'static str },

    #[error("request_id must contain at least 8 characters")]
    InvalidRequestId,
    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Failure of one acquisition cycle.
///
/// Only transport failures and fallback exhaustion are terminal; empty
/// sessions are consumed by the fallback loop and never reach callers.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("feed transport failed for {date}: {message}")]
    FetchTransport {
        date: TradingDate,
        message: String,
        retryable: bool,
    },

    #[error("no published session found in {attempts} attempts from {start} back to {last}")]
    NoDataInRange {
        start: TradingDate,
        last: TradingDate,
        attempts: u32,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AcquireError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::FetchTransport { .. } => "acquire.fetch_transport",
            Self::NoDataInRange { .. } => "acquire.no_data_in_range",
            Self::Cache(_) => "acquire.cache",
            Self::Validation(_) => "acquire.validation",
        }
    }

    pub const fn retryable(&self) -> bool {
        match self {
            Self::FetchTransport { retryable, .. } => *retryable,
            Self::NoDataInRange { .. } | Self::Cache(_) | Self::Validation(_) => false,
        }
    }
}

/// Session cache storage errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
