//! Trading-day resolution.
//!
//! Maps a wall-clock instant to the session the exchange should have
//! published most recently. Only weekends are known here; unannounced
//! holidays are absorbed by the fetch fallback in [`crate::fallback`].

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use time::{Duration, UtcOffset};

use crate::config::FeedConfig;
use crate::{TradingDate, UtcTimestamp, ValidationError};

/// Source of the current instant, injectable for deterministic tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> UtcTimestamp;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UtcTimestamp {
        UtcTimestamp::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<UtcTimestamp>,
}

impl ManualClock {
    pub fn new(now: UtcTimestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: UtcTimestamp) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = UtcTimestamp::from_offset_datetime(guard.into_inner() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UtcTimestamp {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Outcome of one resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedDates {
    /// Session expected to be published most recently.
    pub current: TradingDate,
    /// Nearest weekday before `current`.
    pub prior: TradingDate,
    /// Calendar date at the exchange when resolution ran.
    pub local_today: TradingDate,
    pub local_hour: u8,
    pub local_minute: u8,
    /// `true` when today's session had not been published yet.
    pub before_cutoff: bool,
}

/// Resolves `(current, prior)` trading dates for an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingDayResolver {
    offset: UtcOffset,
    cutoff_hour: u8,
}

impl TradingDayResolver {
    pub fn new(offset: UtcOffset, cutoff_hour: u8) -> Result<Self, ValidationError> {
        if cutoff_hour > 23 {
            return Err(ValidationError::InvalidCutoffHour { value: cutoff_hour });
        }
        Ok(Self {
            offset,
            cutoff_hour,
        })
    }

    pub fn from_config(config: &FeedConfig) -> Result<Self, ValidationError> {
        Self::new(config.exchange_offset()?, config.cutoff_hour)
    }

    pub const fn offset(&self) -> UtcOffset {
        self.offset
    }

    pub const fn cutoff_hour(&self) -> u8 {
        self.cutoff_hour
    }

    /// Before the cutoff the current session is the last weekday before
    /// today; from the cutoff on it is today, weekend or not.
    pub fn resolve(&self, now: UtcTimestamp) -> Result<ResolvedDates, ValidationError> {
        let local = now.in_offset(self.offset);
        let local_today = TradingDate::from_date(local.date());
        let before_cutoff = local.hour() < self.cutoff_hour;

        let current = if before_cutoff {
            previous_weekday(local_today)?
        } else {
            local_today
        };
        let prior = previous_weekday(current)?;

        Ok(ResolvedDates {
            current,
            prior,
            local_today,
            local_hour: local.hour(),
            local_minute: local.minute(),
            before_cutoff,
        })
    }
}

pub(crate) fn previous_weekday(date: TradingDate) -> Result<TradingDate, ValidationError> {
    date.previous_weekday()
        .ok_or_else(|| ValidationError::DateOutOfRange {
            value: date.compact(),
        })
}
