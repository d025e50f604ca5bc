//! Bounded backward date-stepping for unpublished sessions.
//!
//! A requested date can legitimately have no data: an unannounced holiday, a
//! market suspension, or a weekend that the resolver let through. The walk
//! retries on the previous weekday until a non-empty session appears or the
//! attempt budget is spent. Transport failures end the walk immediately.

use tracing::{debug, info, warn};

use crate::config::DEFAULT_MAX_ATTEMPTS;
use crate::error::AcquireError;
use crate::feed::SessionFetcher;
use crate::{SessionRecords, TradingDate};

/// Attempt budget for one fallback walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// Total attempts, including the requested date itself.
    pub max_attempts: u32,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl FallbackPolicy {
    pub const fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Dates to try, starting with `start` itself.
    pub fn candidates(self, start: TradingDate) -> CandidateDates {
        CandidateDates {
            next: Some(start),
            remaining: self.max_attempts,
        }
    }
}

/// Lazy, finite sequence of candidate dates: `start`, then each previous
/// weekday. Cloning restarts from the clone point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDates {
    next: Option<TradingDate>,
    remaining: u32,
}

impl Iterator for CandidateDates {
    type Item = TradingDate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = current.previous_weekday();
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let upper = if self.next.is_some() {
            self.remaining as usize
        } else {
            0
        };
        (0, Some(upper))
    }
}

/// First non-empty session found by a fallback walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackOutcome {
    /// Date the session was actually found on; may precede the requested one.
    pub date: TradingDate,
    pub records: SessionRecords,
    pub attempts: u32,
    pub dropped_rows: usize,
}

/// Fetch `start`, stepping back one weekday per empty session.
///
/// # Errors
///
/// - [`AcquireError::FetchTransport`] as soon as any request fails.
/// - [`AcquireError::NoDataInRange`] when every candidate was empty.
pub async fn fetch_with_fallback(
    fetcher: &dyn SessionFetcher,
    start: TradingDate,
    policy: FallbackPolicy,
) -> Result<FallbackOutcome, AcquireError> {
    let mut attempts = 0;
    let mut last = start;

    for date in policy.candidates(start) {
        attempts += 1;
        last = date;

        let parsed = fetcher.fetch_session(date).await?;
        if !parsed.records.is_empty() {
            if date != start {
                info!(requested = %start, actual = %date, attempts, "fell back to earlier session");
            }
            return Ok(FallbackOutcome {
                date,
                records: parsed.records,
                attempts,
                dropped_rows: parsed.dropped_rows,
            });
        }

        debug!(%date, attempt = attempts, "no published session, stepping back");
    }

    warn!(%start, %last, attempts, "fallback exhausted without a published session");
    Err(AcquireError::NoDataInRange {
        start,
        last,
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use super::*;
    use crate::feed::ParsedFeed;
    use crate::{FeedRecord, SecurityCode};

    fn date(value: &str) -> TradingDate {
        TradingDate::parse(value).expect("valid date")
    }

    /// Publishes sessions only on the listed dates and logs every request.
    struct FakeFetcher {
        published: Vec<TradingDate>,
        fail_on: Option<TradingDate>,
        requested: Mutex<Vec<TradingDate>>,
    }

    impl FakeFetcher {
        fn publishing(dates: &[&str]) -> Self {
            Self {
                published: dates.iter().map(|value| date(value)).collect(),
                fail_on: None,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested
                .lock()
                .unwrap()
                .iter()
                .map(|d| d.compact())
                .collect()
        }
    }

    impl SessionFetcher for FakeFetcher {
        fn fetch_session<'a>(
            &'a self,
            date: TradingDate,
        ) -> Pin<Box<dyn Future<Output = Result<ParsedFeed, AcquireError>> + Send + 'a>> {
            Box::pin(async move {
                self.requested.lock().unwrap().push(date);
                if self.fail_on == Some(date) {
                    return Err(AcquireError::FetchTransport {
                        date,
                        message: String::from("connection reset"),
                        retryable: true,
                    });
                }

                let mut parsed = ParsedFeed::default();
                if self.published.contains(&date) {
                    parsed.records.insert(FeedRecord {
                        symbol: SecurityCode::parse("2330").unwrap(),
                        name: String::from("TSMC"),
                        close_price: String::from("590.00"),
                        trade_count: String::from("1"),
                    });
                }
                Ok(parsed)
            })
        }
    }

    #[test]
    fn candidates_start_at_requested_date_and_skip_weekends() {
        let dates: Vec<String> = FallbackPolicy::new(4)
            .candidates(date("20240108"))
            .map(TradingDate::compact)
            .collect();
        assert_eq!(dates, vec!["20240108", "20240105", "20240104", "20240103"]);
    }

    #[test]
    fn candidates_are_bounded_and_restartable() {
        let candidates = FallbackPolicy::default().candidates(date("20240110"));
        assert_eq!(candidates.clone().count(), 10);
        assert_eq!(candidates.size_hint(), (0, Some(10)));

        let first_pass: Vec<TradingDate> = candidates.clone().collect();
        let second_pass: Vec<TradingDate> = candidates.collect();
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn candidates_from_weekend_start_include_the_weekend_day_once() {
        let dates: Vec<String> = FallbackPolicy::new(3)
            .candidates(date("20240106"))
            .map(TradingDate::compact)
            .collect();
        assert_eq!(dates, vec!["20240106", "20240105", "20240104"]);
    }

    #[tokio::test]
    async fn returns_first_date_with_records() {
        let fetcher = FakeFetcher::publishing(&["20240104"]);

        let outcome = fetch_with_fallback(&fetcher, date("20240108"), FallbackPolicy::default())
            .await
            .expect("session found");

        assert_eq!(outcome.date.compact(), "20240104");
        assert_eq!(outcome.attempts, 3);
        assert_eq!(fetcher.requested(), vec!["20240108", "20240105", "20240104"]);
    }

    #[tokio::test]
    async fn succeeds_on_final_permitted_attempt() {
        // Tenth weekday at or before Wednesday 2024-01-10 is Thursday 2023-12-28.
        let fetcher = FakeFetcher::publishing(&["20231228"]);

        let outcome = fetch_with_fallback(&fetcher, date("20240110"), FallbackPolicy::default())
            .await
            .expect("session found on the last attempt");

        assert_eq!(outcome.attempts, 10);
        assert_eq!(outcome.date.compact(), "20231228");
    }

    #[tokio::test]
    async fn exhausting_the_bound_is_no_data_in_range() {
        let fetcher = FakeFetcher::publishing(&["20231227"]);

        let err = fetch_with_fallback(&fetcher, date("20240110"), FallbackPolicy::default())
            .await
            .expect_err("budget exhausted");

        match err {
            AcquireError::NoDataInRange {
                start,
                last,
                attempts,
            } => {
                assert_eq!(start.compact(), "20240110");
                assert_eq!(last.compact(), "20231228");
                assert_eq!(attempts, 10);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fetcher.requested().len(), 10);
    }

    #[tokio::test]
    async fn transport_failure_is_not_date_stepped() {
        let mut fetcher = FakeFetcher::publishing(&["20240104"]);
        fetcher.fail_on = Some(date("20240105"));

        let err = fetch_with_fallback(&fetcher, date("20240108"), FallbackPolicy::default())
            .await
            .expect_err("transport failure propagates");

        assert_eq!(err.code(), "acquire.fetch_transport");
        assert_eq!(fetcher.requested(), vec!["20240108", "20240105"]);
    }
}
