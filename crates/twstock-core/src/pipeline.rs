//! End-to-end acquisition: resolve, consult the cache, fetch both sessions,
//! reconcile and store.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheMode, SessionCache};
use crate::calendar::{previous_weekday, Clock, ResolvedDates, SystemClock, TradingDayResolver};
use crate::config::FeedConfig;
use crate::error::{AcquireError, ValidationError};
use crate::fallback::{fetch_with_fallback, FallbackPolicy};
use crate::feed::{FeedClient, SessionFetcher};
use crate::reconcile::merge;

/// Result of one acquisition cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquisition {
    pub entry: CacheEntry,
    pub resolved: ResolvedDates,
    pub cache_hit: bool,
    /// Outbound requests made by this cycle; zero on a cache hit.
    pub attempts: u32,
    pub dropped_rows: usize,
}

/// Reconciled daily closing data for the whole market.
#[derive(Clone)]
pub struct StockFeed {
    fetcher: Arc<dyn SessionFetcher>,
    cache: Arc<dyn SessionCache>,
    clock: Arc<dyn Clock>,
    resolver: TradingDayResolver,
    policy: FallbackPolicy,
}

impl StockFeed {
    pub fn new(
        fetcher: Arc<dyn SessionFetcher>,
        cache: Arc<dyn SessionCache>,
        clock: Arc<dyn Clock>,
        resolver: TradingDayResolver,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            fetcher,
            cache,
            clock,
            resolver,
            policy,
        }
    }

    /// Live feed over HTTP with the system clock.
    pub fn from_config(
        config: &FeedConfig,
        cache: Arc<dyn SessionCache>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self::new(
            Arc::new(FeedClient::from_config(config)),
            cache,
            Arc::new(SystemClock),
            TradingDayResolver::from_config(config)?,
            FallbackPolicy::new(config.max_attempts),
        ))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn resolver(&self) -> &TradingDayResolver {
        &self.resolver
    }

    pub fn resolve(&self) -> Result<ResolvedDates, ValidationError> {
        self.resolver.resolve(self.clock.now())
    }

    /// Current reconciled snapshots, served from the cache when it already
    /// holds the resolved session.
    pub async fn fetch_stocks(&self) -> Result<CacheEntry, AcquireError> {
        Ok(self.acquire(CacheMode::Use).await?.entry)
    }

    pub async fn acquire(&self, mode: CacheMode) -> Result<Acquisition, AcquireError> {
        let resolved = self.resolve()?;
        debug!(
            current = %resolved.current,
            prior = %resolved.prior,
            before_cutoff = resolved.before_cutoff,
            "resolved trading dates"
        );

        if mode.reads() {
            if let Some(entry) = self.cached_for(&resolved).await {
                info!(resolved = %resolved.current, records = entry.len(), "session cache hit");
                return Ok(Acquisition {
                    entry,
                    resolved,
                    cache_hit: true,
                    attempts: 0,
                    dropped_rows: 0,
                });
            }
        }

        let today = fetch_with_fallback(self.fetcher.as_ref(), resolved.current, self.policy).await?;
        let prior_start = previous_weekday(today.date)?;
        let prior = fetch_with_fallback(self.fetcher.as_ref(), prior_start, self.policy).await?;

        let entry = CacheEntry {
            records: merge(&today.records, &prior.records, today.date),
            resolved_date: resolved.current,
            resolved_prior_date: prior.date,
            session_date: today.date,
            is_stale_for_today: today.date != resolved.local_today,
            timestamp: self.clock.now(),
        };
        info!(
            session = %entry.session_date,
            prior = %entry.resolved_prior_date,
            records = entry.len(),
            stale = entry.is_stale_for_today,
            "reconciled sessions"
        );

        if mode.writes() {
            self.cache.write(entry.clone()).await?;
            debug!(resolved = %entry.resolved_date, "session cache updated");
        }

        Ok(Acquisition {
            entry,
            resolved,
            cache_hit: false,
            attempts: today.attempts + prior.attempts,
            dropped_rows: today.dropped_rows + prior.dropped_rows,
        })
    }

    async fn cached_for(&self, resolved: &ResolvedDates) -> Option<CacheEntry> {
        match self.cache.read().await {
            Ok(Some(entry)) if entry.is_valid_for(resolved.current) => Some(entry),
            Ok(Some(entry)) => {
                debug!(
                    cached = %entry.resolved_date,
                    resolved = %resolved.current,
                    "session cache outdated"
                );
                None
            }
            Ok(None) => {
                debug!("session cache empty");
                None
            }
            Err(error) => {
                warn!(%error, "session cache unreadable, refetching");
                None
            }
        }
    }
}
