//! Single-slot session cache.
//!
//! The slot holds the last reconciled result and is reusable for exactly one
//! resolved trading date. Freshness is decided by date equality, not by a
//! wall-clock TTL: the resolved date stays constant across local midnight
//! until the next publish cutoff.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CacheError;
use crate::{ReconciledSnapshot, TradingDate, UtcTimestamp};

/// How an acquisition cycle uses the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Serve a valid entry; otherwise fetch and store the result.
    #[default]
    Use,
    /// Always fetch, then store the result.
    Refresh,
    /// Always fetch and leave the slot untouched.
    Bypass,
}

impl CacheMode {
    pub const fn reads(self) -> bool {
        matches!(self, Self::Use)
    }

    pub const fn writes(self) -> bool {
        matches!(self, Self::Use | Self::Refresh)
    }
}

/// Reconciled result of one successful acquisition cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub records: Vec<ReconciledSnapshot>,
    /// Resolver answer the entry was built for; the cache key.
    pub resolved_date: TradingDate,
    /// Session the prior values were taken from.
    pub resolved_prior_date: TradingDate,
    /// Session the records were actually taken from after fallback.
    pub session_date: TradingDate,
    pub is_stale_for_today: bool,
    pub timestamp: UtcTimestamp,
}

impl CacheEntry {
    pub fn is_valid_for(&self, resolved_date: TradingDate) -> bool {
        is_valid(self, resolved_date)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Human-facing note on which session the data belongs to.
    pub fn advisory(&self) -> String {
        if self.is_stale_for_today {
            format!(
                "證交所今日資料尚未發布，此為 {} 的資料",
                self.session_date.iso()
            )
        } else {
            format!("取得 {} 的最新資料", self.session_date.iso())
        }
    }
}

/// An entry is reusable iff it was built for the currently resolved date.
pub fn is_valid(entry: &CacheEntry, resolved_date: TradingDate) -> bool {
    entry.resolved_date == resolved_date
}

/// Storage for the single cache slot.
pub trait SessionCache: Send + Sync {
    fn read<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<CacheEntry>, CacheError>> + Send + 'a>>;

    /// Replace the slot wholesale.
    fn write<'a>(
        &'a self,
        entry: CacheEntry,
    ) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + 'a>>;

    fn clear<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + 'a>>;
}

/// Process-local slot.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionCache {
    slot: Arc<tokio::sync::RwLock<Option<CacheEntry>>>,
}

impl InMemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionCache for InMemorySessionCache {
    fn read<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<CacheEntry>, CacheError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.slot.read().await.clone()) })
    }

    fn write<'a>(
        &'a self,
        entry: CacheEntry,
    ) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + 'a>> {
        Box::pin(async move {
            *self.slot.write().await = Some(entry);
            Ok(())
        })
    }

    fn clear<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + 'a>> {
        Box::pin(async move {
            *self.slot.write().await = None;
            Ok(())
        })
    }
}

/// Slot persisted as one JSON document, surviving process restarts.
#[derive(Debug, Clone)]
pub struct FileSessionCache {
    path: PathBuf,
}

impl FileSessionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Stage `payload` in a uniquely named sibling file, then rename it over
/// `path`. Each writer owns its staging file; the last rename wins.
fn persist_atomically(path: &Path, payload: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(payload)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|error| error.error)?;
    Ok(())
}

impl SessionCache for FileSessionCache {
    fn read<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<CacheEntry>, CacheError>> + Send + 'a>> {
        Box::pin(async move {
            let bytes = match tokio::fs::read(&self.path).await {
                Ok(bytes) => bytes,
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(error) => return Err(error.into()),
            };
            let entry = serde_json::from_slice(&bytes)?;
            Ok(Some(entry))
        })
    }

    fn write<'a>(
        &'a self,
        entry: CacheEntry,
    ) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + 'a>> {
        Box::pin(async move {
            let payload = serde_json::to_vec(&entry)?;
            let path = self.path.clone();
            tokio::task::spawn_blocking(move || persist_atomically(&path, &payload))
                .await
                .map_err(std::io::Error::other)??;
            debug!(path = %self.path.display(), records = entry.records.len(), "session cache persisted");
            Ok(())
        })
    }

    fn clear<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<(), CacheError>> + Send + 'a>> {
        Box::pin(async move {
            match tokio::fs::remove_file(&self.path).await {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(error) => Err(error.into()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SecurityCode, SecuritySnapshot};

    fn entry(resolved: &str) -> CacheEntry {
        let date = TradingDate::parse(resolved).expect("valid date");
        CacheEntry {
            records: vec![ReconciledSnapshot {
                snapshot: SecuritySnapshot {
                    date,
                    symbol: SecurityCode::parse("2330").expect("valid code"),
                    name: String::from("台積電"),
                    close_price: String::from("600.00"),
                    trade_count: String::from("123456"),
                },
                prev_close: Some(String::from("590.00")),
                prev_trade_count: None,
            }],
            resolved_date: date,
            resolved_prior_date: date.previous_weekday().expect("in range"),
            session_date: date,
            is_stale_for_today: false,
            timestamp: UtcTimestamp::parse("2024-01-05T08:00:00Z").expect("valid"),
        }
    }

    #[test]
    fn validity_is_resolved_date_equality() {
        let cached = entry("20240105");
        assert!(is_valid(&cached, TradingDate::parse("20240105").expect("valid")));
        assert!(!cached.is_valid_for(TradingDate::parse("20240108").expect("valid")));
    }

    #[test]
    fn cache_mode_flags() {
        assert_eq!(CacheMode::default(), CacheMode::Use);
        assert!(CacheMode::Use.reads() && CacheMode::Use.writes());
        assert!(!CacheMode::Refresh.reads() && CacheMode::Refresh.writes());
        assert!(!CacheMode::Bypass.reads() && !CacheMode::Bypass.writes());
    }

    #[test]
    fn advisory_mentions_session_date() {
        let mut cached = entry("20240105");
        assert!(cached.advisory().contains("2024-01-05"));
        assert!(cached.advisory().starts_with("取得"));

        cached.is_stale_for_today = true;
        assert!(cached.advisory().contains("尚未發布"));
    }

    #[tokio::test]
    async fn in_memory_slot_round_trips_and_overwrites() {
        let cache = InMemorySessionCache::new();
        assert!(cache.read().await.expect("read").is_none());

        cache.write(entry("20240104")).await.expect("write");
        cache.write(entry("20240105")).await.expect("write");

        let stored = cache.read().await.expect("read").expect("entry present");
        assert_eq!(stored.resolved_date.compact(), "20240105");

        cache.clear().await.expect("clear");
        assert!(cache.read().await.expect("read").is_none());
    }

    #[tokio::test]
    async fn file_slot_persists_between_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("session.json");

        FileSessionCache::new(&path)
            .write(entry("20240105"))
            .await
            .expect("write");

        let reopened = FileSessionCache::new(&path);
        let stored = reopened.read().await.expect("read").expect("entry present");
        assert_eq!(stored, entry("20240105"));
        let leftovers = std::fs::read_dir(path.parent().expect("parent"))
            .expect("list dir")
            .count();
        assert_eq!(leftovers, 1, "only the slot file remains");

        reopened.clear().await.expect("clear");
        assert!(reopened.read().await.expect("read").is_none());
        reopened.clear().await.expect("clearing twice is fine");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_file_writes_all_succeed_and_last_one_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");

        for _ in 0..50 {
            let writers: Vec<_> = ["20240104", "20240105"]
                .into_iter()
                .map(|resolved| {
                    let cache = FileSessionCache::new(&path);
                    tokio::spawn(async move { cache.write(entry(resolved)).await })
                })
                .collect();

            for writer in writers {
                writer.await.expect("join").expect("concurrent write");
            }

            let stored = FileSessionCache::new(&path)
                .read()
                .await
                .expect("read")
                .expect("entry present");
            assert!(stored == entry("20240104") || stored == entry("20240105"));
        }

        let leftovers = std::fs::read_dir(dir.path()).expect("list dir").count();
        assert_eq!(leftovers, 1, "no staging files left behind");
    }

    #[tokio::test]
    async fn corrupt_file_slot_is_a_serialization_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").expect("write fixture");

        let err = FileSessionCache::new(&path).read().await.expect_err("must fail");
        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
