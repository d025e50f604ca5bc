//! # twstock Core
//!
//! Acquisition and reconciliation of the Taiwan Stock Exchange daily closing
//! report.
//!
//! ## Overview
//!
//! The exchange publishes one semi-structured, Big5-encoded CSV report per
//! trading session. This crate turns "now" into the session that should be
//! available, fetches it (stepping back over unannounced holidays), parses
//! it, pairs every security with its previous-session values and caches the
//! result for the rest of that trading day.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Single-slot session cache (in-memory and JSON file) |
//! | [`calendar`] | Clock abstraction and trading-day resolution |
//! | [`config`] | Feed configuration with environment overrides |
//! | [`domain`] | Domain models (TradingDate, SecurityCode, snapshots) |
//! | [`envelope`] | Response envelope with metadata |
//! | [`error`] | Core error types |
//! | [`fallback`] | Bounded backward date-stepping |
//! | [`feed`] | Feed client, schema and parser |
//! | [`http_client`] | HTTP client abstraction |
//! | [`pipeline`] | End-to-end acquisition ([`StockFeed`]) |
//! | [`recommend`] | Threshold screening and reply formatting |
//! | [`reconcile`] | Pairing a session with the previous one |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use twstock_core::{FeedConfig, InMemorySessionCache, StockFeed};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let feed = StockFeed::from_config(
//!         &FeedConfig::from_env()?,
//!         Arc::new(InMemorySessionCache::new()),
//!     )?;
//!
//!     let entry = feed.fetch_stocks().await?;
//!     println!("{} securities for {}", entry.len(), entry.session_date);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────────────┐
//! │ Clock        │──▶│ Resolver    │──▶│ SessionCache (hit?)  │
//! └──────────────┘   └─────────────┘   └──────────┬───────────┘
//!                                                  │ miss
//!                    ┌─────────────────────────────▼───────────┐
//!                    │ fetch_with_fallback(today)              │
//!                    │ fetch_with_fallback(prior of actual day)│
//!                    │   └─ FeedClient ─▶ HttpClient           │
//!                    │   └─ FeedParser (Big5, FeedSchema)      │
//!                    └─────────────────────────────┬───────────┘
//!                                                  ▼
//!                    ┌─────────────┐   ┌──────────────────────┐
//!                    │ merge       │──▶│ SessionCache write   │
//!                    └─────────────┘   └──────────────────────┘
//! ```

pub mod cache;
pub mod calendar;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod fallback;
pub mod feed;
pub mod http_client;
pub mod pipeline;
pub mod recommend;
pub mod reconcile;

pub use cache::{CacheEntry, CacheMode, FileSessionCache, InMemorySessionCache, SessionCache};
pub use calendar::{Clock, ManualClock, ResolvedDates, SystemClock, TradingDayResolver};
pub use config::FeedConfig;
pub use domain::{
    FeedRecord, ReconciledSnapshot, SecurityCode, SecuritySnapshot, SessionRecords, TradingDate,
    UtcTimestamp,
};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};
pub use error::{AcquireError, CacheError, ValidationError};
pub use fallback::{fetch_with_fallback, CandidateDates, FallbackOutcome, FallbackPolicy};
pub use feed::{FeedClient, FeedParser, FeedSchema, ParsedFeed, SessionFetcher};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
    ScriptedHttpClient,
};
pub use pipeline::{Acquisition, StockFeed};
pub use recommend::{
    format_reply, is_recommendation_request, percent_change, recommend_reply, Recommendation,
    RecommendationFilter, RecommendationReply,
};
pub use reconcile::merge;
