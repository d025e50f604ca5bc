//! # Domain Models
//!
//! Canonical domain types for exchange session data.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SecurityCode`] | Validated 4–6 digit security identifier |
//! | [`TradingDate`] | Exchange-local calendar date (`YYYYMMDD`) |
//! | [`UtcTimestamp`] | RFC3339 UTC instant |
//! | [`FeedRecord`] | One security row of a published session |
//! | [`SessionRecords`] | Ordered, symbol-keyed rows of one session |
//! | [`SecuritySnapshot`] | Security values for one trading date |
//! | [`ReconciledSnapshot`] | Snapshot plus prior-session values |

mod models;
mod security_code;
mod timestamp;
mod trading_date;

pub use models::{FeedRecord, ReconciledSnapshot, SecuritySnapshot, SessionRecords};
pub use security_code::{SecurityCode, MAX_CODE_LEN, MIN_CODE_LEN};
pub use timestamp::UtcTimestamp;
pub use trading_date::TradingDate;
