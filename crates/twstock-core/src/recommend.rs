//! Threshold screening over reconciled snapshots and chat reply formatting.

use std::fmt::Write as _;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::CacheEntry;
use crate::config::parse_env;
use crate::error::AcquireError;
use crate::{ReconciledSnapshot, SecurityCode, TradingDate, ValidationError};

pub const DEFAULT_MIN_PRICE_CHANGE_PCT: f64 = 4.5;
pub const DEFAULT_MIN_TRADE_COUNT_CHANGE_PCT: f64 = 50.0;

pub const EMPTY_RESULT_REPLY: &str = "沒有找到符合條件的股票";
pub const UNAVAILABLE_REPLY: &str = "抱歉，目前無法取得股票推薦資料，請稍後再試。";

const RECOMMENDATION_KEYWORDS: [&str; 7] = [
    "推薦標的",
    "推薦股票",
    "熱門股票",
    "今日推薦",
    "股票推薦",
    "推薦",
    "標的",
];

/// Percentage change from `previous` to `current`.
///
/// Both sides are decimal strings as published, so thousands separators are
/// stripped first. Returns `None` when `previous` is absent, either side is
/// not a number (the feed prints `--` for untraded securities), or
/// `previous` is zero.
pub fn percent_change(current: &str, previous: Option<&str>) -> Option<f64> {
    let current = parse_decimal(current)?;
    let previous = parse_decimal(previous?)?;
    if previous == 0.0 {
        return None;
    }
    let change = (current - previous) / previous * 100.0;
    change.is_finite().then_some(change)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn parse_decimal(value: &str) -> Option<f64> {
    let cleaned: String = value.chars().filter(|ch| *ch != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|number| number.is_finite())
}

/// Minimum day-over-day changes a security must strictly exceed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationFilter {
    pub min_price_change_pct: f64,
    pub min_trade_count_change_pct: f64,
}

impl Default for RecommendationFilter {
    fn default() -> Self {
        Self {
            min_price_change_pct: DEFAULT_MIN_PRICE_CHANGE_PCT,
            min_trade_count_change_pct: DEFAULT_MIN_TRADE_COUNT_CHANGE_PCT,
        }
    }
}

impl RecommendationFilter {
    pub fn new(
        min_price_change_pct: f64,
        min_trade_count_change_pct: f64,
    ) -> Result<Self, ValidationError> {
        let filter = Self {
            min_price_change_pct,
            min_trade_count_change_pct,
        };
        filter.validate()?;
        Ok(filter)
    }

    /// Defaults overridden by `TWSTOCK_MIN_PRICE_CHANGE_PCT` and
    /// `TWSTOCK_MIN_TRADE_COUNT_CHANGE_PCT`.
    pub fn from_env() -> Result<Self, ValidationError> {
        let defaults = Self::default();
        Self::new(
            parse_env("TWSTOCK_MIN_PRICE_CHANGE_PCT").unwrap_or(defaults.min_price_change_pct),
            parse_env("TWSTOCK_MIN_TRADE_COUNT_CHANGE_PCT")
                .unwrap_or(defaults.min_trade_count_change_pct),
        )
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.min_price_change_pct.is_finite() {
            return Err(ValidationError::NonFiniteThreshold {
                field: "min_price_change_pct",
            });
        }
        if !self.min_trade_count_change_pct.is_finite() {
            return Err(ValidationError::NonFiniteThreshold {
                field: "min_trade_count_change_pct",
            });
        }
        Ok(())
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Human-readable criteria line used in replies.
    pub fn description(&self) -> String {
        let prefix = if self.is_default() {
            "預設篩選條件"
        } else {
            "自訂篩選條件"
        };
        format!(
            "{prefix}：價格漲幅 > {}%, 交易量增長 > {}%",
            self.min_price_change_pct, self.min_trade_count_change_pct
        )
    }

    /// Screen one snapshot. Changes are compared at the two-decimal precision
    /// they are displayed with. Snapshots without comparable prior values never
    /// qualify.
    pub fn evaluate(&self, snapshot: &ReconciledSnapshot) -> Option<Recommendation> {
        let price_change_pct = percent_change(
            &snapshot.snapshot.close_price,
            snapshot.prev_close.as_deref(),
        )?;
        let trade_count_change_pct = percent_change(
            &snapshot.snapshot.trade_count,
            snapshot.prev_trade_count.as_deref(),
        )?;

        (round_to_cents(price_change_pct) > self.min_price_change_pct
            && round_to_cents(trade_count_change_pct) > self.min_trade_count_change_pct)
            .then(|| Recommendation {
                symbol: snapshot.snapshot.symbol.clone(),
                name: snapshot.snapshot.name.clone(),
                close: snapshot.snapshot.close_price.clone(),
                price_change_pct,
                trade_count_change_pct,
            })
    }

    pub fn matches(&self, snapshot: &ReconciledSnapshot) -> bool {
        self.evaluate(snapshot).is_some()
    }

    /// Qualifying snapshots in feed order.
    pub fn apply(&self, records: &[ReconciledSnapshot]) -> Vec<Recommendation> {
        let selected: Vec<Recommendation> =
            records.iter().filter_map(|record| self.evaluate(record)).collect();
        debug!(
            screened = records.len(),
            selected = selected.len(),
            "applied recommendation filter"
        );
        selected
    }
}

/// A security that passed the filter, with the changes that qualified it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub symbol: SecurityCode,
    pub name: String,
    pub close: String,
    pub price_change_pct: f64,
    pub trade_count_change_pct: f64,
}

impl Recommendation {
    fn trend_icon(&self) -> &'static str {
        if self.price_change_pct > 0.0 {
            "📈"
        } else if self.price_change_pct < 0.0 {
            "📉"
        } else {
            "➡️"
        }
    }
}

/// Render the chat reply for a screening result.
///
/// `advisory`, when present, is placed on its own line ahead of the result.
pub fn format_reply(
    recommendations: &[Recommendation],
    filter: &RecommendationFilter,
    data_date: TradingDate,
    advisory: Option<&str>,
) -> String {
    let mut reply = String::new();
    if let Some(advisory) = advisory {
        let _ = writeln!(reply, "⚠️ {advisory}");
    }

    if recommendations.is_empty() {
        reply.push_str(EMPTY_RESULT_REPLY);
        return reply;
    }

    reply.push_str("📊 股票篩選結果\n");
    let _ = writeln!(reply, "🔍 篩選條件: {}", filter.description());
    let _ = writeln!(reply, "📅 資料日期: {}", data_date.iso());
    let _ = writeln!(reply, "📈 符合條件的股票數量: {}\n", recommendations.len());

    for (position, item) in recommendations.iter().enumerate() {
        let _ = writeln!(reply, "{}. {} {}", position + 1, item.symbol, item.name);
        let _ = writeln!(
            reply,
            "   收盤價: {} ({} {:.2}%)\n",
            item.close,
            item.trend_icon(),
            item.price_change_pct
        );
    }

    reply
}

/// Whether a chat message asks for today's recommendations.
pub fn is_recommendation_request(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    RECOMMENDATION_KEYWORDS
        .iter()
        .any(|keyword| normalized.contains(keyword))
}

/// Outcome of answering one recommendation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationReply {
    pub text: String,
    pub recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_date: Option<TradingDate>,
    pub is_stale: bool,
    /// `true` when acquisition failed and the reply is the apology.
    pub degraded: bool,
}

/// Build a reply from an acquisition result, turning failure into the
/// apology text instead of an error.
pub fn recommend_reply(
    acquired: Result<CacheEntry, AcquireError>,
    filter: &RecommendationFilter,
) -> RecommendationReply {
    match acquired {
        Ok(entry) => {
            let recommendations = filter.apply(&entry.records);
            let advisory = entry.is_stale_for_today.then(|| entry.advisory());
            RecommendationReply {
                text: format_reply(
                    &recommendations,
                    filter,
                    entry.session_date,
                    advisory.as_deref(),
                ),
                recommendations,
                data_date: Some(entry.session_date),
                is_stale: entry.is_stale_for_today,
                degraded: false,
            }
        }
        Err(error) => {
            warn!(code = error.code(), %error, "stock data unavailable, replying with apology");
            RecommendationReply {
                text: String::from(UNAVAILABLE_REPLY),
                recommendations: Vec::new(),
                data_date: None,
                is_stale: false,
                degraded: true,
            }
        }
    }
}
