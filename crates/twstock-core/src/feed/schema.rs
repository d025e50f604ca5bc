use std::sync::LazyLock;

use regex::Regex;

use crate::ValidationError;

/// Security rows open with a quoted 4–6 digit code, optionally behind the
/// `=` spreadsheet formula escape. Headers, notes and blank lines never do.
static DATA_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^=?"\d{4,6}""#).expect("data row pattern is valid"));

/// Named column offsets of a feed row, validated once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSchema {
    symbol: usize,
    name: usize,
    trade_count: usize,
    close_price: usize,
    min_width: usize,
}

impl FeedSchema {
    pub fn new(
        symbol: usize,
        name: usize,
        trade_count: usize,
        close_price: usize,
        min_width: usize,
    ) -> Result<Self, ValidationError> {
        for (column, offset) in [
            ("symbol", symbol),
            ("name", name),
            ("trade_count", trade_count),
            ("close_price", close_price),
        ] {
            if offset >= min_width {
                return Err(ValidationError::SchemaColumnOutOfRange {
                    column,
                    offset,
                    min_width,
                });
            }
        }

        Ok(Self {
            symbol,
            name,
            trade_count,
            close_price,
            min_width,
        })
    }

    /// Layout of the exchange's daily closing report.
    pub const fn exchange_daily() -> Self {
        Self {
            symbol: 0,
            name: 1,
            trade_count: 2,
            close_price: 8,
            min_width: 9,
        }
    }

    pub fn is_data_row(line: &str) -> bool {
        DATA_ROW.is_match(line)
    }

    pub const fn symbol(&self) -> usize {
        self.symbol
    }

    pub const fn name(&self) -> usize {
        self.name
    }

    pub const fn trade_count(&self) -> usize {
        self.trade_count
    }

    pub const fn close_price(&self) -> usize {
        self.close_price
    }

    /// Rows narrower than this are dropped.
    pub const fn min_width(&self) -> usize {
        self.min_width
    }
}

impl Default for FeedSchema {
    fn default() -> Self {
        Self::exchange_daily()
    }
}
