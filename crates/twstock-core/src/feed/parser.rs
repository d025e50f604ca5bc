//! Exchange CSV feed decoding.
//!
//! The daily report mixes section titles, column headers, per-security rows
//! and footnotes of different widths without a fixed layout. Only lines that
//! open with a quoted security code are read; everything else is noise.

use csv::{ReaderBuilder, StringRecord};
use encoding_rs::BIG5;
use tracing::{debug, warn};

use super::schema::FeedSchema;
use crate::{FeedRecord, SecurityCode, SessionRecords};

/// Result of parsing one session's feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub records: SessionRecords,
    /// Code-prefixed rows dropped for being truncated or malformed.
    pub dropped_rows: usize,
}

/// Parses raw feed bytes into symbol-keyed session records.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedParser {
    schema: FeedSchema,
}

impl FeedParser {
    pub const fn new(schema: FeedSchema) -> Self {
        Self { schema }
    }

    pub const fn schema(&self) -> FeedSchema {
        self.schema
    }

    pub fn parse(&self, raw: &[u8]) -> ParsedFeed {
        let text = decode_feed(raw);
        self.parse_text(&text)
    }

    pub fn parse_text(&self, text: &str) -> ParsedFeed {
        let mut parsed = ParsedFeed::default();

        let mut rows = String::with_capacity(text.len());
        for line in text.lines().filter(|line| FeedSchema::is_data_row(line)) {
            if has_balanced_quotes(line) {
                rows.push_str(line);
                rows.push('\n');
            } else {
                parsed.dropped_rows += 1;
            }
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(rows.as_bytes());
        let mut fields = StringRecord::new();
        loop {
            match reader.read_record(&mut fields) {
                Ok(true) => match self.parse_row(&fields) {
                    Some(record) => {
                        if let Some(previous) = parsed.records.insert(record) {
                            debug!(symbol = %previous.symbol, "duplicate security row replaced");
                        }
                    }
                    None => parsed.dropped_rows += 1,
                },
                Ok(false) => break,
                Err(error) => {
                    debug!(%error, "unreadable security row");
                    parsed.dropped_rows += 1;
                }
            }
        }

        if parsed.dropped_rows > 0 {
            debug!(
                dropped = parsed.dropped_rows,
                kept = parsed.records.len(),
                "dropped malformed security rows"
            );
        }

        parsed
    }

    fn parse_row(&self, fields: &StringRecord) -> Option<FeedRecord> {
        if fields.len() < self.schema.min_width() {
            return None;
        }

        let symbol = SecurityCode::parse(fields.get(self.schema.symbol())?).ok()?;
        Some(FeedRecord {
            symbol,
            name: clean(fields.get(self.schema.name())?),
            trade_count: clean(fields.get(self.schema.trade_count())?),
            close_price: clean(fields.get(self.schema.close_price())?),
        })
    }
}

/// Decode the feed's Big5 body. Unmappable bytes become U+FFFD.
pub fn decode_feed(raw: &[u8]) -> String {
    let (text, _, had_errors) = BIG5.decode(raw);
    if had_errors {
        warn!(bytes = raw.len(), "feed contained bytes outside Big5");
    }
    text.into_owned()
}

/// Parse with the exchange's daily layout.
pub fn parse(raw: &[u8]) -> ParsedFeed {
    FeedParser::default().parse(raw)
}

/// A row with an unterminated quote would swallow the next line.
fn has_balanced_quotes(line: &str) -> bool {
    line.bytes().filter(|byte| *byte == b'"').count() % 2 == 0
}

fn clean(field: &str) -> String {
    field.trim().trim_matches('"').trim().to_owned()
}
