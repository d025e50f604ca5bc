use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{SecurityCode, TradingDate};

/// One security row as published in a single session's feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
    pub symbol: SecurityCode,
    pub name: String,
    /// Decimal string exactly as published, thousands separators included.
    pub close_price: String,
    pub trade_count: String,
}

/// Per-security records of one session, keyed by symbol, in feed order.
///
/// Inserting a symbol that is already present replaces its values but keeps
/// its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecords {
    records: Vec<FeedRecord>,
    index: HashMap<SecurityCode, usize>,
}

impl SessionRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the replaced record when the symbol was already present.
    pub fn insert(&mut self, record: FeedRecord) -> Option<FeedRecord> {
        match self.index.get(&record.symbol) {
            Some(&position) => Some(std::mem::replace(&mut self.records[position], record)),
            None => {
                self.index.insert(record.symbol.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn get(&self, symbol: &SecurityCode) -> Option<&FeedRecord> {
        self.index
            .get(symbol)
            .and_then(|&position| self.records.get(position))
    }

    pub fn contains(&self, symbol: &SecurityCode) -> bool {
        self.index.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeedRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a SessionRecords {
    type Item = &'a FeedRecord;
    type IntoIter = std::slice::Iter<'a, FeedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<FeedRecord> for SessionRecords {
    fn from_iter<I: IntoIterator<Item = FeedRecord>>(iter: I) -> Self {
        let mut records = Self::new();
        for record in iter {
            records.insert(record);
        }
        records
    }
}

/// Immutable snapshot of one security for one trading date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySnapshot {
    pub date: TradingDate,
    pub symbol: SecurityCode,
    pub name: String,
    #[serde(rename = "close")]
    pub close_price: String,
    pub trade_count: String,
}

impl SecuritySnapshot {
    pub fn from_record(record: &FeedRecord, date: TradingDate) -> Self {
        Self {
            date,
            symbol: record.symbol.clone(),
            name: record.name.clone(),
            close_price: record.close_price.clone(),
            trade_count: record.trade_count.clone(),
        }
    }
}

/// Snapshot paired with the previous session's values.
///
/// `prev_*` are `None` for securities absent from the prior session (new
/// listings); they are never zero-filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledSnapshot {
    #[serde(flatten)]
    pub snapshot: SecuritySnapshot,
    pub prev_close: Option<String>,
    pub prev_trade_count: Option<String>,
}

impl ReconciledSnapshot {
    pub fn symbol(&self) -> &SecurityCode {
        &self.snapshot.symbol
    }

    pub fn has_prior(&self) -> bool {
        self.prev_close.is_some()
    }
}
