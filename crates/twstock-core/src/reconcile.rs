//! Pairing a session's records with the preceding session's.

use crate::{ReconciledSnapshot, SecuritySnapshot, SessionRecords, TradingDate};

/// Merge `today` with `prior` by security code.
///
/// Output follows `today`'s order and has exactly one entry per security in
/// `today`. Securities only found in `prior` are dropped; securities missing
/// from `prior` get `None` for both previous values.
pub fn merge(
    today: &SessionRecords,
    prior: &SessionRecords,
    date: TradingDate,
) -> Vec<ReconciledSnapshot> {
    today
        .iter()
        .map(|record| {
            let previous = prior.get(&record.symbol);
            ReconciledSnapshot {
                snapshot: SecuritySnapshot::from_record(record, date),
                prev_close: previous.map(|p| p.close_price.clone()),
                prev_trade_count: previous.map(|p| p.trade_count.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FeedRecord, SecurityCode};

    fn records(rows: &[(&str, &str, &str)]) -> SessionRecords {
        rows.iter()
            .map(|(symbol, close, trades)| FeedRecord {
                symbol: SecurityCode::parse(symbol).expect("valid code"),
                name: format!("name-{symbol}"),
                close_price: (*close).to_owned(),
                trade_count: (*trades).to_owned(),
            })
            .collect()
    }

    fn date() -> TradingDate {
        TradingDate::parse("20240105").expect("valid date")
    }

    #[test]
    fn new_listing_has_absent_prior_values() {
        let today = records(&[("2330", "600", "10")]);
        let merged = merge(&today, &SessionRecords::new(), date());

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].snapshot.close_price, "600");
        assert_eq!(merged[0].prev_close, None);
        assert_eq!(merged[0].prev_trade_count, None);
    }

    #[test]
    fn attaches_prior_values_and_drops_delisted() {
        let today = records(&[("2330", "600", "10"), ("1101", "33", "7")]);
        let prior = records(&[("9999", "1", "1"), ("2330", "590", "8")]);

        let merged = merge(&today, &prior, date());

        let symbols: Vec<&str> = merged.iter().map(|m| m.symbol().as_str()).collect();
        assert_eq!(symbols, vec!["2330", "1101"]);
        assert_eq!(merged[0].prev_close.as_deref(), Some("590"));
        assert_eq!(merged[0].prev_trade_count.as_deref(), Some("8"));
        assert!(!merged[1].has_prior());
        assert!(merged.iter().all(|m| m.snapshot.date == date()));
    }

    #[test]
    fn output_length_tracks_today_and_absence_tracks_prior() {
        let today = records(&[
            ("1101", "1", "1"),
            ("1102", "1", "1"),
            ("1103", "1", "1"),
            ("1104", "1", "1"),
        ]);
        let prior = records(&[("1102", "2", "2"), ("1104", "2", "2"), ("1105", "2", "2")]);

        let merged = merge(&today, &prior, date());

        assert_eq!(merged.len(), today.len());
        for snapshot in &merged {
            let in_prior = prior.contains(snapshot.symbol());
            assert_eq!(snapshot.prev_close.is_some(), in_prior);
            assert_eq!(snapshot.prev_trade_count.is_some(), in_prior);
        }
    }
}
