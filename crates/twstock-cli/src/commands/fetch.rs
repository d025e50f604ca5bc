use serde::Serialize;
use twstock_core::{ReconciledSnapshot, SecurityCode, StockFeed, TradingDate};

use crate::cli::FetchArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct FetchResponseData {
    resolved_date: TradingDate,
    session_date: TradingDate,
    prior_date: TradingDate,
    is_stale_for_today: bool,
    total: usize,
    records: Vec<ReconciledSnapshot>,
}

pub async fn run(args: &FetchArgs, feed: &StockFeed) -> Result<CommandResult, CliError> {
    let symbols = args
        .symbols
        .iter()
        .map(|raw| SecurityCode::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let acquisition = feed.acquire(args.cache.mode()).await?;
    let entry = acquisition.entry;
    let advisory = entry.advisory();

    let selected = entry
        .records
        .iter()
        .filter(|record| symbols.is_empty() || symbols.contains(record.symbol()));
    let records: Vec<ReconciledSnapshot> = match args.limit {
        Some(limit) => selected.take(limit).cloned().collect(),
        None => selected.cloned().collect(),
    };

    let text = render_text(&records, &advisory);
    let mut result = CommandResult::ok(serde_json::to_value(FetchResponseData {
        resolved_date: entry.resolved_date,
        session_date: entry.session_date,
        prior_date: entry.resolved_prior_date,
        is_stale_for_today: entry.is_stale_for_today,
        total: entry.records.len(),
        records,
    })?)
    .with_text(text)
    .with_cache_hit(acquisition.cache_hit);

    if entry.is_stale_for_today {
        result = result.with_warning(advisory);
    }
    for symbol in symbols
        .iter()
        .filter(|symbol| !entry.records.iter().any(|record| record.symbol() == *symbol))
    {
        result = result.with_warning(format!("security {symbol} not found in the session"));
    }

    Ok(result)
}

fn render_text(records: &[ReconciledSnapshot], advisory: &str) -> String {
    let mut lines = vec![advisory.to_owned()];
    lines.extend(records.iter().map(|record| {
        format!(
            "{} {} close={} trades={} prev_close={} prev_trades={}",
            record.snapshot.symbol,
            record.snapshot.name,
            record.snapshot.close_price,
            record.snapshot.trade_count,
            record.prev_close.as_deref().unwrap_or("-"),
            record.prev_trade_count.as_deref().unwrap_or("-"),
        )
    }));
    lines.join("\n")
}
