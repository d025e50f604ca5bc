use serde::Serialize;
use twstock_core::{FeedParser, FeedRecord};

use crate::cli::ParseArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ParseResponseData {
    total: usize,
    dropped_rows: usize,
    records: Vec<FeedRecord>,
}

pub async fn run(args: &ParseArgs) -> Result<CommandResult, CliError> {
    let raw = tokio::fs::read(&args.path).await?;
    let parsed = FeedParser::default().parse(&raw);

    let total = parsed.records.len();
    let limit = args.limit.unwrap_or(total);
    let records: Vec<FeedRecord> = parsed.records.iter().take(limit).cloned().collect();
    let text = records
        .iter()
        .map(|record| {
            format!(
                "{} {} close={} trades={}",
                record.symbol, record.name, record.close_price, record.trade_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut result = CommandResult::ok(serde_json::to_value(ParseResponseData {
        total,
        dropped_rows: parsed.dropped_rows,
        records,
    })?)
    .with_text(text);

    if total == 0 {
        result = result.with_warning(format!(
            "no security rows found in {}",
            args.path.display()
        ));
    }

    Ok(result)
}
