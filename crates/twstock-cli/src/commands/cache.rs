use serde_json::json;
use twstock_core::{FileSessionCache, SessionCache, TradingDayResolver, UtcTimestamp};

use crate::cli::{CacheArgs, CacheCommand, Cli};
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &CacheArgs, cli: &Cli) -> Result<CommandResult, CliError> {
    let path = cli.cache_file.as_ref().ok_or_else(|| {
        CliError::Command(String::from(
            "no cache file configured; pass --cache-file or set TWSTOCK_CACHE_FILE",
        ))
    })?;
    let cache = FileSessionCache::new(path);

    match args.command {
        CacheCommand::Show => {
            let Some(entry) = cache.read().await? else {
                return Ok(CommandResult::ok(json!({
                    "path": path.display().to_string(),
                    "present": false,
                }))
                .with_text("cache is empty"));
            };

            let resolver = TradingDayResolver::from_config(&cli.feed_config()?)?;
            let resolved = resolver.resolve(UtcTimestamp::now())?;
            let valid = entry.is_valid_for(resolved.current);
            let text = format!(
                "{} records for {} (resolved {}), {}\n{}",
                entry.len(),
                entry.session_date.iso(),
                entry.resolved_date.iso(),
                if valid { "valid" } else { "outdated" },
                entry.advisory()
            );

            let mut result = CommandResult::ok(json!({
                "path": path.display().to_string(),
                "present": true,
                "valid": valid,
                "resolved_date": entry.resolved_date,
                "resolved_prior_date": entry.resolved_prior_date,
                "session_date": entry.session_date,
                "is_stale_for_today": entry.is_stale_for_today,
                "timestamp": entry.timestamp,
                "records": entry.len(),
            }))
            .with_text(text)
            .with_cache_hit(true);
            if !valid {
                result = result.with_warning(format!(
                    "cached entry is for {}, current session is {}",
                    entry.resolved_date.iso(),
                    resolved.current.iso()
                ));
            }
            Ok(result)
        }
        CacheCommand::Clear => {
            cache.clear().await?;
            Ok(CommandResult::ok(json!({
                "path": path.display().to_string(),
                "cleared": true,
            }))
            .with_text("cache cleared"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::Parser;
    use twstock_core::{
        CacheEntry, ReconciledSnapshot, SecurityCode, SecuritySnapshot, TradingDate,
    };

    use super::*;

    fn cli_for(path: &Path, action: &str) -> Cli {
        let path = path.to_str().expect("utf-8 path");
        Cli::parse_from(["twstock", "--cache-file", path, "cache", action])
    }

    fn args(cli: &Cli) -> &CacheArgs {
        match &cli.command {
            crate::cli::Command::Cache(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    fn friday_entry() -> CacheEntry {
        let date = TradingDate::parse("20240105").expect("valid date");
        CacheEntry {
            records: vec![ReconciledSnapshot {
                snapshot: SecuritySnapshot {
                    date,
                    symbol: SecurityCode::parse("2330").expect("valid code"),
                    name: String::from("台積電"),
                    close_price: String::from("600.00"),
                    trade_count: String::from("150"),
                },
                prev_close: Some(String::from("590.00")),
                prev_trade_count: Some(String::from("100")),
            }],
            resolved_date: date,
            resolved_prior_date: TradingDate::parse("20240104").expect("valid date"),
            session_date: date,
            is_stale_for_today: false,
            timestamp: UtcTimestamp::parse("2024-01-05T07:00:00Z").expect("valid instant"),
        }
    }

    #[tokio::test]
    async fn show_reports_slot_and_clear_empties_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        FileSessionCache::new(&path)
            .write(friday_entry())
            .await
            .expect("seed slot");

        let show = cli_for(&path, "show");
        let shown = run(args(&show), &show).await.expect("show");
        assert_eq!(shown.data["present"], true);
        assert_eq!(shown.data["records"], 1);
        assert_eq!(shown.data["session_date"], "20240105");
        assert!(shown.cache_hit);

        let clear = cli_for(&path, "clear");
        let cleared = run(args(&clear), &clear).await.expect("clear");
        assert_eq!(cleared.data["cleared"], true);
        assert!(!path.exists());

        let empty = run(args(&show), &show).await.expect("show empty");
        assert_eq!(empty.data["present"], false);
        assert_eq!(empty.text.as_deref(), Some("cache is empty"));
    }
}
