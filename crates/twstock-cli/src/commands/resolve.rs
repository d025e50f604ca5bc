use twstock_core::{TradingDayResolver, UtcTimestamp};

use crate::cli::{Cli, ResolveArgs};
use crate::error::CliError;

use super::CommandResult;

pub fn run(args: &ResolveArgs, cli: &Cli) -> Result<CommandResult, CliError> {
    let config = cli.feed_config()?;
    let resolver = TradingDayResolver::from_config(&config)?;
    let now = match &args.at {
        Some(at) => UtcTimestamp::parse(at)?,
        None => UtcTimestamp::now(),
    };

    let resolved = resolver.resolve(now)?;
    let text = format!(
        "current: {}\nprior: {}\nlocal: {} {:02}:{:02}{}",
        resolved.current.iso(),
        resolved.prior.iso(),
        resolved.local_today.iso(),
        resolved.local_hour,
        resolved.local_minute,
        if resolved.before_cutoff {
            " (before publish cutoff)"
        } else {
            ""
        }
    );

    Ok(CommandResult::ok(serde_json::to_value(resolved)?).with_text(text))
}
