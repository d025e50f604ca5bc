//! CLI argument definitions for twstock.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `resolve` | Show which sessions the exchange should have published |
//! | `fetch` | Acquire reconciled closing data |
//! | `recommend` | Screen the market and build the chat reply |
//! | `parse` | Parse a saved exchange report offline |
//! | `cache` | Inspect or clear the file-backed session cache |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, text) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings as errors |
//! | `--cache-file` | none | JSON file backing the session cache |
//! | `--base-url` | `TWSTOCK_BASE_URL` or the TWSE report | Feed endpoint |
//! | `--feed-type` | `ALLBUT0999` | Report `type` parameter |
//! | `--cutoff-hour` | `14` | Local hour the session is published |
//! | `--utc-offset-hours` | `8` | Exchange UTC offset |
//! | `--max-attempts` | `10` | Fallback attempt budget |
//! | `--timeout-ms` | `10000` | Request timeout in ms |
//!
//! Unset feed options fall back to the `TWSTOCK_*` environment variables,
//! then to the built-in defaults.
//!
//! # Examples
//!
//! ```bash
//! twstock resolve --pretty
//! twstock fetch --symbol 2330 --cache-file ~/.cache/twstock/session.json
//! twstock recommend --format text
//! twstock parse MI_INDEX_20240105.csv --limit 5
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use twstock_core::recommend::RecommendationFilter;
use twstock_core::{CacheMode, FeedConfig, ValidationError};

/// Taiwan Stock Exchange daily closing data and screening.
#[derive(Debug, Parser)]
#[command(
    name = "twstock",
    author,
    version,
    about = "Taiwan Stock Exchange daily closing data CLI"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings (stale data, degraded replies) as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// JSON file backing the session cache; in-memory when omitted.
    #[arg(long, global = true, env = "TWSTOCK_CACHE_FILE")]
    pub cache_file: Option<PathBuf>,

    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[arg(long, global = true)]
    pub feed_type: Option<String>,

    /// Local hour (0-23) from which today's session is considered published.
    #[arg(long, global = true)]
    pub cutoff_hour: Option<u8>,

    #[arg(long, global = true, allow_negative_numbers = true)]
    pub utc_offset_hours: Option<i8>,

    /// Sessions tried per fetch before giving up, requested date included.
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Environment configuration with command-line overrides applied.
    pub fn feed_config(&self) -> Result<FeedConfig, ValidationError> {
        let mut config = FeedConfig::from_env()?;
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(feed_type) = &self.feed_type {
            config.feed_type = feed_type.clone();
        }
        if let Some(cutoff_hour) = self.cutoff_hour {
            config.cutoff_hour = cutoff_hour;
        }
        if let Some(utc_offset_hours) = self.utc_offset_hours {
            config.utc_offset_hours = utc_offset_hours;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.max_attempts = max_attempts;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON envelope.
    Json,
    /// Plain text for terminals and chat relays.
    Text,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// 🗓️ Show the current and prior sessions for an instant.
    ///
    /// # Examples
    ///
    ///   twstock resolve
    ///   twstock resolve --at 2024-01-08T01:00:00Z
    Resolve(ResolveArgs),

    /// 📥 Acquire reconciled closing data for the resolved session.
    ///
    /// # Examples
    ///
    ///   twstock fetch --pretty
    ///   twstock fetch --symbol 2330 --symbol 2317
    ///   twstock fetch --refresh --limit 20
    Fetch(FetchArgs),

    /// 📊 Screen the market and build the recommendation reply.
    ///
    /// # Examples
    ///
    ///   twstock recommend --format text
    ///   twstock recommend --min-price-change-pct 3 --min-trade-count-change-pct 30
    ///   twstock recommend --message "今日推薦"
    Recommend(RecommendArgs),

    /// 📄 Parse a saved exchange report without touching the network.
    Parse(ParseArgs),

    /// 📦 Session cache management commands.
    Cache(CacheArgs),
}

/// Arguments for the `resolve` command.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// RFC3339 UTC instant to resolve instead of now.
    #[arg(long)]
    pub at: Option<String>,
}

/// Cache usage shared by acquiring commands.
#[derive(Debug, Clone, Copy, Args)]
pub struct CachePolicyArgs {
    /// Ignore a valid cache entry, fetch, and store the result.
    #[arg(long, default_value_t = false, conflicts_with = "no_cache")]
    pub refresh: bool,

    /// Fetch without reading or writing the cache.
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,
}

impl CachePolicyArgs {
    pub fn mode(&self) -> CacheMode {
        if self.no_cache {
            CacheMode::Bypass
        } else if self.refresh {
            CacheMode::Refresh
        } else {
            CacheMode::Use
        }
    }
}

/// Arguments for the `fetch` command.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Only return these security codes.
    #[arg(long = "symbol")]
    pub symbols: Vec<String>,

    /// Maximum number of records to return.
    #[arg(long)]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub cache: CachePolicyArgs,
}

/// Arguments for the `recommend` command.
#[derive(Debug, Args)]
pub struct RecommendArgs {
    /// Minimum price change in percent (exclusive).
    #[arg(long, allow_negative_numbers = true)]
    pub min_price_change_pct: Option<f64>,

    /// Minimum trade-count change in percent (exclusive).
    #[arg(long, allow_negative_numbers = true)]
    pub min_trade_count_change_pct: Option<f64>,

    /// Chat message to answer; ignored unless it asks for recommendations.
    #[arg(long)]
    pub message: Option<String>,

    #[command(flatten)]
    pub cache: CachePolicyArgs,
}

impl RecommendArgs {
    pub fn filter(&self) -> Result<RecommendationFilter, ValidationError> {
        let defaults = RecommendationFilter::from_env()?;
        RecommendationFilter::new(
            self.min_price_change_pct
                .unwrap_or(defaults.min_price_change_pct),
            self.min_trade_count_change_pct
                .unwrap_or(defaults.min_trade_count_change_pct),
        )
    }
}

/// Arguments for the `parse` command.
#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Saved report, raw Big5 bytes as served by the exchange.
    pub path: PathBuf,

    /// Maximum number of records to return.
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for the `cache` command group.
#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

/// Cache management subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Print the cached entry and whether it is valid right now.
    Show,
    /// Remove the cache file.
    Clear,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_feed_defaults() {
        let cli = Cli::parse_from([
            "twstock",
            "--cutoff-hour",
            "15",
            "--max-attempts",
            "3",
            "fetch",
            "--symbol",
            "2330",
        ]);

        let config = cli.feed_config().expect("valid config");

        assert_eq!(config.cutoff_hour, 15);
        assert_eq!(config.max_attempts, 3);
        match cli.command {
            Command::Fetch(args) => {
                assert_eq!(args.symbols, vec!["2330"]);
                assert_eq!(args.cache.mode(), CacheMode::Use);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn invalid_cutoff_is_rejected() {
        let cli = Cli::parse_from(["twstock", "--cutoff-hour", "24", "resolve"]);
        assert_eq!(
            cli.feed_config().expect_err("must fail"),
            ValidationError::InvalidCutoffHour { value: 24 }
        );
    }

    #[test]
    fn cache_flags_map_to_modes() {
        let cli = Cli::parse_from(["twstock", "recommend", "--no-cache"]);
        match cli.command {
            Command::Recommend(args) => assert_eq!(args.cache.mode(), CacheMode::Bypass),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
