mod cache;
mod fetch;
mod parse;
mod recommend;
mod resolve;

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use twstock_core::{
    Envelope, EnvelopeError, EnvelopeMeta, FileSessionCache, InMemorySessionCache, SessionCache,
    StockFeed,
};
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    /// Plain-text rendering, when the command has a natural one.
    pub text: Option<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub cache_hit: bool,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            text: None,
            warnings: Vec::new(),
            errors: Vec::new(),
            cache_hit: false,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_error(mut self, error: EnvelopeError) -> Self {
        self.errors.push(error);
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }
}

/// Envelope plus the optional text form of the same result.
pub struct Rendered {
    pub envelope: Envelope<Value>,
    pub text: Option<String>,
}

pub async fn run(cli: &Cli) -> Result<Rendered, CliError> {
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::Resolve(args) => resolve::run(args, cli)?,
        Command::Fetch(args) => fetch::run(args, &stock_feed(cli)?).await?,
        Command::Recommend(args) => recommend::run(args, &stock_feed(cli)?).await?,
        Command::Parse(args) => parse::run(args).await?,
        Command::Cache(args) => cache::run(args, cli).await?,
    };

    let CommandResult {
        data,
        text,
        warnings,
        errors,
        cache_hit,
    } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut meta = EnvelopeMeta::new(Uuid::new_v4().to_string(), latency_ms, cache_hit)?;
    for warning in warnings {
        meta.push_warning(warning);
    }

    let mut envelope = Envelope::success(meta, data);
    for error in errors {
        envelope.push_error(error)?;
    }

    Ok(Rendered { envelope, text })
}

fn session_cache(cli: &Cli) -> Arc<dyn SessionCache> {
    match &cli.cache_file {
        Some(path) => Arc::new(FileSessionCache::new(path)),
        None => Arc::new(InMemorySessionCache::new()),
    }
}

fn stock_feed(cli: &Cli) -> Result<StockFeed, CliError> {
    let config = cli.feed_config()?;
    Ok(StockFeed::from_config(&config, session_cache(cli))?)
}
