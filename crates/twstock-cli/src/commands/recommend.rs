use serde_json::json;
use twstock_core::{is_recommendation_request, recommend_reply, EnvelopeError, StockFeed};

use crate::cli::RecommendArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &RecommendArgs, feed: &StockFeed) -> Result<CommandResult, CliError> {
    let filter = args.filter()?;

    if let Some(message) = &args.message {
        if !is_recommendation_request(message) {
            return Ok(CommandResult::ok(json!({
                "is_recommendation_request": false,
                "message": message,
            }))
            .with_warning("message does not ask for recommendations; nothing fetched"));
        }
    }

    let acquired = feed.acquire(args.cache.mode()).await;
    let cache_hit = acquired.as_ref().is_ok_and(|acquisition| acquisition.cache_hit);
    let failure = acquired.as_ref().err().map(|error| {
        EnvelopeError::new(error.code(), error.to_string())
            .map(|envelope_error| envelope_error.with_retryable(error.retryable()))
    });

    let reply = recommend_reply(acquired.map(|acquisition| acquisition.entry), &filter);

    let mut result = CommandResult::ok(serde_json::to_value(&reply)?)
        .with_text(reply.text.clone())
        .with_cache_hit(cache_hit);
    if reply.is_stale {
        result = result.with_warning("data is not from today's session");
    }
    if let Some(failure) = failure {
        result = result.with_error(failure?);
    }

    Ok(result)
}
