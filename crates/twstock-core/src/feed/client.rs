use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use super::parser::{FeedParser, ParsedFeed};
use crate::config::FeedConfig;
use crate::error::AcquireError;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::TradingDate;

/// Retrieves and parses one session's feed.
///
/// Implementations make exactly one outbound request per call and never
/// retry; an empty [`ParsedFeed`] means the date had no published session.
pub trait SessionFetcher: Send + Sync {
    fn fetch_session<'a>(
        &'a self,
        date: TradingDate,
    ) -> Pin<Box<dyn Future<Output = Result<ParsedFeed, AcquireError>> + Send + 'a>>;
}

/// HTTP client for the exchange's daily closing report.
#[derive(Clone)]
pub struct FeedClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    feed_type: String,
    timeout_ms: u64,
    parser: FeedParser,
}

impl FeedClient {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &FeedConfig) -> Self {
        Self {
            http_client,
            base_url: config.base_url.clone(),
            feed_type: config.feed_type.clone(),
            timeout_ms: config.timeout_ms,
            parser: FeedParser::default(),
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()), config)
    }

    pub fn with_parser(mut self, parser: FeedParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn url_for(&self, date: TradingDate) -> String {
        format!(
            "{}?response=csv&date={}&type={}",
            self.base_url,
            date.compact(),
            urlencoding::encode(&self.feed_type)
        )
    }
}

impl SessionFetcher for FeedClient {
    fn fetch_session<'a>(
        &'a self,
        date: TradingDate,
    ) -> Pin<Box<dyn Future<Output = Result<ParsedFeed, AcquireError>> + Send + 'a>> {
        Box::pin(async move {
            let url = self.url_for(date);
            debug!(%date, %url, "requesting exchange feed");

            let request = HttpRequest::get(url)
                .with_header("accept", "text/csv")
                .with_timeout_ms(self.timeout_ms);
            let response = self.http_client.execute(request).await.map_err(|error| {
                AcquireError::FetchTransport {
                    date,
                    message: error.message().to_owned(),
                    retryable: error.retryable(),
                }
            })?;

            if !response.is_success() {
                return Err(AcquireError::FetchTransport {
                    date,
                    message: format!("exchange returned status {}", response.status),
                    retryable: response.status == 429 || response.status >= 500,
                });
            }

            let parsed = self.parser.parse(&response.body);
            debug!(%date, records = parsed.records.len(), "parsed exchange feed");
            Ok(parsed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpError, HttpResponse, ScriptedHttpClient};

    const ROW: &str = "\"2330\",\"TSMC\",\"100\",\"1\",\"1\",\"1\",\"1\",\"1\",\"590.00\"\n";

    fn date(value: &str) -> TradingDate {
        TradingDate::parse(value).expect("valid date")
    }

    #[test]
    fn builds_exchange_query_url() {
        let client = FeedClient::new(Arc::new(ScriptedHttpClient::new()), &FeedConfig::default());
        assert_eq!(
            client.url_for(date("20240105")),
            "https://www.twse.com.tw/exchangeReport/MI_INDEX?response=csv&date=20240105&type=ALLBUT0999"
        );
    }

    #[tokio::test]
    async fn parses_successful_response() {
        let http = ScriptedHttpClient::new().with_response("20240105", HttpResponse::ok(ROW));
        let client = FeedClient::new(Arc::new(http.clone()), &FeedConfig::default());

        let parsed = client
            .fetch_session(date("20240105"))
            .await
            .expect("fetch succeeds");

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(http.request_count(), 1);
    }

    #[tokio::test]
    async fn non_success_status_is_a_transport_error() {
        let http = ScriptedHttpClient::new().with_response("20240105", HttpResponse::with_status(503));
        let client = FeedClient::new(Arc::new(http), &FeedConfig::default());

        let err = client
            .fetch_session(date("20240105"))
            .await
            .expect_err("must fail");

        assert_eq!(err.code(), "acquire.fetch_transport");
        assert!(err.retryable());
    }

    #[tokio::test]
    async fn transport_failure_keeps_retryable_flag() {
        let http = ScriptedHttpClient::new()
            .with_error("20240105", HttpError::non_retryable("invalid request"));
        let client = FeedClient::new(Arc::new(http), &FeedConfig::default());

        let err = client
            .fetch_session(date("20240105"))
            .await
            .expect_err("must fail");

        assert!(matches!(
            err,
            AcquireError::FetchTransport {
                retryable: false,
                ..
            }
        ));
    }
}
