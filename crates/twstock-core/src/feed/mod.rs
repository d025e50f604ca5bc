//! Exchange feed retrieval and parsing.

pub mod client;
pub mod parser;
pub mod schema;

pub use client::{FeedClient, SessionFetcher};
pub use parser::{decode_feed, parse, FeedParser, ParsedFeed};
pub use schema::FeedSchema;
