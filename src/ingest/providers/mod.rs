// src/ingest/providers/mod.rs
pub mod feed;
pub mod rss;

pub use feed::{build_http_client, FeedSourceProvider};
pub use rss::{parse_feed, parse_feed_date};
