// src/ingest/providers/feed.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::ingest::providers::rss::parse_feed;
use crate::ingest::types::{FeedProvider, ParsedFeed};

pub const DEFAULT_USER_AGENT: &str = concat!("news-digest/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for all feeds of one run.
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
        .build()
        .context("building http client")
}

/// One configured feed, fetched over HTTP or served from an in-memory document.
pub struct FeedSourceProvider {
    name: String,
    label: Option<String>,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl FeedSourceProvider {
    pub fn from_url(url: impl Into<String>, client: reqwest::Client) -> Self {
        let url = url.into();
        Self {
            name: url.clone(),
            label: None,
            mode: Mode::Http { url, client },
        }
    }

    pub fn from_fixture(name: impl Into<String>, xml: &str) -> Self {
        Self {
            name: name.into(),
            label: None,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label.filter(|l| !l.trim().is_empty());
        self
    }
}

#[async_trait]
impl FeedProvider for FeedSourceProvider {
    async fn fetch_feed(&self) -> Result<ParsedFeed> {
        match &self.mode {
            Mode::Fixture(xml) => parse_feed(xml).with_context(|| format!("parsing {}", self.name)),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("GET {url}"))?
                    .error_for_status()
                    .with_context(|| format!("GET {url}"))?;
                let body = resp.text().await.with_context(|| format!("reading body of {url}"))?;
                parse_feed(&body).with_context(|| format!("parsing {url}"))
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}
