// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Body-bearing fields an entry may carry, probed in [`BODY_PREFERENCE`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyField {
    /// RSS `content:encoded` or Atom `<content>`.
    Content,
    /// RSS `<description>`.
    Description,
    /// Atom `<summary>`.
    Summary,
}

pub const BODY_PREFERENCE: [BodyField; 3] =
    [BodyField::Content, BodyField::Description, BodyField::Summary];

/// One entry as delivered by the feed parser. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
}

impl FeedEntry {
    pub fn body_field(&self, field: BodyField) -> Option<&str> {
        match field {
            BodyField::Content => self.content.as_deref(),
            BodyField::Description => self.description.as_deref(),
            BodyField::Summary => self.summary.as_deref(),
        }
    }

    /// First present body field in preference order, or `""`.
    /// Fields are never concatenated.
    pub fn body_text(&self) -> &str {
        BODY_PREFERENCE
            .iter()
            .find_map(|f| self.body_field(*f))
            .unwrap_or_default()
    }
}

/// A parsed feed: channel title plus entries in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<FeedEntry>,
}

#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch_feed(&self) -> Result<ParsedFeed>;

    /// Identifier used in logs and as the last-resort source label (usually the URL).
    fn name(&self) -> &str;

    /// Operator-configured source label, if any.
    fn label(&self) -> Option<&str> {
        None
    }
}
