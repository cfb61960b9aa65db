// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod types;
pub mod window;

use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::artifact::{record_count, NewsRecord, SourceGroup};
use crate::ingest::types::{FeedEntry, FeedProvider};
use crate::ingest::window::TimeWindow;

/// Canonical form for substring matching: NFKD, drop anything without an
/// ASCII fallback, lowercase. Idempotent.
pub fn normalize_text(s: &str) -> String {
    s.nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Keywords whose normalized form occurs anywhere in the normalized corpus.
/// Substring containment only; the caller's spelling and order are kept.
pub fn match_keywords(corpus: &str, keywords: &[String]) -> Vec<String> {
    if corpus.is_empty() || keywords.is_empty() {
        return Vec::new();
    }
    let hay = normalize_text(corpus);
    let mut out: Vec<String> = Vec::new();
    for k in keywords {
        let needle = normalize_text(k);
        if needle.trim().is_empty() || !hay.contains(&needle) {
            continue;
        }
        if !out.contains(k) {
            out.push(k.clone());
        }
    }
    out
}

/// Decode entities and drop markup so keywords match the visible text only.
pub fn plain_text(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)<[^>]+>").unwrap());
    let stripped = re_tags.replace_all(s, " ");
    html_escape::decode_html_entities(&stripped).into_owned()
}

/// Per-batch skip accounting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub entries: usize,
    pub kept: usize,
    pub no_timestamp: usize,
    pub out_of_window: usize,
    pub no_match: usize,
}

impl ExtractStats {
    pub fn absorb(&mut self, other: ExtractStats) {
        self.entries += other.entries;
        self.kept += other.kept;
        self.no_timestamp += other.no_timestamp;
        self.out_of_window += other.out_of_window;
        self.no_match += other.no_match;
    }
}

pub fn extract(
    entries: &[FeedEntry],
    source_label: &str,
    window: &TimeWindow,
    keywords: &[String],
) -> Vec<NewsRecord> {
    extract_with_stats(entries, source_label, window, keywords).0
}

/// Turn one feed's entries into records, in feed order. Entries without a
/// timestamp, outside the window, or without a keyword hit are skipped.
pub fn extract_with_stats(
    entries: &[FeedEntry],
    source_label: &str,
    window: &TimeWindow,
    keywords: &[String],
) -> (Vec<NewsRecord>, ExtractStats) {
    let mut stats = ExtractStats {
        entries: entries.len(),
        ..Default::default()
    };
    let mut out = Vec::new();

    for entry in entries {
        let title = entry.title.as_deref().unwrap_or_default();

        let Some(published) = entry.published.map(|ts| window.localize(ts)) else {
            stats.no_timestamp += 1;
            tracing::trace!(source = source_label, title, "entry without date, skipped");
            continue;
        };

        if !window.contains(published) {
            stats.out_of_window += 1;
            tracing::trace!(source = source_label, title, %published, "outside window");
            continue;
        }

        let corpus = format!("{title} {}", plain_text(entry.body_text()));
        let matched = match_keywords(&corpus, keywords);
        if matched.is_empty() {
            stats.no_match += 1;
            tracing::trace!(source = source_label, title, "no match");
            continue;
        }

        tracing::debug!(source = source_label, title, keywords = ?matched, "match");
        out.push(NewsRecord {
            title: title.to_string(),
            link: entry.link.clone().unwrap_or_default(),
            published,
            matched_keywords: matched,
        });
    }

    stats.kept = out.len();
    counter!("digest_entries_total").increment(stats.entries as u64);
    counter!("digest_records_kept_total").increment(stats.kept as u64);
    counter!("digest_entries_skipped_total", "reason" => "no_timestamp")
        .increment(stats.no_timestamp as u64);
    counter!("digest_entries_skipped_total", "reason" => "out_of_window")
        .increment(stats.out_of_window as u64);
    counter!("digest_entries_skipped_total", "reason" => "no_match")
        .increment(stats.no_match as u64);

    (out, stats)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFailure {
    pub feed: String,
    pub error: String,
}

/// Everything one extraction run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub batch: SourceGroup,
    pub stats: ExtractStats,
    pub feeds_ok: usize,
    pub feed_errors: Vec<FeedFailure>,
}

/// Label precedence: configured label, channel title, provider name.
pub fn resolve_label(configured: Option<&str>, channel_title: Option<&str>, name: &str) -> String {
    configured
        .or(channel_title)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(name)
        .to_string()
}

/// Fetch every provider in order and extract into one batch. A failing feed
/// is recorded and logged; the remaining feeds still run.
pub async fn run_once(
    providers: &[Box<dyn FeedProvider>],
    keywords: &[String],
    window: &TimeWindow,
) -> RunReport {
    crate::metrics::ensure_metrics_described();

    let mut report = RunReport::default();
    for p in providers {
        let feed = match p.fetch_feed().await {
            Ok(feed) => feed,
            Err(e) => {
                tracing::error!(error = ?e, feed = p.name(), "feed fetch failed");
                counter!("digest_feed_errors_total").increment(1);
                report.feed_errors.push(FeedFailure {
                    feed: p.name().to_string(),
                    error: format!("{e:#}"),
                });
                continue;
            }
        };
        report.feeds_ok += 1;

        let label = resolve_label(p.label(), feed.title.as_deref(), p.name());
        tracing::info!(feed = p.name(), source = %label, entries = feed.entries.len(), "feed parsed");

        let (records, stats) = extract_with_stats(&feed.entries, &label, window, keywords);
        report.stats.absorb(stats);
        if !records.is_empty() {
            report.batch.entry(label).or_default().extend(records);
        }
    }

    tracing::info!(
        feeds_ok = report.feeds_ok,
        feeds_failed = report.feed_errors.len(),
        entries = report.stats.entries,
        kept = record_count(&report.batch),
        no_timestamp = report.stats.no_timestamp,
        out_of_window = report.stats.out_of_window,
        no_match = report.stats.no_match,
        "extraction run finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_accents_and_case() {
        assert_eq!(normalize_text("Café"), "cafe");
        assert_eq!(normalize_text("IMPORTACIÓN"), "importacion");
    }

    #[test]
    fn characters_without_ascii_fallback_are_dropped() {
        assert_eq!(normalize_text("a→b"), "ab");
        assert_eq!(normalize_text("日本 maíz"), " maiz");
    }

    #[test]
    fn plain_text_drops_tags_and_decodes() {
        assert_eq!(
            plain_text("<p>Sube el <b>ma&iacute;z</b></p>").trim(),
            "Sube el  maíz"
        );
    }

    #[test]
    fn label_precedence() {
        assert_eq!(resolve_label(Some("Clarín"), Some("Clarin RSS"), "u"), "Clarín");
        assert_eq!(resolve_label(None, Some(" Clarin RSS "), "u"), "Clarin RSS");
        assert_eq!(resolve_label(None, Some("  "), "https://x/rss"), "https://x/rss");
    }
}
