// src/jobs.rs
//! The three runnable flows: scrape feeds into an artifact, merge artifacts
//! into one file, and merge + render + send a digest.

use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

use crate::artifact::{record_count, write_batch, write_new_batch, SourceGroup};
use crate::error::ConfigError;
use crate::ingest::types::FeedProvider;
use crate::ingest::window::TimeWindow;
use crate::ingest::{run_once, ExtractStats, FeedFailure};
use crate::merge::{
    collect_artifact_paths, merge_artifacts, retire_artifacts, MergeSummary, Retirement,
};
use crate::notify::DigestSink;
use crate::render::{render_digest, RenderOptions};

/// Where a scrape writes its batch.
#[derive(Debug, Clone)]
pub enum ArtifactTarget {
    /// Exactly this file, replaced if present.
    Path(PathBuf),
    /// A new `{prefix}{window end}` artifact in `dir`, never replacing another.
    Dir { dir: PathBuf, prefix: String },
}

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub keywords: Vec<String>,
    pub window: TimeWindow,
    pub output: ArtifactTarget,
}

#[derive(Debug)]
pub struct ScrapeReport {
    pub output: PathBuf,
    pub stats: ExtractStats,
    pub sources: usize,
    pub records: usize,
    pub feeds_ok: usize,
    pub feed_errors: Vec<FeedFailure>,
}

impl ScrapeReport {
    /// Fail when any feed failed, unless failures are tolerated.
    pub fn ensure_feeds_ok(self, allow_feed_errors: bool) -> Result<Self> {
        if self.feed_errors.is_empty() || allow_feed_errors {
            return Ok(self);
        }
        let names: Vec<&str> = self.feed_errors.iter().map(|f| f.feed.as_str()).collect();
        bail!(
            "{} of {} feed(s) failed: {}",
            self.feed_errors.len(),
            self.feed_errors.len() + self.feeds_ok,
            names.join(", ")
        )
    }
}

/// Fetch, filter and write one batch artifact. The artifact is written even
/// when some feeds failed or nothing matched.
pub async fn run_scrape(
    providers: &[Box<dyn FeedProvider>],
    opts: &ScrapeOptions,
) -> Result<ScrapeReport> {
    if providers.is_empty() {
        return Err(ConfigError::Empty("no feeds configured".into()).into());
    }
    if opts.keywords.is_empty() {
        return Err(ConfigError::Empty("no keywords configured".into()).into());
    }
    tracing::info!(
        feeds = providers.len(),
        keywords = opts.keywords.len(),
        start = %opts.window.start,
        end = %opts.window.end,
        "scrape started"
    );

    let report = run_once(providers, &opts.keywords, &opts.window).await;
    let output = match &opts.output {
        ArtifactTarget::Path(path) => {
            write_batch(path, &report.batch)?;
            path.clone()
        }
        ArtifactTarget::Dir { dir, prefix } => {
            write_new_batch(dir, prefix, opts.window.end, &report.batch)?
        }
    };

    Ok(ScrapeReport {
        output,
        stats: report.stats,
        sources: report.batch.len(),
        records: record_count(&report.batch),
        feeds_ok: report.feeds_ok,
        feed_errors: report.feed_errors,
    })
}

/// Merge every artifact in `dir` and write the consolidated mapping.
pub fn run_merge(dir: &Path, prefix: &str, output: &Path) -> Result<(SourceGroup, MergeSummary)> {
    let paths = collect_artifact_paths(dir, prefix)?;
    let outcome = merge_artifacts(&paths);
    write_batch(output, &outcome.digest)?;
    Ok((outcome.digest, outcome.summary))
}

#[derive(Debug, Clone)]
pub struct DigestOptions {
    pub dir: PathBuf,
    pub prefix: String,
    pub label: String,
    pub subject_prefix: String,
    pub render: RenderOptions,
    pub retire: Retirement,
}

#[derive(Debug, Default)]
pub struct DigestReport {
    pub summary: MergeSummary,
    pub subject: Option<String>,
    pub sent: bool,
    pub retired: usize,
}

pub fn digest_subject(prefix: &str, now: NaiveDateTime) -> String {
    format!("{prefix} {}", now.format("%d/%m/%Y"))
}

/// Merge, render and hand the digest to `sink`. An empty digest is not sent.
/// Artifacts are retired only after the sink accepted the digest.
pub async fn run_digest(
    sink: &dyn DigestSink,
    opts: &DigestOptions,
    now: NaiveDateTime,
) -> Result<DigestReport> {
    let paths = collect_artifact_paths(&opts.dir, &opts.prefix)?;
    let outcome = merge_artifacts(&paths);

    let mut report = DigestReport {
        summary: outcome.summary,
        ..Default::default()
    };
    if outcome.summary.records_kept == 0 {
        tracing::info!(artifacts = paths.len(), "no new items to send");
        return Ok(report);
    }

    let html = render_digest(&outcome.digest, &opts.label, now, &opts.render);
    let subject = digest_subject(&opts.subject_prefix, now);
    sink.send(&subject, &html).await?;
    tracing::info!(sink = sink.name(), %subject, records = outcome.summary.records_kept, "digest delivered");
    report.subject = Some(subject);
    report.sent = true;

    report.retired = retire_artifacts(&outcome.merged_paths, &opts.retire)?;
    Ok(report)
}
