//! Command-line interface definitions.
//!
//! Every subcommand reads the same configuration file; flags override the
//! file for the run they are given on.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::ingest::window::Lookback;
use crate::merge::Retirement;

/// Keyword-filtered feed harvesting and an emailed digest.
///
/// ```sh
/// # hourly
/// news-digest scrape --since-hours 1.5
/// # daily
/// news-digest digest artifacts --retire-to artifacts/sent
/// ```
#[derive(Parser, Debug)]
#[command(name = "news-digest", author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML or JSON configuration file
    #[arg(short, long, global = true, env = "NEWS_DIGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write Prometheus exposition text to this file on exit
    #[arg(long, global = true, env = "NEWS_DIGEST_METRICS_TEXTFILE")]
    pub metrics_textfile: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch feeds, keep keyword matches inside the window, write one artifact.
    Scrape(ScrapeArgs),

    /// Merge artifacts from a directory into one deduplicated JSON file.
    Merge(MergeArgs),

    /// Merge artifacts, render the HTML digest and send it.
    Digest(DigestArgs),
}

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Feed URL to fetch instead of the configured feeds (repeatable)
    #[arg(long = "feed-url", value_name = "URL")]
    pub feed_urls: Vec<String>,

    /// Source label for feeds given with --feed-url
    #[arg(long, requires = "feed_urls")]
    pub label: Option<String>,

    /// Lookback in whole days
    #[arg(long, conflicts_with = "since_hours")]
    pub since_days: Option<u32>,

    /// Lookback in (fractional) hours
    #[arg(long)]
    pub since_hours: Option<f64>,

    /// Artifact path; defaults to {output.dir}/{prefix}{timestamp}.json
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Exit successfully even when some feeds failed
    #[arg(long)]
    pub allow_feed_errors: bool,
}

impl ScrapeArgs {
    /// `None` when neither flag was given, so configuration decides.
    pub fn lookback(&self) -> Result<Option<Lookback>, ConfigError> {
        match (self.since_days, self.since_hours) {
            (Some(_), Some(_)) => Err(ConfigError::Conflict(
                "--since-days and --since-hours are mutually exclusive".into(),
            )),
            (Some(d), None) => Lookback::days(d).map(Some),
            (None, Some(h)) => Lookback::hours(h).map(Some),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Directory holding batch artifacts
    pub dir: PathBuf,

    /// Artifact file name prefix; defaults to output.prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Consolidated JSON output path
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct DigestArgs {
    /// Directory holding batch artifacts
    pub dir: PathBuf,

    /// Artifact file name prefix; defaults to output.prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Describes the covered period in the digest body
    #[arg(long)]
    pub label: Option<String>,

    /// Write the HTML to this file instead of sending email
    #[arg(long)]
    pub html_out: Option<PathBuf>,

    /// Move merged artifacts here after a successful send
    #[arg(long, conflicts_with = "delete_artifacts")]
    pub retire_to: Option<PathBuf>,

    /// Delete merged artifacts after a successful send
    #[arg(long)]
    pub delete_artifacts: bool,
}

impl DigestArgs {
    pub fn retirement(&self) -> Retirement {
        match (&self.retire_to, self.delete_artifacts) {
            (Some(dir), _) => Retirement::MoveTo(dir.clone()),
            (None, true) => Retirement::Delete,
            (None, false) => Retirement::Keep,
        }
    }
}
