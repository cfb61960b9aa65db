//! news-digest binary entrypoint.
//! Parses the CLI, loads configuration and dispatches to one job.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_digest::cli::{Cli, Command, DigestArgs, MergeArgs, ScrapeArgs};
use news_digest::config::{DigestConfig, EmailConfig};
use news_digest::ingest::providers::{build_http_client, FeedSourceProvider};
use news_digest::ingest::types::FeedProvider;
use news_digest::ingest::window::TimeWindow;
use news_digest::jobs::{
    run_digest, run_merge, run_scrape, ArtifactTarget, DigestOptions, ScrapeOptions,
};
use news_digest::metrics::MetricsTextfile;
use news_digest::notify::{DigestSink, EmailSender, FileSink};
use news_digest::render::RenderOptions;

/// Compact logs by default; `NEWS_DIGEST_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_digest=info,warn"));

    let json = std::env::var("NEWS_DIGEST_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

async fn scrape(cfg: &DigestConfig, args: ScrapeArgs) -> Result<()> {
    let lookback = match args.lookback()? {
        Some(l) => l,
        None => cfg.lookback()?,
    };
    let client = build_http_client(cfg.http.timeout_secs, &cfg.http.user_agent)?;

    let providers: Vec<Box<dyn FeedProvider>> = if args.feed_urls.is_empty() {
        cfg.feeds
            .iter()
            .map(|f| {
                Box::new(
                    FeedSourceProvider::from_url(&f.url, client.clone()).with_label(f.label.clone()),
                ) as Box<dyn FeedProvider>
            })
            .collect()
    } else {
        args.feed_urls
            .iter()
            .map(|url| {
                Box::new(
                    FeedSourceProvider::from_url(url, client.clone()).with_label(args.label.clone()),
                ) as Box<dyn FeedProvider>
            })
            .collect()
    };

    let window = TimeWindow::current(lookback, cfg.time_policy)?;
    let output = match args.output {
        Some(path) => ArtifactTarget::Path(path),
        None => ArtifactTarget::Dir {
            dir: cfg.output.dir.clone(),
            prefix: cfg.output.prefix.clone(),
        },
    };
    let opts = ScrapeOptions {
        keywords: cfg.keywords.clone(),
        window,
        output,
    };

    let report = run_scrape(&providers, &opts)
        .await?
        .ensure_feeds_ok(args.allow_feed_errors)?;
    tracing::info!(
        path = %report.output.display(),
        processed = report.stats.entries,
        matched = report.records,
        sources = report.sources,
        feeds_failed = report.feed_errors.len(),
        "scrape done"
    );
    Ok(())
}

fn merge(cfg: &DigestConfig, args: MergeArgs) -> Result<()> {
    let prefix = args.prefix.as_deref().unwrap_or(&cfg.output.prefix);
    let (digest, summary) = run_merge(&args.dir, prefix, &args.output)?;
    tracing::info!(
        path = %args.output.display(),
        sources = digest.len(),
        merged = summary.records_kept,
        duplicates = summary.duplicates_dropped,
        "merge done"
    );
    Ok(())
}

async fn digest(cfg: &DigestConfig, args: DigestArgs) -> Result<()> {
    // Credentials are checked before anything is read or moved.
    let sink: Box<dyn DigestSink> = match &args.html_out {
        Some(path) => Box::new(FileSink::new(path)),
        None => Box::new(EmailSender::from_config(&EmailConfig::from_env()?)?),
    };

    let opts = DigestOptions {
        prefix: args
            .prefix
            .clone()
            .unwrap_or_else(|| cfg.output.prefix.clone()),
        label: args
            .label
            .clone()
            .unwrap_or_else(|| cfg.digest.label.clone()),
        subject_prefix: cfg.digest.subject_prefix().to_string(),
        render: RenderOptions {
            heading: cfg.digest.heading.clone(),
            footer: cfg.digest.footer.clone(),
        },
        retire: args.retirement(),
        dir: args.dir,
    };

    let report = run_digest(sink.as_ref(), &opts, cfg.time_policy.now()).await?;
    tracing::info!(
        sent = report.sent,
        merged = report.summary.records_kept,
        retired = report.retired,
        "digest done"
    );
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut cfg = DigestConfig::load(cli.config.as_deref())?;
    cfg.apply_env(|key| std::env::var(key));

    match cli.command {
        Command::Scrape(args) => scrape(&cfg, args).await,
        Command::Merge(args) => merge(&cfg, args),
        Command::Digest(args) => digest(&cfg, args).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let metrics = match cli.metrics_textfile.clone().map(MetricsTextfile::install) {
        Some(Ok(m)) => Some(m),
        Some(Err(e)) => {
            tracing::warn!(error = %format!("{e:#}"), "metrics disabled");
            None
        }
        None => None,
    };

    let result = run(cli).await;

    if let Some(m) = &metrics {
        if let Err(e) = m.flush() {
            tracing::warn!(error = %format!("{e:#}"), path = %m.path().display(), "metrics flush failed");
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run failed");
            ExitCode::FAILURE
        }
    }
}
