// src/metrics.rs
use anyhow::{Context, Result};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};

/// One-time metric descriptions so series carry help text when rendered.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("digest_entries_total", "Feed entries seen by extraction.");
        describe_counter!(
            "digest_records_kept_total",
            "Entries kept after window and keyword filtering."
        );
        describe_counter!(
            "digest_entries_skipped_total",
            "Entries skipped, labelled by reason."
        );
        describe_counter!("digest_feed_errors_total", "Feed fetch/parse failures.");
        describe_counter!(
            "digest_merge_duplicates_total",
            "Records dropped by link dedup during merge."
        );
        describe_counter!(
            "digest_artifacts_skipped_total",
            "Artifacts that could not be read or parsed."
        );
        describe_counter!("digest_emails_sent_total", "Digests handed to a sink.");
    });
}

/// Prometheus recorder whose exposition is written to a file on `flush`,
/// for node_exporter's textfile collector. One-shot jobs have no scrape
/// window, so there is no HTTP listener.
pub struct MetricsTextfile {
    handle: PrometheusHandle,
    path: PathBuf,
}

impl MetricsTextfile {
    pub fn install(path: impl Into<PathBuf>) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self {
            handle,
            path: path.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn flush(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating metrics dir {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("prom.partial");
        fs::write(&tmp, self.render()).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("finalizing {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "metrics textfile written");
        Ok(())
    }
}
