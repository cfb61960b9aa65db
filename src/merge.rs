// src/merge.rs
//! Consolidation of batch artifacts into one digest, deduplicated by link.

use anyhow::{Context, Result};
use metrics::counter;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::artifact::{read_artifact, record_count, SourceGroup};

/// Links already placed in the digest. Lives for one merge call only.
#[derive(Debug, Default)]
pub struct SeenLinks(HashSet<String>);

impl SeenLinks {
    /// `true` the first time a link is offered.
    pub fn insert(&mut self, link: &str) -> bool {
        if self.0.contains(link) {
            return false;
        }
        self.0.insert(link.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub artifacts_read: usize,
    pub artifacts_skipped: usize,
    pub records_seen: usize,
    pub records_kept: usize,
    pub duplicates_dropped: usize,
}

#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub digest: SourceGroup,
    pub summary: MergeSummary,
    /// Artifacts that were read successfully, in processing order.
    pub merged_paths: Vec<PathBuf>,
}

/// Fold groups into `digest` in order. First occurrence of a link wins,
/// regardless of source label. Buckets are only created on append.
fn absorb_group(
    digest: &mut SourceGroup,
    seen: &mut SeenLinks,
    group: SourceGroup,
    summary: &mut MergeSummary,
) {
    for (source, records) in group {
        for rec in records {
            summary.records_seen += 1;
            if seen.insert(&rec.link) {
                digest.entry(source.clone()).or_default().push(rec);
            } else {
                summary.duplicates_dropped += 1;
                tracing::trace!(%source, link = %rec.link, "duplicate dropped");
            }
        }
    }
}

fn sort_buckets(digest: &mut SourceGroup) {
    for records in digest.values_mut() {
        records.sort_by_key(|r| r.published);
    }
}

/// Merge in-memory groups. Used by `merge_artifacts` and directly by tests.
pub fn merge_groups<I>(groups: I) -> (SourceGroup, MergeSummary)
where
    I: IntoIterator<Item = SourceGroup>,
{
    let mut digest = SourceGroup::new();
    let mut seen = SeenLinks::default();
    let mut summary = MergeSummary::default();
    for g in groups {
        absorb_group(&mut digest, &mut seen, g, &mut summary);
    }
    sort_buckets(&mut digest);
    summary.records_kept = record_count(&digest);
    (digest, summary)
}

/// Merge artifact files in the given order. Unreadable or malformed files
/// are logged and skipped; they never abort the merge.
pub fn merge_artifacts(paths: &[PathBuf]) -> MergeOutcome {
    crate::metrics::ensure_metrics_described();

    let mut out = MergeOutcome::default();
    let mut seen = SeenLinks::default();

    for path in paths {
        let loaded = match read_artifact(path) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "skipping artifact");
                counter!("digest_artifacts_skipped_total").increment(1);
                out.summary.artifacts_skipped += 1;
                continue;
            }
        };
        if loaded.bad_records > 0 {
            tracing::warn!(
                path = %path.display(),
                bad_records = loaded.bad_records,
                "artifact had malformed records"
            );
        }
        out.summary.artifacts_read += 1;
        out.merged_paths.push(path.clone());
        absorb_group(&mut out.digest, &mut seen, loaded.group, &mut out.summary);
    }

    sort_buckets(&mut out.digest);
    out.summary.records_kept = record_count(&out.digest);
    counter!("digest_merge_duplicates_total").increment(out.summary.duplicates_dropped as u64);

    tracing::info!(
        artifacts = out.summary.artifacts_read,
        skipped = out.summary.artifacts_skipped,
        seen = out.summary.records_seen,
        kept = out.summary.records_kept,
        duplicates = out.summary.duplicates_dropped,
        sources = out.digest.len(),
        "merge finished"
    );
    out
}

/// Artifact files in `dir` named `{prefix}*.json`, sorted by file name.
pub fn collect_artifact_paths(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("listing artifacts in {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("listing artifacts in {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".json"));
        if matches {
            paths.push(path);
        }
    }
    paths.sort();
    tracing::debug!(dir = %dir.display(), count = paths.len(), "artifacts discovered");
    Ok(paths)
}

/// What happens to merged artifacts after a successful send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Retirement {
    #[default]
    Keep,
    MoveTo(PathBuf),
    Delete,
}

/// Apply `how` to each path. Returns how many files were retired.
pub fn retire_artifacts(paths: &[PathBuf], how: &Retirement) -> Result<usize> {
    match how {
        Retirement::Keep => Ok(0),
        Retirement::MoveTo(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating archive dir {}", dir.display()))?;
            for p in paths {
                let Some(name) = p.file_name() else { continue };
                let dest = dir.join(name);
                fs::rename(p, &dest).with_context(|| {
                    format!("moving {} to {}", p.display(), dest.display())
                })?;
                tracing::debug!(from = %p.display(), to = %dest.display(), "artifact archived");
            }
            tracing::info!(count = paths.len(), dir = %dir.display(), "artifacts archived");
            Ok(paths.len())
        }
        Retirement::Delete => {
            for p in paths {
                fs::remove_file(p).with_context(|| format!("deleting {}", p.display()))?;
            }
            tracing::info!(count = paths.len(), "artifacts deleted");
            Ok(paths.len())
        }
    }
}
