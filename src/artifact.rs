// src/artifact.rs
//! Batch artifacts: one JSON object per extraction run, keyed by source label.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_ARTIFACT_PREFIX: &str = "RSS_FEEDS_";
const FILE_STAMP: &str = "%Y_%m_%d__%H_%M_%S";

/// One matched article. `link` is the identity key across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    #[serde(default)]
    pub title: String,
    pub link: String,
    pub published: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_keywords: Vec<String>,
}

/// Source label -> records. Keys iterate in lexicographic order.
pub type SourceGroup = BTreeMap<String, Vec<NewsRecord>>;

pub fn record_count(group: &SourceGroup) -> usize {
    group.values().map(Vec::len).sum()
}

/// `{prefix}2024_01_01__08_00_00.json`
pub fn artifact_file_name(prefix: &str, stamp: NaiveDateTime) -> String {
    numbered_artifact_file_name(prefix, stamp, 0)
}

/// Same-second batches get `_001`, `_002`... after the stamp; they still sort
/// after the unnumbered one.
pub fn numbered_artifact_file_name(prefix: &str, stamp: NaiveDateTime, n: u32) -> String {
    if n == 0 {
        format!("{prefix}{}.json", stamp.format(FILE_STAMP))
    } else {
        format!("{prefix}{}_{n:03}.json", stamp.format(FILE_STAMP))
    }
}

const MAX_SAME_STAMP: u32 = 1000;
static PARTIAL_SEQ: AtomicU64 = AtomicU64::new(0);

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir).with_context(|| format!("creating artifact dir {}", dir.display()))
}

/// Write `json` to a temporary file in `dir`, unique per process and call.
fn write_partial(dir: &Path, json: &str) -> Result<PathBuf> {
    let seq = PARTIAL_SEQ.fetch_add(1, Ordering::Relaxed);
    let tmp = dir.join(format!(".batch.{}.{seq}.json.partial", std::process::id()));
    fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    Ok(tmp)
}

fn log_written(path: &Path, group: &SourceGroup) {
    tracing::info!(
        path = %path.display(),
        sources = group.len(),
        records = record_count(group),
        "batch artifact written"
    );
}

/// Serialize a batch to pretty JSON at `path`, replacing any existing file.
/// Parent directories are created, and the file is written under a temporary
/// name and renamed so readers never see a half-written artifact.
pub fn write_batch(path: &Path, group: &SourceGroup) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    ensure_dir(dir)?;
    let json = serde_json::to_string_pretty(group).context("serializing batch")?;

    let tmp = write_partial(dir, &json)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("finalizing {}", path.display()));
    }
    log_written(path, group);
    Ok(())
}

/// Write a batch under a fresh `{prefix}{stamp}` name in `dir` and return
/// its path. An existing artifact is never replaced: concurrent runs that
/// share a stamp get numbered names instead.
pub fn write_new_batch(
    dir: &Path,
    prefix: &str,
    stamp: NaiveDateTime,
    group: &SourceGroup,
) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let json = serde_json::to_string_pretty(group).context("serializing batch")?;
    let tmp = write_partial(dir, &json)?;

    let mut claimed = None;
    for n in 0..MAX_SAME_STAMP {
        let path = dir.join(numbered_artifact_file_name(prefix, stamp, n));
        // hard_link fails when the target exists, so the name is claimed atomically
        match fs::hard_link(&tmp, &path) {
            Ok(()) => {
                claimed = Some(path);
                break;
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                return Err(e).with_context(|| format!("finalizing {}", path.display()));
            }
        }
    }
    let _ = fs::remove_file(&tmp);

    let path = claimed.with_context(|| {
        format!(
            "more than {MAX_SAME_STAMP} artifacts share stamp {} in {}",
            stamp.format(FILE_STAMP),
            dir.display()
        )
    })?;
    log_written(&path, group);
    Ok(path)
}

/// Outcome of reading one artifact leniently.
#[derive(Debug, Default)]
pub struct LoadedArtifact {
    pub group: SourceGroup,
    /// Records that were present but did not deserialize.
    pub bad_records: usize,
}

/// Read an artifact. The file must be a JSON object of arrays; individual
/// records that fail to deserialize are dropped and counted instead of
/// failing the whole file.
pub fn read_artifact(path: &Path) -> Result<LoadedArtifact> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_artifact(&raw).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_artifact(raw: &str) -> Result<LoadedArtifact> {
    let loose: BTreeMap<String, Vec<serde_json::Value>> = serde_json::from_str(raw)?;

    let mut out = LoadedArtifact::default();
    for (source, values) in loose {
        let mut records = Vec::with_capacity(values.len());
        for v in values {
            match serde_json::from_value::<NewsRecord>(v) {
                Ok(r) => records.push(r),
                Err(e) => {
                    tracing::warn!(%source, error = %e, "skipping malformed record");
                    out.bad_records += 1;
                }
            }
        }
        out.group.insert(source, records);
    }
    Ok(out)
}
