// tests/digest_job.rs
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use news_digest::jobs::{run_digest, DigestOptions};
use news_digest::merge::Retirement;
use news_digest::notify::{DigestSink, FileSink};
use news_digest::render::RenderOptions;

const RUN_1: &str = r#"{"Clarin": [{"title":"Sube el maiz","link":"http://a/1","published":"2024-01-01T08:00:00"}]}"#;
const RUN_2: &str = r#"{"Clarin": [{"title":"Sube el maiz","link":"http://a/1","published":"2024-01-01T08:00:00"}], "LaNacion": [{"title":"Trigo en baja","link":"http://b/1","published":"2024-01-01T09:00:00"}]}"#;

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

#[async_trait]
impl DigestSink for RecordingSink {
    async fn send(&self, subject: &str, html: &str) -> Result<()> {
        if self.fail {
            bail!("smtp unavailable");
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), html.to_string()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(7, 0, 0)
        .unwrap()
}

fn opts(dir: &Path, retire: Retirement) -> DigestOptions {
    DigestOptions {
        dir: dir.to_path_buf(),
        prefix: "RSS_FEEDS_".into(),
        label: "the last day".into(),
        subject_prefix: "Agro Digest".into(),
        render: RenderOptions::default(),
        retire,
    }
}

fn seed(dir: &Path) {
    fs::write(dir.join("RSS_FEEDS_2024_01_01__08_00_00.json"), RUN_1).unwrap();
    fs::write(dir.join("RSS_FEEDS_2024_01_01__09_00_00.json"), RUN_2).unwrap();
}

#[tokio::test]
async fn sends_one_digest_and_archives_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let archive = dir.path().join("sent");
    let sink = RecordingSink::default();

    let report = run_digest(&sink, &opts(dir.path(), Retirement::MoveTo(archive.clone())), now())
        .await
        .unwrap();

    assert!(report.sent);
    assert_eq!(report.retired, 2);
    assert_eq!(report.subject.as_deref(), Some("Agro Digest 02/01/2024"));

    let sent = sink.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Agro Digest 02/01/2024");
    assert_eq!(sent[0].1.matches("<li>").count(), 2);

    assert!(archive.join("RSS_FEEDS_2024_01_01__08_00_00.json").exists());
    assert!(!dir.path().join("RSS_FEEDS_2024_01_01__08_00_00.json").exists());
}

#[tokio::test]
async fn zero_records_never_calls_sink() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("RSS_FEEDS_2024_01_01__08_00_00.json"), "{}").unwrap();
    let sink = RecordingSink::default();

    let report = run_digest(&sink, &opts(dir.path(), Retirement::Delete), now())
        .await
        .unwrap();

    assert!(!report.sent);
    assert_eq!(report.retired, 0);
    assert!(sink.sent.lock().unwrap().is_empty());
    assert!(dir.path().join("RSS_FEEDS_2024_01_01__08_00_00.json").exists());
}

#[tokio::test]
async fn failed_send_keeps_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let sink = RecordingSink {
        fail: true,
        ..Default::default()
    };

    let res = run_digest(&sink, &opts(dir.path(), Retirement::Delete), now()).await;
    assert!(res.is_err());
    assert!(dir.path().join("RSS_FEEDS_2024_01_01__08_00_00.json").exists());
    assert!(dir.path().join("RSS_FEEDS_2024_01_01__09_00_00.json").exists());
}

#[tokio::test]
async fn malformed_artifacts_are_left_in_place() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let bad = dir.path().join("RSS_FEEDS_2024_01_01__10_00_00.json");
    fs::write(&bad, "{ broken").unwrap();
    let sink = RecordingSink::default();

    let report = run_digest(&sink, &opts(dir.path(), Retirement::Delete), now())
        .await
        .unwrap();
    assert_eq!(report.retired, 2);
    assert_eq!(report.summary.artifacts_skipped, 1);
    assert!(bad.exists());
    assert!(!dir.path().join("RSS_FEEDS_2024_01_01__09_00_00.json").exists());
}

#[tokio::test]
async fn file_sink_writes_preview() {
    let dir = tempfile::tempdir().unwrap();
    let arts = dir.path().join("artifacts");
    fs::create_dir_all(&arts).unwrap();
    seed(&arts);
    let out = dir.path().join("preview").join("digest.html");
    let sink = FileSink::new(&out);

    let report = run_digest(&sink, &opts(&arts, Retirement::Keep), now())
        .await
        .unwrap();
    assert!(report.sent);
    assert_eq!(report.retired, 0);

    let html = fs::read_to_string(&out).unwrap();
    assert!(html.contains("<h3>LaNacion</h3>"));
    assert!(arts.join("RSS_FEEDS_2024_01_01__08_00_00.json").exists());
}
