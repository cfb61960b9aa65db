// tests/metrics_ingest.rs
use chrono::NaiveDate;
use news_digest::artifact::parse_artifact;
use news_digest::ingest::providers::FeedSourceProvider;
use news_digest::ingest::run_once;
use news_digest::ingest::types::FeedProvider;
use news_digest::ingest::window::{Lookback, TimePolicy, TimeWindow};
use news_digest::merge::merge_groups;
use news_digest::metrics::MetricsTextfile;
use std::fs;

const CLARIN_XML: &str = include_str!("fixtures/clarin_rss.xml");
const BROKEN_XML: &str = include_str!("fixtures/broken.xml");

#[tokio::test]
async fn metrics_textfile_after_scrape() {
    let dir = tempfile::tempdir().unwrap();
    let prom = dir.path().join("metrics").join("news_digest.prom");
    // one recorder per process; this binary installs it exactly once
    let metrics = MetricsTextfile::install(&prom).expect("recorder");

    let now = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let window = TimeWindow::ending_at(now, Lookback::Days(1), TimePolicy::Utc).unwrap();
    let providers: Vec<Box<dyn FeedProvider>> = vec![
        Box::new(FeedSourceProvider::from_fixture("clarin", CLARIN_XML)),
        Box::new(FeedSourceProvider::from_fixture("broken", BROKEN_XML)),
    ];
    let kws = vec!["trigo".to_string(), "maiz".to_string()];
    let report = run_once(&providers, &kws, &window).await;
    assert_eq!(report.stats.kept, 2);

    metrics.flush().expect("flush");
    let out = fs::read_to_string(&prom).unwrap();
    assert!(out.contains("digest_entries_total"));
    assert!(out.contains("digest_records_kept_total"));
    assert!(out.contains("digest_entries_skipped_total"));
    assert!(out.contains("reason=\"out_of_window\""));
    assert!(out.contains("digest_feed_errors_total"));
    assert_eq!(metrics.path(), prom.as_path());
}

#[test]
fn merge_groups_do_not_need_a_recorder() {
    let g = parse_artifact(r#"{"X": [{"title": "t", "link": "l", "published": "2024-01-01T00:00:00"}]}"#)
        .unwrap()
        .group;
    let (digest, _) = merge_groups([g.clone(), g]);
    assert_eq!(digest["X"].len(), 1);
}
