// tests/merge_e2e.rs
//! Two-run scenario: an hourly run repeats a story and adds a new source.

use news_digest::jobs::run_merge;
use news_digest::merge::{collect_artifact_paths, merge_artifacts};
use std::fs;

const RUN_1: &str = r#"{"Clarin": [{"title":"Sube el maiz","link":"http://a/1","published":"2024-01-01T08:00:00"}]}"#;
const RUN_2: &str = r#"{"Clarin": [{"title":"Sube el maiz","link":"http://a/1","published":"2024-01-01T08:00:00"}], "LaNacion": [{"title":"Trigo en baja","link":"http://b/1","published":"2024-01-01T09:00:00"}]}"#;

#[test]
fn clarin_and_lanacion_each_keep_one_record() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("RSS_FEEDS_2024_01_01__08_00_00.json"), RUN_1).unwrap();
    fs::write(dir.path().join("RSS_FEEDS_2024_01_01__09_00_00.json"), RUN_2).unwrap();

    let paths = collect_artifact_paths(dir.path(), "RSS_FEEDS_").unwrap();
    let out = merge_artifacts(&paths);

    assert_eq!(out.digest.len(), 2);
    assert_eq!(out.digest["Clarin"].len(), 1);
    assert_eq!(out.digest["Clarin"][0].link, "http://a/1");
    assert_eq!(out.digest["LaNacion"].len(), 1);
    assert_eq!(out.digest["LaNacion"][0].link, "http://b/1");

    assert_eq!(out.summary.artifacts_read, 2);
    assert_eq!(out.summary.records_seen, 3);
    assert_eq!(out.summary.records_kept, 2);
    assert_eq!(out.summary.duplicates_dropped, 1);
}

#[test]
fn merge_job_writes_consolidated_file() {
    let dir = tempfile::tempdir().unwrap();
    let arts = dir.path().join("artifacts");
    fs::create_dir_all(&arts).unwrap();
    fs::write(arts.join("RSS_FEEDS_2024_01_01__08_00_00.json"), RUN_1).unwrap();
    fs::write(arts.join("RSS_FEEDS_2024_01_01__09_00_00.json"), RUN_2).unwrap();

    let output = dir.path().join("merged").join("digest.json");
    let (digest, summary) = run_merge(&arts, "RSS_FEEDS_", &output).unwrap();
    assert_eq!(summary.records_kept, 2);

    let back = news_digest::artifact::read_artifact(&output).unwrap();
    assert_eq!(back.group, digest);

    // merging the consolidated file again changes nothing
    let again = merge_artifacts(&[output.clone(), output]);
    assert_eq!(again.digest, digest);
}
