// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod artifact;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod jobs;
pub mod merge;
pub mod metrics;
pub mod notify;
pub mod render;

// ---- Re-exports for stable public API ----
pub use crate::artifact::{NewsRecord, SourceGroup};
pub use crate::error::ConfigError;
pub use crate::ingest::{extract, match_keywords, normalize_text};
pub use crate::merge::{merge_artifacts, MergeSummary};
pub use crate::render::{render_digest, strip_generated_line};
