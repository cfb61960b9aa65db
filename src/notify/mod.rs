// src/notify/mod.rs
pub mod email;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;

pub use email::EmailSender;

/// Destination for a rendered digest.
#[async_trait]
pub trait DigestSink: Send + Sync {
    async fn send(&self, subject: &str, html: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Writes the HTML to a file instead of mailing it (dry run / preview).
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DigestSink for FileSink {
    async fn send(&self, subject: &str, html: &str) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        fs::write(&self.path, html)
            .with_context(|| format!("writing digest to {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), subject, "digest written to file");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
