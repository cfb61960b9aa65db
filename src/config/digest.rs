// src/config/digest.rs
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::artifact::DEFAULT_ARTIFACT_PREFIX;
use crate::error::ConfigError;
use crate::ingest::config::{clean_list, keywords_from_env, load_keywords_from};
use crate::ingest::providers::feed::DEFAULT_USER_AGENT;
use crate::ingest::window::{Lookback, TimePolicy};

pub const ENV_CONFIG_PATH: &str = "NEWS_DIGEST_CONFIG";
pub const DEFAULT_CONFIG_TOML: &str = "config/digest.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/digest.json";

fn default_output_dir() -> PathBuf {
    PathBuf::from("artifacts")
}
fn default_prefix() -> String {
    DEFAULT_ARTIFACT_PREFIX.to_string()
}
fn default_heading() -> String {
    "News Digest".to_string()
}
fn default_label() -> String {
    "the last period".to_string()
}
fn default_footer() -> String {
    "This email was generated automatically.".to_string()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub url: String,
    /// Overrides the channel title as the grouping key.
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowCfg {
    pub days: Option<u32>,
    pub hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputCfg {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for OutputCfg {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            prefix: default_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestCfg {
    #[serde(default = "default_heading")]
    pub heading: String,
    /// Defaults to `heading` when absent.
    #[serde(default)]
    pub subject_prefix: Option<String>,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default = "default_footer")]
    pub footer: String,
}

impl Default for DigestCfg {
    fn default() -> Self {
        Self {
            heading: default_heading(),
            subject_prefix: None,
            label: default_label(),
            footer: default_footer(),
        }
    }
}

impl DigestCfg {
    pub fn subject_prefix(&self) -> &str {
        self.subject_prefix.as_deref().unwrap_or(&self.heading)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpCfg {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Everything an extraction or digest run needs besides secrets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DigestConfig {
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Extra keywords file (TOML or JSON), merged with `keywords`.
    #[serde(default)]
    pub keywords_file: Option<PathBuf>,
    #[serde(default)]
    pub feeds: Vec<FeedSource>,
    #[serde(default)]
    pub window: WindowCfg,
    #[serde(default)]
    pub time_policy: TimePolicy,
    #[serde(default)]
    pub output: OutputCfg,
    #[serde(default)]
    pub digest: DigestCfg,
    #[serde(default)]
    pub http: HttpCfg,
}

impl DigestConfig {
    /// Load from an explicit path. TOML or JSON by extension.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed: Result<Self, String> = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str(&content).map_err(|e| e.to_string())
        };
        let mut cfg = parsed.map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;

        if let Some(kw_path) = cfg.keywords_file.clone() {
            let kw_path = match path.parent() {
                Some(base) if kw_path.is_relative() && !kw_path.exists() => base.join(kw_path),
                _ => kw_path,
            };
            let extra = load_keywords_from(&kw_path)?;
            cfg.keywords.extend(extra);
        }
        cfg.keywords = clean_list(std::mem::take(&mut cfg.keywords));
        Ok(cfg)
    }

    /// Resolution order:
    /// 1) explicit path
    /// 2) $NEWS_DIGEST_CONFIG
    /// 3) config/digest.toml
    /// 4) config/digest.json
    /// 5) built-in defaults (no feeds, no keywords)
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(p) = explicit {
            return Self::load_from(p);
        }
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(ConfigError::MissingPath(ENV_CONFIG_PATH.into()));
        }
        for candidate in [DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_JSON] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// `$KEYWORDS` replaces the file's list when set and non-blank.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        if let Some(list) = keywords_from_env(lookup) {
            tracing::info!(count = list.len(), "keywords taken from environment");
            self.keywords = list;
        }
    }

    pub fn lookback(&self) -> Result<Lookback, ConfigError> {
        if self.window.days.is_some() && self.window.hours.is_some() {
            tracing::warn!("both window.days and window.hours set; hours take precedence");
        }
        Lookback::resolve(self.window.days, self.window.hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let cfg: DigestConfig = toml::from_str(r#"keywords = ["maiz"]"#).unwrap();
        assert_eq!(cfg.output.prefix, "RSS_FEEDS_");
        assert_eq!(cfg.time_policy, TimePolicy::Utc);
        assert_eq!(cfg.digest.subject_prefix(), "News Digest");
        assert_eq!(cfg.lookback().unwrap(), Lookback::Days(1));
    }

    #[test]
    fn hours_win_over_days_in_file() {
        let cfg: DigestConfig = toml::from_str("[window]\ndays = 3\nhours = 1.5\n").unwrap();
        assert_eq!(cfg.lookback().unwrap(), Lookback::Hours(1.5));
    }

    #[test]
    fn env_keywords_replace_file_keywords() {
        let mut cfg = DigestConfig {
            keywords: vec!["maiz".into()],
            ..Default::default()
        };
        cfg.apply_env(|_| Ok("soja,trigo".to_string()));
        assert_eq!(cfg.keywords, vec!["soja".to_string(), "trigo".into()]);
    }
}
