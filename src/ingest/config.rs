// src/ingest/config.rs
//! Keyword lists: inline in the main config, in a separate TOML/JSON file,
//! or comma-separated in `$KEYWORDS`.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;

pub const ENV_KEYWORDS: &str = "KEYWORDS";

/// Load keywords from a file. Supports TOML (`keywords = [...]`) or a JSON array.
pub fn load_keywords_from(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_keywords(&content, ext.as_str()).ok_or_else(|| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: "expected `keywords = [..]` (TOML) or a JSON array of strings".into(),
    })
}

/// `$KEYWORDS` split on commas; `None` when unset or blank.
pub fn keywords_from_env<F>(lookup: F) -> Option<Vec<String>>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let raw = lookup(ENV_KEYWORDS).ok()?;
    let list = split_keywords(&raw);
    (!list.is_empty()).then_some(list)
}

pub fn split_keywords(raw: &str) -> Vec<String> {
    clean_list(raw.split(',').map(str::to_string))
}

fn parse_keywords(s: &str, hint_ext: &str) -> Option<Vec<String>> {
    let try_toml = hint_ext == "toml" || s.contains("keywords");
    if try_toml {
        if let Some(v) = parse_toml(s) {
            return Some(v);
        }
    }
    if let Some(v) = parse_json(s) {
        return Some(v);
    }
    if !try_toml {
        return parse_toml(s);
    }
    None
}

fn parse_toml(s: &str) -> Option<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlKw {
        keywords: Vec<String>,
    }
    let v: TomlKw = toml::from_str(s).ok()?;
    Some(clean_list(v.keywords))
}

fn parse_json(s: &str) -> Option<Vec<String>> {
    let v: Vec<String> = serde_json::from_str(s).ok()?;
    Some(clean_list(v))
}

/// Trim, drop blanks, dedupe; sorted for stable `matched_keywords` order.
pub fn clean_list<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    use std::collections::BTreeSet;
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}
