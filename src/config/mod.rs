// src/config/mod.rs
//! Service configuration, loaded from TOML or JSON.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::event::FilterConfig;
use crate::ingest::providers::usgs::{DEFAULT_QUERY_URL, DEFAULT_SUMMARY_BASE};
use crate::ingest::FetchOptions;

pub const ENV_CONFIG_PATH: &str = "QUAKE_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/quake.toml";
pub const DEFAULT_JSON_PATH: &str = "config/quake.json";

fn default_summary_base() -> String {
    DEFAULT_SUMMARY_BASE.to_string()
}
fn default_query_url() -> String {
    DEFAULT_QUERY_URL.to_string()
}
fn default_pacing_ms() -> u64 {
    300
}
fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    #[serde(default = "default_summary_base")]
    pub summary_base_url: String,
    #[serde(default = "default_query_url")]
    pub query_url: String,
    /// Pause between chunk requests. 0 disables pacing.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub dedup_by_id: bool,
    #[serde(default)]
    pub default_filter: FilterConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            summary_base_url: default_summary_base(),
            query_url: default_query_url(),
            pacing_ms: default_pacing_ms(),
            request_timeout_secs: default_timeout_secs(),
            dedup_by_id: false,
            default_filter: FilterConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            pacing: Duration::from_millis(self.pacing_ms),
            dedup_by_id: self.dedup_by_id,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn sanitized(mut self) -> Self {
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_timeout_secs();
        }
        self.default_filter = self.default_filter.sanitized();
        self
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<ServiceConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading service config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing service config {}", path.display()))?;
    Ok(cfg.sanitized())
}

/// Load config using env var + fallbacks:
/// 1) $QUAKE_CONFIG_PATH
/// 2) config/quake.toml
/// 3) config/quake.json
/// 4) built-in defaults
pub fn load_default() -> Result<ServiceConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_from(&json_p);
    }
    Ok(ServiceConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<ServiceConfig> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    if hint_ext == "toml" {
        return Ok(toml::from_str(s)?);
    }
    // Unknown extension: try JSON, then TOML
    if let Ok(v) = serde_json::from_str(s) {
        return Ok(v);
    }
    toml::from_str(s).map_err(|e| anyhow!("unsupported service config format: {e}"))
}
