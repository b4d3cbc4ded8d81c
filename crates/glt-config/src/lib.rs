//! glt-config
//!
//! Tracker configuration: poll cadence, route selection, feed endpoint
//! and overlay asset paths. Loaded from a JSON file; the MBTA API key is
//! read from the environment only and must never appear in the config
//! file or in logs.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Poll cadence bounds. The MBTA feed refreshes roughly every 10s;
/// polling faster burns quota for identical data, polling slower than a
/// minute makes the map visibly stale.
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;
pub const MAX_POLL_INTERVAL_SECS: u64 = 60;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_API_BASE_URL: &str = "http://realtime.mbta.com/developer/api/v2";
const DEFAULT_API_KEY_ENV: &str = "MBTA_API_KEY";

/// Green Line surface branches (B, C, D) as v2 route ids.
fn default_route_ids() -> Vec<String> {
    vec!["810_".to_string(), "813_".to_string(), "823_".to_string()]
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

/// Effective tracker configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// Seconds between reconciliation cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Route ids passed to `predictionsbyroutes`.
    #[serde(default = "default_route_ids")]
    pub route_ids: Vec<String>,

    /// Feed endpoint; overridable for tests against a mock server.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Optional bundled polyline CSV for the route overlay.
    #[serde(default)]
    pub route_csv: Option<PathBuf>,

    /// Optional bundled station CSV for the route overlay.
    #[serde(default)]
    pub stations_csv: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            route_ids: default_route_ids(),
            api_base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
            route_csv: None,
            stations_csv: None,
        }
    }
}

impl TrackerConfig {
    /// Load and validate a config file.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&raw)
    }

    /// Parse and validate config from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let json: Value = serde_json::from_str(raw).context("config is not valid JSON")?;
        reject_inline_secrets(&json)?;
        let cfg: TrackerConfig =
            serde_json::from_value(json).context("config has an invalid shape")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate field constraints. Called by the loaders; call it
    /// directly when building a config in code.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_seconds < MIN_POLL_INTERVAL_SECS
            || self.poll_interval_seconds > MAX_POLL_INTERVAL_SECS
        {
            bail!(
                "poll_interval_seconds={} out of range [{MIN_POLL_INTERVAL_SECS}, {MAX_POLL_INTERVAL_SECS}]",
                self.poll_interval_seconds
            );
        }
        if self.route_ids.is_empty() {
            bail!("route_ids must not be empty");
        }
        if self.route_ids.iter().any(|r| r.trim().is_empty()) {
            bail!("route_ids must not contain blank entries");
        }
        if self.api_base_url.trim().is_empty() {
            bail!("api_base_url must not be empty");
        }
        Ok(())
    }

    /// Read the API key from the configured environment variable.
    ///
    /// The returned value must never be logged.
    pub fn api_key(&self) -> Result<String> {
        let key = std::env::var(&self.api_key_env).with_context(|| {
            format!(
                "API key environment variable '{}' is not set",
                self.api_key_env
            )
        })?;
        if key.trim().is_empty() {
            bail!("API key environment variable '{}' is empty", self.api_key_env);
        }
        Ok(key)
    }
}

/// The key lives in the environment, not the file. Fail closed if a
/// config tries to embed one under any nesting.
fn reject_inline_secrets(json: &Value) -> Result<()> {
    fn walk(v: &Value) -> Option<&str> {
        match v {
            Value::Object(map) => {
                for (k, child) in map {
                    if k.eq_ignore_ascii_case("api_key") {
                        return Some("api_key");
                    }
                    if let Some(hit) = walk(child) {
                        return Some(hit);
                    }
                }
                None
            }
            Value::Array(items) => items.iter().find_map(walk),
            _ => None,
        }
    }

    if let Some(field) = walk(json) {
        bail!("config must not embed '{field}'; set it via the environment instead");
    }
    Ok(())
}
