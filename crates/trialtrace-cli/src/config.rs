//! Configuration loading for trialtrace.
//! Reads trialtrace.toml from the current directory or path in
//! TRIALTRACE_CONFIG env var. A missing file yields the defaults, so the
//! tool works out of the box against the public registry.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base of the v2 JSON API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Base of the rendered study and history pages.
    #[serde(default = "default_page_base_url")]
    pub page_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url()  -> String { "https://clinicaltrials.gov/api/v2".to_string() }
fn default_page_base_url() -> String { "https://clinicaltrials.gov".to_string() }
fn default_timeout_secs()  -> u64    { 10 }

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            page_base_url: default_page_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Upper bound on trials fetched in full mode.
    #[serde(default = "default_full_cap")]
    pub full_cap: usize,
    /// Pause between consecutive trials.
    #[serde(default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,
}

fn default_full_cap()            -> usize { 1000 }
fn default_politeness_delay_ms() -> u64   { 500 }

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            full_cap: default_full_cap(),
            politeness_delay_ms: default_politeness_delay_ms(),
        }
    }
}

impl Config {
    /// Load configuration from trialtrace.toml.
    /// Checks TRIALTRACE_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("TRIALTRACE_CONFIG")
            .unwrap_or_else(|_| "trialtrace.toml".to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_file_missing() {
        let config = Config::load_from(Path::new("/nonexistent/trialtrace.toml")).unwrap();
        assert_eq!(config.registry.api_base_url, "https://clinicaltrials.gov/api/v2");
        assert_eq!(config.registry.timeout_secs, 10);
        assert_eq!(config.batch.full_cap, 1000);
        assert_eq!(config.batch.politeness_delay_ms, 500);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trialtrace.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[registry]\napi_base_url = \"http://localhost:8080/api/v2\"").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.registry.api_base_url, "http://localhost:8080/api/v2");
        assert_eq!(config.registry.page_base_url, "https://clinicaltrials.gov");
        assert_eq!(config.batch.full_cap, 1000);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trialtrace.toml");
        std::fs::write(&path, "registry = \"not a table\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
