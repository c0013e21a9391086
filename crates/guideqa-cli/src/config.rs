//! Client configuration.

use anyhow::Result;
use guideqa_core::{DEFAULT_REQUEST_TIMEOUT_SECS, PatchFallback};
use guideqa_types::DEFAULT_TOP_K;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default)]
    pub debug_return_evidence: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
    #[serde(default)]
    pub patch_fallback: PatchFallback,
    /// Largest value, in bytes, either storage area accepts. Unlimited when unset.
    #[serde(default)]
    pub store_quota_bytes: Option<usize>,
}

fn default_api_base() -> String {
    "http://localhost:8000".to_string()
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("guideqa")
}

fn default_session_path() -> PathBuf {
    std::env::temp_dir().join("guideqa").join("session.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            top_k: default_top_k(),
            debug_return_evidence: false,
            request_timeout_secs: default_request_timeout_secs(),
            data_dir: default_data_dir(),
            session_path: default_session_path(),
            patch_fallback: PatchFallback::default(),
            store_quota_bytes: None,
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `config/default.toml` if present, otherwise defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }

    /// SQLite file backing history and feedback.
    pub fn durable_path(&self) -> PathBuf {
        self.data_dir.join("store.db")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
