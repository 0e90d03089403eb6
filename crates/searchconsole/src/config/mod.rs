//! Configuration management
//!
//! Reads `~/.searchconsole/config.json`. Every field is optional in the
//! file; a missing file means defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::common::paths;
use crate::error::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://searchconsole.googleapis.com/webmasters/v3";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_pacing_ms() -> u64 {
    1000
}

fn default_callback_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Whole-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Wait between paged query requests.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// How long the local-server flow waits for the browser.
    #[serde(default = "default_callback_timeout_secs")]
    pub callback_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secrets_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            pacing_ms: default_pacing_ms(),
            callback_timeout_secs: default_callback_timeout_secs(),
            credentials_path: None,
            client_secrets_path: None,
            service_account_path: None,
        }
    }
}

impl Settings {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(paths::config_path()?)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    /// Saved credentials location: the configured path or
    /// `~/.searchconsole/credentials.json`.
    pub fn credentials_file(&self) -> Result<PathBuf> {
        match &self.credentials_path {
            Some(path) => Ok(path.clone()),
            None => paths::credentials_path(),
        }
    }
}
