//! Client settings.
//!
//! Resolved in order: built-in defaults, `.agentdeck/settings.json` in the
//! workspace, then `AGENTDECK_*` environment variables. The CLI applies its
//! own flags last.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatError, ChatResult};

pub const ENV_BASE_URL: &str = "AGENTDECK_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "AGENTDECK_TIMEOUT_SECS";
pub const ENV_PROBE_INTERVAL_SECS: &str = "AGENTDECK_PROBE_INTERVAL_SECS";

/// Connection settings for the orchestration backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Backend root URL, e.g. `http://localhost:8000`
    pub base_url: String,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Connection polling interval
    pub probe_interval_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            probe_interval_secs: 30,
        }
    }
}

impl ClientSettings {
    /// Location of the settings file inside a workspace
    pub fn settings_path(workspace_root: &Path) -> PathBuf {
        workspace_root.join(".agentdeck").join("settings.json")
    }

    /// Load settings from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> ChatResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| ChatError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Resolve settings for a workspace: file (if present), then environment
    pub fn load(workspace_root: &Path) -> ChatResult<Self> {
        let path = Self::settings_path(workspace_root);
        let settings = if path.exists() {
            debug!("Loading settings from {}", path.display());
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        settings.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by environment variable name
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ChatResult<Self> {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_secs(ENV_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = lookup(ENV_PROBE_INTERVAL_SECS) {
            self.probe_interval_secs = parse_secs(ENV_PROBE_INTERVAL_SECS, &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ChatResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ChatError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ChatError::InvalidConfig(
                "request timeout must be at least one second".to_string(),
            ));
        }
        if self.probe_interval_secs == 0 {
            return Err(ChatError::InvalidConfig(
                "probe interval must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }
}

fn parse_secs(key: &str, value: &str) -> ChatResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| ChatError::InvalidConfig(format!("{} must be a number of seconds", key)))
}
