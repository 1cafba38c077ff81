use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow, bail};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/chat";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Values the rest of the app runs with, after CLI and file are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Layer command-line overrides on top of the file values.
    pub fn merged(&self, endpoint: Option<String>, timeout_secs: Option<u64>) -> Self {
        Self {
            endpoint: endpoint.or_else(|| self.endpoint.clone()),
            timeout_secs: timeout_secs.or(self.timeout_secs),
        }
    }

    pub fn settings(&self) -> Result<Settings> {
        let endpoint = self
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        validate_endpoint(&endpoint)?;

        Ok(Settings {
            endpoint,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("local-chat").join("config.json"))
    }
}

fn validate_endpoint(endpoint: &str) -> Result<()> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| anyhow!("Invalid chat endpoint '{}': {}", endpoint, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Chat endpoint must be an http(s) URL, got '{}'", endpoint);
    }
    Ok(())
}
