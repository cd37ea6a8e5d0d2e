use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Error};
use dirs_next::{config_dir, home_dir};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::utils::markdown::MarkdownMode;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_STREAM_DELAY_MS: u64 = 50;
pub const DEFAULT_BASE_URL: &str = "https://notebooklm.google.com";

const ENV_API_KEY: &str = "API_KEY";
const ENV_NOTEBOOK_ID: &str = "NOTEBOOKLM_NOTEBOOK_ID";
const ENV_CLEAN_MARKDOWN: &str = "CLEAN_MARKDOWN";
const ENV_HOST: &str = "HOST";
const ENV_PORT: &str = "PORT";
const ENV_STREAM_DELAY_MS: &str = "STREAM_DELAY_MS";
const ENV_BASE_URL: &str = "NOTEBOOKLM_BASE_URL";
const ENV_AUTH_JSON: &str = "NOTEBOOKLM_AUTH_JSON";
const ENV_STORAGE_STATE: &str = "NOTEBOOKLM_STORAGE_STATE";

/// On-disk shape of `notebooklm2api.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean_markdown: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebooklm_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_state_path: Option<PathBuf>,
}

pub fn default_config_path() -> PathBuf {
    let mut path = config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("notebooklm2api");
    path.push("notebooklm2api.toml");
    path
}

fn default_storage_state_path() -> PathBuf {
    let mut path = home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".notebooklm");
    path.push("storage_state.json");
    path
}

impl ConfigFile {
    /// An explicit path must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_path(), false),
        };
        if !path.exists() {
            if required {
                return Err(Error::msg(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            return Ok(ConfigFile::default());
        }
        info!("Loading config from {}", path.display());
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Where the backend's browser session cookies come from.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub base_url: String,
    /// Inline storage-state JSON; wins over `storage_state_path`.
    pub auth_json: Option<String>,
    pub storage_state_path: PathBuf,
}

/// Process-wide settings, built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub default_notebook_id: Option<String>,
    pub markdown_mode: MarkdownMode,
    pub stream_delay: Duration,
    pub backend: BackendConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            default_notebook_id: None,
            markdown_mode: MarkdownMode::Normalize,
            stream_delay: Duration::from_millis(DEFAULT_STREAM_DELAY_MS),
            backend: BackendConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                auth_json: None,
                storage_state_path: default_storage_state_path(),
            },
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let file = ConfigFile::load(path)?;
        Self::resolve(file, |key| env::var(key).ok())
    }

    /// Layers `env` over `file` over the defaults.
    pub fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let defaults = Config::default();

        let port = match non_empty(env(ENV_PORT)) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("{} must be a port number, got {:?}", ENV_PORT, raw))?,
            None => file.port.unwrap_or(defaults.port),
        };

        let stream_delay_ms = match non_empty(env(ENV_STREAM_DELAY_MS)) {
            Some(raw) => raw.trim().parse::<u64>().with_context(|| {
                format!("{} must be milliseconds, got {:?}", ENV_STREAM_DELAY_MS, raw)
            })?,
            None => file.stream_delay_ms.unwrap_or(DEFAULT_STREAM_DELAY_MS),
        };

        let clean_markdown = match env(ENV_CLEAN_MARKDOWN) {
            Some(raw) => parse_flag(&raw),
            None => file.clean_markdown.unwrap_or(false),
        };

        Ok(Config {
            host: non_empty(env(ENV_HOST))
                .or(non_empty(file.host))
                .unwrap_or(defaults.host),
            port,
            api_key: non_empty(env(ENV_API_KEY)).or(non_empty(file.api_key)),
            default_notebook_id: non_empty(env(ENV_NOTEBOOK_ID)).or(non_empty(file.notebook_id)),
            markdown_mode: MarkdownMode::from_clean_flag(clean_markdown),
            stream_delay: Duration::from_millis(stream_delay_ms),
            backend: BackendConfig {
                base_url: non_empty(env(ENV_BASE_URL))
                    .or(non_empty(file.notebooklm_base_url))
                    .unwrap_or(defaults.backend.base_url),
                auth_json: non_empty(env(ENV_AUTH_JSON)),
                storage_state_path: non_empty(env(ENV_STORAGE_STATE))
                    .map(PathBuf::from)
                    .or(file.storage_state_path)
                    .unwrap_or(defaults.backend.storage_state_path),
            },
        })
    }

    pub fn with_listen_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn auth_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Effective settings as TOML, with the API key masked.
    pub fn to_redacted_toml(&self) -> Result<String, Error> {
        let file = ConfigFile {
            api_key: self.api_key.as_ref().map(|_| "********".to_string()),
            notebook_id: self.default_notebook_id.clone(),
            clean_markdown: Some(self.markdown_mode.is_strip()),
            host: Some(self.host.clone()),
            port: Some(self.port),
            stream_delay_ms: Some(self.stream_delay.as_millis() as u64),
            notebooklm_base_url: Some(self.backend.base_url.clone()),
            storage_state_path: Some(self.backend.storage_state_path.clone()),
        };
        Ok(toml::to_string_pretty(&file)?)
    }
}
