use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{AlacenaError, AlacenaResult};

// Default configuration values
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const CREDENTIALS_FILE: &str = "credentials.json";

/// Main configuration struct for Alacena
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Inventory backend settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Where credentials are kept between runs
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Inventory backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Scheme, host and port of the backend, optionally with a path prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
}

fn env_or<T: FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(fallback)
}

// Default functions
fn default_base_url() -> String {
    env_or("ALACENA_BASE_URL", DEFAULT_BASE_URL.to_string())
}

fn default_request_timeout() -> u64 {
    env_or("ALACENA_REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS)
}

fn default_credentials_path() -> PathBuf {
    if let Ok(path) = std::env::var("ALACENA_CREDENTIALS_PATH") {
        return PathBuf::from(path);
    }

    dirs::data_dir()
        .map(|dir| dir.join("alacena").join(CREDENTIALS_FILE))
        .unwrap_or_else(|| PathBuf::from(CREDENTIALS_FILE))
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
        }
    }
}

impl Config {
    /// Reject settings the client cannot work with
    pub fn validate(&self) -> AlacenaResult<()> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(AlacenaError::config_invalid("api.base_url", "must not be empty"));
        }

        let url = reqwest::Url::parse(base_url)
            .map_err(|e| AlacenaError::config_invalid("api.base_url", e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AlacenaError::config_invalid(
                "api.base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(AlacenaError::config_invalid(
                "api.request_timeout_secs",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.api.request_timeout_secs)
    }
}

/// Load the application configuration from its default location
pub async fn load_config() -> AlacenaResult<Config> {
    let path = get_config_path();
    load_config_from(&path).await
}

/// Get the path to the configuration file
pub fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("ALACENA_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    dirs::config_dir()
        .map(|dir| dir.join("alacena").join("config.json"))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

/// Load configuration from `path`, writing the defaults there if it is missing
pub async fn load_config_from(path: &Path) -> AlacenaResult<Config> {
    let config_key = path.display().to_string();

    if !fs::try_exists(path)
        .await
        .map_err(|e| AlacenaError::config_invalid(&config_key, e))?
    {
        let default_config = Config::default();
        save_config(path, &default_config).await?;
        info!("Created default configuration at {}", path.display());
        return Ok(default_config);
    }

    let config_str = fs::read_to_string(path)
        .await
        .map_err(|e| AlacenaError::config_invalid(&config_key, e))?;
    let config: Config = serde_json::from_str(&config_str)
        .map_err(|e| AlacenaError::config_invalid(&config_key, e))?;
    debug!("Loaded configuration from {}", path.display());

    config.validate()?;
    Ok(config)
}

/// Save configuration to file
pub async fn save_config(path: &Path, config: &Config) -> AlacenaResult<()> {
    let config_key = path.display().to_string();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AlacenaError::config_invalid(&config_key, e))?;
    }

    let config_str = serde_json::to_string_pretty(config)
        .map_err(|e| AlacenaError::config_invalid(&config_key, e))?;
    fs::write(path, config_str)
        .await
        .map_err(|e| AlacenaError::config_invalid(&config_key, e))?;
    debug!("Saved configuration to {}", path.display());

    Ok(())
}
