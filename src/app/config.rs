//! # Configuration
//!
//! Application settings are read from an optional JSON file, then overridden
//! by `FAKE_NFT_*` environment variables, then by command line flags, and
//! validated last.
//!
//! ```json
//! {
//!   "api": {
//!     "base_url": "https://api.example.com",
//!     "token": "<api token>",
//!     "order_id": "1",
//!     "profile_id": "1",
//!     "request_timeout_secs": 30
//!   },
//!   "storage": { "preferences_path": "prefs.json" },
//!   "logging": { "level": "info", "file_path": "logs" }
//! }
//! ```

use std::path::{Path, PathBuf};

use derive_builder::UninitializedFieldError;
use eyre::Report;
use nft_core::core::bits::{OrderId, ProfileId};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::service::nft_service::ApiRoutes;

#[derive(Debug, Error)]
pub enum ConfigBuildError {
    #[error("Configuration missing or invalid `{0}`")]
    UninitializedField(&'static str),

    #[error("Configuration error `{0}`")]
    Other(String),

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

impl From<UninitializedFieldError> for ConfigBuildError {
    fn from(err: UninitializedFieldError) -> Self {
        ConfigBuildError::UninitializedField(err.field_name())
    }
}

impl From<Report> for ConfigBuildError {
    fn from(report: Report) -> Self {
        ConfigBuildError::Other(format!("{:?}", report))
    }
}

impl From<std::io::Error> for ConfigBuildError {
    fn from(err: std::io::Error) -> Self {
        ConfigBuildError::FileError(format!("IO error: {:?}", err))
    }
}

impl From<serde_json::Error> for ConfigBuildError {
    fn from(err: serde_json::Error) -> Self {
        ConfigBuildError::FileError(format!("JSON parsing error: {}", err))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ApplicationConfig {
    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(base_url) = &cli.base_url {
            self.api.base_url = base_url.clone();
        }
        if let Some(token) = &cli.token {
            self.api.token = token.clone();
        }
        if let Some(order_id) = &cli.order_id {
            self.api.order_id = order_id.clone();
        }
        if let Some(preferences_path) = &cli.preferences_path {
            self.storage.preferences_path = Some(preferences_path.clone());
        }
        if let Some(log_path) = &cli.log_path {
            self.logging.file_path = Some(log_path.clone());
        }
        if let Some(term_log_off) = cli.term_log_off {
            self.logging.disable_terminal = term_log_off;
        }
    }
}

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent with every request, never logged
    #[serde(default, skip_serializing)]
    pub token: String,
    #[serde(default = "default_order_id")]
    pub order_id: OrderId,
    #[serde(default = "default_profile_id")]
    pub profile_id: ProfileId,
    /// Transport default when absent
    pub request_timeout_secs: Option<u64>,
}

impl ApiSettings {
    pub fn routes(&self) -> Result<ApiRoutes, ConfigBuildError> {
        let base_url = Url::parse(&self.base_url).map_err(|err| {
            ConfigBuildError::ValidationError(format!("Invalid base_url {}: {}", self.base_url, err))
        })?;

        Ok(ApiRoutes {
            base_url,
            order_id: self.order_id.clone(),
            profile_id: self.profile_id.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// JSON file for user preferences; kept in memory when absent
    pub preferences_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `fake_nft=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for daily log files
    pub file_path: Option<PathBuf>,
    #[serde(default)]
    pub disable_terminal: bool,
}

/// Values given on the command line, highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub order_id: Option<OrderId>,
    pub preferences_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub term_log_off: Option<bool>,
}

fn default_base_url() -> String {
    String::from("https://d5dn3j2ouj72b0ejucbl.apigw.yandexcloud.net")
}

fn default_order_id() -> OrderId {
    OrderId::from("1")
}

fn default_profile_id() -> ProfileId {
    ProfileId::from("1")
}

fn default_log_level() -> String {
    String::from("info")
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
            order_id: default_order_id(),
            profile_id: default_profile_id(),
            request_timeout_secs: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
            disable_terminal: false,
        }
    }
}

pub const ENV_API_URL: &str = "FAKE_NFT_API_URL";
pub const ENV_TOKEN: &str = "FAKE_NFT_TOKEN";
pub const ENV_ORDER_ID: &str = "FAKE_NFT_ORDER_ID";
pub const ENV_PROFILE_ID: &str = "FAKE_NFT_PROFILE_ID";
pub const ENV_REQUEST_TIMEOUT: &str = "FAKE_NFT_REQUEST_TIMEOUT_SECS";

/// Configuration loader that handles multiple sources with proper precedence
pub struct ConfigLoader {
    base_config: ApplicationConfig,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            base_config: ApplicationConfig::default(),
        }
    }

    /// Load configuration with precedence (lowest first): defaults, file,
    /// environment, command line.
    pub fn load_config(
        &self,
        config_file_path: Option<&Path>,
        cli_overrides: Option<&CliOverrides>,
    ) -> Result<ApplicationConfig, ConfigBuildError> {
        self.load_config_with_env(config_file_path, cli_overrides, |key| {
            std::env::var(key).ok()
        })
    }

    pub fn load_config_with_env(
        &self,
        config_file_path: Option<&Path>,
        cli_overrides: Option<&CliOverrides>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ApplicationConfig, ConfigBuildError> {
        let mut config = match config_file_path {
            Some(path) => Self::read_config_file(path)?,
            None => self.base_config.clone(),
        };

        Self::merge_environment(&mut config, env)?;

        if let Some(overrides) = cli_overrides {
            config.apply_cli_overrides(overrides);
        }

        Self::validate_config(&config)?;

        tracing::info!(base_url = %config.api.base_url, "Configuration loaded");
        Ok(config)
    }

    fn read_config_file(file_path: &Path) -> Result<ApplicationConfig, ConfigBuildError> {
        match file_path.extension().and_then(|s| s.to_str()) {
            Some("json") => {}
            Some(ext) => {
                return Err(ConfigBuildError::FileError(format!(
                    "Unsupported configuration file format: {}. Supported formats: json",
                    ext
                )));
            }
            None => {
                return Err(ConfigBuildError::FileError(String::from(
                    "Configuration file has no extension. Supported formats: json",
                )));
            }
        }

        let content = std::fs::read_to_string(file_path).map_err(|err| {
            ConfigBuildError::FileError(format!(
                "Failed to read configuration file {}: {:?}",
                file_path.display(),
                err
            ))
        })?;

        tracing::info!(file_path = %file_path.display(), "Loading configuration from file");
        Ok(serde_json::from_str(&content)?)
    }

    fn merge_environment(
        config: &mut ApplicationConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigBuildError> {
        if let Some(val) = env(ENV_API_URL) {
            tracing::debug!(env_var = ENV_API_URL, value = %val, "Overriding base URL");
            config.api.base_url = val;
        }
        if let Some(val) = env(ENV_TOKEN) {
            tracing::debug!(env_var = ENV_TOKEN, "Overriding API token");
            config.api.token = val;
        }
        if let Some(val) = env(ENV_ORDER_ID) {
            config.api.order_id = OrderId::from(val);
        }
        if let Some(val) = env(ENV_PROFILE_ID) {
            config.api.profile_id = ProfileId::from(val);
        }
        if let Some(val) = env(ENV_REQUEST_TIMEOUT) {
            let secs = val.parse().map_err(|err| {
                ConfigBuildError::EnvError(format!(
                    "Failed to parse {} as seconds: {:?}",
                    ENV_REQUEST_TIMEOUT, err
                ))
            })?;
            config.api.request_timeout_secs = Some(secs);
        }
        Ok(())
    }

    fn validate_config(config: &ApplicationConfig) -> Result<(), ConfigBuildError> {
        config.api.routes()?;

        if config.api.token.trim().is_empty() {
            return Err(ConfigBuildError::ValidationError(format!(
                "API token is empty, set it in the configuration file or {}",
                ENV_TOKEN
            )));
        }
        if config.api.order_id.as_str().is_empty() {
            return Err(ConfigBuildError::ValidationError(String::from(
                "order_id must not be empty",
            )));
        }
        if config.api.request_timeout_secs == Some(0) {
            return Err(ConfigBuildError::ValidationError(String::from(
                "request_timeout_secs must be positive",
            )));
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
