// Application configuration
//
// Layered with the `config` crate: built-in defaults, then an optional TOML file, then
// `CLINICAL_ASSESSMENT__SECTION__KEY` environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "clinical-assessment.toml";
pub const ENV_PREFIX: &str = "CLINICAL_ASSESSMENT";
const ENV_SEPARATOR: &str = "__";

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("submission.endpoint is required when submission.mode = \"http\"")]
    MissingEndpoint,
    #[error("submission.endpoint '{0}' is not an absolute http(s) URL")]
    InvalidEndpoint(String),
    #[error("submission.timeout_secs must be greater than zero")]
    ZeroTimeout,
    #[error("logging.level '{0}' must be one of off|error|warn|info|debug|trace")]
    InvalidLevel(String),
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    /// Fixed placeholder result after a short delay.
    #[default]
    Mock,
    /// POST to `submission.endpoint`.
    Http,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionConfig {
    pub mode: SubmissionMode,
    pub mock_delay_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: usize,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            mode: SubmissionMode::Mock,
            mock_delay_ms: 2000,
            endpoint: None,
            timeout_secs: 10,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            level: "debug".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.trim().parse().unwrap_or(log::LevelFilter::Debug)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load with the process environment. An explicit `path` must exist; without one,
    /// `clinical-assessment.toml` in the working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_with_env(path, None)
    }

    /// `env` replaces the process environment (tests).
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, SettingsError> {
        let defaults = AppConfig::default();
        let file = match path {
            Some(p) => File::from(p).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let cfg = Config::builder()
            .set_default("submission.mode", "mock")?
            .set_default("submission.mock_delay_ms", defaults.submission.mock_delay_ms)?
            .set_default("submission.timeout_secs", defaults.submission.timeout_secs)?
            .set_default("submission.max_retries", defaults.submission.max_retries as u64)?
            .set_default("logging.level", defaults.logging.level.as_str())?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let loaded: AppConfig = cfg.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let level = self.logging.level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(SettingsError::InvalidLevel(self.logging.level.clone()));
        }
        if self.submission.timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout);
        }
        if self.submission.mode == SubmissionMode::Http {
            let raw = self
                .submission
                .endpoint
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or(SettingsError::MissingEndpoint)?;
            validate_endpoint(raw)?;
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub(crate) fn validate_endpoint(raw: &str) -> Result<Url, SettingsError> {
    let invalid = || SettingsError::InvalidEndpoint(raw.to_string());
    let url = Url::parse(raw).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}
