use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants;
use crate::error::{ImportError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub login_path: String,
    pub behavior_bulk_path: String,
    pub roster_bulk_path: String,
    pub behavior_single_path: String,
    pub register_teacher_path: String,
    pub change_password_path: String,
    pub students_path: String,
    pub checkins_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_BASE_URL.to_string(),
            login_path: constants::LOGIN_PATH.to_string(),
            behavior_bulk_path: constants::BEHAVIOR_BULK_PATH.to_string(),
            roster_bulk_path: constants::ROSTER_BULK_PATH.to_string(),
            behavior_single_path: constants::BEHAVIOR_SINGLE_PATH.to_string(),
            register_teacher_path: constants::REGISTER_TEACHER_PATH.to_string(),
            change_password_path: constants::CHANGE_PASSWORD_PATH.to_string(),
            students_path: constants::STUDENTS_PATH.to_string(),
            checkins_path: constants::CHECKINS_PATH.to_string(),
        }
    }
}

impl ApiConfig {
    /// Joins the base URL and an endpoint path without doubling the slash.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { path: PathBuf::from(constants::DEFAULT_SESSION_FILE) }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from(constants::DEFAULT_LOG_DIR) }
    }
}

impl Config {
    /// Loads `path` if it exists (defaults otherwise), then applies `.env` and
    /// environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let _ = dotenv::dotenv();

        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ImportError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            Self::from_toml(&content)?
        } else {
            debug!(path = %path.display(), "config file not found, using defaults");
            Config::default()
        };

        if let Ok(url) = std::env::var(constants::BASE_URL_ENV) {
            config.api.base_url = url;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let base = self.api.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ImportError::Config(format!(
                "api.base_url must start with http:// or https://, got '{}'",
                self.api.base_url
            )));
        }
        Ok(())
    }
}
