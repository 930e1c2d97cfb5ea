use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::shape::CHAT_LANGUAGES;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const API_BASE_URL_ENV: &str = "AFIYALINK_API_BASE_URL";
pub const USER_ID_ENV: &str = "AFIYALINK_USER_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub user_id: String,
    pub chat_language: String,
    pub source_language: String,
    pub target_language: String,
    /// Per-request timeout for the HTTP transport; `None` leaves it unbounded
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_id: "guest".to_string(),
            chat_language: "en".to_string(),
            source_language: "zh".to_string(),
            target_language: "en".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load from the user config dir, then apply environment overrides.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        config.check_chat_language();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn save_languages(source: &str, target: &str) -> Result<(), ConfigError> {
        Self::save_languages_to(&Self::config_path()?, source, target)
    }

    /// Rewrite only the translation pair. A file that fails to parse is left
    /// untouched and the parse error is returned.
    pub fn save_languages_to(path: &Path, source: &str, target: &str) -> Result<(), ConfigError> {
        let mut config = Self::load_from(path)?;
        config.source_language = source.to_string();
        config.target_language = target.to_string();
        config.save_to(path)
    }

    /// The chatbot only answers in a few languages; anything else falls back
    /// to English before a request is ever built.
    fn check_chat_language(&mut self) {
        let code = self.chat_language.trim().to_ascii_lowercase();
        if CHAT_LANGUAGES.contains(&code.as_str()) {
            self.chat_language = code;
        } else {
            tracing::warn!(
                chat_language = %self.chat_language,
                supported = ?CHAT_LANGUAGES,
                "unsupported chat language, using en"
            );
            self.chat_language = "en".to_string();
        }
    }

    fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(API_BASE_URL_ENV).ok(),
            std::env::var(USER_ID_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, base_url: Option<String>, user_id: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(id) = user_id.filter(|u| !u.trim().is_empty()) {
            self.user_id = id;
        }
    }

    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("afiyalink"))
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}
