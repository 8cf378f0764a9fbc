//! Configuration management
//!
//! Configuration is read from a YAML file (`config.yml` by default) and
//! can be overridden by `NOTENEWS_*` environment variables. Every section
//! is optional; missing values fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the config file path
pub const CONFIG_PATH_ENV: &str = "NOTENEWS_CONFIG";

/// Config file used when `NOTENEWS_CONFIG` is not set
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub moderation: ModerationConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL or SQLite file path
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/notenews.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    #[default]
    Sqlite,
    Mysql,
}

/// Login session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Days until a login session expires
    #[serde(default = "default_expiration_days")]
    pub expiration_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiration_days: default_expiration_days(),
        }
    }
}

fn default_expiration_days() -> i64 {
    14
}

/// News feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// Maximum number of news items on the home page
    #[serde(default = "default_home_page_count")]
    pub home_page_count: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            home_page_count: default_home_page_count(),
        }
    }
}

fn default_home_page_count() -> usize {
    10
}

/// Comment moderation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Substrings that may not appear in a comment
    #[serde(default = "default_bad_words")]
    pub bad_words: Vec<String>,
    /// Message shown when a comment is rejected
    #[serde(default = "default_warning")]
    pub warning: String,
    /// Match forbidden words regardless of letter case
    #[serde(default)]
    pub ignore_case: bool,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            bad_words: default_bad_words(),
            warning: default_warning(),
            ignore_case: false,
        }
    }
}

fn default_bad_words() -> Vec<String> {
    vec!["редиска".to_string(), "негодяй".to_string()]
}

fn default_warning() -> String {
    "Не ругайтесь!".to_string()
}

/// Template configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory whose templates override the embedded ones by name
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the default configuration. Invalid
    /// YAML is reported with its line and column.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Recognised variables:
    /// - NOTENEWS_SERVER_HOST
    /// - NOTENEWS_SERVER_PORT
    /// - NOTENEWS_DATABASE_DRIVER
    /// - NOTENEWS_DATABASE_URL
    /// - NOTENEWS_NEWS_HOME_PAGE_COUNT
    /// - NOTENEWS_TEMPLATES_PATH
    pub fn load_with_env(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Path of the config file: `NOTENEWS_CONFIG` or `config.yml`
    pub fn path_from_env() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("NOTENEWS_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("NOTENEWS_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(driver) = std::env::var("NOTENEWS_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("NOTENEWS_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(count) = std::env::var("NOTENEWS_NEWS_HOME_PAGE_COUNT") {
            if let Ok(count) = count.parse::<usize>() {
                self.news.home_page_count = count;
            }
        }

        if let Ok(path) = std::env::var("NOTENEWS_TEMPLATES_PATH") {
            self.templates.path = Some(PathBuf::from(path));
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.news.home_page_count == 0 {
            return Err(ConfigError::ValidationError(
                "news.home_page_count must be at least 1".to_string(),
            ));
        }
        if self.session.expiration_days <= 0 {
            return Err(ConfigError::ValidationError(
                "session.expiration_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches process environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const OVERRIDE_VARS: &[&str] = &[
    "NOTENEWS_SERVER_HOST",
    "NOTENEWS_SERVER_PORT",
    "NOTENEWS_DATABASE_DRIVER",
    "NOTENEWS_DATABASE_URL",
    "NOTENEWS_NEWS_HOME_PAGE_COUNT",
    "NOTENEWS_TEMPLATES_PATH",
];

#[cfg(test)]
fn clear_override_vars() {
    for var in OVERRIDE_VARS {
        std::env::remove_var(var);
    }
}
