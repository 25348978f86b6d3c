//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `FLAREWATCH_*` environment overrides.

use crate::analysis::{AnalysisConfig, RecentOrder};
use crate::recommend::TextGenConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub recommender: RecommenderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_database_file")]
    pub database_file: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("flarewatch").to_string_lossy().to_string())
        .unwrap_or_else(|| "./flarewatch_data".to_string())
}

fn default_database_file() -> String {
    "flarewatch.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: default_database_file(),
        }
    }
}

impl StorageConfig {
    /// Full path of the SQLite database
    pub fn database_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.database_file)
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Text generation recommender configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RecommenderConfig {
    /// Use the text generation service; otherwise rule-based advice
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_recommender_url")]
    pub base_url: String,

    #[serde(default = "default_recommender_model")]
    pub model: String,

    pub api_key: Option<String>,

    #[serde(default = "default_recommender_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_recommender_retries")]
    pub max_retries: u32,
}

fn default_recommender_url() -> String {
    TextGenConfig::default().base_url
}

fn default_recommender_model() -> String {
    TextGenConfig::default().model
}

fn default_recommender_timeout() -> u64 {
    20_000
}

fn default_recommender_retries() -> u32 {
    3
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_recommender_url(),
            model: default_recommender_model(),
            api_key: None,
            request_timeout_ms: default_recommender_timeout(),
            max_retries: default_recommender_retries(),
        }
    }
}

impl RecommenderConfig {
    /// Client settings for the text generation recommender
    pub fn text_gen(&self) -> TextGenConfig {
        TextGenConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            request_timeout_ms: self.request_timeout_ms,
            max_retries: self.max_retries,
            ..TextGenConfig::default()
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Install the global tracing subscriber
    ///
    /// `RUST_LOG` wins over the configured level. `default_directives` may
    /// contain `{level}`, replaced by the configured level.
    pub fn init(&self, default_directives: &str) -> Result<(), ConfigError> {
        use tracing_subscriber::fmt::writer::BoxMakeWriter;
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives.replace("{level}", &self.level)));

        let (writer, ansi) = match &self.file {
            Some(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| ConfigError::Io {
                        path: PathBuf::from(path),
                        error: e.to_string(),
                    })?;
                (BoxMakeWriter::new(std::sync::Mutex::new(file)), false)
            }
            None => (BoxMakeWriter::new(std::io::stderr), true),
        };

        let registry = tracing_subscriber::registry().with(filter);
        let result = if self.format.eq_ignore_ascii_case("json") {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .try_init()
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(ansi)
                        .with_writer(writer),
                )
                .try_init()
        };

        result.map_err(|e| ConfigError::Logging(e.to_string()))
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("flarewatch").join("config.toml")),
            Some(PathBuf::from("/etc/flarewatch/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Storage overrides
        if let Some(data_dir) = var("FLAREWATCH_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }
        if let Some(file) = var("FLAREWATCH_DATABASE_FILE") {
            self.storage.database_file = file;
        }

        // API overrides
        if let Some(host) = var("FLAREWATCH_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("FLAREWATCH_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }

        // Analysis overrides
        if let Some(hours) = var("FLAREWATCH_LOW_SLEEP_HOURS").and_then(|h| h.parse().ok()) {
            self.analysis.low_sleep_hours = hours;
        }
        if let Some(size) = var("FLAREWATCH_RECENT_WINDOW").and_then(|s| s.parse().ok()) {
            self.analysis.recent_window = size;
        }
        if let Some(order) = var("FLAREWATCH_RECENT_ORDER")
            .and_then(|o| o.parse::<RecentOrder>().ok())
        {
            self.analysis.recent_order = order;
        }

        // Recommender overrides
        if let Some(enabled) = var("FLAREWATCH_RECOMMENDER_ENABLED").and_then(|e| e.parse().ok()) {
            self.recommender.enabled = enabled;
        }
        if let Some(url) = var("FLAREWATCH_RECOMMENDER_URL") {
            self.recommender.base_url = url;
        }
        if let Some(model) = var("FLAREWATCH_RECOMMENDER_MODEL") {
            self.recommender.model = model;
        }
        if let Some(key) = var("FLAREWATCH_RECOMMENDER_API_KEY") {
            self.recommender.api_key = Some(key);
        }

        // Logging overrides
        if let Some(level) = var("FLAREWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("FLAREWATCH_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Flarewatch Configuration
#
# Environment variables override these settings:
# - FLAREWATCH_DATA_DIR
# - FLAREWATCH_DATABASE_FILE
# - FLAREWATCH_API_HOST
# - FLAREWATCH_API_PORT
# - FLAREWATCH_LOW_SLEEP_HOURS
# - FLAREWATCH_RECENT_WINDOW
# - FLAREWATCH_RECENT_ORDER
# - FLAREWATCH_RECOMMENDER_ENABLED
# - FLAREWATCH_RECOMMENDER_URL
# - FLAREWATCH_RECOMMENDER_MODEL
# - FLAREWATCH_RECOMMENDER_API_KEY
# - FLAREWATCH_LOG_LEVEL
# - FLAREWATCH_LOG_FORMAT

[storage]
# Directory holding the database
data_dir = "~/.local/share/flarewatch"

# SQLite database file name inside data_dir
database_file = "flarewatch.db"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8080

# Allowed CORS origins (empty allows any)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 30

[analysis]
# Sleep strictly below this many hours counts as a trigger
low_sleep_hours = 6.0

# Records per kind in the recent window used for flare-up prediction
recent_window = 3

# How the recent window is chosen: "storage" (last logged) or "date" (latest dates)
recent_order = "storage"

[recommender]
# Use an OpenAI-compatible text generation service for recommendations.
# When disabled, recommendations are derived from the trigger counts.
enabled = false

# Service base URL and model
base_url = "https://api.openai.com"
model = "gpt-4o-mini"

# API key (prefer FLAREWATCH_RECOMMENDER_API_KEY)
# api_key = ""

# Request timeout (ms) and attempts per request
request_timeout_ms = 20000
max_retries = 3

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/flarewatch/flarewatch.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();

        assert_eq!(config.api.port, 8080);
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert!(!config.recommender.enabled);
        assert_eq!(config.storage.database_file, "flarewatch.db");
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: Config = toml::from_str(
            r#"
            [analysis]
            recent_order = "date"

            [recommender]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.recent_order, RecentOrder::Date);
        assert_eq!(config.analysis.low_sleep_hours, 6.0);
        assert_eq!(config.analysis.recent_window, 3);
        assert!(config.recommender.enabled);
        assert_eq!(config.recommender.max_retries, 3);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FLAREWATCH_API_PORT", "9000"),
            ("FLAREWATCH_LOW_SLEEP_HOURS", "7.5"),
            ("FLAREWATCH_RECENT_ORDER", "date"),
            ("FLAREWATCH_RECOMMENDER_API_KEY", "sk-test"),
            // Unparseable values are ignored
            ("FLAREWATCH_RECENT_WINDOW", "many"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.port, 9000);
        assert_eq!(config.analysis.low_sleep_hours, 7.5);
        assert_eq!(config.analysis.recent_order, RecentOrder::Date);
        assert_eq!(config.analysis.recent_window, 3);
        assert_eq!(config.recommender.text_gen().api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_database_path() {
        let storage = StorageConfig {
            data_dir: "/tmp/fw".to_string(),
            database_file: "log.db".to_string(),
        };
        assert_eq!(storage.database_path(), PathBuf::from("/tmp/fw/log.db"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/flarewatch.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
