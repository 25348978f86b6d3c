//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::analysis::{AnalysisConfig, AnalysisEngine};
use crate::recommend::{Recommender, RuleBasedRecommender};
use crate::storage::RecordStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store for the four health log collections
    pub store: Arc<dyn RecordStore>,
    /// Analysis pipeline, configuration only
    pub engine: AnalysisEngine,
    /// Phrases recommendations from trigger reports
    pub recommender: Arc<dyn Recommender>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create state with rule-based recommendations
    pub fn new(store: Arc<dyn RecordStore>, analysis: AnalysisConfig, config: ApiConfig) -> Self {
        let recommender = Arc::new(RuleBasedRecommender::new(analysis.low_sleep_hours));
        Self::with_recommender(store, analysis, config, recommender)
    }

    /// Create state with a specific recommender
    pub fn with_recommender(
        store: Arc<dyn RecordStore>,
        analysis: AnalysisConfig,
        config: ApiConfig,
        recommender: Arc<dyn Recommender>,
    ) -> Self {
        Self {
            store,
            engine: AnalysisEngine::new(analysis),
            recommender,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Allowed CORS origins; empty allows any
    pub cors_origins: Vec<String>,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            cors_origins: Vec::new(),
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<&crate::config::ApiConfig> for ApiConfig {
    fn from(config: &crate::config::ApiConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            request_timeout_secs: config.request_timeout_secs,
            cors_origins: config.cors_origins.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr() {
        assert_eq!(ApiConfig::new("127.0.0.1", 9000).addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_from_file_config() {
        let file = crate::config::ApiConfig {
            port: 9100,
            cors_origins: vec!["http://localhost:3000".to_string()],
            ..Default::default()
        };
        let config = ApiConfig::from(&file);

        assert_eq!(config.port, 9100);
        assert_eq!(config.cors_origins.len(), 1);
        assert_eq!(config.max_body_size, 1024 * 1024);
    }
}
