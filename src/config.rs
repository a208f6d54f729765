use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::table::GridLimits;
use crate::ws::TableDefaults;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port (HTTP and WebSocket)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Shape of tables with no stored definition
    #[serde(default = "default_rows")]
    pub default_rows: usize,
    #[serde(default = "default_cols")]
    pub default_cols: usize,

    /// Upper bounds on grid growth
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    #[serde(default = "default_max_cols")]
    pub max_cols: usize,

    /// Frames buffered per connection before it is considered stalled
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,

    /// JWT secret shared with the auth service; auth is disabled when unset
    pub auth_jwt_secret: Option<String>,

    /// Database URL of the table service
    pub db_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        match envy::from_env::<Config>() {
            Ok(config) => {
                config.validate()?;
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.outbound_queue_capacity == 0 {
            return Err(ConfigError::Invalid("OUTBOUND_QUEUE_CAPACITY must be at least 1"));
        }
        if self.default_rows > self.max_rows || self.default_cols > self.max_cols {
            return Err(ConfigError::Invalid("default table size exceeds MAX_ROWS/MAX_COLS"));
        }
        Ok(())
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Allowed CORS origins, `None` meaning any
    pub fn cors_origin_list(&self) -> Option<Vec<String>> {
        self.cors_origins.as_ref().map(|origins| {
            origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    pub fn table_defaults(&self) -> TableDefaults {
        TableDefaults {
            rows: self.default_rows,
            cols: self.default_cols,
            limits: GridLimits {
                max_rows: self.max_rows,
                max_cols: self.max_cols,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            default_rows: default_rows(),
            default_cols: default_cols(),
            max_rows: default_max_rows(),
            max_cols: default_max_cols(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            auth_jwt_secret: None,
            db_url: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_rows() -> usize {
    3
}

fn default_cols() -> usize {
    3
}

fn default_max_rows() -> usize {
    10_000
}

fn default_max_cols() -> usize {
    1_000
}

fn default_outbound_queue_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_overrides_and_fills_defaults() {
        let vars = vec![
            ("PORT".to_string(), "9001".to_string()),
            ("DEFAULT_ROWS".to_string(), "5".to_string()),
            ("CORS_ORIGINS".to_string(), "http://a.test, http://b.test,".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.default_rows, 5);
        assert_eq!(config.default_cols, 3);
        assert_eq!(config.outbound_queue_capacity, 256);
        assert!(config.auth_jwt_secret.is_none());
        assert_eq!(
            config.cors_origin_list(),
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
    }

    #[test]
    fn rejects_zero_queue_capacity() {
        let config = Config { outbound_queue_capacity: 0, ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        assert!(Config::default().validate().is_ok());
    }
}
