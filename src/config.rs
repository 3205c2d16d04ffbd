//! Application configuration: environment loading and validation.

use crate::checkout::client::CheckoutClientConfig;
use crate::checkout::flow::FlowConfig;
use crate::checkout::resolver::ResolverConfig;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub gateway: CheckoutClientConfig,
    pub resolver: ResolverConfig,
    pub flow: FlowConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone)]
pub enum LogFormat {
    Json,
    Plain,
}

impl AppConfig {
    /// Loads configuration from environment variables, reading `.env` first
    /// when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv().ok();

        Ok(AppConfig {
            server: ServerConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            gateway: CheckoutClientConfig::from_env()
                .map_err(|_| ConfigError::MissingVariable("GATEWAY_BASE_URL".to_string()))?,
            resolver: ResolverConfig::from_env(),
            flow: FlowConfig::from_env(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logging.validate()?;

        if !self.gateway.base_url.starts_with("http://")
            && !self.gateway.base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue(
                "GATEWAY_BASE_URL must be a valid URL".to_string(),
            ));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "GATEWAY_TIMEOUT_SECS cannot be 0".to_string(),
            ));
        }
        if self.resolver.poll_delay.is_zero() {
            return Err(ConfigError::InvalidValue(
                "CHECKOUT_POLL_INTERVAL_MS cannot be 0".to_string(),
            ));
        }
        if self.resolver.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "CHECKOUT_MAX_POLL_ATTEMPTS cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".to_string()))?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue(
                "SERVER_PORT cannot be 0".to_string(),
            ));
        }
        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SERVER_HOST cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Plain,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
        if !valid_levels.contains(&self.level.to_uppercase().as_str()) {
            return Err(ConfigError::InvalidValue("LOG_LEVEL".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_validation() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
        };
        assert!(config.validate().is_ok());

        let bad_port = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        assert!(bad_port.validate().is_err());

        let empty_host = ServerConfig {
            host: String::new(),
            port: 8000,
        };
        assert!(empty_host.validate().is_err());
    }

    #[test]
    fn logging_level_validation() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Plain,
        };
        assert!(config.validate().is_ok());

        let invalid = LoggingConfig {
            level: "loud".to_string(),
            format: LogFormat::Plain,
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn gateway_url_validation() {
        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            logging: LoggingConfig {
                level: "INFO".to_string(),
                format: LogFormat::Plain,
            },
            gateway: CheckoutClientConfig {
                base_url: "not-a-url".to_string(),
                timeout_secs: 45,
            },
            resolver: ResolverConfig::default(),
            flow: FlowConfig::default(),
        };
        assert!(config.validate().is_err());
    }
}
