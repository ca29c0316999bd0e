//! Application configuration module
//! Handles environment variable loading, configuration validation, and application settings

use std::env;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
    pub forwarding: ForwardingConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64,   // seconds
    pub idle_timeout: Option<u64>, // seconds
}

/// Payment gateway credentials and endpoints
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub merchant_code: String,
    pub hash_key: String,
    pub payment_url: String,
    pub return_url: String,
    pub currency: String,
    pub locale: String,
}

/// Webhook forwarding configuration
#[derive(Debug, Clone)]
pub struct ForwardingConfig {
    pub enabled: bool,
    pub endpoint_url: Option<String>,
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone)]
pub enum LogFormat {
    Json,
    Plain,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenv::dotenv().ok();

        Ok(AppConfig {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            gateway: GatewayConfig::from_env()?,
            forwarding: ForwardingConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.gateway.validate()?;
        self.forwarding.validate()?;
        self.logging.validate()?;

        Ok(())
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
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

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(DatabaseConfig {
            url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingVariable("DATABASE_URL".to_string()))?,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MIN_CONNECTIONS".to_string()))?,
            connection_timeout: env::var("DB_CONNECTION_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_CONNECTION_TIMEOUT".to_string()))?,
            idle_timeout: env::var("DB_IDLE_TIMEOUT")
                .ok()
                .and_then(|val| val.parse().ok()),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::InvalidValue("DATABASE_URL".to_string()));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::InvalidValue(
                "DB_MIN_CONNECTIONS must be <= DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(())
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(GatewayConfig {
            merchant_code: env::var("VNPAY_TMN_CODE")
                .map_err(|_| ConfigError::MissingVariable("VNPAY_TMN_CODE".to_string()))?,
            hash_key: env::var("VNPAY_HASH_KEY")
                .map_err(|_| ConfigError::MissingVariable("VNPAY_HASH_KEY".to_string()))?,
            payment_url: env::var("VNPAY_URL").unwrap_or_else(|_| {
                "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string()
            }),
            return_url: env::var("VNPAY_RETURN_URL")
                .unwrap_or_else(|_| "http://localhost:3000/payment/return".to_string()),
            currency: env::var("VNPAY_CURRENCY").unwrap_or_else(|_| "VND".to_string()),
            locale: env::var("VNPAY_LOCALE").unwrap_or_else(|_| "vn".to_string()),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.merchant_code.is_empty() {
            return Err(ConfigError::InvalidValue("VNPAY_TMN_CODE".to_string()));
        }

        if self.hash_key.is_empty() {
            return Err(ConfigError::InvalidValue("VNPAY_HASH_KEY".to_string()));
        }

        if !self.payment_url.starts_with("http://") && !self.payment_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "VNPAY_URL must be a valid URL".to_string(),
            ));
        }

        if !self.return_url.starts_with("http://") && !self.return_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "VNPAY_RETURN_URL must be a valid URL".to_string(),
            ));
        }

        Ok(())
    }
}

impl ForwardingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(ForwardingConfig {
            enabled: env::var("USE_WEBHOOK_FORWARDING")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("USE_WEBHOOK_FORWARDING".to_string()))?,
            endpoint_url: env::var("WEBHOOK_FORWARD_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            timeout_secs: env::var("WEBHOOK_FORWARD_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("WEBHOOK_FORWARD_TIMEOUT_SECS".to_string())
                })?,
        })
    }

    /// Target endpoint, present only when forwarding is actually usable.
    pub fn endpoint(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.endpoint_url.as_deref()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "WEBHOOK_FORWARD_TIMEOUT_SECS cannot be 0".to_string(),
            ));
        }

        if let Some(url) = self.endpoint_url.as_deref() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(
                    "WEBHOOK_FORWARD_URL must be a valid URL".to_string(),
                ));
            }
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

/// Configuration error types
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

    fn gateway_config() -> GatewayConfig {
        GatewayConfig {
            merchant_code: "TESTTMN1".to_string(),
            hash_key: "key".to_string(),
            payment_url: "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string(),
            return_url: "http://localhost:3000/payment/return".to_string(),
            currency: "VND".to_string(),
            locale: "vn".to_string(),
        }
    }

    #[test]
    fn test_server_config_validation() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        };

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port_validation() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Invalid port
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gateway_config_requires_credentials() {
        let mut config = gateway_config();
        assert!(config.validate().is_ok());

        config.hash_key = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_forwarding_endpoint_requires_enabled_flag() {
        let config = ForwardingConfig {
            enabled: false,
            endpoint_url: Some("https://lambda.example.com/ipn".to_string()),
            timeout_secs: 30,
        };
        assert!(config.endpoint().is_none());

        let config = ForwardingConfig {
            enabled: true,
            endpoint_url: Some("https://lambda.example.com/ipn".to_string()),
            timeout_secs: 30,
        };
        assert_eq!(config.endpoint(), Some("https://lambda.example.com/ipn"));

        let config = ForwardingConfig {
            enabled: true,
            endpoint_url: None,
            timeout_secs: 30,
        };
        assert!(config.endpoint().is_none());
    }

    #[test]
    fn test_zero_forward_timeout_is_rejected() {
        let config = ForwardingConfig {
            enabled: true,
            endpoint_url: None,
            timeout_secs: 0,
        };
        assert!(config.validate().is_err());
    }
}
