//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. A `.env` file is honored in development (loaded in main).

use std::env;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// JWT secret key for signing login tokens
    pub jwt_secret: String,

    /// Login token lifetime in seconds
    pub token_lifetime_secs: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./lacto.db".to_string()),

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                // Development fallback only
                // In production, this MUST be set via environment variable
                "lacto-dev-secret-change-in-production".to_string()
            }),

            token_lifetime_secs: env::var("TOKEN_LIFETIME_SECS")
                .unwrap_or_else(|_| "28800".to_string()) // 8 hours, one shift
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TOKEN_LIFETIME_SECS".to_string()))?,
        };

        if config.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("TOKEN_LIFETIME_SECS".to_string()));
        }

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load() {
        // No env vars required for a dev configuration
        let config = ServerConfig::load().unwrap();
        assert!(config.http_port > 0);
        assert!(config.token_lifetime_secs > 0);
    }
}
