//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Hours an investor may cancel after investing
    pub cooling_off_hours: i64,

    /// Days a marketplace listing stays active
    pub listing_duration_days: i64,

    /// Days shares must be held after completion before resale
    pub min_holding_days: i64,

    /// Platform fee on secondary sales, in basis points
    pub seller_fee_basis_points: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let cooling_off_hours = env::var("COOLING_OFF_HOURS")
            .unwrap_or_else(|_| "48".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("COOLING_OFF_HOURS"))?;

        let listing_duration_days = env::var("LISTING_DURATION_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("LISTING_DURATION_DAYS"))?;

        let min_holding_days = env::var("MIN_HOLDING_DAYS")
            .unwrap_or_else(|_| "180".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("MIN_HOLDING_DAYS"))?;

        let seller_fee_basis_points = env::var("SELLER_FEE_BASIS_POINTS")
            .unwrap_or_else(|_| "200".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("SELLER_FEE_BASIS_POINTS"))?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            cooling_off_hours,
            listing_duration_days,
            min_holding_days,
            seller_fee_basis_points,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
