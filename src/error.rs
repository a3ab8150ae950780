//! Error types for querygate
//!
//! This module defines the error hierarchy used throughout the gateway.
//! We use `thiserror` for library-style errors with clear error chains.

use std::io;

use crate::gateway::validator::Rejection;

/// Main error type for gateway operations
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Statement refused by the read-only validator
    #[error("Statement rejected: {0}")]
    RejectedStatement(Rejection),

    /// Query engine errors (network, engine-side syntax errors, timeouts)
    #[error("Engine error: {0}")]
    Engine(#[from] DbError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<Rejection> for GatewayError {
    fn from(rejection: Rejection) -> Self {
        GatewayError::RejectedStatement(rejection)
    }
}

/// Query engine operation errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Failed to establish connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Operation exceeded the configured query timeout
    #[error("Operation timed out")]
    Timeout,

    /// The engine returned rows but never reported a column list
    #[error("Engine returned no column metadata")]
    NoColumns,
}

/// Configuration loading/parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Home directory not found
    #[error("Could not determine home directory")]
    NoHomeDir,

    /// Config file not found
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// IO errors while reading configuration
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Forecast precondition failures
///
/// These are reported alongside the historical data rather than aborting
/// the whole response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastError {
    /// No date column or no numeric value column could be found
    #[error("Cannot identify date/value columns: {0}")]
    UnidentifiableColumns(String),

    /// Not enough usable points to fit a trend
    #[error("Insufficient data for forecast: {0}")]
    InsufficientData(String),
}

/// Specialized Result type for gateway operations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Specialized Result type for engine operations
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Specialized Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized Result type for forecast operations
pub type ForecastResult<T> = std::result::Result<T, ForecastError>;
