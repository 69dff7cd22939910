//! Error types for market-glance.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for dashboard operations.
#[derive(Error, Debug)]
pub enum DashError {
    /// Warehouse connection errors (login rejected, host unreachable, session expired, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query errors (unreadable query file, rejected statement, warehouse-side failure, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (terminal failures, unexpected states, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DashError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(m) | Self::Query(m) | Self::Config(m) | Self::Internal(m) => m,
        }
    }
}

/// Result type alias using DashError.
pub type Result<T> = std::result::Result<T, DashError>;
