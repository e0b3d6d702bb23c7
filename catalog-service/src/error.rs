//! Service-level error type
//!
//! Covers failures outside a single request: loading configuration,
//! binding the listener, connecting to the database. Request-scoped
//! failures use [`crate::handlers::ApiError`] instead.

use thiserror::Error;

/// Result type alias using the service [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while starting or running the service
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Database connection or migration error
    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(Box<sqlx::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(Box::new(err))
    }
}
