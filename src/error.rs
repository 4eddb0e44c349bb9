//! Error handling for carteira
//!
//! Defines the domain error kinds and establishes a unified Result type
//! using anyhow for context chaining and error propagation.

use thiserror::Error;

/// Core error types for portfolio operations
#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("store error: {0}")]
    Store(String),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("pricing error: {0}")]
    Pricing(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for portfolio operations
pub type Result<T> = anyhow::Result<T>;
