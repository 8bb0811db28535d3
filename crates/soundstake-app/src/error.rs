//! Error types for soundstake app services
//!
//! Application-level errors that wrap engine errors and add app-specific
//! variants.

use soundstake::error::EngineError;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Engine(EngineError::Network(e))
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Engine(EngineError::Io(e))
    }
}

/// Result type alias for soundstake app services
pub type Result<T> = std::result::Result<T, AppError>;
