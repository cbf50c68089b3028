use shared::error::AppError;
use thiserror::Error;

/// Startup and serve failures
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database initialization failed: {0}")]
    Database(#[from] AppError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
