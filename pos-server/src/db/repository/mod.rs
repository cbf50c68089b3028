//! Repository Module
//!
//! Free async functions per table over `sqlx`. Single-statement helpers take
//! any [`sqlx::SqliteExecutor`] so they run against the pool or inside an
//! open transaction; multi-statement writes take `&mut SqliteConnection`.

// Auth
pub mod role;
pub mod user;

// Catalog
pub mod category;
pub mod product;

// Floor
pub mod dining_table;

// Orders
pub mod order;

// Stock and cash
pub mod cash_register;
pub mod inventory;

// Configuration
pub mod currency;
pub mod setting;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound("Record not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate("Record already exists".into())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepoError::Validation(
                "Referenced record does not exist or is still in use".into(),
            ),
            sqlx::Error::Database(db) if db.is_check_violation() => {
                RepoError::Validation("Value violates a data constraint".into())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => {
                // Driver text stays in the log, the caller gets a generic message
                tracing::error!(error = %msg, "Database operation failed");
                AppError::database("Database operation failed")
            }
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
