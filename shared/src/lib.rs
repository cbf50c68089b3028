//! Shared types for the nightclub POS
//!
//! Error codes, response envelope, domain models and bus messages used by
//! pos-server and mirrored by the dashboards.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

// Message bus re-exports (for convenient access)
pub use message::{BusMessage, EventType};
