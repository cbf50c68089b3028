//! User Model
//!
//! Credentials live with the identity provider; the POS only keeps the
//! operator record and its role.

use serde::{Deserialize, Serialize};

/// Operator (waiter, bartender, cashier, admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub role_id: i64,
    pub is_active: bool,
    pub created_at: i64,
}

/// Create user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub username: String,
    pub role_id: i64,
}

/// Update user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub role_id: Option<i64>,
    pub is_active: Option<bool>,
}
