//! 角色 (RBAC)
//!
//! 角色的 `slug` 写入令牌的 `role` claim，`permissions` 是权限 slug 列表，
//! 以 JSON 数组存在 `role.permissions` 列。

use serde::{Deserialize, Serialize};

/// Slug of the seeded administrator role; bypasses every permission check
pub const ADMIN_ROLE_SLUG: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub permissions: Vec<String>,
    /// Seeded roles (admin, gerente, mesero, bartender, cajero)
    pub is_system: bool,
    pub is_active: bool,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        self.slug == ADMIN_ROLE_SLUG
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCreate {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Partial update; the slug is immutable once tokens carry it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub is_active: Option<bool>,
}
