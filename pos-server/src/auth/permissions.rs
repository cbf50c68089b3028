//! Permission slugs
//!
//! Roles store a JSON list of these. `"all"` grants everything and the
//! `admin` role slug bypasses checks entirely.

pub const ORDERS_READ: &str = "orders:read";
pub const ORDERS_CREATE: &str = "orders:create";
pub const ORDERS_UPDATE: &str = "orders:update";
pub const ORDERS_CHECKOUT: &str = "orders:checkout";
pub const ORDERS_DESTROY: &str = "orders:destroy";
pub const TABLES_READ: &str = "tables:read";
pub const TABLES_MANAGE: &str = "tables:manage";
pub const MENU_MANAGE: &str = "menu:manage";
pub const INVENTORY_MANAGE: &str = "inventory:manage";
pub const CASH_MANAGE: &str = "cash:manage";
pub const SETTINGS_MANAGE: &str = "settings:manage";
pub const USERS_MANAGE: &str = "users:manage";
pub const ALL: &str = "all";

/// Every assignable permission
pub const ALL_PERMISSIONS: &[&str] = &[
    ORDERS_READ,
    ORDERS_CREATE,
    ORDERS_UPDATE,
    ORDERS_CHECKOUT,
    ORDERS_DESTROY,
    TABLES_READ,
    TABLES_MANAGE,
    MENU_MANAGE,
    INVENTORY_MANAGE,
    CASH_MANAGE,
    SETTINGS_MANAGE,
    USERS_MANAGE,
    ALL,
];

/// Known slug or a `module:*` wildcard over a known module
pub fn is_valid_permission(permission: &str) -> bool {
    if ALL_PERMISSIONS.contains(&permission) {
        return true;
    }
    permission.strip_suffix(":*").is_some_and(|module| {
        ALL_PERMISSIONS
            .iter()
            .any(|p| p.split_once(':').is_some_and(|(m, _)| m == module))
    })
}
