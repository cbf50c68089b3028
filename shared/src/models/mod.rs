//! Data models
//!
//! Shared between pos-server and the dashboards (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod cash_register;
pub mod category;
pub mod currency;
pub mod dining_table;
pub mod inventory;
pub mod order;
pub mod product;
pub mod role;
pub mod setting;
pub mod user;

// Re-exports
pub use cash_register::*;
pub use category::*;
pub use currency::*;
pub use dining_table::*;
pub use inventory::*;
pub use order::*;
pub use product::*;
pub use role::*;
pub use setting::*;
pub use user::*;
