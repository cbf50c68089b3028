//! Dining Table Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored occupancy flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum TableStatus {
    #[serde(rename = "disponible")]
    #[cfg_attr(feature = "db", sqlx(rename = "disponible"))]
    Available,
    #[serde(rename = "ocupada")]
    #[cfg_attr(feature = "db", sqlx(rename = "ocupada"))]
    Occupied,
    #[serde(rename = "reservada")]
    #[cfg_attr(feature = "db", sqlx(rename = "reservada"))]
    Reserved,
}

impl TableStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "disponible",
            TableStatus::Occupied => "ocupada",
            TableStatus::Reserved => "reservada",
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dining table entity (mesa)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    /// Number painted on the table; not unique
    pub number: i64,
    pub capacity: i32,
    pub status: TableStatus,
    /// Zone label (e.g. "VIP", "Terraza")
    pub location: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub number: i64,
    pub capacity: Option<i32>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Update dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub number: Option<i64>,
    pub capacity: Option<i32>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

/// Manual status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatusUpdate {
    pub status: TableStatus,
}

/// Table with derived order information (dashboard polling view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableOverview {
    #[serde(flatten)]
    pub table: DiningTable,
    pub active_order_id: Option<i64>,
    pub can_accept_orders: bool,
}
