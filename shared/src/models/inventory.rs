//! Inventory Model (stock on hand + movement ledger)

use serde::{Deserialize, Serialize};

/// Stock on hand for one non-combo product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct InventoryStock {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub min_stock: i64,
    pub max_stock: Option<i64>,
    pub updated_at: i64,
}

/// Stock row joined with its product, as listed to operators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StockLevel {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub min_stock: i64,
    pub max_stock: Option<i64>,
    pub below_min: bool,
}

/// Threshold update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockThresholdsUpdate {
    pub min_stock: Option<i64>,
    pub max_stock: Option<i64>,
}

/// Movement kind (tipo de movimiento)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum MovementType {
    /// Purchase / restock
    Entrada,
    /// Manual withdrawal (breakage, internal use)
    Salida,
    /// Physical count, sets the absolute quantity
    Ajuste,
    Venta,
    Devolucion,
    /// Component consumed by a combo sale
    VentaCombo,
}

impl MovementType {
    /// Resulting quantity after applying `quantity` to `current`
    ///
    /// Returns `None` when the movement would leave negative stock.
    pub fn apply(&self, current: i64, quantity: i64) -> Option<i64> {
        let next = match self {
            MovementType::Entrada | MovementType::Devolucion => current.checked_add(quantity)?,
            MovementType::Salida | MovementType::Venta | MovementType::VentaCombo => {
                current.checked_sub(quantity)?
            }
            MovementType::Ajuste => quantity,
        };
        (next >= 0).then_some(next)
    }
}

/// Append-only ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct InventoryMovement {
    pub id: i64,
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub resulting_quantity: i64,
    pub reason: Option<String>,
    pub user_id: i64,
    pub order_id: Option<i64>,
    pub created_at: i64,
}

/// Record movement payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementCreate {
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: Option<String>,
}
