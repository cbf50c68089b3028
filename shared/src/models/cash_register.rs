//! Cash Register Model (caja)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum CashRegisterStatus {
    Abierta,
    Cerrada,
}

/// Cash register session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CashRegister {
    pub id: i64,
    pub opened_by: i64,
    pub opening_amount: f64,
    pub closing_amount: Option<f64>,
    /// opening + ingresos - egresos, computed at close
    pub expected_amount: Option<f64>,
    pub status: CashRegisterStatus,
    pub opened_at: i64,
    pub closed_at: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum CashMovementType {
    Ingreso,
    Egreso,
}

/// Cash drawer movement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CashMovement {
    pub id: i64,
    pub register_id: i64,
    pub movement_type: CashMovementType,
    pub amount: f64,
    pub concept: String,
    pub order_id: Option<i64>,
    pub user_id: i64,
    pub created_at: i64,
}

/// Open register payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashRegisterOpen {
    pub opening_amount: f64,
    pub notes: Option<String>,
}

/// Close register payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashRegisterClose {
    /// Counted cash in the drawer
    pub closing_amount: f64,
    pub notes: Option<String>,
}

/// Record movement payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashMovementCreate {
    pub movement_type: CashMovementType,
    pub amount: f64,
    pub concept: String,
}
