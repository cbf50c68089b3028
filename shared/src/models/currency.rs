//! Currency Model (moneda)

use serde::{Deserialize, Serialize};

/// Currency with its rate against the base currency
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Currency {
    pub id: i64,
    /// ISO-like code, unique (e.g. "MXN", "USD")
    pub code: String,
    pub name: String,
    pub symbol: String,
    /// Units of this currency per 1 unit of the base currency
    pub exchange_rate: f64,
    /// At most one row is default
    pub is_default: bool,
    pub is_active: bool,
}

/// Create currency payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyCreate {
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub exchange_rate: f64,
}

/// Update currency payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyUpdate {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub exchange_rate: Option<f64>,
    pub is_active: Option<bool>,
}

/// Conversion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

/// Conversion result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub converted: f64,
    /// Effective rate from → to
    pub rate: f64,
}
