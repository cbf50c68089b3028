//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Sale price in currency unit
    pub price: f64,
    /// Purchase cost in currency unit
    pub cost: f64,
    /// Unique product code (barcode / PLU)
    pub code: String,
    pub image: Option<String>,
    pub is_active: bool,
    pub category_id: Option<i64>,
    pub is_combo: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub cost: Option<f64>,
    pub code: String,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub is_combo: Option<bool>,
}

/// Update product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub cost: Option<f64>,
    pub code: Option<String>,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub is_combo: Option<bool>,
    pub is_active: Option<bool>,
}

/// Combo → component relation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ComboComponent {
    pub combo_id: i64,
    pub component_id: i64,
    /// Units of the component consumed by one combo
    pub quantity: i64,
}

/// Combo component input (replace-set semantics)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboComponentInput {
    pub component_id: i64,
    pub quantity: i64,
}

/// Principal → complement relation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductComplement {
    pub product_id: i64,
    pub complement_id: i64,
    pub required_quantity: i64,
    pub is_mandatory: bool,
    /// Free complements are billed at 0
    pub is_free: bool,
}

/// Complement input (replace-set semantics)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductComplementInput {
    pub complement_id: i64,
    pub required_quantity: Option<i64>,
    pub is_mandatory: Option<bool>,
    pub is_free: Option<bool>,
}

/// Why a combo component blocks availability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ComponentShortage {
    Missing { component_id: i64 },
    Inactive { component_id: i64 },
    InsufficientStock {
        component_id: i64,
        required: i64,
        on_hand: i64,
    },
}

/// Availability verdict for one product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductAvailability {
    pub product_id: i64,
    pub is_combo: bool,
    pub is_available: bool,
    /// Combos: 1 or 0; normal products: stock on hand
    pub current_stock: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shortages: Vec<ComponentShortage>,
}

/// Menu entry with derived stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuProduct {
    #[serde(flatten)]
    pub product: Product,
    pub category_name: Option<String>,
    pub category_color: String,
    pub current_stock: i64,
    pub is_available: bool,
}
