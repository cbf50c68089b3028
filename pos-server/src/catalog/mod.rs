//! Catalog read models
//!
//! Combo availability and derived stock for the menu.

pub mod stock;

pub use stock::StockResolver;
