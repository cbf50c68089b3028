//! Table availability
//!
//! The stored `dining_table.status` column is only written through
//! [`TableTracker`]; occupancy is re-derived from active orders at read time.

pub mod tracker;

pub use tracker::TableTracker;
