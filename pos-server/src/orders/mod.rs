//! Order lifecycle
//!
//! - [`OrderLifecycle`]: create, status changes, checkout, totals, delete
//!
//! Every command runs in one SQLite transaction and publishes the order
//! snapshot only after commit.

pub mod lifecycle;

pub use lifecycle::OrderLifecycle;
