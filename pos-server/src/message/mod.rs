//! Real-time notification
//!
//! - [`MessageBus`]: single shared broadcast topic
//! - [`OrderNotifier`]: publishes order snapshots and diagnostic messages
//!
//! CRUD handlers publish `sync` signals through `ServerState::broadcast_sync`.
//! WebSocket sessions (`api::ws`) subscribe and forward every message.

pub mod bus;
pub mod notifier;

pub use bus::MessageBus;
pub use notifier::OrderNotifier;
pub use shared::message::{BusMessage, EventType, NotificationPayload, SyncPayload};
