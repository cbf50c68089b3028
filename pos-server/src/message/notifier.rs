//! OrderNotifier - order change fan-out
//!
//! Called by the lifecycle manager after a successful commit. Publishing is
//! best effort: no subscribers means nobody is watching, which is fine.

use shared::error::{AppError, AppResult, ErrorCode};
use shared::message::{BusMessage, NotificationPayload};
use shared::models::OrderSnapshot;

use super::MessageBus;

const SOURCE_ORDERS: &str = "orders";
const SOURCE_DIAGNOSTICS: &str = "diagnostics";

#[derive(Debug, Clone)]
pub struct OrderNotifier {
    bus: MessageBus,
}

impl OrderNotifier {
    pub fn new(bus: MessageBus) -> Self {
        Self { bus }
    }

    /// Publish the full snapshot as `order_updated`
    ///
    /// Returns how many subscribers received it.
    pub fn order_updated(&self, snapshot: &OrderSnapshot) -> usize {
        let msg = match BusMessage::order_updated(snapshot) {
            Ok(msg) => msg.with_source(SOURCE_ORDERS),
            Err(e) => {
                tracing::error!(order_id = snapshot.id, error = %e, "Failed to encode order snapshot");
                return 0;
            }
        };
        self.deliver(msg, snapshot.id)
    }

    /// Diagnostic message used to check dashboard connectivity
    pub fn notification(&self, payload: &NotificationPayload) -> AppResult<usize> {
        let msg = BusMessage::notification(payload)
            .map_err(|e| AppError::with_message(ErrorCode::InternalError, e.to_string()))?
            .with_source(SOURCE_DIAGNOSTICS);
        Ok(self.deliver(msg, 0))
    }

    fn deliver(&self, msg: BusMessage, order_id: i64) -> usize {
        let event = msg.event_type;
        match self.bus.publish(msg) {
            Ok(receivers) => {
                tracing::debug!(%event, order_id, receivers, "Published bus message");
                receivers
            }
            Err(_) => {
                tracing::debug!(%event, order_id, "No dashboard subscribed, message dropped");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::EventType;
    use shared::models::OrderStatus;

    fn snapshot() -> OrderSnapshot {
        OrderSnapshot {
            id: 3,
            numero_orden: "ORD-20260101-AAAAAA".into(),
            estado: OrderStatus::Ready,
            mesa_id: None,
            mesa_numero: None,
            usuario_id: 1,
            usuario_nombre: None,
            usuario_rol: None,
            subtotal: 0.0,
            total: 0.0,
            pagado: false,
            version: 3,
            created_at: 0,
            updated_at: 0,
            productos: vec![],
        }
    }

    #[tokio::test]
    async fn order_updated_reaches_subscribers() {
        let bus = MessageBus::new();
        let notifier = OrderNotifier::new(bus.clone());
        let mut rx = bus.subscribe();

        assert_eq!(notifier.order_updated(&snapshot()), 1);
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.event_type, EventType::OrderUpdated);
        assert_eq!(msg.source.as_deref(), Some("orders"));
        let got: OrderSnapshot = msg.parse_payload().unwrap();
        assert_eq!(got.estado, OrderStatus::Ready);
    }

    #[test]
    fn no_subscribers_is_not_an_error() {
        let notifier = OrderNotifier::new(MessageBus::new());
        assert_eq!(notifier.order_updated(&snapshot()), 0);
        assert_eq!(
            notifier.notification(&NotificationPayload::info("ping", "hola")).unwrap(),
            0
        );
    }
}
