//! 消息总线消息类型定义
//!
//! 这些类型在 pos-server 和看板之间共享。进程内通过 broadcast 通道传递，
//! 对外通过 WebSocket 以 JSON 文本帧推送。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use uuid::Uuid;

use crate::models::OrderSnapshot;

pub mod payload;
pub use payload::*;

/// 消息总线事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// 系统通知 (诊断/测试消息)
    Notification = 1,
    /// 订单状态变更 (完整快照)
    OrderUpdated = 2,
    /// 资源同步信号
    Sync = 3,
}

impl TryFrom<u8> for EventType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EventType::Notification),
            2 => Ok(EventType::OrderUpdated),
            3 => Ok(EventType::Sync),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Notification => write!(f, "notification"),
            EventType::OrderUpdated => write!(f, "order_updated"),
            EventType::Sync => write!(f, "sync"),
        }
    }
}

/// 消息总线消息体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub event_type: EventType,
    /// 发送方 (例如 "orders", "api")
    pub source: Option<String>,
    /// JSON 编码的载荷
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(event_type: EventType, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type,
            source: None,
            payload,
        }
    }

    /// 设置发送方
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// 创建订单变更消息
    pub fn order_updated(snapshot: &OrderSnapshot) -> Result<Self, serde_json::Error> {
        Ok(Self::new(EventType::OrderUpdated, serde_json::to_vec(snapshot)?))
    }

    /// 创建通知消息
    pub fn notification(payload: &NotificationPayload) -> Result<Self, serde_json::Error> {
        Ok(Self::new(EventType::Notification, serde_json::to_vec(payload)?))
    }

    /// 创建同步信号消息
    pub fn sync(payload: &SyncPayload) -> Result<Self, serde_json::Error> {
        Ok(Self::new(EventType::Sync, serde_json::to_vec(payload)?))
    }

    /// 解析载荷为指定类型
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    /// WebSocket 文本帧: `{"type": ..., "request_id": ..., "data": ...}`
    pub fn to_ws_frame(&self) -> Result<String, serde_json::Error> {
        let data: serde_json::Value = serde_json::from_slice(&self.payload)?;
        serde_json::to_string(&serde_json::json!({
            "type": self.event_type.to_string(),
            "request_id": self.request_id,
            "data": data,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;

    fn snapshot() -> OrderSnapshot {
        OrderSnapshot {
            id: 7,
            numero_orden: "ORD-20260101-ABC123".to_string(),
            estado: OrderStatus::Delivered,
            mesa_id: Some(5),
            mesa_numero: Some(5),
            usuario_id: 1,
            usuario_nombre: Some("Ana".to_string()),
            usuario_rol: Some("mesero".to_string()),
            subtotal: 120.0,
            total: 120.0,
            pagado: false,
            version: 2,
            created_at: 1,
            updated_at: 2,
            productos: vec![],
        }
    }

    #[test]
    fn test_event_type_conversion() {
        assert_eq!(EventType::try_from(2), Ok(EventType::OrderUpdated));
        assert!(EventType::try_from(9).is_err());
        assert_eq!(EventType::Sync.to_string(), "sync");
    }

    #[test]
    fn test_order_updated_roundtrip() {
        let msg = BusMessage::order_updated(&snapshot()).unwrap().with_source("orders");
        assert_eq!(msg.event_type, EventType::OrderUpdated);
        assert_eq!(msg.source.as_deref(), Some("orders"));
        let back: OrderSnapshot = msg.parse_payload().unwrap();
        assert_eq!(back, snapshot());
    }

    #[test]
    fn test_ws_frame_shape() {
        let msg = BusMessage::order_updated(&snapshot()).unwrap();
        let frame: serde_json::Value = serde_json::from_str(&msg.to_ws_frame().unwrap()).unwrap();
        assert_eq!(frame["type"], "order_updated");
        assert_eq!(frame["data"]["estado"], "entregada");
        assert_eq!(frame["data"]["numero_orden"], "ORD-20260101-ABC123");
    }

    #[test]
    fn test_notification_message() {
        let msg = BusMessage::notification(&NotificationPayload::info("Test", "Hello")).unwrap();
        let payload: NotificationPayload = msg.parse_payload().unwrap();
        assert_eq!(payload.title, "Test");
        assert_eq!(payload.level, NotificationLevel::Info);
    }
}
