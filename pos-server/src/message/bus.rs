//! 消息总线核心实现
//!
//! # 架构
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  MessageBus                  │
//! │   broadcast::Sender<BusMessage> (单一主题)    │
//! └───────────────────────┬──────────────────────┘
//!                         │ subscribe()
//!          ┌──────────────┼──────────────┐
//!          ▼              ▼              ▼
//!     WS 会话 (吧台)   WS 会话 (收银)   WS 会话 (服务员)
//! ```
//!
//! 至多一次、尽力而为：没有确认、没有重放。看板断线期间的消息不会补发，
//! 重连后必须轮询 `GET /api/tables` / `GET /api/orders/active`。

use shared::error::{AppError, ErrorCode};
use shared::message::BusMessage;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Default capacity of the broadcast channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// 消息总线 - 服务器到所有看板的广播
#[derive(Debug, Clone)]
pub struct MessageBus {
    /// 服务器到客户端的广播通道
    server_tx: broadcast::Sender<BusMessage>,
    /// 关闭信号令牌
    shutdown_token: CancellationToken,
}

impl MessageBus {
    /// 创建默认容量的消息总线
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// 创建指定容量的消息总线
    pub fn with_capacity(capacity: usize) -> Self {
        let (server_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            server_tx,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// 发布消息 (服务器 -> 所有订阅者)
    ///
    /// 返回收到消息的订阅者数量；没有订阅者时返回 `BusUnavailable`。
    pub fn publish(&self, msg: BusMessage) -> Result<usize, AppError> {
        self.server_tx.send(msg).map_err(|_| {
            AppError::with_message(ErrorCode::BusUnavailable, "No subscribers on the message bus")
        })
    }

    /// 订阅广播
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.server_tx.subscribe()
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.server_tx.receiver_count()
    }

    /// 获取关闭信号令牌
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// 关闭消息总线 (WS 会话收到信号后退出)
    pub fn shutdown(&self) {
        tracing::info!("Shutting down message bus");
        self.shutdown_token.cancel();
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
