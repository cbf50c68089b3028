use serde::{Deserialize, Serialize};
use std::fmt;

// ==================== Notification Level ====================

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ==================== Payloads ====================

/// 通知载荷 (服务端 -> 看板)
///
/// Diagnostic/utility messages (connectivity checks, operator hints).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub message: String,
    pub level: NotificationLevel,
    /// 附加数据 (JSON)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// 同步信号载荷 (服务端 -> 所有看板)
///
/// Broadcast after CRUD writes so dashboards refetch the resource.
///
/// # 示例
/// - `resource`: "dining_table"
/// - `version`: 42
/// - `action`: "updated"
/// - `id`: "5"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    /// 资源类型 (例如: "product", "dining_table", "currency")
    pub resource: String,
    /// 单调版本号 (每个资源独立计数)
    pub version: u64,
    /// 变更类型 ("created", "updated", "deleted")
    pub action: String,
    /// 资源 ID
    pub id: String,
    /// 资源数据 (deleted 时为 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// ==================== Convenience Constructors ====================

impl NotificationPayload {
    pub fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level,
            data: None,
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, message)
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
