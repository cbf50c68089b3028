use std::sync::Arc;

use dashmap::DashMap;
use shared::message::{BusMessage, SyncPayload};
use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::db::DbService;
use crate::message::{MessageBus, OrderNotifier};
use crate::orders::OrderLifecycle;

/// 资源版本管理器
///
/// 每种资源独立的递增版本号，随 `sync` 消息下发，
/// 客户端据此判断数据新旧。
#[derive(Debug, Default)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 递增并返回新版本号 (首次为 1)
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 当前版本号，未出现过的资源为 0
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

/// 服务器状态
///
/// 所有字段都是廉价克隆的句柄，直接作为 axum `State` 使用。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置 (不可变) |
/// | pool | SQLite 连接池 |
/// | message_bus | 广播总线 |
/// | notifier | 订单快照推送 |
/// | orders | 订单生命周期 |
/// | jwt_service | 令牌校验 |
/// | resource_versions | sync 版本号 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub message_bus: MessageBus,
    pub notifier: OrderNotifier,
    pub orders: OrderLifecycle,
    pub jwt_service: Arc<JwtService>,
    pub resource_versions: Arc<ResourceVersions>,
}

impl ServerState {
    /// Wire every service around an open pool
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let message_bus = MessageBus::with_capacity(config.bus_capacity);
        let notifier = OrderNotifier::new(message_bus.clone());
        let orders = OrderLifecycle::new(pool.clone(), notifier.clone());
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Self {
            config,
            pool,
            message_bus,
            notifier,
            orders,
            jwt_service,
            resource_versions: Arc::new(ResourceVersions::new()),
        }
    }

    /// 初始化：工作目录 → 数据库 (含迁移) → 服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db = if config.is_in_memory() {
            DbService::in_memory().await?
        } else {
            DbService::new(&config.database_file().to_string_lossy()).await?
        };

        Ok(Self::new(config.clone(), db.pool))
    }

    /// 广播资源变更 (CRUD handler 写入成功后调用)
    ///
    /// 无订阅者时静默丢弃。
    pub async fn broadcast_sync<T: serde::Serialize>(
        &self,
        resource: &str,
        action: &str,
        id: &str,
        data: Option<&T>,
    ) {
        let version = self.resource_versions.increment(resource);
        let payload = SyncPayload {
            resource: resource.to_string(),
            version,
            action: action.to_string(),
            id: id.to_string(),
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };
        match BusMessage::sync(&payload) {
            Ok(msg) => {
                let _ = self.message_bus.publish(msg);
            }
            Err(e) => tracing::error!(resource, error = %e, "Failed to encode sync payload"),
        }
    }
}
