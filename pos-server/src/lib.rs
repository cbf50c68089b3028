//! Nightclub POS Server - 夜店/酒吧点单服务
//!
//! # 架构概述
//!
//! 单进程 HTTP 服务，SQLite 持久化，看板通过 WebSocket 接收推送：
//!
//! - **订单生命周期** (`orders`): 建单、状态机、结账、销毁，单事务内完成
//! - **桌台** (`tables`): 占用状态由活跃订单推导
//! - **目录** (`catalog`): 套餐 (combo) 可用性与库存推导
//! - **消息总线** (`message`): 广播订单快照与同步信号
//! - **认证** (`auth`): 外部签发的 JWT 校验 + 权限
//! - **HTTP API** (`api`): RESTful 接口与 WebSocket
//!
//! # 模块结构
//!
//! ```text
//! pos-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── auth/          # JWT 校验、权限
//! ├── api/           # HTTP 路由和处理器
//! ├── orders/        # 订单生命周期
//! ├── tables/        # 桌台占用
//! ├── catalog/       # 套餐库存推导
//! ├── currency/      # 汇率换算
//! ├── message/       # 消息总线
//! ├── db/            # SQLite 仓储层
//! └── utils/         # 日志、金额、校验
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod core;
pub mod currency;
pub mod db;
pub mod message;
pub mod orders;
pub mod tables;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use message::{BusMessage, EventType, MessageBus};
pub use orders::OrderLifecycle;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
    ____  ____  _____
   / __ \/ __ \/ ___/
  / /_/ / / / /\__ \
 / ____/ /_/ /___/ /
/_/    \____//____/   v{}
    "#,
        env!("CARGO_PKG_VERSION")
    );
}
