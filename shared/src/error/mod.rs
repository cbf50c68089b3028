//! 统一错误体系
//!
//! - [`ErrorCode`]: `u16` 错误码，按千位分域
//! - [`ErrorCategory`]: 由错误码推导的领域
//! - [`AppError`]: 错误码 + 消息 + 细节，实现 axum `IntoResponse`
//! - [`ApiResponse`]: 失败时返回给看板的信封
//!
//! | 区间 | 领域 |
//! |------|------|
//! | 0xxx | 通用 |
//! | 1xxx | 认证 |
//! | 2xxx | 权限 |
//! | 3xxx | 币种与设置 |
//! | 4xxx | 订单 |
//! | 5xxx | 收银 |
//! | 6xxx | 商品与库存 |
//! | 7xxx | 桌台 |
//! | 8xxx | 员工与角色 |
//! | 9xxx | 系统 |
//!
//! ```
//! use shared::error::{ApiResponse, AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::TableOccupied).with_detail("table_id", 5);
//! let body = ApiResponse::error(&err);
//! assert_eq!(body.code, 7002);
//! assert_eq!(body.details.unwrap()["table_id"], 5);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
