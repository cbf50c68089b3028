//! 工具模块
//!
//! - [`logger`] - tracing 初始化
//! - [`money`] - 金额计算 (rust_decimal)
//! - [`validation`] - 输入校验

pub mod logger;
pub mod money;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
