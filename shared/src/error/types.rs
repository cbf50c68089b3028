//! AppError and the error envelope

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::codes::ErrorCode;

/// 业务错误：错误码 + 可读消息 + 结构化细节
///
/// `details` 按键排序，便于看板和日志稳定比对。
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<BTreeMap<String, Value>>,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach one detail entry (later keys overwrite earlier ones)
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ---- 通用 ----

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Validation error naming the offending request field
    pub fn invalid_field(field: &str, msg: impl Into<String>) -> Self {
        Self::validation(msg).with_detail("field", field)
    }

    /// Operation refused by a business rule (same code as validation)
    pub fn business_rule(msg: impl Into<String>) -> Self {
        Self::validation(msg)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{resource} not found"))
            .with_detail("resource", resource)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    // ---- 认证 / 权限 ----

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }
}

/// 错误信封
///
/// 成功响应直接返回实体 JSON，只有失败才使用信封：
///
/// ```json
/// { "code": 7002, "message": "Table is occupied", "details": { "table_id": 5 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, Value>>,
}

impl ApiResponse {
    pub fn error(err: &AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }

    /// Decoded error code; `None` for codes this build does not know
    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::try_from(self.code).ok()
    }
}

impl From<ApiResponse> for AppError {
    fn from(resp: ApiResponse) -> Self {
        Self {
            code: resp.error_code().unwrap_or(ErrorCode::Unknown),
            message: resp.message,
            details: resp.details,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if !self.code.category().is_client_side() {
            tracing::error!(code = %self.code, message = %self.message, "System error");
        }
        (self.http_status(), axum::Json(ApiResponse::error(&self))).into_response()
    }
}
