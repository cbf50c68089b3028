//! 认证中间件
//!
//! [`require_auth`] 校验 `Authorization: Bearer <token>` 并注入 [`CurrentUser`]；
//! [`require_permission`] 按权限 slug 拦截。

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;

/// Paths under `/api/` that skip header authentication
///
/// The WebSocket endpoint authenticates with `?token=` before upgrading.
const PUBLIC_API_PATHS: &[&str] = &["/api/ws"];

/// 认证中间件
///
/// 跳过：`OPTIONS` 预检、非 `/api/` 路径（`/health`、404）、[`PUBLIC_API_PATHS`]。
///
/// | 情况 | 错误码 |
/// |------|--------|
/// | 无 Authorization 头 | NotAuthenticated (401) |
/// | 令牌过期 | TokenExpired (401) |
/// | 其他无效令牌 | TokenInvalid (401) |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();
    if req.method() == http::Method::OPTIONS
        || !path.starts_with("/api/")
        || PUBLIC_API_PATHS.contains(&path)
    {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = req.uri().to_string());
            return Err(AppError::not_authenticated());
        }
    };

    let user = authenticate(&state.jwt_service, token).inspect_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            error = e.message.clone(),
            uri = req.uri().to_string()
        );
    })?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Validate a raw token into a [`CurrentUser`]
pub fn authenticate(jwt: &JwtService, token: &str) -> Result<CurrentUser, AppError> {
    let claims = jwt.validate_token(token).map_err(|e| match e {
        JwtError::ExpiredToken => AppError::token_expired(),
        _ => AppError::invalid_token("Invalid token"),
    })?;
    CurrentUser::try_from(claims).map_err(|e| AppError::invalid_token(e.to_string()))
}

/// 权限检查中间件
///
/// ```ignore
/// Router::new()
///     .route("/", post(handler::create))
///     .layer(middleware::from_fn(require_permission("orders:create")));
/// ```
///
/// 无权限返回 403 PermissionDenied。
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(AppError::not_authenticated)?;

            if !user.has_permission(permission) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = user.id,
                    role = user.role.clone(),
                    required_permission = permission
                );
                return Err(AppError::forbidden(format!("Permission denied: {permission}"))
                    .with_detail("required_permission", permission));
            }

            Ok(next.run(req).await)
        })
    }
}
