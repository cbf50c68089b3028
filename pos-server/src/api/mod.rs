//! HTTP API
//!
//! 每个资源一个子模块，`router()` 返回挂在 `/api/...` 下的路由，
//! 读写分组分别加 [`require_permission`](crate::auth::require_permission)。
//!
//! | 模块 | 前缀 |
//! |------|------|
//! | [`health`] | `/health` (公开) |
//! | [`orders`] | `/api/orders` |
//! | [`tables`] | `/api/tables` |
//! | [`categories`] | `/api/categories` |
//! | [`products`] | `/api/products` |
//! | [`inventory`] | `/api/inventory` |
//! | [`cash_registers`] | `/api/cash-registers` |
//! | [`currencies`] | `/api/currencies` |
//! | [`settings`] | `/api/settings` |
//! | [`users`] / [`roles`] | `/api/users`, `/api/roles` |
//! | [`message`] | `/api/message/emit` |
//! | [`ws`] | `/api/ws?token=` |
//!
//! 成功响应直接返回 JSON 实体；错误统一为 `ApiResponse` 信封。

pub mod cash_registers;
pub mod categories;
pub mod currencies;
pub mod health;
pub mod inventory;
pub mod message;
pub mod orders;
pub mod products;
pub mod roles;
pub mod settings;
pub mod tables;
pub mod users;
pub mod ws;

use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue, StatusCode};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::core::ServerState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// 并发请求上限，超出的请求排队等待
const MAX_CONCURRENT_REQUESTS: usize = 256;

/// 超时返回 408 而不是挂起连接
fn request_timeout(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Every route, no middleware, no state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(tables::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(inventory::router())
        .merge(cash_registers::router())
        .merge(currencies::router())
        .merge(settings::router())
        .merge(users::router())
        .merge(roles::router())
        .merge(message::router())
        .merge(ws::router())
}

/// Fully layered application, used by the server and the integration tests
///
/// Layers run outside-in: request id → trace → concurrency limit →
/// compression → CORS → timeout → JWT auth → per-group permission → handler.
pub fn build_app(state: ServerState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let timeout = Duration::from_millis(state.config.request_timeout_ms);

    build_router()
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(request_timeout(timeout))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, XRequestId))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use tower::ServiceExt;

    #[tokio::test]
    async fn slow_handler_times_out_with_408() {
        let app: Router = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    "late"
                }),
            )
            .route("/fast", get(|| async { "ok" }))
            .layer(request_timeout(Duration::from_millis(20)));

        let slow = app
            .clone()
            .oneshot(http::Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(slow.status(), StatusCode::REQUEST_TIMEOUT);

        let fast = app
            .oneshot(http::Request::get("/fast").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(fast.status(), StatusCode::OK);
    }
}
