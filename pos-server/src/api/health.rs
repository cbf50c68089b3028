//! 健康检查 (公开，无需认证)
//!
//! ```json
//! { "status": "ok", "version": "0.1.0", "database": "ok", "subscribers": 2 }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use http::StatusCode;
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: &'static str,
    /// Connected WebSocket dashboards
    subscribers: usize,
}

async fn health(State(state): State<ServerState>) -> (StatusCode, Json<HealthResponse>) {
    let db_ok = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Health check database probe failed"))
        .is_ok();

    let status = if db_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status,
        Json(HealthResponse {
            status: if db_ok { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            database: if db_ok { "ok" } else { "error" },
            subscribers: state.message_bus.subscriber_count(),
        }),
    )
}
