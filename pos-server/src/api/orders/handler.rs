//! Order API Handlers
//!
//! 状态变更与快照推送由 [`OrderLifecycle`](crate::orders::OrderLifecycle) 完成，
//! handler 只做提取和转发。

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use shared::models::{
    Order, OrderCreate, OrderDetail, OrderFilter, OrderHistory, OrderPayment, OrderSnapshot,
    OrderStatusUpdate,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

const RESOURCE: &str = "orders";

/// GET /api/orders?status=&table_id=&is_paid=&limit=
pub async fn list(
    State(state): State<ServerState>,
    Query(filter): Query<OrderFilter>,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.list(&filter).await?))
}

/// GET /api/orders/active - 吧台/收银看板轮询
pub async fn active(State(state): State<ServerState>) -> AppResult<Json<Vec<OrderSnapshot>>> {
    Ok(Json(state.orders.active().await?))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    Ok(Json(state.orders.get(id).await?))
}

/// GET /api/orders/{id}/history
pub async fn history(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<OrderHistory>>> {
    Ok(Json(state.orders.history(id).await?))
}

/// POST /api/orders - 提交购物车
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<OrderDetail>> {
    let detail = state.orders.create_order(payload, current_user.id).await?;
    Ok(Json(detail))
}

/// PUT /api/orders/{id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<OrderSnapshot>> {
    let snapshot = state
        .orders
        .update_status(id, payload.status, payload.expected_version, current_user.id)
        .await?;
    Ok(Json(snapshot))
}

/// POST /api/orders/{id}/pay - 结账 (不改变状态，不推送)
pub async fn pay(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderPayment>,
) -> AppResult<Json<Order>> {
    let order = state
        .orders
        .mark_paid(id, payload.payment_method, current_user.id)
        .await?;
    Ok(Json(order))
}

/// POST /api/orders/{id}/recalculate
pub async fn recalculate(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.recompute_totals(id, current_user.id).await?))
}

/// DELETE /api/orders/{id} - 不可恢复
pub async fn destroy(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let removed = state.orders.destroy(id, current_user.id).await?;
    state
        .broadcast_sync(RESOURCE, "deleted", &id.to_string(), Some(&removed))
        .await;
    Ok(Json(true))
}
