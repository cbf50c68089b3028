//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, Order, TableOverview, TableStatusUpdate,
};

use crate::core::ServerState;
use crate::db;
use crate::db::repository::{RepoError, dining_table};
use crate::tables::TableTracker;
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text};

const RESOURCE: &str = "dining_table";
const MAX_CAPACITY: i32 = 100;

fn table_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::TableNotFound).with_detail("table_id", id)
}

fn validate_fields(
    number: Option<i64>,
    capacity: Option<i32>,
    location: &Option<String>,
    notes: &Option<String>,
) -> AppResult<()> {
    if let Some(n) = number
        && n < 1
    {
        return Err(AppError::invalid_field("number", "Table number must be positive"));
    }
    if let Some(c) = capacity
        && !(1..=MAX_CAPACITY).contains(&c)
    {
        return Err(AppError::invalid_field(
            "capacity",
            format!("capacity must be between 1 and {MAX_CAPACITY}"),
        ));
    }
    validate_optional_text(location, "location", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(notes, "notes", MAX_NOTE_LEN)?;
    Ok(())
}

/// GET /api/tables - 看板轮询视图 (含派生占用信息)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<TableOverview>>> {
    let tables = dining_table::find_all(&state.pool).await?;
    let mut conn = state.pool.acquire().await.map_err(RepoError::from)?;
    let mut overview = Vec::with_capacity(tables.len());
    for table in tables {
        overview.push(TableTracker::overview(&mut conn, table).await?);
    }
    Ok(Json(overview))
}

/// GET /api/tables/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TableOverview>> {
    let mut conn = state.pool.acquire().await.map_err(RepoError::from)?;
    let table = dining_table::find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| table_not_found(id))?;
    Ok(Json(TableTracker::overview(&mut conn, table).await?))
}

/// GET /api/tables/{id}/active-order - 最近的 pendiente / en_proceso 订单
pub async fn active_order(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Option<Order>>> {
    let mut conn = state.pool.acquire().await.map_err(RepoError::from)?;
    dining_table::find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| table_not_found(id))?;
    Ok(Json(TableTracker::active_order(&mut conn, id).await?))
}

/// POST /api/tables
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    validate_fields(Some(payload.number), payload.capacity, &payload.location, &payload.notes)?;
    let table = dining_table::create(&state.pool, payload).await?;

    let id = table.id.to_string();
    state.broadcast_sync(RESOURCE, "created", &id, Some(&table)).await;
    Ok(Json(table))
}

/// PUT /api/tables/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<Json<DiningTable>> {
    validate_fields(payload.number, payload.capacity, &payload.location, &payload.notes)?;
    let table = dining_table::update(&state.pool, id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => table_not_found(id),
            e => e.into(),
        })?;

    state.broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&table)).await;
    Ok(Json(table))
}

/// PUT /api/tables/{id}/status - 手动改状态
///
/// 有活动订单时不能设为 disponible。
pub async fn set_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TableStatusUpdate>,
) -> AppResult<Json<DiningTable>> {
    let mut tx = db::begin_write(&state.pool).await?;
    let table = TableTracker::set_status(&mut tx, id, payload.status).await?;
    tx.commit().await.map_err(RepoError::from)?;

    state.broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&table)).await;
    Ok(Json(table))
}

/// DELETE /api/tables/{id}
///
/// 有活动订单的桌台不能删除。
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let mut conn = state.pool.acquire().await.map_err(RepoError::from)?;
    if let Some(active) = TableTracker::active_order(&mut conn, id).await? {
        return Err(AppError::new(ErrorCode::TableHasActiveOrders).with_detail("order_id", active.id));
    }
    drop(conn);

    if !dining_table::delete(&state.pool, id).await? {
        return Err(table_not_found(id));
    }
    state.broadcast_sync::<()>(RESOURCE, "deleted", &id.to_string(), None).await;
    Ok(Json(true))
}
