//! Cash Register API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    CashMovement, CashMovementCreate, CashRegister, CashRegisterClose, CashRegisterOpen,
    CashRegisterStatus,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db;
use crate::db::repository::{RepoError, cash_register};
use crate::utils::AppResult;
use crate::utils::money::{validate_amount, validate_positive_amount};
use crate::utils::validation::{
    MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text,
};

const RESOURCE: &str = "cash_register";
const DEFAULT_LIST_LIMIT: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

fn register_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::CashRegisterNotFound).with_detail("register_id", id)
}

async fn load(state: &ServerState, id: i64) -> AppResult<CashRegister> {
    cash_register::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| register_not_found(id))
}

/// GET /api/cash-registers?limit=
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<CashRegister>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 365);
    Ok(Json(cash_register::find_all(&state.pool, limit).await?))
}

/// GET /api/cash-registers/current - 当前打开的收银 (无则 null)
pub async fn current(State(state): State<ServerState>) -> AppResult<Json<Option<CashRegister>>> {
    Ok(Json(cash_register::find_open(&state.pool).await?))
}

/// POST /api/cash-registers/open
pub async fn open(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<CashRegisterOpen>,
) -> AppResult<Json<CashRegister>> {
    validate_amount(payload.opening_amount, "opening_amount")?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

    let register = cash_register::open(&state.pool, current_user.id, payload)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::new(ErrorCode::CashRegisterAlreadyOpen),
            e => e.into(),
        })?;
    tracing::info!(
        register_id = register.id,
        opening_amount = register.opening_amount,
        user_id = current_user.id,
        "Cash register opened"
    );
    state
        .broadcast_sync(RESOURCE, "created", &register.id.to_string(), Some(&register))
        .await;
    Ok(Json(register))
}

/// POST /api/cash-registers/{id}/close - 计算应有金额
pub async fn close(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CashRegisterClose>,
) -> AppResult<Json<CashRegister>> {
    validate_amount(payload.closing_amount, "closing_amount")?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;
    if load(&state, id).await?.status != CashRegisterStatus::Abierta {
        return Err(AppError::new(ErrorCode::CashRegisterNotOpen).with_detail("register_id", id));
    }

    let mut tx = db::begin_write(&state.pool).await?;
    let register = cash_register::close(&mut tx, id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => {
                AppError::new(ErrorCode::CashRegisterNotOpen).with_detail("register_id", id)
            }
            e => e.into(),
        })?;
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(
        register_id = id,
        expected = ?register.expected_amount,
        counted = ?register.closing_amount,
        "Cash register closed"
    );
    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&register))
        .await;
    Ok(Json(register))
}

/// GET /api/cash-registers/{id}/movements
pub async fn movements(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<CashMovement>>> {
    load(&state, id).await?;
    Ok(Json(cash_register::find_movements(&state.pool, id).await?))
}

/// POST /api/cash-registers/{id}/movements - 手工收支
pub async fn record_movement(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<CashMovementCreate>,
) -> AppResult<Json<CashMovement>> {
    validate_positive_amount(payload.amount, "amount")?;
    validate_required_text(&payload.concept, "concept", MAX_SHORT_TEXT_LEN)?;
    if load(&state, id).await?.status != CashRegisterStatus::Abierta {
        return Err(AppError::new(ErrorCode::CashRegisterNotOpen).with_detail("register_id", id));
    }

    let movement = cash_register::insert_movement(
        &state.pool,
        id,
        payload.movement_type,
        payload.amount,
        &payload.concept,
        None,
        current_user.id,
    )
    .await?;
    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&movement))
        .await;
    Ok(Json(movement))
}
