//! Inventory API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    InventoryMovement, InventoryStock, MovementCreate, MovementType, Product, StockLevel,
    StockThresholdsUpdate,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db;
use crate::db::repository::inventory::{self, MovementOutcome, NewMovement};
use crate::db::repository::{RepoError, product};
use crate::utils::AppResult;
use crate::utils::money::{MAX_QUANTITY, validate_quantity};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};

const RESOURCE: &str = "inventory";
const DEFAULT_MOVEMENT_LIMIT: i64 = 100;
const MAX_MOVEMENT_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    pub product_id: Option<i64>,
    pub limit: Option<i64>,
}

/// Stock belongs to normal products; combo stock is derived
async fn stocked_product(state: &ServerState, product_id: i64) -> AppResult<Product> {
    let found = product::find_by_id(&state.pool, product_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", product_id))?;
    if found.is_combo {
        return Err(AppError::invalid_field(
            "product_id",
            "Combos have no stock of their own",
        ));
    }
    Ok(found)
}

/// GET /api/inventory - 库存列表 (含低于最低库存标记)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<StockLevel>>> {
    Ok(Json(inventory::find_levels(&state.pool).await?))
}

/// GET /api/inventory/{product_id}
pub async fn get_by_product(
    State(state): State<ServerState>,
    Path(product_id): Path<i64>,
) -> AppResult<Json<InventoryStock>> {
    let stock = inventory::find_by_product(&state.pool, product_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Stock for product {product_id}")))?;
    Ok(Json(stock))
}

/// PUT /api/inventory/{product_id} - 设置最低/最高库存
pub async fn set_thresholds(
    State(state): State<ServerState>,
    Path(product_id): Path<i64>,
    Json(payload): Json<StockThresholdsUpdate>,
) -> AppResult<Json<InventoryStock>> {
    stocked_product(&state, product_id).await?;
    if payload.min_stock.is_some_and(|m| m < 0) {
        return Err(AppError::invalid_field("min_stock", "min_stock must be non-negative"));
    }
    if let (Some(min), Some(max)) = (payload.min_stock, payload.max_stock)
        && max < min
    {
        return Err(AppError::invalid_field("max_stock", "max_stock must be >= min_stock"));
    }

    let stock = inventory::set_thresholds(&state.pool, product_id, payload).await?;
    state
        .broadcast_sync(RESOURCE, "updated", &product_id.to_string(), Some(&stock))
        .await;
    Ok(Json(stock))
}

/// GET /api/inventory/movements?product_id=&limit=
pub async fn movements(
    State(state): State<ServerState>,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<Vec<InventoryMovement>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_MOVEMENT_LIMIT)
        .clamp(1, MAX_MOVEMENT_LIMIT);
    Ok(Json(inventory::find_movements(&state.pool, query.product_id, limit).await?))
}

/// POST /api/inventory/movements - 手工出入库
///
/// `venta` / `venta_combo` 只由下单流程写入。`ajuste` 设置绝对数量。
pub async fn record_movement(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<MovementCreate>,
) -> AppResult<Json<InventoryMovement>> {
    match payload.movement_type {
        MovementType::Venta | MovementType::VentaCombo => {
            return Err(AppError::invalid_field(
                "movement_type",
                "Sales are recorded by orders",
            ));
        }
        MovementType::Ajuste => {
            if !(0..=MAX_QUANTITY).contains(&payload.quantity) {
                return Err(AppError::invalid_field(
                    "quantity",
                    format!("quantity must be between 0 and {MAX_QUANTITY}"),
                ));
            }
        }
        _ => validate_quantity(payload.quantity, "quantity")?,
    }
    validate_optional_text(&payload.reason, "reason", MAX_NOTE_LEN)?;
    stocked_product(&state, payload.product_id).await?;

    let mut tx = db::begin_write(&state.pool).await?;
    let outcome = inventory::record_movement(
        &mut tx,
        NewMovement {
            product_id: payload.product_id,
            movement_type: payload.movement_type,
            quantity: payload.quantity,
            reason: payload.reason.as_deref(),
            user_id: current_user.id,
            order_id: None,
        },
    )
    .await?;

    let movement = match outcome {
        MovementOutcome::Applied(m) => m,
        MovementOutcome::Insufficient { on_hand } => {
            return Err(AppError::new(ErrorCode::InsufficientStock)
                .with_detail("product_id", payload.product_id)
                .with_detail("required", payload.quantity)
                .with_detail("on_hand", on_hand));
        }
    };
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(
        product_id = movement.product_id,
        movement_type = ?movement.movement_type,
        quantity = movement.quantity,
        resulting = movement.resulting_quantity,
        "Inventory movement recorded"
    );
    state
        .broadcast_sync(RESOURCE, "updated", &movement.product_id.to_string(), Some(&movement))
        .await;
    Ok(Json(movement))
}
