//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{Category, CategoryCreate, CategoryUpdate};

use crate::core::ServerState;
use crate::db::repository::{RepoError, category};
use crate::utils::AppResult;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_color, validate_optional_text, validate_required_text,
};

const RESOURCE: &str = "category";

fn category_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::CategoryNotFound).with_detail("category_id", id)
}

/// GET /api/categories
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(category::find_all(&state.pool).await?))
}

/// GET /api/categories/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Category>> {
    let found = category::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| category_not_found(id))?;
    Ok(Json(found))
}

/// POST /api/categories
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<Json<Category>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_color(&payload.color, "color")?;

    let created = category::create(&state.pool, payload).await?;
    state
        .broadcast_sync(RESOURCE, "created", &created.id.to_string(), Some(&created))
        .await;
    Ok(Json(created))
}

/// PUT /api/categories/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<Category>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_color(&payload.color, "color")?;

    let updated = category::update(&state.pool, id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => category_not_found(id),
            e => e.into(),
        })?;
    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&updated))
        .await;
    Ok(Json(updated))
}

/// DELETE /api/categories/{id}
///
/// 仍有商品时拒绝删除。
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let products = category::count_products(&state.pool, id).await?;
    if products > 0 {
        return Err(AppError::new(ErrorCode::CategoryHasProducts)
            .with_detail("category_id", id)
            .with_detail("products", products));
    }
    if !category::delete(&state.pool, id).await? {
        return Err(category_not_found(id));
    }
    state.broadcast_sync::<()>(RESOURCE, "deleted", &id.to_string(), None).await;
    Ok(Json(true))
}
