//! Product API Handlers

use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ComboComponent, ComboComponentInput, MenuProduct, Product, ProductAvailability,
    ProductComplement, ProductComplementInput, ProductCreate, ProductUpdate,
};

use crate::catalog::StockResolver;
use crate::core::ServerState;
use crate::db;
use crate::db::repository::{RepoError, product};
use crate::utils::AppResult;
use crate::utils::money::{validate_amount, validate_quantity};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, validate_optional_text,
    validate_required_text,
};

const RESOURCE: &str = "product";

fn product_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", id)
}

fn invalid_component(msg: impl Into<String>, component_id: i64) -> AppError {
    AppError::with_message(ErrorCode::ComboInvalidComponent, msg)
        .with_detail("component_id", component_id)
}

async fn load(state: &ServerState, id: i64) -> AppResult<Product> {
    product::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| product_not_found(id))
}

async fn ensure_code_free(state: &ServerState, code: &str, exclude_id: Option<i64>) -> AppResult<()> {
    if product::code_exists(&state.pool, code, exclude_id).await? {
        return Err(AppError::new(ErrorCode::ProductCodeExists).with_detail("code", code));
    }
    Ok(())
}

fn validate_common(
    description: &Option<String>,
    image: &Option<String>,
    cost: Option<f64>,
) -> AppResult<()> {
    validate_optional_text(description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(image, "image", MAX_URL_LEN)?;
    if let Some(cost) = cost {
        validate_amount(cost, "cost")?;
    }
    Ok(())
}

/// GET /api/products
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(product::find_all(&state.pool).await?))
}

/// GET /api/products/menu - 在售商品 + 分类颜色 + 派生库存
pub async fn menu(State(state): State<ServerState>) -> AppResult<Json<Vec<MenuProduct>>> {
    Ok(Json(StockResolver::menu(&state.pool).await?))
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    Ok(Json(load(&state, id).await?))
}

/// GET /api/products/{id}/availability
///
/// 只是提示：下单时在事务内重新校验库存。
pub async fn availability(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ProductAvailability>> {
    let found = load(&state, id).await?;
    let mut conn = state.pool.acquire().await.map_err(RepoError::from)?;
    Ok(Json(StockResolver::availability(&mut conn, &found).await?))
}

/// POST /api/products
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.code, "code", MAX_SHORT_TEXT_LEN)?;
    validate_amount(payload.price, "price")?;
    validate_common(&payload.description, &payload.image, payload.cost)?;
    ensure_code_free(&state, &payload.code, None).await?;

    let created = product::create(&state.pool, payload).await?;
    tracing::info!(product_id = created.id, code = %created.code, "Product created");
    state
        .broadcast_sync(RESOURCE, "created", &created.id.to_string(), Some(&created))
        .await;
    Ok(Json(created))
}

/// PUT /api/products/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(code) = &payload.code {
        validate_required_text(code, "code", MAX_SHORT_TEXT_LEN)?;
        ensure_code_free(&state, code, Some(id)).await?;
    }
    if let Some(price) = payload.price {
        validate_amount(price, "price")?;
    }
    validate_common(&payload.description, &payload.image, payload.cost)?;

    let updated = product::update(&state.pool, id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => product_not_found(id),
            e => e.into(),
        })?;
    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&updated))
        .await;
    Ok(Json(updated))
}

/// DELETE /api/products/{id}
///
/// 已售出的商品被订单引用，删除会失败；改为停用 (`is_active = false`)。
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if !product::delete(&state.pool, id).await? {
        return Err(product_not_found(id));
    }
    state.broadcast_sync::<()>(RESOURCE, "deleted", &id.to_string(), None).await;
    Ok(Json(true))
}

/// GET /api/products/{id}/components
pub async fn components(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<ComboComponent>>> {
    load(&state, id).await?;
    Ok(Json(product::find_components(&state.pool, id).await?))
}

/// PUT /api/products/{id}/components - 整体替换套餐组件
pub async fn replace_components(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<Vec<ComboComponentInput>>,
) -> AppResult<Json<Vec<ComboComponent>>> {
    let combo = load(&state, id).await?;
    if !combo.is_combo {
        return Err(AppError::with_message(
            ErrorCode::ComboInvalidComponent,
            format!("{} is not a combo", combo.name),
        )
        .with_detail("product_id", id));
    }

    let mut seen = HashSet::new();
    for c in &payload {
        validate_quantity(c.quantity, "quantity")?;
        if c.component_id == id {
            return Err(invalid_component("A combo cannot contain itself", c.component_id));
        }
        if !seen.insert(c.component_id) {
            return Err(invalid_component("Duplicated component", c.component_id));
        }
        let component = product::find_by_id(&state.pool, c.component_id)
            .await?
            .ok_or_else(|| invalid_component("Component does not exist", c.component_id))?;
        if component.is_combo {
            return Err(invalid_component("Combos cannot be nested", c.component_id));
        }
    }

    let mut tx = db::begin_write(&state.pool).await?;
    product::replace_components(&mut tx, id, &payload).await?;
    tx.commit().await.map_err(RepoError::from)?;

    let components = product::find_components(&state.pool, id).await?;
    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&components))
        .await;
    Ok(Json(components))
}

/// GET /api/products/{id}/complements
pub async fn complements(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<ProductComplement>>> {
    load(&state, id).await?;
    Ok(Json(product::find_complements(&state.pool, id).await?))
}

/// PUT /api/products/{id}/complements - 整体替换配品
pub async fn replace_complements(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<Vec<ProductComplementInput>>,
) -> AppResult<Json<Vec<ProductComplement>>> {
    load(&state, id).await?;

    let mut seen = HashSet::new();
    for c in &payload {
        if let Some(q) = c.required_quantity {
            validate_quantity(q, "required_quantity")?;
        }
        if c.complement_id == id {
            return Err(AppError::invalid_field("complement_id", "A product cannot complement itself"));
        }
        if !seen.insert(c.complement_id) {
            return Err(AppError::invalid_field("complement_id", "Duplicated complement"));
        }
        if product::find_by_id(&state.pool, c.complement_id).await?.is_none() {
            return Err(product_not_found(c.complement_id));
        }
    }

    let mut tx = db::begin_write(&state.pool).await?;
    product::replace_complements(&mut tx, id, &payload).await?;
    tx.commit().await.map_err(RepoError::from)?;

    let complements = product::find_complements(&state.pool, id).await?;
    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&complements))
        .await;
    Ok(Json(complements))
}
