//! Currency API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{ConversionRequest, ConversionResult, Currency, CurrencyCreate, CurrencyUpdate};

use crate::core::ServerState;
use crate::db;
use crate::currency;
use crate::db::repository::{RepoError, currency as currency_repo};
use crate::utils::AppResult;
use crate::utils::money::{validate_amount, validate_positive_amount};
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};

const RESOURCE: &str = "currency";

fn currency_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::CurrencyNotFound).with_detail("currency_id", id)
}

fn unknown_code(code: &str) -> AppError {
    AppError::new(ErrorCode::CurrencyNotFound).with_detail("code", code)
}

/// 2-5 uppercase letters or digits
fn validate_code(code: &str) -> Result<(), AppError> {
    let valid = (2..=5).contains(&code.len())
        && code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if !valid {
        return Err(AppError::invalid_field(
            "code",
            "code must be 2-5 uppercase letters or digits",
        ));
    }
    Ok(())
}

/// GET /api/currencies
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Currency>>> {
    Ok(Json(currency_repo::find_all(&state.pool).await?))
}

/// GET /api/currencies/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Currency>> {
    let found = currency_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| currency_not_found(id))?;
    Ok(Json(found))
}

/// POST /api/currencies/convert
pub async fn convert(
    State(state): State<ServerState>,
    Json(payload): Json<ConversionRequest>,
) -> AppResult<Json<ConversionResult>> {
    validate_amount(payload.amount, "amount")?;
    let from = currency_repo::find_by_code(&state.pool, &payload.from)
        .await?
        .ok_or_else(|| unknown_code(&payload.from))?;
    let to = currency_repo::find_by_code(&state.pool, &payload.to)
        .await?
        .ok_or_else(|| unknown_code(&payload.to))?;
    Ok(Json(currency::convert(payload.amount, &from, &to)?))
}

/// POST /api/currencies
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CurrencyCreate>,
) -> AppResult<Json<Currency>> {
    validate_code(&payload.code)?;
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.symbol, "symbol", 8)?;
    validate_positive_amount(payload.exchange_rate, "exchange_rate")?;

    let code = payload.code.clone();
    let created = currency_repo::create(&state.pool, payload)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => {
                AppError::new(ErrorCode::CurrencyCodeExists).with_detail("code", code)
            }
            e => e.into(),
        })?;
    state
        .broadcast_sync(RESOURCE, "created", &created.id.to_string(), Some(&created))
        .await;
    Ok(Json(created))
}

/// PUT /api/currencies/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CurrencyUpdate>,
) -> AppResult<Json<Currency>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(symbol) = &payload.symbol {
        validate_required_text(symbol, "symbol", 8)?;
    }
    if let Some(rate) = payload.exchange_rate {
        validate_positive_amount(rate, "exchange_rate")?;
    }

    // 默认币种不能停用
    if payload.is_active == Some(false) {
        let current = currency_repo::find_by_id(&state.pool, id)
            .await?
            .ok_or_else(|| currency_not_found(id))?;
        if current.is_default {
            return Err(AppError::business_rule("The default currency cannot be deactivated"));
        }
    }

    let updated = currency_repo::update(&state.pool, id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => currency_not_found(id),
            e => e.into(),
        })?;
    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&updated))
        .await;
    Ok(Json(updated))
}

/// PUT /api/currencies/{id}/default
///
/// 单事务内清除旧默认并设置新默认。
pub async fn set_default(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Currency>> {
    let mut tx = db::begin_write(&state.pool).await?;
    let updated = currency_repo::set_default(&mut tx, id)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => currency_not_found(id),
            e => e.into(),
        })?;
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(currency = %updated.code, "Default currency changed");
    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&updated))
        .await;
    Ok(Json(updated))
}
