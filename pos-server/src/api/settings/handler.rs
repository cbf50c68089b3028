//! Settings API Handlers
//!
//! 值按声明类型存储为 TEXT，读取时解码，写入时按声明类型校验。

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{SETTING_DEFAULT_CURRENCY, Setting, SettingRow, SettingUpdate, SettingValue};

use crate::core::ServerState;
use crate::db::repository::{RepoError, currency, setting};
use crate::utils::AppResult;

const RESOURCE: &str = "setting";

fn setting_not_found(key: &str) -> AppError {
    AppError::new(ErrorCode::SettingNotFound).with_detail("key", key)
}

fn decode(row: SettingRow) -> AppResult<Setting> {
    let value = SettingValue::from_raw(row.value_type, &row.value).ok_or_else(|| {
        tracing::error!(key = %row.key, "Stored setting does not match its declared type");
        AppError::internal(format!("Setting {} is corrupted", row.key))
    })?;
    Ok(Setting {
        key: row.key,
        value,
        value_type: row.value_type,
        description: row.description,
        updated_at: row.updated_at,
    })
}

/// GET /api/settings
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Setting>>> {
    let rows = setting::find_all(&state.pool).await?;
    let settings = rows.into_iter().map(decode).collect::<AppResult<Vec<_>>>()?;
    Ok(Json(settings))
}

/// GET /api/settings/{key}
pub async fn get_by_key(
    State(state): State<ServerState>,
    Path(key): Path<String>,
) -> AppResult<Json<Setting>> {
    let row = setting::find_by_key(&state.pool, &key)
        .await?
        .ok_or_else(|| setting_not_found(&key))?;
    Ok(Json(decode(row)?))
}

/// PUT /api/settings/{key}
pub async fn update(
    State(state): State<ServerState>,
    Path(key): Path<String>,
    Json(payload): Json<SettingUpdate>,
) -> AppResult<Json<Setting>> {
    let current = setting::find_by_key(&state.pool, &key)
        .await?
        .ok_or_else(|| setting_not_found(&key))?;

    let value = SettingValue::from_json(current.value_type, payload.value).ok_or_else(|| {
        AppError::new(ErrorCode::SettingTypeMismatch)
            .with_detail("key", key.as_str())
            .with_detail("expected", format!("{:?}", current.value_type).to_lowercase())
    })?;

    if key == SETTING_DEFAULT_CURRENCY {
        let code = value.as_str().unwrap_or_default();
        let known = currency::find_by_code(&state.pool, code).await?;
        if !known.is_some_and(|c| c.is_active) {
            return Err(AppError::new(ErrorCode::CurrencyNotFound).with_detail("code", code));
        }
    }

    let row = setting::update_value(&state.pool, &key, &value)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => setting_not_found(&key),
            e => e.into(),
        })?;
    let updated = decode(row)?;

    tracing::info!(key = %key, "Setting updated");
    state
        .broadcast_sync(RESOURCE, "updated", &key, Some(&updated))
        .await;
    Ok(Json(updated))
}
