//! Role API Handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{Role, RoleCreate, RoleUpdate};

use crate::auth::CurrentUser;
use crate::auth::permissions::{ALL, ALL_PERMISSIONS, is_valid_permission};
use crate::core::ServerState;
use crate::db::repository::{RepoError, role};
use crate::utils::AppResult;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text, validate_slug,
};

const RESOURCE: &str = "role";

fn role_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::RoleNotFound).with_detail("role_id", id)
}

/// 校验权限列表；授予 `all` 需要管理员
fn validate_permissions(permissions: &[String], current_user: &CurrentUser) -> AppResult<()> {
    for p in permissions {
        if !is_valid_permission(p) {
            return Err(AppError::invalid_field("permissions", format!("Unknown permission: {p}")));
        }
    }
    if permissions.iter().any(|p| p == ALL) && !current_user.is_admin() {
        return Err(AppError::new(ErrorCode::AdminRequired));
    }
    Ok(())
}

/// GET /api/roles
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Role>>> {
    Ok(Json(role::find_all(&state.pool).await?))
}

/// GET /api/roles/permissions
pub async fn permissions() -> Json<Vec<&'static str>> {
    Json(ALL_PERMISSIONS.to_vec())
}

/// GET /api/roles/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Role>> {
    let found = role::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| role_not_found(id))?;
    Ok(Json(found))
}

/// POST /api/roles
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<RoleCreate>,
) -> AppResult<Json<Role>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_slug(&payload.slug, "slug")?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_permissions(&payload.permissions, &current_user)?;

    let slug = payload.slug.clone();
    let created = role::create(&state.pool, payload)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => {
                AppError::new(ErrorCode::RoleNameExists).with_detail("slug", slug)
            }
            e => e.into(),
        })?;
    state
        .broadcast_sync(RESOURCE, "created", &created.id.to_string(), Some(&created))
        .await;
    Ok(Json(created))
}

/// PUT /api/roles/{id}
///
/// 系统角色的权限不可修改。
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<Json<Role>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let current = role::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| role_not_found(id))?;
    if let Some(permissions) = &payload.permissions {
        if current.is_system {
            return Err(AppError::business_rule("System role permissions cannot be changed"));
        }
        validate_permissions(permissions, &current_user)?;
    }
    if current.is_system && payload.is_active == Some(false) {
        return Err(AppError::business_rule("System roles cannot be deactivated"));
    }

    let updated = role::update(&state.pool, id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => role_not_found(id),
            RepoError::Duplicate(_) => AppError::new(ErrorCode::RoleNameExists),
            e => e.into(),
        })?;
    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&updated))
        .await;
    Ok(Json(updated))
}

/// DELETE /api/roles/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let current = role::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| role_not_found(id))?;
    if current.is_system {
        return Err(AppError::business_rule("System roles cannot be deleted"));
    }
    let users = role::count_users(&state.pool, id).await?;
    if users > 0 {
        return Err(AppError::new(ErrorCode::RoleInUse)
            .with_detail("role_id", id)
            .with_detail("users", users));
    }
    if !role::delete(&state.pool, id).await? {
        return Err(role_not_found(id));
    }
    state.broadcast_sync::<()>(RESOURCE, "deleted", &id.to_string(), None).await;
    Ok(Json(true))
}
