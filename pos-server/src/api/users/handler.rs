//! User API Handlers
//!
//! 仅维护操作员记录与角色绑定，凭据由身份服务管理。

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{User, UserCreate, UserUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, role, user};
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_required_text};

const RESOURCE: &str = "user";

fn user_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::UserNotFound).with_detail("user_id", id)
}

fn validate_username(username: &str) -> Result<(), AppError> {
    validate_required_text(username, "username", MAX_SHORT_TEXT_LEN)?;
    if username.chars().any(char::is_whitespace) {
        return Err(AppError::invalid_field("username", "username must not contain spaces"));
    }
    Ok(())
}

/// 角色必须存在且启用；只有管理员能分配管理员角色
async fn ensure_role(state: &ServerState, role_id: i64, current_user: &CurrentUser) -> AppResult<()> {
    let found = role::find_by_id(&state.pool, role_id)
        .await?
        .filter(|r| r.is_active)
        .ok_or_else(|| AppError::new(ErrorCode::RoleNotFound).with_detail("role_id", role_id))?;
    if found.is_admin() && !current_user.is_admin() {
        return Err(AppError::new(ErrorCode::AdminRequired));
    }
    Ok(())
}

fn map_write_error(e: RepoError, username: Option<String>) -> AppError {
    match e {
        RepoError::Duplicate(_) => {
            let err = AppError::new(ErrorCode::UsernameExists);
            match username {
                Some(u) => err.with_detail("username", u),
                None => err,
            }
        }
        e => e.into(),
    }
}

/// GET /api/users
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(user::find_all(&state.pool).await?))
}

/// GET /api/users/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let found = user::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    Ok(Json(found))
}

/// POST /api/users
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<User>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_username(&payload.username)?;
    ensure_role(&state, payload.role_id, &current_user).await?;

    let username = payload.username.clone();
    let created = user::create(&state.pool, payload)
        .await
        .map_err(|e| map_write_error(e, Some(username)))?;
    state
        .broadcast_sync(RESOURCE, "created", &created.id.to_string(), Some(&created))
        .await;
    Ok(Json(created))
}

/// PUT /api/users/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(username) = &payload.username {
        validate_username(username)?;
    }
    if let Some(role_id) = payload.role_id {
        ensure_role(&state, role_id, &current_user).await?;
    }

    let username = payload.username.clone();
    let updated = user::update(&state.pool, id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => user_not_found(id),
            e => map_write_error(e, username),
        })?;
    state
        .broadcast_sync(RESOURCE, "updated", &id.to_string(), Some(&updated))
        .await;
    Ok(Json(updated))
}

/// DELETE /api/users/{id}
///
/// 不能删除自己。
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if current_user.id == id {
        return Err(AppError::business_rule("You cannot delete your own user"));
    }
    if !user::delete(&state.pool, id).await? {
        return Err(user_not_found(id));
    }
    tracing::info!(user_id = id, operator = %current_user.username, "User deleted");
    state.broadcast_sync::<()>(RESOURCE, "deleted", &id.to_string(), None).await;
    Ok(Json(true))
}
