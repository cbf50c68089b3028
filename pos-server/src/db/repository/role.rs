//! Role Repository

use super::{RepoError, RepoResult};
use shared::models::{Role, RoleCreate, RoleUpdate};
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    let roles = sqlx::query_as::<_, Role>(
        "SELECT id, name, slug, description, permissions, is_system, is_active FROM role ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(roles)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Role>> {
    let role = sqlx::query_as::<_, Role>(
        "SELECT id, name, slug, description, permissions, is_system, is_active FROM role WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(role)
}

fn encode_permissions(permissions: &[String]) -> RepoResult<String> {
    serde_json::to_string(permissions)
        .map_err(|e| RepoError::Validation(format!("Invalid permissions: {e}")))
}

pub async fn create(pool: &SqlitePool, data: RoleCreate) -> RepoResult<Role> {
    let permissions = encode_permissions(&data.permissions)?;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO role (name, slug, description, permissions, is_system, is_active) VALUES (?1, ?2, ?3, ?4, 0, 1) RETURNING id",
    )
    .bind(&data.name)
    .bind(&data.slug)
    .bind(&data.description)
    .bind(permissions)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create role".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: RoleUpdate) -> RepoResult<Role> {
    let permissions = data
        .permissions
        .as_deref()
        .map(encode_permissions)
        .transpose()?;
    let rows = sqlx::query(
        "UPDATE role SET name = COALESCE(?1, name), description = COALESCE(?2, description), permissions = COALESCE(?3, permissions), is_active = COALESCE(?4, is_active) WHERE id = ?5",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(permissions)
    .bind(data.is_active)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Role {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Role {id} not found")))
}

pub async fn count_users(pool: &SqlitePool, id: i64) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM role WHERE id = ? AND is_system = 0")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
