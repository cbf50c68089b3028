//! User Repository

use super::{RepoError, RepoResult};
use shared::models::{User, UserCreate, UserUpdate};
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, name, username, role_id, is_active, created_at FROM users ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, username, role_id, is_active, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn create(pool: &SqlitePool, data: UserCreate) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, username, role_id, is_active, created_at) VALUES (?1, ?2, ?3, 1, ?4) RETURNING id",
    )
    .bind(&data.name)
    .bind(&data.username)
    .bind(data.role_id)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: UserUpdate) -> RepoResult<User> {
    let rows = sqlx::query(
        "UPDATE users SET name = COALESCE(?1, name), username = COALESCE(?2, username), role_id = COALESCE(?3, role_id), is_active = COALESCE(?4, is_active) WHERE id = ?5",
    )
    .bind(&data.name)
    .bind(&data.username)
    .bind(data.role_id)
    .bind(data.is_active)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
