//! Category Repository

use super::{RepoError, RepoResult};
use shared::models::{Category, CategoryCreate, CategoryUpdate};
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, description, color, is_active FROM category ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, description, color, is_active FROM category WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(category)
}

pub async fn create(pool: &SqlitePool, data: CategoryCreate) -> RepoResult<Category> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO category (name, description, color, is_active) VALUES (?1, ?2, ?3, 1) RETURNING id",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(&data.color)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create category".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: CategoryUpdate) -> RepoResult<Category> {
    let rows = sqlx::query(
        "UPDATE category SET name = COALESCE(?1, name), description = COALESCE(?2, description), color = COALESCE(?3, color), is_active = COALESCE(?4, is_active) WHERE id = ?5",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(&data.color)
    .bind(data.is_active)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Category {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Category {id} not found")))
}

pub async fn count_products(pool: &SqlitePool, id: i64) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE category_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM category WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
