//! Dining Table Repository

use super::{RepoError, RepoResult};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate, TableStatus};
use sqlx::{SqliteExecutor, SqlitePool};

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<DiningTable>> {
    let tables = sqlx::query_as::<_, DiningTable>(
        "SELECT id, number, capacity, status, location, notes, is_active, created_at, updated_at FROM dining_table ORDER BY number, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(tables)
}

pub async fn find_by_id<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
) -> RepoResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(
        "SELECT id, number, capacity, status, location, notes, is_active, created_at, updated_at FROM dining_table WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(exec)
    .await?;
    Ok(table)
}

pub async fn create(pool: &SqlitePool, data: DiningTableCreate) -> RepoResult<DiningTable> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO dining_table (number, capacity, status, location, notes, is_active, created_at, updated_at) VALUES (?1, ?2, 'disponible', ?3, ?4, 1, ?5, ?5) RETURNING id",
    )
    .bind(data.number)
    .bind(data.capacity.unwrap_or(4))
    .bind(&data.location)
    .bind(&data.notes)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create dining table".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: DiningTableUpdate) -> RepoResult<DiningTable> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE dining_table SET number = COALESCE(?1, number), capacity = COALESCE(?2, capacity), location = COALESCE(?3, location), notes = COALESCE(?4, notes), is_active = COALESCE(?5, is_active), updated_at = ?6 WHERE id = ?7",
    )
    .bind(data.number)
    .bind(data.capacity)
    .bind(&data.location)
    .bind(&data.notes)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Dining table {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Dining table {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM dining_table WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Conditional flip `disponible → ocupada`; `false` when the table was not available
pub async fn occupy_if_available<'e>(exec: impl SqliteExecutor<'e>, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE dining_table SET status = 'ocupada', updated_at = ?1 WHERE id = ?2 AND status = 'disponible'",
    )
    .bind(now)
    .bind(id)
    .execute(exec)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Unconditional status write
pub async fn set_status<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
    status: TableStatus,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE dining_table SET status = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn new_table(number: i64) -> DiningTableCreate {
        DiningTableCreate {
            number,
            capacity: Some(6),
            location: Some("VIP".into()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_update_delete() {
        let pool = test_pool().await;
        let t = create(&pool, new_table(5)).await.unwrap();
        assert_eq!(t.number, 5);
        assert_eq!(t.status, TableStatus::Available);
        assert!(t.is_active);

        let t = update(
            &pool,
            t.id,
            DiningTableUpdate {
                number: None,
                capacity: Some(8),
                location: None,
                notes: Some("Junto a la pista".into()),
                is_active: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(t.capacity, 8);
        assert_eq!(t.location.as_deref(), Some("VIP"));

        assert!(delete(&pool, t.id).await.unwrap());
        assert!(find_by_id(&pool, t.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn occupy_only_from_available() {
        let pool = test_pool().await;
        let t = create(&pool, new_table(1)).await.unwrap();
        assert!(occupy_if_available(&pool, t.id).await.unwrap());
        assert!(!occupy_if_available(&pool, t.id).await.unwrap());

        set_status(&pool, t.id, TableStatus::Reserved).await.unwrap();
        assert!(!occupy_if_available(&pool, t.id).await.unwrap());
        let t = find_by_id(&pool, t.id).await.unwrap().unwrap();
        assert_eq!(t.status, TableStatus::Reserved);
    }

    #[tokio::test]
    async fn update_missing_table() {
        let pool = test_pool().await;
        let err = update(
            &pool,
            999,
            DiningTableUpdate {
                number: Some(1),
                capacity: None,
                location: None,
                notes: None,
                is_active: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }
}
