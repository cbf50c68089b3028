//! Currency Repository

use super::{RepoError, RepoResult};
use shared::models::{Currency, CurrencyCreate, CurrencyUpdate};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Currency>> {
    let currencies = sqlx::query_as::<_, Currency>(
        "SELECT id, code, name, symbol, exchange_rate, is_default, is_active FROM currency ORDER BY is_default DESC, code",
    )
    .fetch_all(pool)
    .await?;
    Ok(currencies)
}

pub async fn find_by_id<'e>(exec: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<Currency>> {
    let currency = sqlx::query_as::<_, Currency>(
        "SELECT id, code, name, symbol, exchange_rate, is_default, is_active FROM currency WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(exec)
    .await?;
    Ok(currency)
}

pub async fn find_by_code(pool: &SqlitePool, code: &str) -> RepoResult<Option<Currency>> {
    let currency = sqlx::query_as::<_, Currency>(
        "SELECT id, code, name, symbol, exchange_rate, is_default, is_active FROM currency WHERE code = ?",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(currency)
}

pub async fn find_default(pool: &SqlitePool) -> RepoResult<Option<Currency>> {
    let currency = sqlx::query_as::<_, Currency>(
        "SELECT id, code, name, symbol, exchange_rate, is_default, is_active FROM currency WHERE is_default = 1 LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(currency)
}

pub async fn create(pool: &SqlitePool, data: CurrencyCreate) -> RepoResult<Currency> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO currency (code, name, symbol, exchange_rate, is_default, is_active) VALUES (?1, ?2, ?3, ?4, 0, 1) RETURNING id",
    )
    .bind(&data.code)
    .bind(&data.name)
    .bind(&data.symbol)
    .bind(data.exchange_rate)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create currency".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: CurrencyUpdate) -> RepoResult<Currency> {
    let rows = sqlx::query(
        "UPDATE currency SET name = COALESCE(?1, name), symbol = COALESCE(?2, symbol), exchange_rate = COALESCE(?3, exchange_rate), is_active = COALESCE(?4, is_active) WHERE id = ?5",
    )
    .bind(&data.name)
    .bind(&data.symbol)
    .bind(data.exchange_rate)
    .bind(data.is_active)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Currency {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Currency {id} not found")))
}

/// Make `id` the only default currency (run inside a transaction)
pub async fn set_default(conn: &mut SqliteConnection, id: i64) -> RepoResult<Currency> {
    if find_by_id(&mut *conn, id).await?.is_none() {
        return Err(RepoError::NotFound(format!("Currency {id} not found")));
    }
    sqlx::query("UPDATE currency SET is_default = 0 WHERE is_default = 1")
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE currency SET is_default = 1, is_active = 1 WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Currency {id} not found")))
}
