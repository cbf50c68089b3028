//! Cash Register Repository
//!
//! Global single register: only one `abierta` row at a time (enforced by a
//! partial unique index as well as the check in [`open`]).

use super::{RepoError, RepoResult};
use shared::models::{
    CashMovement, CashMovementType, CashRegister, CashRegisterClose, CashRegisterOpen,
};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

pub async fn find_by_id<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
) -> RepoResult<Option<CashRegister>> {
    let register = sqlx::query_as::<_, CashRegister>(
        "SELECT id, opened_by, opening_amount, closing_amount, expected_amount, status, opened_at, closed_at, notes FROM cash_register WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(exec)
    .await?;
    Ok(register)
}

pub async fn find_open<'e>(exec: impl SqliteExecutor<'e>) -> RepoResult<Option<CashRegister>> {
    let register = sqlx::query_as::<_, CashRegister>(
        "SELECT id, opened_by, opening_amount, closing_amount, expected_amount, status, opened_at, closed_at, notes FROM cash_register WHERE status = 'abierta' LIMIT 1",
    )
    .fetch_optional(exec)
    .await?;
    Ok(register)
}

pub async fn find_all(pool: &SqlitePool, limit: i64) -> RepoResult<Vec<CashRegister>> {
    let registers = sqlx::query_as::<_, CashRegister>(
        "SELECT id, opened_by, opening_amount, closing_amount, expected_amount, status, opened_at, closed_at, notes FROM cash_register ORDER BY opened_at DESC, id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(registers)
}

pub async fn open(pool: &SqlitePool, user_id: i64, data: CashRegisterOpen) -> RepoResult<CashRegister> {
    if find_open(pool).await?.is_some() {
        return Err(RepoError::Duplicate("A cash register is already open".into()));
    }

    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO cash_register (opened_by, opening_amount, status, opened_at, notes) VALUES (?1, ?2, 'abierta', ?3, ?4) RETURNING id",
    )
    .bind(user_id)
    .bind(data.opening_amount)
    .bind(now)
    .bind(&data.notes)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to open cash register".into()))
}

/// Close an open register; expected = opening + ingresos − egresos, computed in SQL
pub async fn close(
    conn: &mut SqliteConnection,
    id: i64,
    data: CashRegisterClose,
) -> RepoResult<CashRegister> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE cash_register SET status = 'cerrada', closed_at = ?1, closing_amount = ?2, \
         expected_amount = ROUND(opening_amount \
            + COALESCE((SELECT SUM(amount) FROM cash_movement WHERE register_id = ?4 AND movement_type = 'ingreso'), 0) \
            - COALESCE((SELECT SUM(amount) FROM cash_movement WHERE register_id = ?4 AND movement_type = 'egreso'), 0), 2), \
         notes = COALESCE(?3, notes) \
         WHERE id = ?4 AND status = 'abierta'",
    )
    .bind(now)
    .bind(data.closing_amount)
    .bind(&data.notes)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Cash register {id} not found or already closed"
        )));
    }
    find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Cash register {id} not found")))
}

pub async fn insert_movement<'e>(
    exec: impl SqliteExecutor<'e>,
    register_id: i64,
    movement_type: CashMovementType,
    amount: f64,
    concept: &str,
    order_id: Option<i64>,
    user_id: i64,
) -> RepoResult<CashMovement> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO cash_movement (register_id, movement_type, amount, concept, order_id, user_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING id",
    )
    .bind(register_id)
    .bind(movement_type)
    .bind(amount)
    .bind(concept)
    .bind(order_id)
    .bind(user_id)
    .bind(now)
    .fetch_one(exec)
    .await?;

    Ok(CashMovement {
        id,
        register_id,
        movement_type,
        amount,
        concept: concept.to_string(),
        order_id,
        user_id,
        created_at: now,
    })
}

pub async fn find_movements(pool: &SqlitePool, register_id: i64) -> RepoResult<Vec<CashMovement>> {
    let movements = sqlx::query_as::<_, CashMovement>(
        "SELECT id, register_id, movement_type, amount, concept, order_id, user_id, created_at FROM cash_movement WHERE register_id = ? ORDER BY id",
    )
    .bind(register_id)
    .fetch_all(pool)
    .await?;
    Ok(movements)
}
