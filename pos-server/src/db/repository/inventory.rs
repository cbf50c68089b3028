//! Inventory Repository (stock on hand + movement ledger)

use super::{RepoError, RepoResult};
use shared::models::{InventoryMovement, InventoryStock, MovementType, StockLevel, StockThresholdsUpdate};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

/// Result of applying a movement to the stock row
#[derive(Debug)]
pub enum MovementOutcome {
    Applied(InventoryMovement),
    /// Movement would leave negative stock; nothing was written
    Insufficient { on_hand: i64 },
}

/// Movement to record
#[derive(Debug, Clone)]
pub struct NewMovement<'a> {
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: Option<&'a str>,
    pub user_id: i64,
    pub order_id: Option<i64>,
}

pub async fn find_levels(pool: &SqlitePool) -> RepoResult<Vec<StockLevel>> {
    let levels = sqlx::query_as::<_, StockLevel>(
        "SELECT s.product_id, p.name AS product_name, s.quantity, s.min_stock, s.max_stock, (s.quantity < s.min_stock) AS below_min \
         FROM inventory_stock s JOIN product p ON p.id = s.product_id \
         ORDER BY p.name",
    )
    .fetch_all(pool)
    .await?;
    Ok(levels)
}

pub async fn find_by_product<'e>(
    exec: impl SqliteExecutor<'e>,
    product_id: i64,
) -> RepoResult<Option<InventoryStock>> {
    let stock = sqlx::query_as::<_, InventoryStock>(
        "SELECT id, product_id, quantity, min_stock, max_stock, updated_at FROM inventory_stock WHERE product_id = ?",
    )
    .bind(product_id)
    .fetch_optional(exec)
    .await?;
    Ok(stock)
}

/// Stock on hand; products without a stock row have 0
pub async fn quantity_on_hand<'e>(exec: impl SqliteExecutor<'e>, product_id: i64) -> RepoResult<i64> {
    let qty: Option<i64> =
        sqlx::query_scalar("SELECT quantity FROM inventory_stock WHERE product_id = ?")
            .bind(product_id)
            .fetch_optional(exec)
            .await?;
    Ok(qty.unwrap_or(0))
}

/// Create or update min/max thresholds
pub async fn set_thresholds(
    pool: &SqlitePool,
    product_id: i64,
    data: StockThresholdsUpdate,
) -> RepoResult<InventoryStock> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO inventory_stock (product_id, quantity, min_stock, max_stock, updated_at) VALUES (?1, 0, COALESCE(?2, 0), ?3, ?4) \
         ON CONFLICT(product_id) DO UPDATE SET min_stock = COALESCE(?2, min_stock), max_stock = COALESCE(?3, max_stock), updated_at = ?4",
    )
    .bind(product_id)
    .bind(data.min_stock)
    .bind(data.max_stock)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_product(pool, product_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to upsert inventory stock".into()))
}

/// Apply a movement and append it to the ledger
///
/// Callers run this inside a transaction so the stock row and the ledger
/// entry commit together.
pub async fn record_movement(
    conn: &mut SqliteConnection,
    movement: NewMovement<'_>,
) -> RepoResult<MovementOutcome> {
    let on_hand = quantity_on_hand(&mut *conn, movement.product_id).await?;
    let Some(resulting) = movement.movement_type.apply(on_hand, movement.quantity) else {
        return Ok(MovementOutcome::Insufficient { on_hand });
    };

    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO inventory_stock (product_id, quantity, min_stock, updated_at) VALUES (?1, ?2, 0, ?3) \
         ON CONFLICT(product_id) DO UPDATE SET quantity = excluded.quantity, updated_at = excluded.updated_at",
    )
    .bind(movement.product_id)
    .bind(resulting)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO inventory_movement (product_id, movement_type, quantity, resulting_quantity, reason, user_id, order_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING id",
    )
    .bind(movement.product_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(resulting)
    .bind(movement.reason)
    .bind(movement.user_id)
    .bind(movement.order_id)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(MovementOutcome::Applied(InventoryMovement {
        id,
        product_id: movement.product_id,
        movement_type: movement.movement_type,
        quantity: movement.quantity,
        resulting_quantity: resulting,
        reason: movement.reason.map(str::to_string),
        user_id: movement.user_id,
        order_id: movement.order_id,
        created_at: now,
    }))
}

/// Ledger entries, newest first
pub async fn find_movements(
    pool: &SqlitePool,
    product_id: Option<i64>,
    limit: i64,
) -> RepoResult<Vec<InventoryMovement>> {
    let movements = sqlx::query_as::<_, InventoryMovement>(
        "SELECT id, product_id, movement_type, quantity, resulting_quantity, reason, user_id, order_id, created_at FROM inventory_movement \
         WHERE (?1 IS NULL OR product_id = ?1) ORDER BY created_at DESC, id DESC LIMIT ?2",
    )
    .bind(product_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(movements)
}
