//! Order Repository (orders, line items, history)
//!
//! Writes here are building blocks for `orders::OrderLifecycle`, which owns
//! the transaction boundaries. Nothing in this module publishes events.

use super::RepoResult;
use shared::models::{
    HistoryAction, Order, OrderFilter, OrderHistory, OrderItem, OrderStatus, PaymentMethod,
};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

const ORDER_COLUMNS: &str = "id, order_number, status, subtotal, tax, discount, total, payment_method, is_paid, notes, table_id, user_id, bartender_id, version, created_at, updated_at";

/// Default page size for order listings
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Order header joined with its table and creator, for snapshots
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotHeader {
    #[sqlx(flatten)]
    pub order: Order,
    pub table_number: Option<i64>,
    pub user_name: Option<String>,
    pub user_role: Option<String>,
}

/// Line item joined with product and category, for snapshots
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotItemRow {
    pub id: i64,
    pub product_name: String,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub unit_price: f64,
    pub quantity: i64,
    pub subtotal: f64,
    pub notes: Option<String>,
}

/// Order header to insert
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub order_number: &'a str,
    pub table_id: Option<i64>,
    pub user_id: i64,
    pub bartender_id: Option<i64>,
    pub notes: Option<&'a str>,
}

/// Priced line item to insert
#[derive(Debug, Clone)]
pub struct NewOrderItem<'a> {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub subtotal: f64,
    pub notes: Option<&'a str>,
    pub is_free_complement: bool,
    pub complement_of: Option<i64>,
}

// ── Queries ────────────────────────────────────────────────────────

pub async fn find_by_id<'e>(exec: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?;
    Ok(order)
}

pub async fn find_all(pool: &SqlitePool, filter: &OrderFilter) -> RepoResult<Vec<Order>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"));
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(table_id) = filter.table_id {
        qb.push(" AND table_id = ").push_bind(table_id);
    }
    if let Some(is_paid) = filter.is_paid {
        qb.push(" AND is_paid = ").push_bind(is_paid);
    }
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT));

    let orders = qb.build_query_as::<Order>().fetch_all(pool).await?;
    Ok(orders)
}

/// Orders in `pendiente` / `en_proceso` / `lista`, oldest first (work queue order)
pub async fn find_active(pool: &SqlitePool) -> RepoResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE status IN ('pendiente', 'en_proceso', 'lista') ORDER BY created_at ASC, id ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

/// Most recent order on a table that still occupies it
pub async fn find_occupying_on_table<'e>(
    exec: impl SqliteExecutor<'e>,
    table_id: i64,
) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE table_id = ? AND status IN ('pendiente', 'en_proceso') ORDER BY created_at DESC, id DESC LIMIT 1"
    ))
    .bind(table_id)
    .fetch_optional(exec)
    .await?;
    Ok(order)
}

pub async fn count_occupying_on_table<'e>(
    exec: impl SqliteExecutor<'e>,
    table_id: i64,
) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders WHERE table_id = ? AND status IN ('pendiente', 'en_proceso')",
    )
    .bind(table_id)
    .fetch_one(exec)
    .await?;
    Ok(count)
}

pub async fn find_items<'e>(exec: impl SqliteExecutor<'e>, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, quantity, unit_price, subtotal, notes, is_free_complement, complement_of FROM order_items WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(exec)
    .await?;
    Ok(items)
}

pub async fn find_history(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderHistory>> {
    let history = sqlx::query_as::<_, OrderHistory>(
        "SELECT id, order_id, user_id, action, detail, created_at FROM order_history WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(history)
}

pub async fn snapshot_header<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
) -> RepoResult<Option<SnapshotHeader>> {
    let header = sqlx::query_as::<_, SnapshotHeader>(
        "SELECT o.id, o.order_number, o.status, o.subtotal, o.tax, o.discount, o.total, o.payment_method, o.is_paid, o.notes, o.table_id, o.user_id, o.bartender_id, o.version, o.created_at, o.updated_at, \
         t.number AS table_number, u.name AS user_name, r.slug AS user_role \
         FROM orders o \
         LEFT JOIN dining_table t ON t.id = o.table_id \
         LEFT JOIN users u ON u.id = o.user_id \
         LEFT JOIN role r ON r.id = u.role_id \
         WHERE o.id = ?",
    )
    .bind(id)
    .fetch_optional(exec)
    .await?;
    Ok(header)
}

pub async fn snapshot_items<'e>(
    exec: impl SqliteExecutor<'e>,
    order_id: i64,
) -> RepoResult<Vec<SnapshotItemRow>> {
    let items = sqlx::query_as::<_, SnapshotItemRow>(
        "SELECT i.id, p.name AS product_name, c.name AS category_name, c.color AS category_color, i.unit_price, i.quantity, i.subtotal, i.notes \
         FROM order_items i \
         JOIN product p ON p.id = i.product_id \
         LEFT JOIN category c ON c.id = p.category_id \
         WHERE i.order_id = ? ORDER BY i.id",
    )
    .bind(order_id)
    .fetch_all(exec)
    .await?;
    Ok(items)
}

// ── Writes ─────────────────────────────────────────────────────────

pub async fn insert<'e>(exec: impl SqliteExecutor<'e>, order: NewOrder<'_>) -> RepoResult<i64> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (order_number, status, subtotal, tax, discount, total, is_paid, notes, table_id, user_id, bartender_id, version, created_at, updated_at) \
         VALUES (?1, 'pendiente', 0, 0, 0, 0, 0, ?2, ?3, ?4, ?5, 1, ?6, ?6) RETURNING id",
    )
    .bind(order.order_number)
    .bind(order.notes)
    .bind(order.table_id)
    .bind(order.user_id)
    .bind(order.bartender_id)
    .bind(now)
    .fetch_one(exec)
    .await?;
    Ok(id)
}

pub async fn insert_item<'e>(
    exec: impl SqliteExecutor<'e>,
    order_id: i64,
    item: NewOrderItem<'_>,
) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO order_items (order_id, product_id, quantity, unit_price, subtotal, notes, is_free_complement, complement_of) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING id",
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.subtotal)
    .bind(item.notes)
    .bind(item.is_free_complement)
    .bind(item.complement_of)
    .fetch_one(exec)
    .await?;
    Ok(id)
}

pub async fn order_number_exists<'e>(exec: impl SqliteExecutor<'e>, number: &str) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE order_number = ?")
        .bind(number)
        .fetch_one(exec)
        .await?;
    Ok(count > 0)
}

/// Compare-and-swap the status on `version`; `false` when the version moved
pub async fn update_status_cas<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
    expected_version: i64,
    status: OrderStatus,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET status = ?1, version = version + 1, updated_at = ?2 WHERE id = ?3 AND version = ?4",
    )
    .bind(status)
    .bind(now)
    .bind(id)
    .bind(expected_version)
    .execute(exec)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Set the paid flag; `false` when the order is missing or already paid
pub async fn mark_paid<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
    method: PaymentMethod,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET is_paid = 1, payment_method = ?1, updated_at = ?2 WHERE id = ?3 AND is_paid = 0",
    )
    .bind(method)
    .bind(now)
    .bind(id)
    .execute(exec)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Sum of line subtotals as stored
pub async fn item_subtotals<'e>(exec: impl SqliteExecutor<'e>, order_id: i64) -> RepoResult<Vec<f64>> {
    let subtotals: Vec<f64> =
        sqlx::query_scalar("SELECT subtotal FROM order_items WHERE order_id = ? ORDER BY id")
            .bind(order_id)
            .fetch_all(exec)
            .await?;
    Ok(subtotals)
}

pub async fn update_totals<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
    subtotal: f64,
    total: f64,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET subtotal = ?1, tax = 0, discount = 0, total = ?2, updated_at = ?3 WHERE id = ?4",
    )
    .bind(subtotal)
    .bind(total)
    .bind(now)
    .bind(id)
    .execute(exec)
    .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn insert_history<'e>(
    exec: impl SqliteExecutor<'e>,
    order_id: i64,
    user_id: i64,
    action: HistoryAction,
    detail: &str,
) -> RepoResult<i64> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO order_history (order_id, user_id, action, detail, created_at) VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
    )
    .bind(order_id)
    .bind(user_id)
    .bind(action)
    .bind(detail)
    .bind(now)
    .fetch_one(exec)
    .await?;
    Ok(id)
}

pub async fn delete<'e>(exec: impl SqliteExecutor<'e>, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(exec)
        .await?;
    Ok(rows.rows_affected() > 0)
}
